//! Пул воркеров с корреляцией запрос/ответ по токену
//!
//! # Features
//! - Ограниченная очередь задач с backpressure при заполнении
//! - Graceful / немедленная остановка пула с таймером ожидания
//! - Сессии с почтовым ящиком ёмкостью 1 и таймаутом чтения
//! - Отмена задачи до диспетчеризации и конвертация паник в ошибки
//! - Явная конфигурация и внедрение зависимостей вместо глобального состояния

pub mod dispatch;
pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod result;
pub mod session;
pub mod signal;
pub mod task;

pub use dispatch::{Dispatcher, Message};
pub use errors::TaskError;
pub use handle::TaskHandle;
pub use model::PoolMetrics;
pub use pool::{ChannelExecutor, Config, Executor, PanicPolicy, TaskPoolExecutor};
pub use result::TaskResult;
pub use session::{Reply, Session, SessionRegistry, Token, DEFAULT_RECV_TIMEOUT};
pub use task::Task;
