use super::{
    errors::panic_to_error,
    handle::TaskHandle,
    pool::{Config, Executor, TaskPoolExecutor},
    result::TaskResult,
    session::{Reply, SessionRegistry, Token},
    task::Task,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

type ReplyCallback<P, R> = Box<dyn FnOnce(P) -> R + Send + 'static>;

/// Конверт запроса: полезная нагрузка + callback пользователя.
/// Передаётся задаче как `args[0]`.
pub struct Message<P, R> {
    token: Option<Token>,
    payload: P,
    callback: ReplyCallback<P, R>,
}

/// Адаптер запрос/ответ: владеет реестром сессий и исполнителем.
/// Создаётся явно на старте процесса и внедряется вызывающим.
pub struct Dispatcher<P, R> {
    registry: SessionRegistry<R>,
    executor: Arc<dyn Executor<Message<P, R>>>,
}

impl<P: Send + 'static, R: Send + 'static> Dispatcher<P, R> {
    pub fn new(executor: Arc<dyn Executor<Message<P, R>>>) -> Self {
        Self {
            registry: SessionRegistry::new(),
            executor,
        }
    }

    /// Собственный пул по конфигурации; ошибки конфигурации
    /// всплывают здесь, на старте
    pub fn with_config(config: Config) -> TaskResult<Self> {
        let pool: Arc<dyn Executor<Message<P, R>>> = TaskPoolExecutor::new(config)?;
        Ok(Self::new(pool))
    }

    pub fn registry(&self) -> &SessionRegistry<R> {
        &self.registry
    }

    pub fn create_token(&self) -> Token {
        self.registry.create()
    }

    /// Запрос с корреляцией по токену через собственный исполнитель
    pub fn send_request<F>(&self, token: Token, payload: P, callback: F) -> Option<TaskHandle>
    where
        F: FnOnce(P) -> R + Send + 'static,
    {
        let task = self.request_task(token, payload, Box::new(callback));
        self.submit(self.executor.as_ref(), task)
    }

    /// Запрос через явно переданный исполнитель
    pub fn send_request_via<F>(
        &self,
        executor: &dyn Executor<Message<P, R>>,
        token: Token,
        payload: P,
        callback: F,
    ) -> Option<TaskHandle>
    where
        F: FnOnce(P) -> R + Send + 'static,
    {
        let task = self.request_task(token, payload, Box::new(callback));
        self.submit(executor, task)
    }

    /// Fire-and-forget: результат callback никому не доставляется,
    /// его паника только логируется
    pub fn send_async<F>(&self, payload: P, callback: F) -> Option<TaskHandle>
    where
        F: FnOnce(P) -> R + Send + 'static,
    {
        let task = Self::async_task(payload, Box::new(callback));
        self.submit(self.executor.as_ref(), task)
    }

    pub fn send_async_via<F>(
        &self,
        executor: &dyn Executor<Message<P, R>>,
        payload: P,
        callback: F,
    ) -> Option<TaskHandle>
    where
        F: FnOnce(P) -> R + Send + 'static,
    {
        let task = Self::async_task(payload, Box::new(callback));
        self.submit(executor, task)
    }

    /// Блокирующее чтение ответа с таймаутом по умолчанию
    pub fn recv(&self, token: Token) -> Option<Reply<R>> {
        self.recv_timeout(token, Duration::ZERO)
    }

    /// Чтение с явным таймаутом. Токен выводится из оборота в любом
    /// случае; неизвестный токен даёт `None` без блокировки.
    pub fn recv_timeout(&self, token: Token, timeout: Duration) -> Option<Reply<R>> {
        let session = self.registry.lookup(token)?;
        let reply = session.read(timeout);
        self.registry.retire(token);
        Some(reply)
    }

    pub fn shutdown(&self) {
        self.executor.shutdown();
    }

    fn request_task(
        &self,
        token: Token,
        payload: P,
        callback: ReplyCallback<P, R>,
    ) -> Task<Message<P, R>> {
        let registry = self.registry.clone();
        Task::new(
            move |mut args: Vec<Message<P, R>>| {
                if args.is_empty() {
                    return;
                }
                let msg = args.remove(0);
                let Some(token) = msg.token else { return };
                // сессии уже нет: получатель отвалился по таймауту
                let Some(session) = registry.lookup(token) else {
                    return;
                };
                let Message {
                    payload, callback, ..
                } = msg;
                match catch_unwind(AssertUnwindSafe(move || callback(payload))) {
                    Ok(data) => session.write(Reply::Data(data)),
                    Err(p) => session.write(Reply::Fault(panic_to_error(p))),
                }
            },
            vec![Message {
                token: Some(token),
                payload,
                callback,
            }],
        )
    }

    fn async_task(payload: P, callback: ReplyCallback<P, R>) -> Task<Message<P, R>> {
        Task::new(
            move |mut args: Vec<Message<P, R>>| {
                if args.is_empty() {
                    return;
                }
                let Message {
                    payload, callback, ..
                } = args.remove(0);
                if let Err(p) = catch_unwind(AssertUnwindSafe(move || {
                    callback(payload);
                })) {
                    warn!(error = %panic_to_error(p), "async message callback panicked");
                }
            },
            vec![Message {
                token: None,
                payload,
                callback,
            }],
        )
    }

    fn submit(
        &self,
        executor: &dyn Executor<Message<P, R>>,
        task: Task<Message<P, R>>,
    ) -> Option<TaskHandle> {
        let handle = task.handle();
        match executor.execute(task) {
            Ok(()) => Some(handle),
            Err(e) => {
                error!(error = %e, "message submit failed");
                None
            }
        }
    }
}
