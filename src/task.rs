use super::{errors::panic_to_error, handle::TaskHandle, result::TaskResult};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

pub type Callback<A> = Box<dyn FnOnce(Vec<A>) + Send + 'static>;

/// Задача исполнителя: callback + позиционные аргументы + флаг отмены.
/// Аргументы можно менять до постановки в очередь; после `execute`
/// владение задачей переходит воркеру, который её заберёт.
pub struct Task<A> {
    callback: Callback<A>,
    args: Vec<A>,
    cancelled: Arc<AtomicBool>,
}

impl<A> Task<A> {
    pub fn new<F>(callback: F, args: Vec<A>) -> Self
    where
        F: FnOnce(Vec<A>) + Send + 'static,
    {
        Self {
            callback: Box::new(callback),
            args,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle для отмены после отправки
    pub fn handle(&self) -> TaskHandle {
        TaskHandle::new(self.cancelled.clone())
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Заменяет весь список аргументов
    pub fn set_args(&mut self, args: Vec<A>) -> &mut Self {
        self.args = args;
        self
    }

    /// Замена аргумента по индексу; вне диапазона ничего не меняет
    pub fn set_arg(&mut self, index: usize, arg: A) {
        if index < self.args.len() {
            self.args[index] = arg;
        }
    }

    /// Чтение аргумента по индексу; вне диапазона даёт `None`
    pub fn arg(&self, index: usize) -> Option<&A> {
        self.args.get(index)
    }

    pub fn args_len(&self) -> usize {
        self.args.len()
    }

    /// Добавление аргументов: `None` добавляет в конец, как и `Some(i)`
    /// при `i >= len`; иначе вставка с позиции `i` со сдвигом хвоста вправо
    pub fn add_args(&mut self, start_index: Option<usize>, args: Vec<A>) -> &mut Self {
        if args.is_empty() {
            return self;
        }
        match start_index {
            Some(i) if i < self.args.len() => {
                self.args.splice(i..i, args);
            }
            _ => self.args.extend(args),
        }
        self
    }

    /// Выполнение; отменённая задача пропускается молча
    pub fn call(self) {
        if self.is_cancelled() {
            return;
        }
        let Task { callback, args, .. } = self;
        callback(args);
    }

    /// Выполнение с преобразованием паники callback в `TaskError::Panic`
    pub fn call_caught(self) -> TaskResult<()> {
        if self.is_cancelled() {
            return Ok(());
        }
        let Task { callback, args, .. } = self;
        catch_unwind(AssertUnwindSafe(move || callback(args))).map_err(panic_to_error)
    }
}
