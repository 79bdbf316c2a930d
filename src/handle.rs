use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Handle на отправленную задачу с поддержкой отмены.
/// Отмена действует только до того, как воркер заберёт задачу из очереди;
/// уже выполняющийся callback прервать нельзя.
#[derive(Clone, Debug)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    pub(crate) fn new(cancelled: Arc<AtomicBool>) -> Self {
        Self { cancelled }
    }

    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
