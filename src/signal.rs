use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::Arc;

/// Одноразовый широковещательный сигнал: аналог закрываемого канала.
/// После `set()` каждый подписчик видит сигнал сработавшим навсегда.
#[derive(Clone)]
pub struct Signal {
    tx: Arc<Mutex<Option<Sender<()>>>>,
    rx: Receiver<()>,
}

impl Signal {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
            rx,
        }
    }

    /// Срабатывает один раз; повторные вызовы ничего не делают
    pub fn set(&self) {
        self.tx.lock().take();
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver для `select!`: готов навсегда после `set()`
    pub fn subscribe(&self) -> Receiver<()> {
        self.rx.clone()
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}
