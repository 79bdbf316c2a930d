/// Снимок состояния пула
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub queued: usize,
    pub capacity: Option<usize>,
    pub workers: usize,
    pub stopped: bool,
}

impl PoolMetrics {
    /// Заполненность очереди в диапазоне 0.0..=1.0
    pub fn saturation(&self) -> f64 {
        match self.capacity {
            Some(cap) if cap > 0 => self.queued as f64 / cap as f64,
            _ => 0.0,
        }
    }
}
