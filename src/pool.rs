use super::{
    errors::TaskError,
    model::PoolMetrics,
    result::TaskResult,
    signal::Signal,
    task::Task,
};
use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use parking_lot::Mutex;
use std::{
    sync::{Arc, Once},
    thread,
    time::Duration,
};
use tracing::warn;

/// Политика обработки паник внутри callback задачи
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanicPolicy {
    /// Паника ловится, логируется и превращается в `TaskError::Panic`
    Recover,
    /// Паника раскручивается дальше и завершает поток воркера
    Propagate,
}

/// Конфигурация пула воркеров
#[derive(Debug, Clone)]
pub struct Config {
    pub pool_size: usize,
    pub queue_size: usize,
    /// Останавливать воркеры немедленно, бросая очередь
    pub shutdown_now: bool,
    /// При `shutdown_now = false`: сколько ждать доработки очереди,
    /// ноль означает ждать полного опустошения без ограничения по времени
    pub shutdown_wait: Duration,
    /// Пауза перед выполнением каждой взятой из очереди задачи
    pub task_delay: Duration,
    pub panic_policy: PanicPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool_size: num_cpus::get(),
            queue_size: 0x10000,
            shutdown_now: false,
            shutdown_wait: Duration::ZERO,
            task_delay: Duration::ZERO,
            panic_policy: PanicPolicy::Recover,
        }
    }
}

impl Config {
    pub fn new(
        pool_size: usize,
        queue_size: usize,
        shutdown_now: bool,
        shutdown_wait: Duration,
    ) -> Self {
        Self {
            pool_size,
            queue_size,
            shutdown_now,
            shutdown_wait,
            ..Default::default()
        }
    }

    /// Ошибки конфигурации всплывают при создании пула, а не в рантайме
    pub fn validate(&self) -> TaskResult<()> {
        if self.pool_size == 0 {
            return Err(TaskError::Config("pool_size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Исполнитель задач
pub trait Executor<A>: Send + Sync {
    /// Блокирующая постановка в очередь: при заполненной очереди вызывающий
    /// поток ждёт места либо начала остановки
    fn execute(&self, task: Task<A>) -> TaskResult<()>;
    /// Неблокирующий вариант: `TaskError::Full` при заполненной очереди
    fn try_execute(&self, task: Task<A>) -> TaskResult<()>;
    /// Идемпотентная остановка
    fn shutdown(&self);
}

enum WorkerState {
    Running,
    Draining,
    Stopped,
}

#[inline]
fn signal_fired(rx: &Receiver<()>) -> bool {
    matches!(rx.try_recv(), Err(TryRecvError::Disconnected))
}

fn run_task<A>(task: Task<A>, delay: Duration, policy: PanicPolicy) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
    match policy {
        PanicPolicy::Recover => {
            if let Err(e) = task.call_caught() {
                warn!(error = %e, "recovered task panic");
            }
        }
        PanicPolicy::Propagate => task.call(),
    }
}

fn worker_loop<A: Send + 'static>(
    tasks: Receiver<Task<A>>,
    stop: Receiver<()>,
    drain: Receiver<()>,
    delay: Duration,
    policy: PanicPolicy,
) {
    let mut state = WorkerState::Running;
    loop {
        state = match state {
            WorkerState::Running => {
                // сработавший стоп имеет приоритет над новой выборкой
                if signal_fired(&stop) {
                    WorkerState::Stopped
                } else {
                    crossbeam::select! {
                        recv(stop) -> _ => WorkerState::Stopped,
                        recv(tasks) -> task => match task {
                            Ok(task) => {
                                if signal_fired(&stop) {
                                    // стоп успел сработать: задача бросается
                                    WorkerState::Stopped
                                } else {
                                    run_task(task, delay, policy);
                                    WorkerState::Running
                                }
                            }
                            Err(_) => WorkerState::Stopped,
                        },
                        recv(drain) -> _ => WorkerState::Draining,
                    }
                }
            }
            WorkerState::Draining => {
                // дорабатываем очередь до пустоты либо до принудительного стопа
                loop {
                    if signal_fired(&stop) {
                        break;
                    }
                    match tasks.try_recv() {
                        Ok(task) => run_task(task, delay, policy),
                        Err(_) => break,
                    }
                }
                WorkerState::Stopped
            }
            WorkerState::Stopped => break,
        };
    }
}

struct WorkerHandle {
    stop: Signal,
    thread: thread::JoinHandle<()>,
}

/// Пул воркеров над одной ограниченной очередью.
/// Задачи раздаются в порядке FIFO, но порядок завершения между
/// воркерами не определён.
pub struct TaskPoolExecutor<A> {
    tx: Sender<Task<A>>,
    stopped: Signal,
    drain: Signal,
    close_once: Once,
    workers: Arc<Mutex<Vec<WorkerHandle>>>,
    config: Config,
}

impl<A: Send + 'static> TaskPoolExecutor<A> {
    pub fn new(config: Config) -> TaskResult<Arc<Self>> {
        config.validate()?;
        let (tx, rx) = bounded(config.queue_size);
        let stopped = Signal::new();
        let drain = Signal::new();

        let mut workers = Vec::with_capacity(config.pool_size);
        for i in 0..config.pool_size {
            let stop = Signal::new();
            let task_rx = rx.clone();
            let stop_rx = stop.subscribe();
            let drain_rx = drain.subscribe();
            let delay = config.task_delay;
            let policy = config.panic_policy;
            let thread = thread::Builder::new()
                .name(format!("msg-pool-worker-{i}"))
                .spawn(move || worker_loop(task_rx, stop_rx, drain_rx, delay, policy))
                .map_err(|e| TaskError::Config(format!("worker spawn failed: {e}")))?;
            workers.push(WorkerHandle { stop, thread });
        }

        Ok(Arc::new(Self {
            tx,
            stopped,
            drain,
            close_once: Once::new(),
            workers: Arc::new(Mutex::new(workers)),
            config,
        }))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            queued: self.tx.len(),
            capacity: self.tx.capacity(),
            workers: self.workers.lock().len(),
            stopped: self.stopped.is_set(),
        }
    }

    /// Остановить всех воркеров принудительно и дождаться выхода
    fn clear(workers: &Mutex<Vec<WorkerHandle>>) {
        let handles: Vec<WorkerHandle> = workers.lock().drain(..).collect();
        for w in &handles {
            w.stop.set();
        }
        for w in handles {
            let _ = w.thread.join();
        }
    }

    /// Дождаться добровольного выхода всех воркеров
    fn join_all(workers: &Mutex<Vec<WorkerHandle>>) {
        let handles: Vec<WorkerHandle> = workers.lock().drain(..).collect();
        for w in handles {
            let _ = w.thread.join();
        }
    }
}

fn log_occupancy(len: usize, cap: Option<usize>) {
    if let Some(cap) = cap {
        if cap > 0 && len > cap / 2 && len % 100 == 0 {
            warn!(queued = len, capacity = cap, "task queue above high-water mark");
        }
    }
}

impl<A: Send + 'static> Executor<A> for TaskPoolExecutor<A> {
    fn execute(&self, task: Task<A>) -> TaskResult<()> {
        if self.stopped.is_set() {
            return Err(TaskError::Stopped);
        }
        let stopped = self.stopped.subscribe();
        crossbeam::select! {
            send(self.tx, task) -> res => res.map_err(|_| TaskError::Stopped)?,
            recv(stopped) -> _ => return Err(TaskError::Stopped),
        }
        log_occupancy(self.tx.len(), self.tx.capacity());
        Ok(())
    }

    fn try_execute(&self, task: Task<A>) -> TaskResult<()> {
        if self.stopped.is_set() {
            return Err(TaskError::Stopped);
        }
        self.tx.try_send(task).map_err(|e| match e {
            TrySendError::Full(_) => TaskError::Full,
            TrySendError::Disconnected(_) => TaskError::Stopped,
        })?;
        log_occupancy(self.tx.len(), self.tx.capacity());
        Ok(())
    }

    fn shutdown(&self) {
        self.close_once.call_once(|| {
            self.stopped.set();
            if self.config.shutdown_now {
                Self::clear(&self.workers);
            } else if !self.config.shutdown_wait.is_zero() {
                // воркеры дорабатывают очередь, таймер гарантирует завершение
                self.drain.set();
                let workers = Arc::clone(&self.workers);
                let wait = self.config.shutdown_wait;
                thread::spawn(move || {
                    thread::sleep(wait);
                    Self::clear(&workers);
                });
            } else {
                self.drain.set();
                Self::join_all(&self.workers);
            }
        });
    }
}

/// Исполнитель без воркеров: голая ограниченная очередь,
/// потребитель забирает задачи сам через `receiver()`
pub struct ChannelExecutor<A> {
    tx: Sender<Task<A>>,
    rx: Receiver<Task<A>>,
    stopped: Signal,
    close_once: Once,
}

impl<A: Send + 'static> ChannelExecutor<A> {
    pub fn new(queue_size: usize) -> Self {
        let (tx, rx) = bounded(queue_size);
        Self {
            tx,
            rx,
            stopped: Signal::new(),
            close_once: Once::new(),
        }
    }

    pub fn receiver(&self) -> Receiver<Task<A>> {
        self.rx.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.is_set()
    }
}

impl<A: Send + 'static> Executor<A> for ChannelExecutor<A> {
    fn execute(&self, task: Task<A>) -> TaskResult<()> {
        if self.stopped.is_set() {
            return Err(TaskError::Stopped);
        }
        let stopped = self.stopped.subscribe();
        crossbeam::select! {
            send(self.tx, task) -> res => res.map_err(|_| TaskError::Stopped)?,
            recv(stopped) -> _ => return Err(TaskError::Stopped),
        }
        log_occupancy(self.tx.len(), self.tx.capacity());
        Ok(())
    }

    fn try_execute(&self, task: Task<A>) -> TaskResult<()> {
        if self.stopped.is_set() {
            return Err(TaskError::Stopped);
        }
        self.tx.try_send(task).map_err(|e| match e {
            TrySendError::Full(_) => TaskError::Full,
            TrySendError::Disconnected(_) => TaskError::Stopped,
        })?;
        log_occupancy(self.tx.len(), self.tx.capacity());
        Ok(())
    }

    fn shutdown(&self) {
        self.close_once.call_once(|| self.stopped.set());
    }
}
