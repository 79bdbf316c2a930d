use super::errors::TaskError;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc, time::Duration};

/// Таймаут чтения ответа по умолчанию
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(15);

pub type Token = u64;

/// Ответ на запрос: данные или ошибка, взаимоисключающие
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<R> {
    Data(R),
    Fault(TaskError),
}

impl<R> Reply<R> {
    pub fn data(self) -> Option<R> {
        match self {
            Reply::Data(d) => Some(d),
            Reply::Fault(_) => None,
        }
    }

    pub fn fault(self) -> Option<TaskError> {
        match self {
            Reply::Data(_) => None,
            Reply::Fault(e) => Some(e),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Reply::Fault(TaskError::Timeout))
    }
}

/// Сессия: токен + почтовый ящик ёмкостью 1
pub struct Session<R> {
    id: Token,
    tx: Sender<Reply<R>>,
    rx: Receiver<Reply<R>>,
}

impl<R> Clone for Session<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<R> Session<R> {
    fn new(id: Token) -> Self {
        let (tx, rx) = bounded(1);
        Self { id, tx, rx }
    }

    pub fn id(&self) -> Token {
        self.id
    }

    /// В ящик доставляется не более одного сообщения:
    /// при занятом слоте запись молча отбрасывается, без блокировки
    pub fn write(&self, reply: Reply<R>) {
        let _ = self.tx.try_send(reply);
    }

    /// Блокирующее чтение; нулевой таймаут означает `DEFAULT_RECV_TIMEOUT`,
    /// истечение срока даёт `Reply::Fault(TaskError::Timeout)`
    pub fn read(&self, timeout: Duration) -> Reply<R> {
        let timeout = if timeout.is_zero() {
            DEFAULT_RECV_TIMEOUT
        } else {
            timeout
        };
        match self.rx.recv_timeout(timeout) {
            Ok(reply) => reply,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                Reply::Fault(TaskError::Timeout)
            }
        }
    }
}

struct RegistryState<R> {
    next_id: Token,
    sessions: HashMap<Token, Session<R>>,
}

/// Таблица токен → сессия; клонируется дёшево и разделяется между потоками.
/// Непрочитанный ящик живёт до конца процесса, поэтому каждый `create`
/// обязан быть спарен с чтением на стороне вызывающего.
pub struct SessionRegistry<R> {
    state: Arc<RwLock<RegistryState<R>>>,
}

impl<R> Clone for SessionRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<R> SessionRegistry<R> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState {
                next_id: 0,
                sessions: HashMap::new(),
            })),
        }
    }

    /// Выделяет свежую сессию; токены строго возрастают и не переиспользуются
    pub fn create(&self) -> Token {
        let mut state = self.state.write();
        state.next_id += 1;
        let id = state.next_id;
        state.sessions.insert(id, Session::new(id));
        id
    }

    pub fn lookup(&self, token: Token) -> Option<Session<R>> {
        self.state.read().sessions.get(&token).cloned()
    }

    pub fn retire(&self, token: Token) {
        self.state.write().sessions.remove(&token);
    }

    pub fn len(&self) -> usize {
        self.state.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R> Default for SessionRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}
