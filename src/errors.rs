use std::any::Any;

/// Ошибки исполнителя задач и сессий
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("task pool stopped")]
    Stopped,
    #[error("task pool full")]
    Full,
    #[error("reply wait timed out")]
    Timeout,
    #[error("task panicked: {0}")]
    Panic(String),
    #[error("invalid config: {0}")]
    Config(String),
}

/// Преобразует payload паники в `TaskError::Panic`
pub fn panic_to_error(payload: Box<dyn Any + Send>) -> TaskError {
    if let Some(s) = payload.downcast_ref::<&str>() {
        TaskError::Panic((*s).to_string())
    } else if let Some(s) = payload.downcast_ref::<String>() {
        TaskError::Panic(s.clone())
    } else {
        TaskError::Panic("non-string panic payload".to_string())
    }
}
