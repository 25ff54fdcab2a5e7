//! Error taxonomy shared by the engine and by block code.
//!
//! Structural errors ([`EngineError`]) are returned synchronously from the API call that
//! caused them. Errors raised by user blocks ([`BlockError`]) never reach the caller: they
//! are caught on the worker thread and delivered to exception callbacks.

use thiserror::Error;

/// Engine / handle API error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("uninitialized handle: {0}")]
    UninitializedHandle(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("persistence error: {0}")]
    Persistence(String),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Error raised by block code during setup, update or shutdown.
#[derive(Debug, Clone, Error)]
pub enum BlockError {
    #[error("block error: {0}")]
    Other(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("block panicked: {0}")]
    Panicked(String),
}

impl BlockError {
    /// A misuse of the block's own declared IO (wrong type, unknown port). The instance is
    /// marked unusable until it is set up again.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            BlockError::Engine(EngineError::TypeMismatch(_) | EngineError::NotFound(_))
        )
    }
}

impl From<String> for BlockError {
    fn from(message: String) -> Self {
        BlockError::Other(message)
    }
}

impl From<&str> for BlockError {
    fn from(message: &str) -> Self {
        BlockError::Other(message.to_string())
    }
}
