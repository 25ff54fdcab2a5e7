use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::BlockError;
use crate::port::{EventHandler, Listeners, SubscriptionToken};
use crate::registry::BlockId;

/// Which block call raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Update,
    Shutdown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Setup => "setup",
            Phase::Update => "update",
            Phase::Shutdown => "shutdown",
        })
    }
}

/// An error raised by block code, tagged with the block it came from.
#[derive(Debug, Clone)]
pub struct BlockException {
    pub block_id: BlockId,
    pub block_name: String,
    pub phase: Phase,
    pub error: BlockError,
}

impl fmt::Display for BlockException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed in {}: {}", self.block_name, self.phase, self.error)
    }
}

pub type ExceptionHandler = dyn EventHandler<BlockException>;

/// Engine-wide exception callbacks.
#[derive(Debug, Default)]
pub struct ExceptionRegistry {
    listeners: Listeners<BlockException>,
}

impl ExceptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        callback: impl Fn(&BlockException) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        self.listeners.register(callback)
    }

    pub fn register_handler(&self, handler: Arc<ExceptionHandler>) -> SubscriptionToken {
        self.listeners.register_handler(handler)
    }

    pub fn unregister(&self, token: SubscriptionToken) -> bool {
        self.listeners.unregister(token)
    }

    pub fn unregister_handler(&self, handler: &Arc<ExceptionHandler>) -> bool {
        self.listeners.unregister_handler(handler)
    }

    pub fn deliver(&self, exception: &BlockException) {
        tracing::warn!(
            block = %exception.block_name,
            phase = %exception.phase,
            error = %exception.error,
            "block raised"
        );
        self.listeners.notify(exception);
    }
}
