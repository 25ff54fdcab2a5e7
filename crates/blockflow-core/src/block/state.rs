use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Lifecycle of a block instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockState {
    Created,
    SetUp,
    /// Setup raised an error; the instance can only be set up again or shut down.
    SetupFailed,
    Running,
    Stopped,
    /// A contract violation during update; needs a fresh setup.
    Unusable,
    ShuttingDown,
    Destroyed,
}

impl BlockState {
    pub fn name(&self) -> &'static str {
        match self {
            BlockState::Created => "created",
            BlockState::SetUp => "set up",
            BlockState::SetupFailed => "setup failed",
            BlockState::Running => "running",
            BlockState::Stopped => "stopped",
            BlockState::Unusable => "unusable",
            BlockState::ShuttingDown => "shutting down",
            BlockState::Destroyed => "destroyed",
        }
    }

    pub fn can_setup(&self) -> bool {
        matches!(
            self,
            BlockState::Created | BlockState::SetupFailed | BlockState::Unusable
        )
    }

    pub fn can_start(&self) -> bool {
        matches!(self, BlockState::SetUp | BlockState::Stopped)
    }

    pub fn can_stop(&self) -> bool {
        matches!(self, BlockState::Running)
    }

    pub fn can_shutdown(&self) -> bool {
        !matches!(self, BlockState::ShuttingDown | BlockState::Destroyed)
    }

    /// Whether user setup completed, so teardown must run user shutdown.
    pub fn was_set_up(&self) -> bool {
        matches!(
            self,
            BlockState::SetUp | BlockState::Running | BlockState::Stopped | BlockState::Unusable
        )
    }

    pub fn ensure(&self, allowed: bool, operation: &str, block: &str) -> Result<()> {
        if allowed {
            return Ok(());
        }
        Err(EngineError::InvalidState(format!(
            "cannot {} {} while it is {}",
            operation,
            block,
            self.name()
        )))
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_requires_setup() {
        let err = BlockState::Created
            .ensure(BlockState::Created.can_start(), "start", "Doubler # 0")
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
        assert!(err.to_string().contains("Doubler # 0"));
        assert!(BlockState::SetUp.can_start());
        assert!(BlockState::Stopped.can_start());
        assert!(!BlockState::SetupFailed.can_start());
    }

    #[test]
    fn shutdown_allowed_until_destroyed() {
        assert!(BlockState::Created.can_shutdown());
        assert!(BlockState::Unusable.can_shutdown());
        assert!(!BlockState::Destroyed.can_shutdown());
        assert!(BlockState::Unusable.can_setup());
    }
}
