use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Engine settings. Defaults match a desktop host: 15 workers, 1 ms scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Scheduler tick interval. `None` disables the timer thread; call `Engine::step` instead.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: Option<u64>,
    #[serde(default = "default_buffer_size")]
    pub default_buffer_size: usize,
    /// Bound for waiting on in-flight work in stop, shutdown and pool teardown.
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
    /// Relative bundle paths are resolved against this directory.
    #[serde(default)]
    pub base_directory: Option<PathBuf>,
}

const fn default_worker_threads() -> usize {
    15
}

const fn default_tick_interval_ms() -> Option<u64> {
    Some(1)
}

const fn default_buffer_size() -> usize {
    50
}

const fn default_join_timeout_ms() -> u64 {
    500
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            tick_interval_ms: default_tick_interval_ms(),
            default_buffer_size: default_buffer_size(),
            join_timeout_ms: default_join_timeout_ms(),
            base_directory: None,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| EngineError::InvalidState(format!("invalid value for {}: {}", key, raw))),
        Err(_) => Ok(None),
    }
}

impl EngineConfig {
    /// Defaults overlaid with `BLOCKFLOW_*` environment variables.
    ///
    /// - `BLOCKFLOW_WORKER_THREADS`
    /// - `BLOCKFLOW_TICK_INTERVAL_MS` (`0` or `manual` disables the timer thread)
    /// - `BLOCKFLOW_BUFFER_SIZE`
    /// - `BLOCKFLOW_JOIN_TIMEOUT_MS`
    /// - `BLOCKFLOW_BASE_DIRECTORY`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(n) = parse_env::<usize>("BLOCKFLOW_WORKER_THREADS")? {
            config = config.with_worker_threads(n);
        }
        if let Ok(raw) = std::env::var("BLOCKFLOW_TICK_INTERVAL_MS") {
            let raw = raw.trim();
            config.tick_interval_ms = if raw.eq_ignore_ascii_case("manual") {
                None
            } else {
                let ms = raw.parse::<u64>().map_err(|_| {
                    EngineError::InvalidState(format!(
                        "invalid value for BLOCKFLOW_TICK_INTERVAL_MS: {}",
                        raw
                    ))
                })?;
                (ms > 0).then_some(ms)
            };
        }
        if let Some(n) = parse_env::<usize>("BLOCKFLOW_BUFFER_SIZE")? {
            config = config.with_default_buffer_size(n);
        }
        if let Some(ms) = parse_env::<u64>("BLOCKFLOW_JOIN_TIMEOUT_MS")? {
            config.join_timeout_ms = ms;
        }
        if let Ok(dir) = std::env::var("BLOCKFLOW_BASE_DIRECTORY")
            && !dir.trim().is_empty()
        {
            config.base_directory = Some(PathBuf::from(dir));
        }
        Ok(config)
    }

    pub fn with_worker_threads(mut self, n: usize) -> Self {
        self.worker_threads = n.max(1);
        self
    }

    pub fn with_tick_interval_ms(mut self, ms: Option<u64>) -> Self {
        self.tick_interval_ms = ms.filter(|ms| *ms > 0);
        self
    }

    /// No timer thread; the host drives scheduling through `Engine::step`.
    pub fn manual(self) -> Self {
        self.with_tick_interval_ms(None)
    }

    pub fn with_default_buffer_size(mut self, n: usize) -> Self {
        self.default_buffer_size = n.max(1);
        self
    }

    pub fn with_join_timeout_ms(mut self, ms: u64) -> Self {
        self.join_timeout_ms = ms;
        self
    }

    pub fn with_base_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_directory = Some(dir.into());
        self
    }

    pub fn tick_interval(&self) -> Option<Duration> {
        self.tick_interval_ms.map(Duration::from_millis)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.worker_threads, 15);
        assert_eq!(c.default_buffer_size, 50);
        assert_eq!(c.tick_interval(), Some(Duration::from_millis(1)));
        assert_eq!(c.join_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let c: EngineConfig = serde_json::from_str(r#"{"worker_threads": 2}"#).unwrap();
        assert_eq!(c.worker_threads, 2);
        assert_eq!(c.default_buffer_size, 50);
        assert_eq!(c.tick_interval_ms, Some(1));
    }

    #[test]
    fn builders_clamp() {
        let c = EngineConfig::default()
            .with_worker_threads(0)
            .with_default_buffer_size(0)
            .with_tick_interval_ms(Some(0));
        assert_eq!(c.worker_threads, 1);
        assert_eq!(c.default_buffer_size, 1);
        assert!(c.tick_interval().is_none());
        assert!(EngineConfig::default().manual().tick_interval_ms.is_none());
    }
}
