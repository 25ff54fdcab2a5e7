use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn logging_enabled() -> bool {
    ["BLOCKFLOW_OBSERVABILITY_ENABLED", "BLOCKFLOW_OBSERVABILITY"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .map(|value| parse_flag(&value).unwrap_or(true))
        .unwrap_or(true)
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    std::env::var("BLOCKFLOW_LOG_LEVEL")
        .ok()
        .and_then(|level| tracing_subscriber::EnvFilter::try_new(level).ok())
        .or_else(|| tracing_subscriber::EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new("info"))
}

/// Install the process-wide tracing subscriber. Later calls are no-ops.
///
/// Environment variables:
/// - `BLOCKFLOW_OBSERVABILITY_ENABLED` / `BLOCKFLOW_OBSERVABILITY`: enable flag (default on).
/// - `BLOCKFLOW_LOG_LEVEL`: filter directive, takes precedence over `RUST_LOG`.
/// - `BLOCKFLOW_JSON_LOG_PATH`: write JSON lines to this file instead of compact stdout.
/// - `RUST_LOG`: fallback filter.
pub fn init_observability() {
    INIT.get_or_init(|| {
        if !logging_enabled() {
            return;
        }

        let filter = env_filter();
        match std::env::var("BLOCKFLOW_JSON_LOG_PATH") {
            Ok(raw) => {
                let path = std::path::PathBuf::from(raw);
                let dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| std::path::Path::new("."));
                let _ = std::fs::create_dir_all(dir);
                let file_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("blockflow.logs.jsonl");
                let writer = tracing_appender::rolling::never(dir, file_name);
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_thread_names(true)
                    .with_target(false)
                    .with_writer(writer);
                let _ = tracing_subscriber::registry()
                    .with(filter)
                    .with(layer)
                    .try_init();
            }
            Err(_) => {
                let layer = tracing_subscriber::fmt::layer()
                    .compact()
                    .with_thread_names(true)
                    .with_target(false)
                    .with_writer(std::io::stdout);
                let _ = tracing_subscriber::registry()
                    .with(filter)
                    .with(layer)
                    .try_init();
            }
        }
    });
}
