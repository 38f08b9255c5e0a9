//! Structured logging for Tessera.
//!
//! Console output with uptime timestamps and module paths, plus JSON file
//! logging in debug builds. `RUST_LOG` takes precedence over the config's
//! `debug.log_level`.

use std::fs::File;
use std::path::Path;

use tessera_config::Config;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config give one.
pub const DEFAULT_FILTER: &str = "info";

/// Log file name inside the log directory.
pub const LOG_FILE: &str = "tessera.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables the file layer
/// * `config` - source of the log level when `RUST_LOG` is unset
///
/// ```no_run
/// use tessera_config::Config;
/// use tessera_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter = filter_directive(config);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = File::create(log_dir.join(LOG_FILE))
    {
        subscriber.with(json_file_layer(log_file)).init();
        return;
    }

    subscriber.init();
}

/// JSON lines written to `file`, without ANSI colour codes.
pub fn json_file_layer<S>(file: File) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_timer(fmt::time::uptime())
        .json()
}

/// Filter directive from the config, or [`DEFAULT_FILTER`] when the
/// config is absent or its level is blank.
pub fn filter_directive(config: Option<&Config>) -> String {
    config
        .map(|c| c.debug.log_level.trim())
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// `EnvFilter` for [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
