//! Tracing subscriber setup for the binary.

use shared_utils::env::get_env_var_or;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable selecting `json` or `text` (default) log lines.
pub const LOG_FORMAT_VAR: &str = "MONITOR_LOG_FORMAT";

/// Installs the global subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let log_format = get_env_var_or(LOG_FORMAT_VAR, "text");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}
