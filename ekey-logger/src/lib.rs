//! Process-wide `tracing` initialization for the `ekey` binary.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive when `RUST_LOG` isn't set.
const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Initialize the global `tracing` subscriber. Safe to call once per
/// process; calling it twice returns an error from `tracing`'s global
/// dispatcher that this function ignores, since tests may call it
/// repeatedly.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

    let fmt_layer = fmt::layer().with_ansi(std::io::IsTerminal::is_terminal(&std::io::stdout()));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
