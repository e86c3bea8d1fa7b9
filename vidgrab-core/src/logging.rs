// Tracing subscriber setup shared by the desktop app and tests

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "vidgrab=info,vidgrab_core=info,tower_http=info";

/// Install the global fmt subscriber; later calls are no-ops
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
