use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. Without `debug` the level is pinned to
/// `info`; with it, `RUST_LOG` may override the `debug` default.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
