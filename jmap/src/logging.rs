use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber for applications embedding the engine
///
/// In debug builds, defaults to debug level for this crate and info for
/// others. Can be overridden with the RUST_LOG environment variable.
/// Returns false when a global subscriber was already installed.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("jmap=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
