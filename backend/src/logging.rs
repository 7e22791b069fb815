use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. Returns false if one was already set,
/// which leaves the existing subscriber in place.
pub fn init_tracing(filter: &str) -> bool {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
