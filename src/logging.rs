use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "tollbot=info";

/// Installs the `tracing` subscriber.
///
/// Log lines go to stderr; stdout is reserved for the payload audit log.
/// `RUST_LOG` overrides the default `tollbot=info` filter.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
