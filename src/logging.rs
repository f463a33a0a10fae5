use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `resit=debug`.
pub const LOG_ENV: &str = "RESIT_LOG";

/// Diagnostics go to stderr so command output on stdout stays clean.
pub fn init(verbose: bool) {
    let fallback = if verbose { "resit=debug" } else { "resit=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
