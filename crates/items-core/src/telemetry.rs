use tracing_subscriber::EnvFilter;

/// Install the JSON tracing subscriber, filtered by `RUST_LOG` (default
/// `info`). Output goes to stderr so stdout stays free for command output.
///
/// Timestamps are left to the log sink; Lambda and CloudWatch add their own.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
