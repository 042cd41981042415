use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Logs go to stderr so JSON output on stdout stays parseable.
///
/// `RUST_LOG` wins over `-v`.
pub fn init(verbose: u8) {
    let default = match verbose {
        0 => "warn,settle=info,settle_exec=info",
        1 => "settle=debug,settle_exec=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Ignore the error: a subscriber may already be installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
