use tracing_subscriber::EnvFilter;

/// `-v` forces debug. Otherwise `RUST_LOG` decides, falling back to warn
/// when it is unset or does not parse.
pub fn filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }

    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}
