//! Logging setup
//!
//! stdout carries the MCP channel, so every event goes to stderr.

use tracing_subscriber::{fmt, EnvFilter};

/// Level used when nothing else is configured
pub const DEFAULT_LEVEL: &str = "warn";

/// Pick the filter directive: RUST_LOG, then --verbose/--quiet, then config
pub fn resolve_filter(verbose: bool, quiet: bool, configured: Option<&str>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directive = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        configured.unwrap_or(DEFAULT_LEVEL)
    };
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(filter: EnvFilter) {
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(false)
        .try_init();
}

/// Verbose logging captured by the test harness
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
