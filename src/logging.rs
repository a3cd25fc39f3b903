//! Logging setup on top of `tracing-subscriber`.
//!
//! The filter comes from `RUST_LOG` (default `info`), e.g.
//! `RUST_LOG=enroll_core=debug` or `RUST_LOG=enroll_core::model=trace` to see
//! the big-M values chosen per constraint.
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber for the `enroll` binary. Output goes to
/// stderr so that a JSON result on stdout stays machine-readable. Call once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Debug-level subscriber whose output is captured per test, so a failing
/// run shows the model stats and solve status. Later calls are no-ops.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
