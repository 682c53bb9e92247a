//! Logging setup for tests and benchmarks.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` fmt subscriber writing through the test harness.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Safe to call
/// from every test; only the first call installs the subscriber.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice() {
        init_logging();
        init_logging();
        tracing::debug!("logging initialized");
    }
}
