// src/utils/logging.rs
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")) // Default to INFO level
}

/// Sets up the logging framework using tracing_subscriber.
/// Reads log level filters from the `RUST_LOG` environment variable.
/// Defaults to "info" if `RUST_LOG` is not set.
///
/// Panics if a global subscriber is already installed; embedders that may
/// call this more than once should use [`try_setup_logging`].
pub fn setup_logging() {
    fmt().with_env_filter(default_filter()).init();

    tracing::debug!("Logging setup complete.");
}

/// Same as [`setup_logging`] but reports an already-installed subscriber as an error.
pub fn try_setup_logging() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(default_filter())
        .try_init()?;

    tracing::debug!("Logging setup complete.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_try_setup_reports_error() {
        // Only the second call's outcome is deterministic.
        let _ = try_setup_logging();
        assert!(try_setup_logging().is_err());
    }
}
