//! Tracing subscriber setup for the binaries
//!
//! The filter comes from `RUST_LOG` and defaults to `info`.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Install the global subscriber; `json` selects line-delimited JSON output
pub fn init_tracing(json: bool) -> Result<(), TelemetryError> {
    INITIALISED
        .set(())
        .map_err(|_| TelemetryError::AlreadyInitialised)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true);
        Registry::default().with(filter).with(layer).try_init()
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr);
        Registry::default().with(filter).with(layer).try_init()
    };

    result.map_err(|e| TelemetryError::Install(e.to_string()))
}

/// Errors raised while installing the subscriber
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("tracing has already been initialised")]
    AlreadyInitialised,

    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_rejected() {
        // The first call may race other tests for the global default; only
        // the guard is asserted
        let _ = init_tracing(false);
        assert!(matches!(
            init_tracing(true),
            Err(TelemetryError::AlreadyInitialised)
        ));
    }
}
