//! Tracing subscriber setup for processes embedding drips lists.

use drips_core::DripsError;

use crate::config::StorageConfig;

/// Initialize a global tracing subscriber with the given level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value gives
/// human-readable text. `RUST_LOG` overrides `level` when set. Fails if a
/// global subscriber is already installed.
pub fn init_logging(level: &str, format: &str) -> Result<(), DripsError> {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let result = if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .try_init()
    };
    result.map_err(|e| DripsError::Config(e.to_string()))
}

/// [`init_logging`] with the settings of `config`.
pub fn init_from_config(config: &StorageConfig) -> Result<(), DripsError> {
    init_logging(&config.log_level, &config.log_format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails_without_panicking() {
        let _ = init_from_config(&StorageConfig::default());
        assert!(matches!(init_logging("debug", "json"), Err(DripsError::Config(_))));
    }
}
