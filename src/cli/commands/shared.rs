//! Shared components for CLI commands
//!
//! Logging setup and layered configuration loading used by every command.

use crate::config::IngestionConfig;
use crate::error::Result;
use std::path::Path;
use tracing::{debug, info};

/// Set up structured logging on stderr.
///
/// `RUST_LOG` takes precedence over `log_level`. Initializing twice is a no-op.
pub fn setup_logging(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tdm_ingestion={}", log_level)));

    let initialized = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .is_ok();

    if initialized {
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Load configuration: defaults, config file, environment.
///
/// Without an explicit file the default location is used when it exists.
pub fn load_configuration(config_file: Option<&Path>) -> Result<IngestionConfig> {
    let default_config_path = match config_file {
        Some(_) => None,
        None => IngestionConfig::default_config_path().ok(),
    };

    let config_file = config_file.or_else(|| {
        default_config_path
            .as_deref()
            .filter(|path| path.exists())
    });

    match config_file {
        Some(path) => info!("Using config file: {}", path.display()),
        None => info!("No config file found, using defaults and environment variables"),
    }

    IngestionConfig::load_layered(config_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_explicit_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"tdmq": {{"url": "http://tdmq.test/api"}}}}"#).unwrap();

        let config = load_configuration(Some(file.path())).unwrap();
        assert_eq!(config.tdmq.url.as_deref(), Some("http://tdmq.test/api"));
    }

    #[test]
    fn test_missing_explicit_config_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(load_configuration(Some(&dir.path().join("absent.json"))).is_err());
    }

    #[test]
    fn test_setup_logging_is_idempotent() {
        setup_logging("debug");
        setup_logging("info");
    }
}
