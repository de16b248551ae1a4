//! Control unit configuration loading.
//!
//! One TOML file, parsed through [`ConfigLoader`] and checked with
//! [`Validate`]. Pose overrides are applied later, when the state table is
//! built.

use std::path::Path;

use hoist_common::config::{ConfigError, ConfigLoader};
use hoist_common::superstructure::config::SuperstructureConfig;
use tracing::{debug, error, info};

/// Load and validate the superstructure configuration at `path`.
pub fn load_config(path: &Path) -> Result<SuperstructureConfig, ConfigError> {
    info!("Loading configuration from {}", path.display());
    let config = SuperstructureConfig::load_validated(path).map_err(|e| {
        error!("{}: {e}", path.display());
        e
    })?;
    info!(
        "Config OK: service={}, run_mode={:?}, period={}s, pose_overrides={}",
        config.shared.service_name,
        config.run_mode,
        config.cycle.period_s,
        config.poses.len()
    );
    debug!("Elevator: {:?}", config.elevator);
    debug!("Pivot: {:?}", config.pivot);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoist_common::superstructure::config::RunMode;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn loads_minimal_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("superstructure.toml");
        fs::write(&path, "run_mode = \"sim\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.run_mode, RunMode::Sim);
        assert_eq!(config.shared.service_name, "hoist");
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("superstructure.toml");
        fs::write(&path, "[cycle]\nperiod_s = 0.0\ntelemetry_interval = 5\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
