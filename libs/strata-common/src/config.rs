//! Layered configuration for services embedding Strata

use std::path::Path;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use strata_model::{HealthConfig, TimelinessConfig};
use tracing::debug;

use crate::error::{CommonError, Result};
use crate::logging::LoggingConfig;

/// Prefix for environment overrides; nested keys are separated by `__`
pub const ENV_PREFIX: &str = "STRATA_";

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    pub logging: LoggingConfig,
    pub timeliness: TimelinessConfig,
    pub health: HealthConfig,
}

impl StrataConfig {
    pub fn validate(&self) -> Result<()> {
        self.timeliness.validate()?;
        self.health.validate()?;
        Ok(())
    }
}

/// Load configuration from `config/` under the working directory
///
/// See [`load_config_from_dir`] for the layering.
pub fn load_config() -> Result<StrataConfig> {
    load_config_from_dir("config")
}

/// Load configuration from multiple sources
///
/// Priority (highest to lowest):
/// 1. `STRATA_` environment variables (`STRATA_HEALTH__STUCK_MIN_SAMPLES=20`)
/// 2. `strata.json`
/// 3. `strata.yaml`
/// 4. `strata.toml`
/// 5. Default values
///
/// Missing files are skipped. The merged result is validated.
pub fn load_config_from_dir<P: AsRef<Path>>(dir: P) -> Result<StrataConfig> {
    let dir = dir.as_ref();
    debug!(dir = %dir.display(), "Loading configuration");

    let config: StrataConfig = Figment::from(Serialized::defaults(StrataConfig::default()))
        .merge(Toml::file(dir.join("strata.toml")))
        .merge(Yaml::file(dir.join("strata.yaml")))
        .merge(Json::file(dir.join("strata.json")))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| CommonError::Config(format!("Failed to load configuration: {}", e)))?;

    config.validate()?;
    Ok(config)
}

/// Load configuration from a specific file
pub fn load_config_from_file<T, P>(path: P) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CommonError::Config("Config file must have an extension".to_string()))?;

    let figment = match extension {
        "toml" => Figment::new().merge(Toml::file(path)),
        "yaml" | "yml" => Figment::new().merge(Yaml::file(path)),
        "json" => Figment::new().merge(Json::file(path)),
        _ => {
            return Err(CommonError::Config(format!(
                "Unsupported config file format: {}",
                extension
            )))
        },
    };

    figment.extract().map_err(|e| {
        CommonError::Config(format!("Failed to load configuration from file: {}", e))
    })
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("service.yml");
        fs::write(
            &path,
            "logging:\n  format: json\ntimeliness:\n  gap_multiplier: 4.0\n",
        )
        .unwrap();

        let config: StrataConfig = load_config_from_file(&path).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.timeliness.gap_multiplier, 4.0);
        assert_eq!(config.health, HealthConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("service.toml");
        fs::write(&path, "[health]\nstuck_min_samples = 20\n").unwrap();

        let config: StrataConfig = load_config_from_file(&path).unwrap();
        assert_eq!(config.health.stuck_min_samples, 20);
        assert_eq!(config.health.period_smoothing, 0.2);
    }

    #[test]
    fn test_unsupported_extension() {
        let result: Result<StrataConfig> = load_config_from_file("strata.ini");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Unsupported config file format: ini"));

        let result: Result<StrataConfig> = load_config_from_file("strata");
        assert!(result.is_err());
    }

    #[test]
    fn test_yaml_written_by_serde_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strata.yaml");

        let mut config = StrataConfig::default();
        config.health.stuck_exempt_models = vec!["Setpoint;1".to_string()];
        config.logging.level = "debug".to_string();
        fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        let loaded: StrataConfig = load_config_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    // The only test reading the process environment
    #[test]
    fn test_layering_and_env_override() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("strata.toml"),
            "[timeliness]\ngap_multiplier = 4.0\n\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("strata.yaml"), "timeliness:\n  gap_multiplier: 5.0\n").unwrap();

        let config = load_config_from_dir(dir.path()).unwrap();
        assert_eq!(config.timeliness.gap_multiplier, 5.0);
        assert_eq!(config.logging.level, "warn");

        std::env::set_var("STRATA_HEALTH__STUCK_MIN_SAMPLES", "7");
        let config = load_config_from_dir(dir.path());
        std::env::remove_var("STRATA_HEALTH__STUCK_MIN_SAMPLES");
        assert_eq!(config.unwrap().health.stuck_min_samples, 7);

        fs::write(dir.path().join("strata.json"), r#"{"timeliness": {"gap_multiplier": 0.0}}"#)
            .unwrap();
        let err = load_config_from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("gap_multiplier"));
    }
}
