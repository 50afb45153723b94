//! TOML configuration for the pipeline.
//!
//! ```toml
//! [data]
//! path = "data/wwtp_input_data.csv"
//!
//! [features]
//! capacity_floor = 5.0
//!
//! [clustering]
//! k = 3
//! seed = 42
//! max_iterations = 300
//! restarts = 1
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::cluster::{DEFAULT_K, DEFAULT_MAX_ITERATIONS};
use crate::data::prepare::DEFAULT_CAPACITY_FLOOR;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data: DataConfig,
    pub features: FeatureConfig,
    pub clustering: ClusterConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Delimited file holding the plant records.
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            path: PathBuf::from("data/wwtp_input_data.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureConfig {
    /// Lower bound applied to capacity to get the adjusted capacity.
    pub capacity_floor: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            capacity_floor: DEFAULT_CAPACITY_FLOOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterConfig {
    pub k: usize,
    /// Unset means the initial centroids come from OS entropy.
    pub seed: Option<u64>,
    pub max_iterations: usize,
    pub restarts: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            k: DEFAULT_K,
            seed: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            restarts: 1,
        }
    }
}

impl Config {
    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key, reason: &str| ConfigError::Invalid {
            key,
            reason: reason.to_string(),
        };
        if self.clustering.k == 0 {
            return Err(invalid("clustering.k", "must be at least 1"));
        }
        if self.clustering.max_iterations == 0 {
            return Err(invalid("clustering.max_iterations", "must be at least 1"));
        }
        if self.clustering.restarts == 0 {
            return Err(invalid("clustering.restarts", "must be at least 1"));
        }
        let floor = self.features.capacity_floor;
        if !floor.is_finite() || floor < 0.0 {
            return Err(ConfigError::Invalid {
                key: "features.capacity_floor",
                reason: format!("{floor} is not a finite non-negative number"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.clustering.k, 3);
        assert_eq!(config.features.capacity_floor, 5.0);
        assert_eq!(config.clustering.seed, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
            [data]
            path = "plants.tsv"

            [clustering]
            k = 4
            seed = 11
            "#,
        )
        .unwrap();
        assert_eq!(config.data.path, PathBuf::from("plants.tsv"));
        assert_eq!(config.clustering.k, 4);
        assert_eq!(config.clustering.seed, Some(11));
        assert_eq!(config.clustering.max_iterations, DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn rejects_zero_clusters() {
        let err = Config::from_toml("[clustering]\nk = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "clustering.k", .. }));
    }

    #[test]
    fn rejects_negative_floor() {
        let err = Config::from_toml("[features]\ncapacity_floor = -1.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "features.capacity_floor", .. }
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Config::from_toml("[clustering]\nclusters = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::load(Path::new("/no/such/wwtp.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
