//! # Verifier Configuration
//!
//! Resource limits and policy switches for verification. Every field has a
//! default, so an empty YAML document is a valid configuration. Values can
//! be overridden by `ATRECORD_*` environment variables:
//!
//! | variable                           | field                     |
//! |------------------------------------|---------------------------|
//! | `ATRECORD_MAX_CAR_BYTES`           | `max_car_bytes`           |
//! | `ATRECORD_MAX_BLOCK_BYTES`         | `max_block_bytes`         |
//! | `ATRECORD_VERIFY_BLOCK_DIGESTS`    | `verify_block_digests`    |
//! | `ATRECORD_MAX_DECODE_DEPTH`        | `max_decode_depth`        |
//! | `ATRECORD_ACCEPT_LEGACY_KEY_TYPES` | `accept_legacy_key_types` |

use std::path::{Path, PathBuf};
use std::str::FromStr;

use atrecord_crypto::KeyPolicy;
use atrecord_repo::CarLimits;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENV_PREFIX: &str = "ATRECORD_";

/// Error loading or validating a [`VerifyConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The YAML is malformed or has unknown fields.
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An environment override does not parse.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        /// Variable name.
        var: String,
        /// Offending value.
        value: String,
        /// Parse failure.
        reason: String,
    },

    /// A limit is zero.
    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}

/// Settings for the verification orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    /// Largest accepted container, in bytes.
    pub max_car_bytes: usize,
    /// Largest accepted block, in bytes.
    pub max_block_bytes: usize,
    /// Re-hash every container block against its CID.
    pub verify_block_digests: bool,
    /// Nesting limit when decoding blocks.
    pub max_decode_depth: usize,
    /// Accept `EcdsaSecp256*VerificationKey2019` verification methods.
    pub accept_legacy_key_types: bool,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        let limits = CarLimits::default();
        Self {
            max_car_bytes: limits.max_car_bytes,
            max_block_bytes: limits.max_block_bytes,
            verify_block_digests: limits.verify_block_digests,
            max_decode_depth: limits.max_decode_depth,
            accept_legacy_key_types: false,
        }
    }
}

impl VerifyConfig {
    /// Parse YAML, filling absent fields with defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()
    }

    /// Read and parse a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(std::env::vars())
    }

    /// Apply `ATRECORD_*` overrides from `vars`. Unrelated variables and
    /// unknown `ATRECORD_*` names are ignored.
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "MAX_CAR_BYTES" => self.max_car_bytes = parse_env(key, value)?,
                "MAX_BLOCK_BYTES" => self.max_block_bytes = parse_env(key, value)?,
                "VERIFY_BLOCK_DIGESTS" => self.verify_block_digests = parse_bool(key, value)?,
                "MAX_DECODE_DEPTH" => self.max_decode_depth = parse_env(key, value)?,
                "ACCEPT_LEGACY_KEY_TYPES" => {
                    self.accept_legacy_key_types = parse_bool(key, value)?
                }
                _ => tracing::debug!(var = key, "ignoring unknown override"),
            }
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.max_car_bytes == 0 {
            return Err(ConfigError::ZeroLimit("max_car_bytes"));
        }
        if self.max_block_bytes == 0 {
            return Err(ConfigError::ZeroLimit("max_block_bytes"));
        }
        if self.max_decode_depth == 0 {
            return Err(ConfigError::ZeroLimit("max_decode_depth"));
        }
        Ok(self)
    }

    /// Container limits derived from this configuration.
    pub fn car_limits(&self) -> CarLimits {
        CarLimits {
            max_car_bytes: self.max_car_bytes,
            max_block_bytes: self.max_block_bytes,
            verify_block_digests: self.verify_block_digests,
            max_decode_depth: self.max_decode_depth,
        }
    }

    /// Key selection policy derived from this configuration.
    pub fn key_policy(&self) -> KeyPolicy {
        KeyPolicy {
            accept_legacy_key_types: self.accept_legacy_key_types,
        }
    }
}

fn parse_env<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var: var.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(VerifyConfig::from_yaml_str("").unwrap(), VerifyConfig::default());
        assert_eq!(VerifyConfig::from_yaml_str("{}").unwrap(), VerifyConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let config = VerifyConfig::from_yaml_str(
            "max_car_bytes: 1024\naccept_legacy_key_types: true\n",
        )
        .unwrap();
        assert_eq!(config.max_car_bytes, 1024);
        assert!(config.accept_legacy_key_types);
        assert_eq!(config.max_block_bytes, VerifyConfig::default().max_block_bytes);
        assert!(config.verify_block_digests);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            VerifyConfig::from_yaml_str("max_car_byte: 5"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(matches!(
            VerifyConfig::from_yaml_str("max_block_bytes: 0"),
            Err(ConfigError::ZeroLimit("max_block_bytes"))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = VerifyConfig::default()
            .with_overrides([
                ("ATRECORD_MAX_CAR_BYTES", "2048"),
                ("ATRECORD_VERIFY_BLOCK_DIGESTS", "false"),
                ("ATRECORD_ACCEPT_LEGACY_KEY_TYPES", "YES"),
                ("ATRECORD_SOMETHING_ELSE", "ignored"),
                ("PATH", "/usr/bin"),
            ])
            .unwrap();
        assert_eq!(config.max_car_bytes, 2048);
        assert!(!config.verify_block_digests);
        assert!(config.accept_legacy_key_types);
    }

    #[test]
    fn test_invalid_env_values() {
        assert!(matches!(
            VerifyConfig::default().with_overrides([("ATRECORD_MAX_DECODE_DEPTH", "deep")]),
            Err(ConfigError::InvalidEnv { .. })
        ));
        assert!(matches!(
            VerifyConfig::default().with_overrides([("ATRECORD_VERIFY_BLOCK_DIGESTS", "maybe")]),
            Err(ConfigError::InvalidEnv { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verify.yaml");
        std::fs::write(&path, "max_decode_depth: 32\n").unwrap();
        let config = VerifyConfig::from_file(&path).unwrap();
        assert_eq!(config.max_decode_depth, 32);
        assert_eq!(config.car_limits().max_decode_depth, 32);

        let missing = dir.path().join("absent.yaml");
        assert!(matches!(
            VerifyConfig::from_file(&missing),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_derived_policies() {
        let config = VerifyConfig {
            accept_legacy_key_types: true,
            verify_block_digests: false,
            ..VerifyConfig::default()
        };
        assert!(config.key_policy().accept_legacy_key_types);
        assert!(!config.car_limits().verify_block_digests);
    }
}
