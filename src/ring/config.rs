use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::partitioning::{consistent_hashing::murmur3_hash, RingPosition};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RingConfig {
    pub virtual_nodes: usize,
    #[serde(default)]
    pub hash_function: HashFunction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashFunction {
    #[default]
    Murmur3,
}

impl HashFunction {
    pub fn hash_fn(&self) -> fn(&[u8]) -> RingPosition {
        match self {
            HashFunction::Murmur3 => murmur3_hash,
        }
    }
}

impl RingConfig {
    pub fn new(virtual_nodes: usize) -> Self {
        Self {
            virtual_nodes,
            hash_function: HashFunction::default(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let c = std::fs::read_to_string(path)?;
        let config: RingConfig = serde_json::from_str(&c)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{HashFunction, RingConfig};
    use crate::error::Error;

    #[test]
    fn deserialize_ring_config() {
        let mut config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        config_path.push("conf/ring.json");

        let config = RingConfig::from_path(&config_path).unwrap();

        assert!(matches!(
            config,
            RingConfig {
                virtual_nodes: 3,
                hash_function: HashFunction::Murmur3,
            }
        ));
    }

    #[test]
    fn hash_function_defaults_to_murmur3() {
        let config: RingConfig = serde_json::from_str(r#"{"virtual_nodes": 10}"#).unwrap();
        assert_eq!(config, RingConfig::new(10));
    }

    #[test]
    fn invalid_json_is_an_invalid_config() {
        let err: Error = serde_json::from_str::<RingConfig>(r#"{"virtual_nodes": -1}"#)
            .err()
            .unwrap()
            .into();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = RingConfig::from_path(&PathBuf::from("conf/does_not_exist.json"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Io { .. }));
    }
}
