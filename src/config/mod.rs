use anyhow::Context;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::provider::http::DEFAULT_ENDPOINT;
use crate::storage::DEFAULT_STORAGE_KEY;

const APP_DIR: &str = "routine-picker";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    /// `None` waits on the endpoint indefinitely.
    pub timeout_secs: Option<u64>,
    pub catalog: String,
    pub storage_path: PathBuf,
    pub storage_key: String,
    pub artifacts_dir: PathBuf,
    pub save_exchange: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout_secs: None,
            catalog: "products.json".into(),
            storage_path: default_storage_path(),
            storage_key: DEFAULT_STORAGE_KEY.into(),
            artifacts_dir: ".routine-picker/exchanges".into(),
            save_exchange: false,
        }
    }
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".routine-picker"))
        .join("storage.json")
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

impl Config {
    /// An explicit path must exist; the default location is optional.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(p) => Self::from_file(p),
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_timeout() {
        let cfg = Config::default();
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.timeout_secs, None);
        assert_eq!(cfg.storage_key, "lorealSelectedProducts");
        assert!(cfg.storage_path.ends_with("storage.json"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "endpoint = \"http://localhost:8787/\"\ntimeout_secs = 30\n").unwrap();

        let cfg = Config::resolve(Some(&path)).unwrap();
        assert_eq!(cfg.endpoint, "http://localhost:8787/");
        assert_eq!(cfg.timeout_secs, Some(30));
        assert_eq!(cfg.catalog, "products.json");
        assert!(!cfg.save_exchange);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::resolve(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = \"soon\"").unwrap();

        let err = Config::resolve(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }
}
