use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Path of the dataset relative to `base_url`
pub const DEFAULT_DATASET_PATH: &str = "/msd-mk.sqlite";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,
    /// Read the dataset from this file instead of downloading it
    #[serde(default)]
    pub dataset_file: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    /// Overrides the platform cache directory
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            dataset_path: default_dataset_path(),
            dataset_file: None,
            cache_enabled: true,
            cache_dir: None,
        }
    }
}

impl LexiconConfig {
    /// Full URL of the dataset file
    pub fn dataset_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.dataset_path.trim_start_matches('/')
        )
    }
}

fn default_base_url() -> String {
    // Environment wins over the built-in dev server address
    std::env::var("MKDICT_BASE_URL").unwrap_or_else(|_| "http://localhost:5173".to_string())
}

fn default_dataset_path() -> String {
    DEFAULT_DATASET_PATH.to_string()
}

fn default_true() -> bool {
    true
}

pub fn default_config_path() -> PathBuf {
    let Some(dirs) = ProjectDirs::from("mk", "msd", "mkdict") else {
        return Path::new("mkdict-config.json").to_path_buf();
    };
    dirs.config_dir().join("config.json")
}

/// Missing or malformed files fall back to defaults
pub fn load_config(path: &Path) -> LexiconConfig {
    let Ok(bytes) = fs::read(path) else {
        return LexiconConfig::default();
    };
    serde_json::from_slice::<LexiconConfig>(&bytes).unwrap_or_default()
}

pub fn save_config(path: &Path, cfg: &LexiconConfig) -> Result<(), String> {
    let json = serde_json::to_vec_pretty(cfg).map_err(|e| e.to_string())?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    fs::write(path, json).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dataset_url_joins_cleanly() {
        let cfg = LexiconConfig {
            base_url: "https://recnik.example.mk/".to_string(),
            dataset_path: "/msd-mk.sqlite".to_string(),
            ..LexiconConfig::default()
        };
        assert_eq!(cfg.dataset_url(), "https://recnik.example.mk/msd-mk.sqlite");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = load_config(&temp_dir.path().join("nope.json"));
        assert!(cfg.cache_enabled);
        assert_eq!(cfg.dataset_path, DEFAULT_DATASET_PATH);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"cache_enabled": false}"#).unwrap();

        let cfg = load_config(&path);
        assert!(!cfg.cache_enabled);
        assert_eq!(cfg.dataset_path, DEFAULT_DATASET_PATH);
        assert!(cfg.cache_dir.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");
        let cfg = LexiconConfig {
            base_url: "https://recnik.example.mk".to_string(),
            cache_dir: Some(temp_dir.path().join("cache")),
            ..LexiconConfig::default()
        };

        save_config(&path, &cfg).unwrap();
        let loaded = load_config(&path);
        assert_eq!(loaded.base_url, cfg.base_url);
        assert_eq!(loaded.cache_dir, cfg.cache_dir);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(load_config(&path).cache_enabled);
    }
}
