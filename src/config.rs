use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};
use crate::api::DEFAULT_BASE_URL;
use crate::upload::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub base_url: Option<String>,
    /// Initial value of the chunk size field
    pub default_chunk_size: Option<i64>,
    /// Initial value of the chunk overlap field
    pub default_chunk_overlap: Option<i64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Flag/env value wins over the config file, which wins over the built-in default
    pub fn resolve_base_url(&self, override_url: Option<&str>) -> String {
        override_url
            .or(self.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string()
    }

    pub fn chunk_size(&self) -> i64 {
        self.default_chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    pub fn chunk_overlap(&self) -> i64 {
        self.default_chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("rag-chat").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.resolve_base_url(None), "http://localhost:8000");
        assert_eq!(config.chunk_size(), 500);
        assert_eq!(config.chunk_overlap(), 20);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            base_url: Some("http://rag.internal:9000".to_string()),
            default_chunk_size: Some(1000),
            default_chunk_overlap: None,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.chunk_size(), 1000);
        assert_eq!(loaded.chunk_overlap(), 20);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"default_chunk_overlap": 50}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url, None);
        assert_eq!(config.chunk_overlap(), 50);
    }

    #[test]
    fn test_override_wins_over_file() {
        let config = Config {
            base_url: Some("http://from-file:8000".to_string()),
            ..Config::default()
        };
        assert_eq!(config.resolve_base_url(Some("http://flag:1")), "http://flag:1");
        assert_eq!(config.resolve_base_url(None), "http://from-file:8000");
    }
}
