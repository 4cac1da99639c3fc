use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::utils::paths::get_config_path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Color scheme: `default`, `dark` or `light`
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Path prefix of every field (`config.host`, ...)
    #[serde(default = "default_root")]
    pub root: String,

    /// Character drawn in place of each secret character
    #[serde(default = "default_mask_char")]
    pub mask_char: char,
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_root() -> String {
    "config".to_string()
}

fn default_mask_char() -> char {
    '*'
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            root: default_root(),
            mask_char: default_mask_char(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", config_path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.theme, "default");
        assert_eq!(config.root, "config");
        assert_eq!(config.mask_char, '*');
    }

    #[test]
    fn test_config_deserialization_fills_defaults() {
        let toml_str = r#"
        theme = "dark"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme, "dark");
        assert_eq!(config.root, "config");
    }

    #[test]
    fn test_mask_char_from_toml() {
        let config: Config = toml::from_str("mask_char = \"•\"").unwrap();
        assert_eq!(config.mask_char, '•');
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            theme: "light".to_string(),
            root: "connection".to_string(),
            mask_char: '#',
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "theme = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
