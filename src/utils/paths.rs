use anyhow::{anyhow, Result};
use std::path::PathBuf;

pub fn get_conform_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    Ok(home.join(".conform"))
}

pub fn get_config_path() -> Result<PathBuf> {
    let conform_dir = get_conform_dir()?;
    Ok(conform_dir.join("config.toml"))
}

pub fn get_logs_dir() -> Result<PathBuf> {
    let conform_dir = get_conform_dir()?;
    Ok(conform_dir.join("logs"))
}

pub fn get_crash_log_path() -> Result<PathBuf> {
    let conform_dir = get_conform_dir()?;
    Ok(conform_dir.join("crash.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_conform_dir() {
        let dir = get_conform_dir().unwrap();
        assert!(dir.to_string_lossy().ends_with(".conform"));
    }

    #[test]
    fn test_get_config_path() {
        let path = get_config_path().unwrap();
        assert!(path.to_string_lossy().contains(".conform"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_get_logs_dir() {
        let dir = get_logs_dir().unwrap();
        assert!(dir.to_string_lossy().contains(".conform"));
        assert!(dir.to_string_lossy().ends_with("logs"));
    }

    #[test]
    fn test_get_crash_log_path() {
        let path = get_crash_log_path().unwrap();
        assert!(path.to_string_lossy().ends_with("crash.log"));
    }
}
