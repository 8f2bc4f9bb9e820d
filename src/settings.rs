use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ClaimError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_path")]
    pub data_path: String,
    /// Rows per table page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_data_path() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("claimdash")
        .join("claims.csv")
        .to_string_lossy()
        .to_string()
}

fn default_page_size() -> usize {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            page_size: default_page_size(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("claimdash")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ClaimError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

/// The dataset to open: the `--data` flag if given, else the saved setting.
pub fn resolve_data_path(flag: Option<&str>) -> PathBuf {
    match flag {
        Some(p) => PathBuf::from(shellexpand_path(p)),
        None => PathBuf::from(shellexpand_path(&load_settings().data_path)),
    }
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_path: "/tmp/claims.csv".to_string(),
            page_size: 25,
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.data_path, "/tmp/claims.csv");
        assert_eq!(loaded.page_size, 25);
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.page_size, 10);
        assert!(s.data_path.ends_with("claims.csv"));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_path": "/data/claims.csv"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.page_size, 10);
        assert_eq!(s.data_path, "/data/claims.csv");
    }

    #[test]
    fn test_flag_overrides_setting() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("claims.csv");
        std::fs::write(&file, "").unwrap();
        let resolved = resolve_data_path(Some(file.to_str().unwrap()));
        assert_eq!(resolved, std::fs::canonicalize(&file).unwrap());
    }
}
