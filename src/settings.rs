use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ResitError, Result};

/// Application settings, separate from the receipt record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Pre-filled on new drafts when `--treasurer` is not given.
    #[serde(default)]
    pub default_treasurer: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            default_treasurer: String::new(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("resit")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("resit")
}

fn parse_settings(content: &str) -> Settings {
    serde_json::from_str(content).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "settings.json unreadable, using defaults");
        Settings::default()
    })
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        parse_settings(&content)
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ResitError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

/// Data directory in effect: an explicit override wins over settings.json.
pub fn resolve_data_dir(settings: &Settings, overridden: Option<PathBuf>) -> PathBuf {
    overridden.unwrap_or_else(|| PathBuf::from(shellexpand_path(&settings.data_dir)))
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
            data_dir: "/tmp/resit-test".to_string(),
            default_treasurer: "Aida".to_string(),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_settings(&content), settings);
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.default_treasurer.is_empty());
        assert!(s.data_dir.ends_with("resit"));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let s = parse_settings(r#"{"data_dir": "/tmp/test"}"#);
        assert_eq!(s.data_dir, "/tmp/test");
        assert!(s.default_treasurer.is_empty());
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        assert_eq!(parse_settings("[1, 2"), Settings::default());
    }

    #[test]
    fn test_override_wins() {
        let s = Settings {
            data_dir: "/tmp/from-settings".to_string(),
            default_treasurer: String::new(),
        };
        let dir = resolve_data_dir(&s, Some(PathBuf::from("/tmp/override")));
        assert_eq!(dir, PathBuf::from("/tmp/override"));
        let dir = resolve_data_dir(&s, None);
        assert_eq!(dir, PathBuf::from("/tmp/from-settings"));
    }

    #[test]
    fn test_shellexpand_home() {
        if let Some(home) = dirs::home_dir() {
            let expanded = shellexpand_path("~/receipts");
            assert_eq!(expanded, format!("{}/receipts", home.to_string_lossy()));
        }
    }
}
