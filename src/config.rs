use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub exec: ExecConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ExecConfig {
    // Per-command limit; the child is killed once it passes
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub language: String,
    pub color: bool,
    pub max_history_shown: usize,
    pub prompt: String,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            color: true,
            max_history_shown: 20,
            prompt: "lcat> ".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exec: ExecConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, overlaid by `~/.lcat/config.toml` if present, then by
    /// `LCAT_TIMEOUT` / `LCAT_LANG`. Nothing is written back.
    pub fn new() -> Result<Self> {
        let path = Self::get_config_path();
        let mut config = if path.exists() {
            Self::from_path(&path)?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = var("LCAT_TIMEOUT") {
            self.exec.timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("LCAT_TIMEOUT must be a whole number of seconds, got '{}'", raw))?;
        }
        if let Some(lang) = var("LCAT_LANG") {
            self.display.language = lang;
        }
        Ok(())
    }

    fn get_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lcat")
            .join("config.toml")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.exec.timeout_secs.max(1))
    }

    pub fn get_effective_language(&self) -> String {
        if self.display.language == "auto" {
            // Try to get system language
            std::env::var("LANG")
                .unwrap_or_else(|_| "en_US".to_string())
                .split('.')
                .next()
                .unwrap_or("en")
                .to_string()
        } else {
            self.display.language.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.exec.timeout_secs, 30);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.display.language, "auto");
        assert_eq!(config.display.max_history_shown, 20);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[exec]\ntimeout_secs = 5\n").unwrap();

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.exec.timeout_secs, 5);
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[exec]\ntimeout_secs = \"soon\"\n").unwrap();
        assert!(Config::from_path(&path).is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        config
            .apply_env(|key| match key {
                "LCAT_TIMEOUT" => Some("7".to_string()),
                "LCAT_LANG" => Some("zh".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.exec.timeout_secs, 7);
        assert_eq!(config.get_effective_language(), "zh");

        let mut config = Config::default();
        let err = config.apply_env(|key| (key == "LCAT_TIMEOUT").then(|| "later".to_string()));
        assert!(err.is_err());
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let mut config = Config::default();
        config.exec.timeout_secs = 0;
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }
}
