use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::cli::{Args, ProviderKind};
use crate::errors::ConfigError;
use crate::wire::{Language, Theme};
use crate::wizard::DEFAULT_ORDER_PREFIX;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub language: Language,
    pub theme: Theme,
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// 0 means no timeout.
    pub timeout_secs: u64,
    pub order_prefix: String,
    pub transcript_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: Language::Ar,
            theme: Theme::Light,
            provider: ProviderKind::Gemini,
            model: None,
            base_url: None,
            timeout_secs: 0,
            order_prefix: DEFAULT_ORDER_PREFIX.into(),
            transcript_dir: ".repair-intake/transcripts".into(),
        }
    }
}

impl Config {
    /// `<config dir>/repair-intake/config.toml`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("repair-intake").join("config.toml"))
    }

    /// Reads `path`, or returns defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |message: String| ConfigError::Write {
            path: path.to_path_buf(),
            message,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        let body = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        fs::write(path, body).map_err(|e| write_err(e.to_string()))
    }

    /// Command-line flags win over the file.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(lang) = args.lang {
            self.language = lang;
        }
        if let Some(theme) = args.theme {
            self.theme = theme;
        }
        if let Some(provider) = args.provider {
            self.provider = provider;
        }
        if args.model.is_some() {
            self.model = args.model.clone();
        }
        if args.base_url.is_some() {
            self.base_url = args.base_url.clone();
        }
        if let Some(t) = args.timeout_secs {
            self.timeout_secs = t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.language, Language::Ar);
        assert_eq!(cfg.order_prefix, "RYD");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "language = \"en\"\ntheme = \"dark\"\n").unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.language, Language::En);
        assert_eq!(cfg.theme, Theme::Dark);
        assert_eq!(cfg.provider, ProviderKind::Gemini);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            language: Language::En,
            model: Some("gemini-2.5-pro".into()),
            ..Config::default()
        };
        cfg.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), cfg);
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "language = \"fr\"\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_args_override_file() {
        let mut cfg = Config::default();
        let args = Args::try_parse_from(["repair-intake", "--lang", "en", "--model", "x"]).unwrap();
        cfg.apply_args(&args);
        assert_eq!(cfg.language, Language::En);
        assert_eq!(cfg.model.as_deref(), Some("x"));
        assert_eq!(cfg.theme, Theme::Light);
    }
}
