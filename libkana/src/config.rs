//! Kana-specific configuration that extends the base `Config` from core.
//!
//! This configuration includes:
//! - All generic options from `libime_core::Config` (flattened via serde)
//! - Switches for the candidate forms offered by `KanaCandidateProvider`
//!
//! # Example
//!
//! ```rust
//! use libkana::KanaConfig;
//!
//! let config = KanaConfig::from_toml_str("candidate_limit = 4\nuppercase = false\n").unwrap();
//! assert_eq!(config.base().candidate_limit, 4);
//! assert!(!config.uppercase);
//! assert!(config.katakana);
//! ```
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct KanaConfig {
    /// Base configuration fields (limit, initial mode, decoration, cache)
    #[serde(flatten)]
    pub base: libime_core::Config,

    /// Offer the text wrapped in 【】
    pub bracketed: bool,

    /// Offer the upper-cased text (useful for romaji)
    pub uppercase: bool,

    /// Offer the katakana form of hiragana input
    pub katakana: bool,
}

impl Default for KanaConfig {
    fn default() -> Self {
        Self {
            base: libime_core::Config::default(),
            bracketed: true,
            uppercase: true,
            katakana: true,
        }
    }
}

impl KanaConfig {
    /// Convert this kana config into the base config for the store
    pub fn into_base(self) -> libime_core::Config {
        self.base
    }

    pub fn base(&self) -> &libime_core::Config {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut libime_core::Config {
        &mut self.base
    }

    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("read config {}: {}", path.display(), e))?;
        Ok(toml::from_str(&content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
