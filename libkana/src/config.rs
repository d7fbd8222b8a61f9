//! Kana-specific configuration that extends the base `Config` from core.
//!
//! This configuration includes:
//! - All generic options from `libcompose_core::Config` (flattened via serde)
//! - Where conversion comes from: a remote converter endpoint or a local
//!   TOML dictionary
//!
//! # Example
//!
//! ```rust
//! use libkana::KanaConfig;
//!
//! let config = KanaConfig::from_toml_str(
//!     "live_conversion = true\nendpoint = \"http://127.0.0.1:8765\"\n",
//! ).unwrap();
//! assert!(config.base().live_conversion);
//! assert_eq!(config.endpoint.as_deref(), Some("http://127.0.0.1:8765"));
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct KanaConfig {
    /// Base configuration fields (conversion, prediction, candidates, etc.)
    #[serde(flatten)]
    pub base: libcompose_core::Config,

    /// Base URL of a remote kana-kanji converter. Takes precedence over
    /// `dictionary`.
    pub endpoint: Option<String>,

    /// TOML dictionary (`[dictionary]` of kana reading → surfaces, optional
    /// `[predictions]`) for in-process conversion.
    pub dictionary: Option<PathBuf>,
}

impl KanaConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&content)?)
    }

    /// Convert this kana config into the base config.
    pub fn into_base(self) -> libcompose_core::Config {
        self.base
    }

    pub fn base(&self) -> &libcompose_core::Config {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut libcompose_core::Config {
        &mut self.base
    }
}
