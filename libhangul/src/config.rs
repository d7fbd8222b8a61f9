//! Hangul-specific configuration that extends the base `Config` from core.
//!
//! This configuration includes:
//! - All generic options from `libcompose_core::Config` (flattened via serde)
//! - An optional reading → hanja dictionary for conversion
//!
//! # Example
//!
//! ```rust
//! use libhangul::HangulConfig;
//!
//! let config = HangulConfig::from_toml_str("page_size = 5\n").unwrap();
//! assert_eq!(config.base().page_size, 5);
//! assert!(config.conversion_dictionary.is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HangulConfig {
    /// Base configuration fields (conversion, prediction, candidates, etc.)
    #[serde(flatten)]
    pub base: libcompose_core::Config,

    /// TOML dictionary (`[dictionary]` table of hangul reading → hanja) used
    /// for conversion. Without one, Space passes through.
    pub conversion_dictionary: Option<PathBuf>,
}

impl HangulConfig {
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

    /// Convert this hangul config into the base config.
    pub fn into_base(self) -> libcompose_core::Config {
        self.base
    }

    /// Get a reference to the base config
    pub fn base(&self) -> &libcompose_core::Config {
        &self.base
    }

    /// Get a mutable reference to the base config
    pub fn base_mut(&mut self) -> &mut libcompose_core::Config {
        &mut self.base
    }
}
