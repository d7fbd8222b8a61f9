//! libcompose-core
//!
//! Script-independent composition machinery shared by the per-script crates
//! (libhangul, libkana).
//!
//! A script crate supplies a [`Composer`] (a pure keystroke → pre-edit state
//! machine). This crate wraps it in an [`ImeEngine`] that decides when the
//! accumulated text goes to an external [`ConversionService`], renders the
//! service's segmented answer as pre-edit, pages candidates and makes sure
//! typed text survives service failures, focus loss and script switches.
//!
//! Public API:
//! - `Config` - Engine configuration (TOML)
//! - `Composer` - Trait implemented by script composers
//! - `ConversionService` - Contract of the external converter
//! - `ImeEngine` - Per-script orchestrator
//! - `ScriptRouter` - Owns one engine per script and switches between them
//! - `ModifierTapDisambiguator` - Hold-vs-tap classification for shortcuts
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod candidate;
pub use candidate::{Candidate, CandidateId, CandidateLayout, CandidateList};

pub mod composition;
pub use composition::{Composition, Segment};

pub mod context;
pub use context::{CandidateSurface, ImeContext, Rect, TextClient};

pub mod composer;
pub use composer::{ComposeResult, Composer};

pub mod service;
pub use service::{
    feed_str, with_resync, ControlKey, ConversionService, PendingConversion, ResponseShape,
    ResyncStep, ServiceError, ServiceResponse,
};

pub mod table_converter;
pub use table_converter::TableConverter;

pub mod session;
pub use session::{ConversionSession, ImeSession, OrchestrationState, ServiceOwner};

pub mod editor;
pub use editor::{Backend, ComposingEditor, ConversionEditor, Editor, EditorResult, SuggestionEditor};

pub mod ime_engine;
pub use ime_engine::{ImeEngine, KeyEvent, KeyResult, ScriptEngine};

pub mod keycode;

pub mod modifier;
pub use modifier::{
    ModifierEvent, ModifierKey, ModifierKind, ModifierTapDisambiguator, ShortcutAction,
};

pub mod router;
pub use router::{Script, ScriptRouter};

/// Generic configuration for the composition engine.
///
/// This config contains only script-agnostic fields. Script-specific options
/// (keyboard layout, converter endpoint) belong in `HangulConfig` or
/// `KanaConfig` in their respective crates, which flatten this struct.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    // Conversion
    /// Re-submit the composed text to the converter after every keystroke and
    /// show the converted text as pre-edit.
    pub live_conversion: bool,
    /// Timeout applied by service implementations to every request (ms).
    pub service_timeout_ms: u64,

    // Prediction Settings
    /// Request predictive candidates after a commit.
    pub auto_prediction: bool,
    /// Number of trailing committed characters sent as prediction context.
    pub prediction_context_chars: usize,
    /// Minimum committed text length to trigger a prediction (chars).
    pub min_prediction_trigger_length: usize,

    // Candidate Window
    /// Candidates per page.
    pub page_size: usize,
    /// Keys for selecting candidates (default: "123456789", alternative: "asdfghjkl").
    /// First char selects the 1st candidate on the page, etc.
    pub select_keys: String,
    /// Preferred candidate panel layout.
    pub candidate_layout: CandidateLayout,

    // Shortcuts
    /// A modifier released within this many milliseconds without any other key
    /// counts as a tap.
    pub tap_threshold_ms: u64,

    // Full/Half Width Settings
    /// Convert passed-through ASCII to full-width forms.
    pub full_width_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            live_conversion: false,
            service_timeout_ms: 500,
            auto_prediction: true,
            prediction_context_chars: 10,
            min_prediction_trigger_length: 1,
            page_size: 9,
            select_keys: "123456789".to_string(),
            candidate_layout: CandidateLayout::Vertical,
            tap_threshold_ms: 300,
            full_width_enabled: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Service request timeout as a `Duration`.
    pub fn service_timeout(&self) -> Duration {
        Duration::from_millis(self.service_timeout_ms)
    }

    /// Modifier tap threshold as a `Duration`.
    pub fn tap_threshold(&self) -> Duration {
        Duration::from_millis(self.tap_threshold_ms)
    }

    // ========== Full/Half Width Management ==========

    /// Toggle full-width mode on/off.
    pub fn toggle_fullwidth(&mut self) {
        self.full_width_enabled = !self.full_width_enabled;
    }

    /// Check if full-width mode is enabled.
    pub fn is_fullwidth(&self) -> bool {
        self.full_width_enabled
    }

    // ========== Selection Keys Management ==========

    /// Set the selection keys string. Empty strings are ignored.
    ///
    /// # Example
    /// ```
    /// # use libcompose_core::Config;
    /// let mut config = Config::default();
    /// config.set_select_keys("asdfghjkl"); // Use home row keys
    /// assert_eq!(config.selection_key_index('d'), Some(2));
    /// ```
    pub fn set_select_keys(&mut self, keys: &str) {
        if !keys.is_empty() {
            self.select_keys = keys.to_string();
        }
    }

    /// Get the current selection keys.
    pub fn select_keys(&self) -> &str {
        &self.select_keys
    }

    /// Check if a character is a selection key and return its index (0-based).
    pub fn selection_key_index(&self, ch: char) -> Option<usize> {
        self.select_keys.chars().position(|c| c == ch)
    }
}

/// Utility helpers.
pub mod utils {
    use unicode_normalization::UnicodeNormalization;

    /// NFC-normalize text before it is handed to the host.
    pub fn nfc(s: &str) -> String {
        s.nfc().collect()
    }

    /// Convert ASCII characters to full-width equivalents.
    ///
    /// ASCII space becomes the ideographic space and the printable range
    /// 0x21-0x7E maps onto 0xFF01-0xFF5E. Non-ASCII characters pass through.
    pub fn to_fullwidth(s: &str) -> String {
        s.chars()
            .map(|ch| match ch {
                ' ' => '\u{3000}',
                '!'..='~' => char::from_u32(ch as u32 - 0x21 + 0xFF01).unwrap_or(ch),
                _ => ch,
            })
            .collect()
    }

    /// Keep at most the last `max_chars` characters of `s`.
    pub fn tail_chars(s: &str, max_chars: usize) -> &str {
        let count = s.chars().count();
        if count <= max_chars {
            return s;
        }
        let skip = count - max_chars;
        match s.char_indices().nth(skip) {
            Some((idx, _)) => &s[idx..],
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = config.to_toml_string().unwrap();
        let parsed = Config::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str("live_conversion = true\npage_size = 5\n").unwrap();
        assert!(config.live_conversion);
        assert_eq!(config.page_size, 5);
        assert_eq!(config.select_keys, "123456789");
        assert_eq!(config.service_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_select_keys() {
        let mut config = Config::default();
        assert_eq!(config.selection_key_index('1'), Some(0));
        assert_eq!(config.selection_key_index('a'), None);

        config.set_select_keys("");
        assert_eq!(config.select_keys(), "123456789");

        config.set_select_keys("asdf");
        assert_eq!(config.selection_key_index('f'), Some(3));
        assert_eq!(config.selection_key_index('1'), None);
    }

    #[test]
    fn test_save_and_load_toml() {
        let path = std::env::temp_dir().join(format!(
            "libcompose_config_{}.toml",
            std::process::id()
        ));
        let mut config = Config::default();
        config.toggle_fullwidth();
        config.tap_threshold_ms = 180;
        config.save_toml(&path).unwrap();

        let loaded = Config::load_toml(&path).unwrap();
        assert!(loaded.is_fullwidth());
        assert_eq!(loaded.tap_threshold(), Duration::from_millis(180));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_fullwidth() {
        assert_eq!(utils::to_fullwidth("a1 !"), "ａ１\u{3000}！");
        assert_eq!(utils::to_fullwidth("한"), "한");
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(utils::tail_chars("こんにちは", 2), "ちは");
        assert_eq!(utils::tail_chars("abc", 10), "abc");
        assert_eq!(utils::tail_chars("abc", 0), "");
    }

    #[test]
    fn test_nfc_composes_conjoining_jamo() {
        assert_eq!(utils::nfc("\u{1100}\u{1161}"), "가");
    }
}
