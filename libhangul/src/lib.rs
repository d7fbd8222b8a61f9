//! libhangul crate root
//!
//! Hangul composition on top of `libcompose-core`: jamo tables, the
//! syllable automaton, the dubeolsik layout and a `Composer` that plugs the
//! automaton into the core `ImeEngine`.
//!
//! Public API exported here:
//! - `SyllableAutomaton`, `PhoneticComponent` from `automaton`
//! - `HangulComposer` from `composer`
//! - `HangulConfig` from `config`
//! - `hangul_engine` / `hangul_engine_with_service` factories

pub mod automaton;
pub mod composer;
pub mod config;
pub mod jamo;
pub mod layout;

// Re-export IME components from core.
pub use libcompose_core::{
    Candidate, CandidateList, Composition, ConversionService, ImeContext, ImeEngine, KeyEvent,
    KeyResult, Segment, TableConverter,
};

pub use automaton::{AutomatonResult, AutomatonState, PhoneticComponent, SyllableAutomaton, SyllableState};
pub use composer::HangulComposer;
pub use config::HangulConfig;

use tracing::debug;

/// Build a Hangul engine. A configured conversion dictionary is loaded into
/// an in-process `TableConverter`.
pub fn hangul_engine(
    config: HangulConfig,
) -> Result<ImeEngine<HangulComposer>, Box<dyn std::error::Error>> {
    let dictionary = config.conversion_dictionary.clone();
    let engine = ImeEngine::new(HangulComposer::new(), config.into_base());
    let Some(path) = dictionary else {
        return Ok(engine);
    };
    let content = std::fs::read_to_string(&path)?;
    let converter = TableConverter::from_toml_str(&content)?;
    debug!(path = %path.display(), "loaded hangul conversion dictionary");
    Ok(engine.with_service(Box::new(converter)))
}

/// Build a Hangul engine around an existing conversion service.
pub fn hangul_engine_with_service(
    config: libcompose_core::Config,
    service: Box<dyn ConversionService>,
) -> ImeEngine<HangulComposer> {
    ImeEngine::new(HangulComposer::new(), config).with_service(service)
}
