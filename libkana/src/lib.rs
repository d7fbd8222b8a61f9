//! libkana crate root
//!
//! Romaji → kana input on top of `libcompose-core`: the romaji table, the
//! transliteration buffer, a `Composer` for the core `ImeEngine` and an HTTP
//! client for an external kana-kanji converter.
//!
//! Public API exported here:
//! - `TransliterationComposer`, `KanaComposer` from `composer`
//! - `KanaConfig` from `config`
//! - `RemoteConverter` from `remote`
//! - `kana_engine` / `kana_engine_with_service` factories

pub mod composer;
pub mod config;
pub mod remote;
pub mod romaji;

// Re-export IME components from core.
pub use libcompose_core::{
    Candidate, CandidateList, Composition, ConversionService, ImeContext, ImeEngine, KeyEvent,
    KeyResult, Segment, TableConverter,
};

pub use composer::{KanaComposer, TransliterationComposer, TransliterationResult};
pub use config::KanaConfig;
pub use remote::RemoteConverter;

use tracing::debug;

/// Build a kana engine. A configured endpoint wins over a local dictionary;
/// with neither, Space passes through and Enter commits kana.
pub fn kana_engine(config: KanaConfig) -> Result<ImeEngine<KanaComposer>, Box<dyn std::error::Error>> {
    let endpoint = config.endpoint.clone();
    let dictionary = config.dictionary.clone();
    let base = config.into_base();

    if let Some(endpoint) = endpoint {
        let remote = RemoteConverter::new(endpoint, base.service_timeout())?;
        debug!(endpoint = remote.endpoint(), "using remote kana converter");
        return Ok(kana_engine_with_service(base, Box::new(remote)));
    }

    let engine = ImeEngine::new(KanaComposer::new(), base);
    let Some(path) = dictionary else {
        return Ok(engine);
    };
    let content = std::fs::read_to_string(&path)?;
    let converter = TableConverter::from_toml_str(&content)?;
    debug!(path = %path.display(), "loaded kana conversion dictionary");
    Ok(engine.with_service(Box::new(converter)))
}

/// Build a kana engine around an existing conversion service.
pub fn kana_engine_with_service(
    config: libcompose_core::Config,
    service: Box<dyn ConversionService>,
) -> ImeEngine<KanaComposer> {
    ImeEngine::new(KanaComposer::new(), config).with_service(service)
}
