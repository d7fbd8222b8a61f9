use libcompose_core::{CandidateId, Config, ControlKey, ConversionService, ServiceError};
use libcompose_core::ServiceResponse;
use libkana::{kana_engine, kana_engine_with_service, ImeEngine, KanaComposer, KanaConfig};
use libkana::{KeyEvent, KeyResult, TableConverter};

const KANJI: &str = r#"
[dictionary]
"きょう" = ["今日", "京"]
"は" = ["は", "葉"]
"てんき" = ["天気", "転機"]
"にほん" = ["日本", "二本"]

[predictions]
"今日" = ["は", "の"]
"#;

fn engine(live: bool) -> ImeEngine<KanaComposer> {
    let config = Config {
        live_conversion: live,
        ..Config::default()
    };
    let converter = TableConverter::from_toml_str(KANJI).unwrap();
    kana_engine_with_service(config, Box::new(converter))
}

fn type_keys(ime: &mut ImeEngine<KanaComposer>, keys: &str) -> String {
    let mut committed = String::new();
    for ch in keys.chars() {
        ime.process_key(KeyEvent::Char(ch));
        committed.push_str(&ime.context_mut().take_commit());
    }
    committed
}

#[test]
fn pending_letters_show_in_preedit() {
    let mut ime = engine(false);
    let committed = type_keys(&mut ime, "kyouh");
    assert!(committed.is_empty());
    assert_eq!(ime.context().preedit_text(), "きょうh");
}

#[test]
fn enter_without_converter_commits_kana() {
    let mut ime = kana_engine(KanaConfig::default()).unwrap();
    type_keys(&mut ime, "nihon");
    assert_eq!(ime.context().preedit_text(), "にほn");

    // Space has nothing to convert with
    assert_eq!(ime.process_key(KeyEvent::Space), KeyResult::NotHandled);
    assert_eq!(ime.context().commit_text, "にほん");
    assert!(!ime.is_composing());
}

#[test]
fn conversion_commits_and_offers_predictions() {
    let mut ime = engine(false);
    type_keys(&mut ime, "kyou");
    ime.process_key(KeyEvent::Space);
    assert!(ime.session().is_converting());
    assert_eq!(ime.context().preedit_text(), "今日");
    assert_eq!(ime.context().candidates, vec!["今日", "京", "きょう"]);

    ime.process_key(KeyEvent::Enter);
    assert_eq!(ime.context().commit_text, "今日");
    assert!(ime.session().is_showing_prediction());
    assert_eq!(ime.context().candidates, vec!["は", "の"]);

    ime.process_key(KeyEvent::Char('2'));
    assert_eq!(ime.context().commit_text, "の");
    assert!(ime.context().candidates.is_empty());
}

#[test]
fn selecting_first_clause_keeps_converting_the_rest() {
    let mut ime = engine(false);
    type_keys(&mut ime, "kyouhatenki");
    ime.process_key(KeyEvent::Space);
    assert_eq!(ime.context().preedit_text(), "今日は天気");

    ime.process_key(KeyEvent::Char('1'));
    assert_eq!(ime.context().commit_text, "今日");
    assert!(ime.session().is_converting());
    assert_eq!(ime.context().preedit_text(), "は天気");

    ime.process_key(KeyEvent::Enter);
    assert_eq!(ime.context().commit_text, "は天気");
    assert!(!ime.session().is_converting());
}

#[test]
fn live_conversion_shows_kanji_while_typing() {
    let mut ime = engine(true);
    type_keys(&mut ime, "kyo");
    assert_eq!(ime.context().preedit_text(), "きょ");
    type_keys(&mut ime, "u");
    assert_eq!(ime.context().preedit_text(), "今日");

    ime.process_key(KeyEvent::Enter);
    assert_eq!(ime.context().commit_text, "今日");
}

/// Accepts typed characters but never offers a live conversion.
struct QuietFeeds(TableConverter);

impl ConversionService for QuietFeeds {
    fn feed(&mut self, ch: char) -> Result<ServiceResponse, ServiceError> {
        self.0.feed(ch)?;
        Ok(ServiceResponse::consumed())
    }
    fn trigger_conversion(&mut self) -> Result<ServiceResponse, ServiceError> {
        self.0.trigger_conversion()
    }
    fn send_control_key(&mut self, key: ControlKey) -> Result<ServiceResponse, ServiceError> {
        self.0.send_control_key(key)
    }
    fn select_candidate(&mut self, id: &CandidateId) -> Result<ServiceResponse, ServiceError> {
        self.0.select_candidate(id)
    }
    fn submit(&mut self) -> Result<Option<String>, ServiceError> {
        self.0.submit()
    }
    fn cancel(&mut self) -> Result<(), ServiceError> {
        self.0.cancel()
    }
    fn request_prediction(
        &mut self,
        preceding: &str,
    ) -> Result<Option<ServiceResponse>, ServiceError> {
        self.0.request_prediction(preceding)
    }
    fn reconnect(&mut self) -> Result<(), ServiceError> {
        self.0.reconnect()
    }
}

#[test]
fn live_conversion_without_result_commits_resolved_kana() {
    let config = Config {
        live_conversion: true,
        ..Config::default()
    };
    let converter = TableConverter::from_toml_str(KANJI).unwrap();
    let mut ime = kana_engine_with_service(config, Box::new(QuietFeeds(converter)));

    type_keys(&mut ime, "hon");
    assert!(ime.session().is_peek_active());
    assert_eq!(ime.context().preedit_text(), "ほn");

    // the trailing n still becomes ん
    ime.process_key(KeyEvent::Enter);
    assert_eq!(ime.context().commit_text, "ほん");
    assert!(!ime.is_composing());
}

#[test]
fn live_conversion_is_adopted_by_space() {
    let mut ime = engine(true);
    type_keys(&mut ime, "nihon");
    // trailing n resolves for the converter only
    assert_eq!(ime.context().preedit_text(), "日本");

    ime.process_key(KeyEvent::Space);
    assert!(ime.session().is_converting());
    assert_eq!(ime.context().candidates, vec!["日本", "二本", "にほん"]);

    ime.process_key(KeyEvent::Down);
    assert_eq!(ime.context().preedit_text(), "二本");
    ime.process_key(KeyEvent::Enter);
    assert_eq!(ime.context().commit_text, "二本");
}

#[test]
fn escape_restores_kana_for_more_typing() {
    let mut ime = engine(false);
    type_keys(&mut ime, "kyou");
    ime.process_key(KeyEvent::Space);
    ime.process_key(KeyEvent::Escape);
    assert!(!ime.session().is_converting());
    assert_eq!(ime.context().preedit_text(), "きょう");

    type_keys(&mut ime, "ha");
    assert_eq!(ime.context().preedit_text(), "きょうは");
}

#[test]
fn typing_during_conversion_commits_it_first() {
    let mut ime = engine(false);
    type_keys(&mut ime, "kyou");
    ime.process_key(KeyEvent::Space);

    let committed = type_keys(&mut ime, "h");
    assert_eq!(committed, "今日");
    assert!(!ime.session().is_converting());
    assert_eq!(ime.context().preedit_text(), "h");
}

#[test]
fn backspace_walks_back_through_letters_and_kana() {
    let mut ime = engine(false);
    type_keys(&mut ime, "kak");
    ime.process_key(KeyEvent::Backspace);
    assert_eq!(ime.context().preedit_text(), "か");
    ime.process_key(KeyEvent::Backspace);
    assert_eq!(ime.context().preedit_text(), "");
    assert_eq!(ime.process_key(KeyEvent::Backspace), KeyResult::NotHandled);
}

#[test]
fn focus_loss_flushes_pending_nasal() {
    let mut ime = engine(false);
    type_keys(&mut ime, "hon");
    ime.focus_lost();
    assert_eq!(ime.context().commit_text, "ほん");
    assert!(!ime.is_composing());
}
