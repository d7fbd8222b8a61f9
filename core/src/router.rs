//! Script routing.
//!
//! `ScriptRouter` owns one engine per script and sends keys to the active
//! one. `Latin` has no engine: its keys go straight to the application.
//! Switching scripts force-commits the outgoing engine before anything is
//! routed to the new one, so no two scripts ever compose at once.

use crate::context::ImeContext;
use crate::ime_engine::{KeyEvent, KeyResult, ScriptEngine};
use crate::modifier::{ModifierEvent, ModifierTapDisambiguator, ShortcutAction};
use std::time::Instant;
use tracing::debug;

/// Logical script selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Latin,
    Hangul,
    Kana,
}

pub struct ScriptRouter {
    engines: Vec<(Script, Box<dyn ScriptEngine>)>,
    active: Script,
    shortcuts: ModifierTapDisambiguator,
    /// Text committed by an outgoing engine, not yet taken by the host
    pending_commit: String,
}

impl ScriptRouter {
    /// Start in `Latin` with the given shortcut bindings.
    pub fn new(shortcuts: ModifierTapDisambiguator) -> Self {
        Self {
            engines: Vec::new(),
            active: Script::Latin,
            shortcuts,
            pending_commit: String::new(),
        }
    }

    /// Register the engine for `script`, replacing any previous one.
    pub fn register(&mut self, script: Script, engine: Box<dyn ScriptEngine>) {
        if script == Script::Latin {
            return;
        }
        match self.engines.iter_mut().find(|(s, _)| *s == script) {
            Some(slot) => slot.1 = engine,
            None => self.engines.push((script, engine)),
        }
    }

    pub fn active(&self) -> Script {
        self.active
    }

    pub fn shortcuts_mut(&mut self) -> &mut ModifierTapDisambiguator {
        &mut self.shortcuts
    }

    fn engine_mut(&mut self, script: Script) -> Option<&mut Box<dyn ScriptEngine>> {
        self.engines
            .iter_mut()
            .find(|(s, _)| *s == script)
            .map(|(_, e)| e)
    }

    fn engine(&self, script: Script) -> Option<&dyn ScriptEngine> {
        self.engines
            .iter()
            .find(|(s, _)| *s == script)
            .map(|(_, e)| e.as_ref())
    }

    /// Make `script` active. The outgoing engine commits first. Switching to
    /// a script without an engine is ignored.
    pub fn switch_to(&mut self, script: Script) {
        if script == self.active {
            return;
        }
        if script != Script::Latin && self.engine(script).is_none() {
            debug!(?script, "no engine registered");
            return;
        }
        let outgoing = self.active;
        let committed = match self.engine_mut(outgoing) {
            Some(engine) => {
                engine.focus_lost();
                engine.context_mut().take_commit()
            }
            None => String::new(),
        };
        self.pending_commit.push_str(&committed);
        debug!(from = ?outgoing, to = ?script, "script switch");
        self.active = script;
    }

    /// Cycle Latin, then each registered script in registration order.
    pub fn toggle(&mut self) {
        let mut order = vec![Script::Latin];
        order.extend(self.engines.iter().map(|(s, _)| *s));
        let position = order.iter().position(|s| *s == self.active).unwrap_or(0);
        let next = order[(position + 1) % order.len()];
        self.switch_to(next);
    }

    fn apply(&mut self, action: ShortcutAction) {
        match action {
            ShortcutAction::ToggleScript => self.toggle(),
            ShortcutAction::SelectScript(script) => self.switch_to(script),
            ShortcutAction::ToggleFullWidth => {
                let active = self.active;
                if let Some(engine) = self.engine_mut(active) {
                    engine.toggle_fullwidth();
                }
            }
        }
    }

    fn apply_dispatched(&mut self) {
        for action in self.shortcuts.take_dispatched() {
            self.apply(action);
        }
    }

    /// Feed a modifier edge. Returns true when it fired a shortcut.
    pub fn handle_modifier(&mut self, event: ModifierEvent) -> bool {
        let consumed = self.shortcuts.handle(event);
        self.apply_dispatched();
        consumed
    }

    /// Route an ordinary key: shortcut bindings first, then the active
    /// engine.
    pub fn handle_key(&mut self, key: KeyEvent, at: Instant) -> KeyResult {
        if self.shortcuts.handle(ModifierEvent::KeyDown { key, at }) {
            self.apply_dispatched();
            return KeyResult::Handled;
        }
        self.process_key(key)
    }

    /// Send a key to the active engine without shortcut matching.
    pub fn process_key(&mut self, key: KeyEvent) -> KeyResult {
        let active = self.active;
        match self.engine_mut(active) {
            Some(engine) => engine.process_key(key),
            None => KeyResult::NotHandled,
        }
    }

    pub fn is_composing(&self) -> bool {
        self.engine(self.active)
            .map(|e| e.is_composing())
            .unwrap_or(false)
    }

    /// Commit everything in the active engine and forget held modifiers.
    pub fn focus_lost(&mut self) {
        self.shortcuts.reset();
        let active = self.active;
        if let Some(engine) = self.engine_mut(active) {
            engine.focus_lost();
        }
    }

    /// Everything committed since the last call, from switches and from the
    /// active engine.
    pub fn take_commit(&mut self) -> String {
        let mut text = std::mem::take(&mut self.pending_commit);
        let active = self.active;
        if let Some(engine) = self.engine_mut(active) {
            text.push_str(&engine.context_mut().take_commit());
        }
        text
    }

    /// Display state of the active engine, if any.
    pub fn context(&self) -> Option<&ImeContext> {
        self.engine(self.active).map(|e| e.context())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{ComposeResult, Composer};
    use crate::ime_engine::ImeEngine;
    use crate::modifier::ModifierKey;
    use crate::Config;
    use std::time::Duration;

    #[derive(Default)]
    struct Echo(String);

    impl Composer for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn accepts(&self, ch: char) -> bool {
            ch.is_ascii_lowercase()
        }
        fn input(&mut self, ch: char) -> ComposeResult {
            self.0.push(ch);
            ComposeResult::composing(self.0.clone())
        }
        fn delete_backward(&mut self) -> Option<ComposeResult> {
            self.0.pop().map(|_| ComposeResult::composing(self.0.clone()))
        }
        fn flush(&mut self) -> String {
            std::mem::take(&mut self.0)
        }
        fn composing_text(&self) -> String {
            self.0.clone()
        }
        fn is_composing(&self) -> bool {
            !self.0.is_empty()
        }
        fn clear(&mut self) {
            self.0.clear();
        }
        fn restore(&mut self, text: &str) {
            self.0 = text.to_string();
        }
    }

    fn router() -> ScriptRouter {
        let mut shortcuts = ModifierTapDisambiguator::new(Duration::from_millis(300));
        shortcuts.bind_tap(ModifierKey::RightCommand, ShortcutAction::ToggleScript);
        let mut router = ScriptRouter::new(shortcuts);
        router.register(
            Script::Hangul,
            Box::new(ImeEngine::new(Echo::default(), Config::default())),
        );
        router.register(
            Script::Kana,
            Box::new(ImeEngine::new(Echo::default(), Config::default())),
        );
        router
    }

    #[test]
    fn test_latin_passes_through() {
        let mut router = router();
        assert_eq!(router.active(), Script::Latin);
        assert_eq!(
            router.handle_key(KeyEvent::Char('a'), Instant::now()),
            KeyResult::NotHandled
        );
        assert!(router.context().is_none());
    }

    #[test]
    fn test_switch_commits_outgoing_composition() {
        let mut router = router();
        router.switch_to(Script::Hangul);
        router.process_key(KeyEvent::Char('a'));
        router.process_key(KeyEvent::Char('b'));
        assert!(router.is_composing());

        router.switch_to(Script::Kana);
        assert!(!router.is_composing());
        assert_eq!(router.take_commit(), "ab");
        assert_eq!(router.take_commit(), "");

        // the outgoing engine holds nothing
        router.switch_to(Script::Hangul);
        assert!(!router.is_composing());
        assert_eq!(router.take_commit(), "");
    }

    #[test]
    fn test_tap_cycles_scripts() {
        let mut router = router();
        let t0 = Instant::now();
        for expected in [Script::Hangul, Script::Kana, Script::Latin] {
            router.handle_modifier(ModifierEvent::Down {
                key: ModifierKey::RightCommand,
                at: t0,
            });
            assert!(router.handle_modifier(ModifierEvent::Up {
                key: ModifierKey::RightCommand,
                at: t0 + Duration::from_millis(50),
            }));
            assert_eq!(router.active(), expected);
        }
    }

    #[test]
    fn test_combo_does_not_switch() {
        let mut router = router();
        router.switch_to(Script::Hangul);
        let t0 = Instant::now();
        router.handle_modifier(ModifierEvent::Down {
            key: ModifierKey::RightCommand,
            at: t0,
        });
        router.handle_key(KeyEvent::Char('c'), t0);
        router.handle_modifier(ModifierEvent::Up {
            key: ModifierKey::RightCommand,
            at: t0 + Duration::from_millis(50),
        });
        assert_eq!(router.active(), Script::Hangul);
    }

    #[test]
    fn test_key_shortcut_is_consumed() {
        let mut router = router();
        router.shortcuts_mut().bind_key(
            None,
            KeyEvent::Convert,
            ShortcutAction::SelectScript(Script::Kana),
        );
        assert_eq!(
            router.handle_key(KeyEvent::Convert, Instant::now()),
            KeyResult::Handled
        );
        assert_eq!(router.active(), Script::Kana);
    }

    #[test]
    fn test_unregistered_script_is_ignored() {
        let mut router = ScriptRouter::new(ModifierTapDisambiguator::new(Duration::from_millis(300)));
        router.switch_to(Script::Kana);
        assert_eq!(router.active(), Script::Latin);
        router.toggle();
        assert_eq!(router.active(), Script::Latin);
    }
}
