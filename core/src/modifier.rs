//! Hold-vs-tap classification for modifier shortcuts.
//!
//! A modifier pressed and released on its own within the tap threshold is a
//! *tap* and fires its bound action (e.g. right Command switches script). If
//! anything else is pressed while it is held, the press was used for a combo
//! and never fires. Left and right keys are tracked separately.
//!
//! Plain-key shortcuts and modifier+key shortcuts fire on key-down without
//! any timing. Fired actions are collected and handed to the caller through
//! [`ModifierTapDisambiguator::take_dispatched`].

use crate::ime_engine::KeyEvent;
use crate::router::Script;
use crate::Config;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Physical modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKey {
    LeftShift,
    RightShift,
    LeftControl,
    RightControl,
    LeftOption,
    RightOption,
    LeftCommand,
    RightCommand,
}

/// Logical modifier, either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKind {
    Shift,
    Control,
    Option,
    Command,
}

impl ModifierKey {
    pub fn kind(self) -> ModifierKind {
        match self {
            Self::LeftShift | Self::RightShift => ModifierKind::Shift,
            Self::LeftControl | Self::RightControl => ModifierKind::Control,
            Self::LeftOption | Self::RightOption => ModifierKind::Option,
            Self::LeftCommand | Self::RightCommand => ModifierKind::Command,
        }
    }

    /// Parse a binding name such as `"RightCommand"` or `"lshift"`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "leftshift" | "lshift" => Some(Self::LeftShift),
            "rightshift" | "rshift" => Some(Self::RightShift),
            "leftcontrol" | "lctrl" => Some(Self::LeftControl),
            "rightcontrol" | "rctrl" => Some(Self::RightControl),
            "leftoption" | "lalt" | "loption" => Some(Self::LeftOption),
            "rightoption" | "ralt" | "roption" => Some(Self::RightOption),
            "leftcommand" | "lcmd" => Some(Self::LeftCommand),
            "rightcommand" | "rcmd" => Some(Self::RightCommand),
            _ => None,
        }
    }
}

/// Input to the disambiguator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierEvent {
    Down { key: ModifierKey, at: Instant },
    Up { key: ModifierKey, at: Instant },
    /// Any non-modifier key
    KeyDown { key: KeyEvent, at: Instant },
}

/// Action bound to a tap or a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// Cycle to the next script
    ToggleScript,
    SelectScript(Script),
    ToggleFullWidth,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    since: Instant,
    combo: bool,
}

#[derive(Debug, Clone, Copy)]
struct KeyBinding {
    modifier: Option<ModifierKind>,
    key: KeyEvent,
    action: ShortcutAction,
}

#[derive(Debug, Clone)]
pub struct ModifierTapDisambiguator {
    threshold: Duration,
    taps: HashMap<ModifierKey, ShortcutAction>,
    keys: Vec<KeyBinding>,
    pressed: HashMap<ModifierKey, Press>,
    dispatched: Vec<ShortcutAction>,
}

impl ModifierTapDisambiguator {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            taps: HashMap::new(),
            keys: Vec::new(),
            pressed: HashMap::new(),
            dispatched: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tap_threshold())
    }

    /// Fire `action` when `key` is tapped alone.
    pub fn bind_tap(&mut self, key: ModifierKey, action: ShortcutAction) {
        self.taps.insert(key, action);
    }

    /// Fire `action` when `key` goes down, with `modifier` held (or with no
    /// modifier held when `None`).
    pub fn bind_key(&mut self, modifier: Option<ModifierKind>, key: KeyEvent, action: ShortcutAction) {
        self.keys.push(KeyBinding {
            modifier,
            key,
            action,
        });
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    fn is_held(&self, kind: ModifierKind) -> bool {
        self.pressed.keys().any(|k| k.kind() == kind)
    }

    fn mark_combo(&mut self) {
        for press in self.pressed.values_mut() {
            press.combo = true;
        }
    }

    /// Feed one event. Returns true when the event fired a shortcut and
    /// should not reach the engine.
    pub fn handle(&mut self, event: ModifierEvent) -> bool {
        match event {
            ModifierEvent::Down { key, at } => {
                // a chord of modifiers is never a tap
                let chord = !self.pressed.is_empty();
                self.mark_combo();
                self.pressed.insert(
                    key,
                    Press {
                        since: at,
                        combo: chord,
                    },
                );
                false
            }
            ModifierEvent::KeyDown { key, .. } => {
                self.mark_combo();
                let held_any = !self.pressed.is_empty();
                let binding = self.keys.iter().find(|b| {
                    b.key == key
                        && match b.modifier {
                            Some(kind) => self.is_held(kind),
                            None => !held_any,
                        }
                });
                match binding {
                    Some(binding) => {
                        debug!(?key, action = ?binding.action, "key shortcut");
                        self.dispatched.push(binding.action);
                        true
                    }
                    None => false,
                }
            }
            ModifierEvent::Up { key, at } => {
                let Some(press) = self.pressed.remove(&key) else {
                    return false;
                };
                let held = at.saturating_duration_since(press.since);
                if press.combo || held >= self.threshold {
                    return false;
                }
                match self.taps.get(&key) {
                    Some(&action) => {
                        debug!(?key, ?held, ?action, "modifier tap");
                        self.dispatched.push(action);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Forget held modifiers (focus change, lost key-up).
    pub fn reset(&mut self) {
        self.pressed.clear();
    }

    /// Actions fired since the last call.
    pub fn take_dispatched(&mut self) -> Vec<ShortcutAction> {
        std::mem::take(&mut self.dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disambiguator() -> ModifierTapDisambiguator {
        let mut d = ModifierTapDisambiguator::from_config(&Config::default());
        d.bind_tap(ModifierKey::RightCommand, ShortcutAction::ToggleScript);
        d.bind_tap(
            ModifierKey::LeftCommand,
            ShortcutAction::SelectScript(Script::Latin),
        );
        d
    }

    #[test]
    fn test_threshold_from_config() {
        let config = Config {
            tap_threshold_ms: 120,
            ..Config::default()
        };
        let mut d = ModifierTapDisambiguator::from_config(&config);
        assert_eq!(d.threshold(), Duration::from_millis(120));
        d.bind_tap(ModifierKey::RightCommand, ShortcutAction::ToggleScript);

        let t0 = Instant::now();
        d.handle(ModifierEvent::Down {
            key: ModifierKey::RightCommand,
            at: t0,
        });
        // a hold within the default threshold is too long here
        assert!(!d.handle(ModifierEvent::Up {
            key: ModifierKey::RightCommand,
            at: t0 + Duration::from_millis(200),
        }));
        assert!(d.take_dispatched().is_empty());
    }

    #[test]
    fn test_solo_tap_dispatches_once() {
        let mut d = disambiguator();
        let t0 = Instant::now();
        assert!(!d.handle(ModifierEvent::Down {
            key: ModifierKey::RightCommand,
            at: t0
        }));
        assert!(d.handle(ModifierEvent::Up {
            key: ModifierKey::RightCommand,
            at: t0 + Duration::from_millis(120)
        }));
        assert_eq!(d.take_dispatched(), vec![ShortcutAction::ToggleScript]);
        assert!(d.take_dispatched().is_empty());
    }

    #[test]
    fn test_combo_never_taps() {
        let mut d = disambiguator();
        let t0 = Instant::now();
        d.handle(ModifierEvent::Down {
            key: ModifierKey::RightCommand,
            at: t0,
        });
        assert!(!d.handle(ModifierEvent::KeyDown {
            key: KeyEvent::Char('c'),
            at: t0 + Duration::from_millis(10)
        }));
        assert!(!d.handle(ModifierEvent::Up {
            key: ModifierKey::RightCommand,
            at: t0 + Duration::from_millis(20)
        }));
        assert!(d.take_dispatched().is_empty());
    }

    #[test]
    fn test_long_hold_is_not_a_tap() {
        let mut d = disambiguator();
        let t0 = Instant::now();
        d.handle(ModifierEvent::Down {
            key: ModifierKey::RightCommand,
            at: t0,
        });
        assert!(!d.handle(ModifierEvent::Up {
            key: ModifierKey::RightCommand,
            at: t0 + Duration::from_millis(300)
        }));
        assert!(d.take_dispatched().is_empty());
    }

    #[test]
    fn test_left_and_right_are_independent() {
        let mut d = disambiguator();
        let t0 = Instant::now();
        // right pressed while left is held: both become combos
        d.handle(ModifierEvent::Down {
            key: ModifierKey::LeftCommand,
            at: t0,
        });
        d.handle(ModifierEvent::Down {
            key: ModifierKey::RightCommand,
            at: t0,
        });
        d.handle(ModifierEvent::Up {
            key: ModifierKey::RightCommand,
            at: t0 + Duration::from_millis(50),
        });
        d.handle(ModifierEvent::Up {
            key: ModifierKey::LeftCommand,
            at: t0 + Duration::from_millis(60),
        });
        assert!(d.take_dispatched().is_empty());

        // left tap alone
        let t1 = t0 + Duration::from_secs(1);
        d.handle(ModifierEvent::Down {
            key: ModifierKey::LeftCommand,
            at: t1,
        });
        d.handle(ModifierEvent::Up {
            key: ModifierKey::LeftCommand,
            at: t1 + Duration::from_millis(50),
        });
        assert_eq!(
            d.take_dispatched(),
            vec![ShortcutAction::SelectScript(Script::Latin)]
        );
    }

    #[test]
    fn test_key_shortcuts_fire_on_key_down() {
        let mut d = disambiguator();
        d.bind_key(Some(ModifierKind::Control), KeyEvent::Space, ShortcutAction::ToggleScript);
        d.bind_key(None, KeyEvent::Char('¥'), ShortcutAction::ToggleFullWidth);
        let t0 = Instant::now();

        assert!(d.handle(ModifierEvent::KeyDown {
            key: KeyEvent::Char('¥'),
            at: t0
        }));
        assert!(!d.handle(ModifierEvent::KeyDown {
            key: KeyEvent::Space,
            at: t0
        }));

        d.handle(ModifierEvent::Down {
            key: ModifierKey::RightControl,
            at: t0,
        });
        assert!(d.handle(ModifierEvent::KeyDown {
            key: KeyEvent::Space,
            at: t0
        }));
        // plain binding does not fire with a modifier held
        assert!(!d.handle(ModifierEvent::KeyDown {
            key: KeyEvent::Char('¥'),
            at: t0
        }));

        assert_eq!(
            d.take_dispatched(),
            vec![ShortcutAction::ToggleFullWidth, ShortcutAction::ToggleScript]
        );
    }

    #[test]
    fn test_reset_forgets_held_keys() {
        let mut d = disambiguator();
        let t0 = Instant::now();
        d.handle(ModifierEvent::Down {
            key: ModifierKey::RightCommand,
            at: t0,
        });
        d.reset();
        assert!(!d.handle(ModifierEvent::Up {
            key: ModifierKey::RightCommand,
            at: t0 + Duration::from_millis(10)
        }));
        assert!(d.take_dispatched().is_empty());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(ModifierKey::parse("RightCommand"), Some(ModifierKey::RightCommand));
        assert_eq!(ModifierKey::parse("lshift"), Some(ModifierKey::LeftShift));
        assert_eq!(ModifierKey::parse("hyper"), None);
        assert_eq!(ModifierKey::LeftOption.kind(), ModifierKind::Option);
    }
}
