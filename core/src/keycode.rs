//! Hardware keycode decoding.
//!
//! Keys are decoded from the ANSI virtual keycode and the shift state, never
//! from the character the OS keyboard layout produced, so a Dvorak or AZERTY
//! system layout does not change what the composers receive. Script layouts
//! then map the resulting ASCII character to their own units.

use crate::ime_engine::KeyEvent;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const RETURN: u16 = 0x24;
pub const TAB: u16 = 0x30;
pub const SPACE: u16 = 0x31;
pub const DELETE: u16 = 0x33;
pub const ESCAPE: u16 = 0x35;
pub const JIS_EISU: u16 = 0x66;
pub const JIS_KANA: u16 = 0x68;
pub const PAGE_UP: u16 = 0x74;
pub const FORWARD_DELETE: u16 = 0x75;
pub const PAGE_DOWN: u16 = 0x79;
pub const LEFT: u16 = 0x7B;
pub const RIGHT: u16 = 0x7C;
pub const DOWN: u16 = 0x7D;
pub const UP: u16 = 0x7E;

/// ANSI keycode -> (unshifted, shifted) character
static ANSI_KEYCODES: Lazy<HashMap<u16, (char, char)>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // Letters
    m.insert(0x00, ('a', 'A'));
    m.insert(0x01, ('s', 'S'));
    m.insert(0x02, ('d', 'D'));
    m.insert(0x03, ('f', 'F'));
    m.insert(0x04, ('h', 'H'));
    m.insert(0x05, ('g', 'G'));
    m.insert(0x06, ('z', 'Z'));
    m.insert(0x07, ('x', 'X'));
    m.insert(0x08, ('c', 'C'));
    m.insert(0x09, ('v', 'V'));
    m.insert(0x0B, ('b', 'B'));
    m.insert(0x0C, ('q', 'Q'));
    m.insert(0x0D, ('w', 'W'));
    m.insert(0x0E, ('e', 'E'));
    m.insert(0x0F, ('r', 'R'));
    m.insert(0x10, ('y', 'Y'));
    m.insert(0x11, ('t', 'T'));
    m.insert(0x1F, ('o', 'O'));
    m.insert(0x20, ('u', 'U'));
    m.insert(0x22, ('i', 'I'));
    m.insert(0x23, ('p', 'P'));
    m.insert(0x25, ('l', 'L'));
    m.insert(0x26, ('j', 'J'));
    m.insert(0x28, ('k', 'K'));
    m.insert(0x2D, ('n', 'N'));
    m.insert(0x2E, ('m', 'M'));

    // Digit row
    m.insert(0x12, ('1', '!'));
    m.insert(0x13, ('2', '@'));
    m.insert(0x14, ('3', '#'));
    m.insert(0x15, ('4', '$'));
    m.insert(0x17, ('5', '%'));
    m.insert(0x16, ('6', '^'));
    m.insert(0x1A, ('7', '&'));
    m.insert(0x1C, ('8', '*'));
    m.insert(0x19, ('9', '('));
    m.insert(0x1D, ('0', ')'));
    m.insert(0x1B, ('-', '_'));
    m.insert(0x18, ('=', '+'));

    // Punctuation
    m.insert(0x21, ('[', '{'));
    m.insert(0x1E, (']', '}'));
    m.insert(0x2A, ('\\', '|'));
    m.insert(0x29, (';', ':'));
    m.insert(0x27, ('\'', '"'));
    m.insert(0x2B, (',', '<'));
    m.insert(0x2F, ('.', '>'));
    m.insert(0x2C, ('/', '?'));
    m.insert(0x32, ('`', '~'));

    m
});

/// Character produced by `keycode` on an ANSI layout.
pub fn ascii_for(keycode: u16, shift: bool) -> Option<char> {
    ANSI_KEYCODES
        .get(&keycode)
        .map(|&(lower, upper)| if shift { upper } else { lower })
}

/// Decode a hardware key press into a [`KeyEvent`].
pub fn key_event(keycode: u16, shift: bool) -> Option<KeyEvent> {
    let event = match keycode {
        RETURN => KeyEvent::Enter,
        TAB => KeyEvent::Tab,
        SPACE => KeyEvent::Space,
        DELETE => KeyEvent::Backspace,
        FORWARD_DELETE => KeyEvent::Delete,
        ESCAPE => KeyEvent::Escape,
        JIS_KANA => KeyEvent::Convert,
        PAGE_UP => KeyEvent::PageUp,
        PAGE_DOWN => KeyEvent::PageDown,
        LEFT if shift => KeyEvent::ShiftLeft,
        RIGHT if shift => KeyEvent::ShiftRight,
        LEFT => KeyEvent::Left,
        RIGHT => KeyEvent::Right,
        UP => KeyEvent::Up,
        DOWN => KeyEvent::Down,
        _ => KeyEvent::Char(ascii_for(keycode, shift)?),
    };
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_follow_shift() {
        assert_eq!(ascii_for(0x0F, false), Some('r'));
        assert_eq!(ascii_for(0x0F, true), Some('R'));
        assert_eq!(ascii_for(0x12, true), Some('!'));
        assert_eq!(ascii_for(0x7F, false), None);
    }

    #[test]
    fn test_every_letter_is_mapped_once() {
        let mut letters: Vec<char> = ANSI_KEYCODES
            .values()
            .map(|&(c, _)| c)
            .filter(char::is_ascii_lowercase)
            .collect();
        letters.sort_unstable();
        letters.dedup();
        assert_eq!(letters.len(), 26);
    }

    #[test]
    fn test_special_keys() {
        assert_eq!(key_event(SPACE, false), Some(KeyEvent::Space));
        assert_eq!(key_event(DELETE, false), Some(KeyEvent::Backspace));
        assert_eq!(key_event(LEFT, true), Some(KeyEvent::ShiftLeft));
        assert_eq!(key_event(LEFT, false), Some(KeyEvent::Left));
        assert_eq!(key_event(0x00, false), Some(KeyEvent::Char('a')));
        assert_eq!(key_event(JIS_EISU, false), None);
    }
}
