//! Dubeolsik (2-set) keyboard layout.
//!
//! Keys are looked up by the ASCII character decoded from the hardware
//! keycode, so the system keyboard layout never changes the mapping. Shift
//! produces the tense consonants on Q W E R T and the ㅒ ㅖ vowels on O P;
//! every other shifted letter falls back to its unshifted jamo.

use crate::automaton::PhoneticComponent::{self, Onset, Vowel};
use libcompose_core::keycode;
use phf::phf_map;

static DUBEOLSIK: phf::Map<char, PhoneticComponent> = phf_map! {
    'r' => Onset(0),   // ㄱ
    'R' => Onset(1),   // ㄲ
    's' => Onset(2),   // ㄴ
    'e' => Onset(3),   // ㄷ
    'E' => Onset(4),   // ㄸ
    'f' => Onset(5),   // ㄹ
    'a' => Onset(6),   // ㅁ
    'q' => Onset(7),   // ㅂ
    'Q' => Onset(8),   // ㅃ
    't' => Onset(9),   // ㅅ
    'T' => Onset(10),  // ㅆ
    'd' => Onset(11),  // ㅇ
    'w' => Onset(12),  // ㅈ
    'W' => Onset(13),  // ㅉ
    'c' => Onset(14),  // ㅊ
    'z' => Onset(15),  // ㅋ
    'x' => Onset(16),  // ㅌ
    'v' => Onset(17),  // ㅍ
    'g' => Onset(18),  // ㅎ
    'k' => Vowel(0),   // ㅏ
    'o' => Vowel(1),   // ㅐ
    'i' => Vowel(2),   // ㅑ
    'O' => Vowel(3),   // ㅒ
    'j' => Vowel(4),   // ㅓ
    'p' => Vowel(5),   // ㅔ
    'u' => Vowel(6),   // ㅕ
    'P' => Vowel(7),   // ㅖ
    'h' => Vowel(8),   // ㅗ
    'y' => Vowel(12),  // ㅛ
    'n' => Vowel(13),  // ㅜ
    'b' => Vowel(17),  // ㅠ
    'm' => Vowel(18),  // ㅡ
    'l' => Vowel(20),  // ㅣ
};

/// Component typed by `ch`, if it is a Hangul key.
pub fn component_for(ch: char) -> Option<PhoneticComponent> {
    DUBEOLSIK
        .get(&ch)
        .or_else(|| DUBEOLSIK.get(&ch.to_ascii_lowercase()))
        .copied()
}

/// Component for a hardware key press.
pub fn component_for_key(keycode: u16, shift: bool) -> Option<PhoneticComponent> {
    keycode::ascii_for(keycode, shift).and_then(component_for)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shifted_keys() {
        assert_eq!(component_for('r'), Some(Onset(0)));
        assert_eq!(component_for('R'), Some(Onset(1)));
        assert_eq!(component_for('K'), Some(Vowel(0)));
        assert_eq!(component_for('1'), None);
    }

    #[test]
    fn test_every_letter_is_mapped() {
        for ch in 'a'..='z' {
            assert!(component_for(ch).is_some(), "{} unmapped", ch);
        }
    }

    #[test]
    fn test_hardware_keys() {
        // 0x0F is R on an ANSI keyboard
        assert_eq!(component_for_key(0x0F, false), Some(Onset(0)));
        assert_eq!(component_for_key(0x0F, true), Some(Onset(1)));
        assert_eq!(component_for_key(0x31, false), None);
    }
}
