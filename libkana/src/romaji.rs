//! Romaji → hiragana table.
//!
//! Hepburn and Kunrei spellings plus `x`/`l` small kana and a few
//! punctuation keys. No key is a proper prefix of another key; the nasal
//! `ん` and geminate `っ` are produced by the composer's rules rather than by
//! table entries (apart from the explicit `n'`).

use once_cell::sync::Lazy;
use phf::phf_map;
use std::collections::HashSet;

pub static ROMAJI: phf::Map<&'static str, &'static str> = phf_map! {
    "a" => "あ", "i" => "い", "u" => "う", "e" => "え", "o" => "お",

    "ka" => "か", "ki" => "き", "ku" => "く", "ke" => "け", "ko" => "こ",
    "kya" => "きゃ", "kyu" => "きゅ", "kyo" => "きょ",
    "ga" => "が", "gi" => "ぎ", "gu" => "ぐ", "ge" => "げ", "go" => "ご",
    "gya" => "ぎゃ", "gyu" => "ぎゅ", "gyo" => "ぎょ",

    "sa" => "さ", "shi" => "し", "si" => "し", "su" => "す", "se" => "せ", "so" => "そ",
    "sha" => "しゃ", "shu" => "しゅ", "she" => "しぇ", "sho" => "しょ",
    "sya" => "しゃ", "syu" => "しゅ", "syo" => "しょ",
    "za" => "ざ", "ji" => "じ", "zi" => "じ", "zu" => "ず", "ze" => "ぜ", "zo" => "ぞ",
    "ja" => "じゃ", "ju" => "じゅ", "je" => "じぇ", "jo" => "じょ",
    "zya" => "じゃ", "zyu" => "じゅ", "zyo" => "じょ",

    "ta" => "た", "chi" => "ち", "ti" => "ち", "tsu" => "つ", "tu" => "つ", "te" => "て", "to" => "と",
    "cha" => "ちゃ", "chu" => "ちゅ", "che" => "ちぇ", "cho" => "ちょ",
    "tya" => "ちゃ", "tyu" => "ちゅ", "tyo" => "ちょ",
    "da" => "だ", "di" => "ぢ", "du" => "づ", "de" => "で", "do" => "ど",
    "dya" => "ぢゃ", "dyu" => "ぢゅ", "dyo" => "ぢょ",

    "na" => "な", "ni" => "に", "nu" => "ぬ", "ne" => "ね", "no" => "の",
    "nya" => "にゃ", "nyu" => "にゅ", "nyo" => "にょ",
    "n'" => "ん",

    "ha" => "は", "hi" => "ひ", "fu" => "ふ", "hu" => "ふ", "he" => "へ", "ho" => "ほ",
    "hya" => "ひゃ", "hyu" => "ひゅ", "hyo" => "ひょ",
    "fa" => "ふぁ", "fi" => "ふぃ", "fe" => "ふぇ", "fo" => "ふぉ",
    "ba" => "ば", "bi" => "び", "bu" => "ぶ", "be" => "べ", "bo" => "ぼ",
    "bya" => "びゃ", "byu" => "びゅ", "byo" => "びょ",
    "pa" => "ぱ", "pi" => "ぴ", "pu" => "ぷ", "pe" => "ぺ", "po" => "ぽ",
    "pya" => "ぴゃ", "pyu" => "ぴゅ", "pyo" => "ぴょ",
    "vu" => "ゔ",

    "ma" => "ま", "mi" => "み", "mu" => "む", "me" => "め", "mo" => "も",
    "mya" => "みゃ", "myu" => "みゅ", "myo" => "みょ",
    "ya" => "や", "yu" => "ゆ", "yo" => "よ",
    "ra" => "ら", "ri" => "り", "ru" => "る", "re" => "れ", "ro" => "ろ",
    "rya" => "りゃ", "ryu" => "りゅ", "ryo" => "りょ",
    "wa" => "わ", "wo" => "を",

    "xa" => "ぁ", "xi" => "ぃ", "xu" => "ぅ", "xe" => "ぇ", "xo" => "ぉ",
    "la" => "ぁ", "li" => "ぃ", "lu" => "ぅ", "le" => "ぇ", "lo" => "ぉ",
    "xya" => "ゃ", "xyu" => "ゅ", "xyo" => "ょ",
    "lya" => "ゃ", "lyu" => "ゅ", "lyo" => "ょ",
    "xtu" => "っ", "ltu" => "っ", "xwa" => "ゎ",

    "-" => "ー", "," => "、", "." => "。", "[" => "「", "]" => "」",
};

/// Every proper prefix of a table key.
static PREFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut prefixes = HashSet::new();
    for key in ROMAJI.keys() {
        let key: &'static str = key;
        for (idx, _) in key.char_indices().skip(1) {
            prefixes.insert(&key[..idx]);
        }
    }
    prefixes
});

pub fn lookup(latin: &str) -> Option<&'static str> {
    ROMAJI.get(latin).copied()
}

/// Whether some longer key starts with `latin`.
pub fn is_proper_prefix(latin: &str) -> bool {
    PREFIXES.contains(latin)
}

/// Whether `ch` can start or continue a romaji sequence.
pub fn is_romaji_char(ch: char) -> bool {
    let mut buf = [0; 4];
    let key: &str = ch.encode_utf8(&mut buf);
    ch.is_ascii_lowercase() || ch == '\'' || ROMAJI.contains_key(key)
}

pub fn is_vowel(ch: char) -> bool {
    matches!(ch, 'a' | 'i' | 'u' | 'e' | 'o')
}

pub fn is_glide(ch: char) -> bool {
    ch == 'y'
}

/// Letters that can be doubled into a geminate marker.
pub fn is_geminating(ch: char) -> bool {
    ch.is_ascii_lowercase() && !is_vowel(ch) && ch != 'n'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_key_is_a_prefix_of_another() {
        for key in ROMAJI.keys() {
            assert!(!is_proper_prefix(key), "{} is a prefix", key);
        }
    }

    #[test]
    fn test_prefixes() {
        assert!(is_proper_prefix("k"));
        assert!(is_proper_prefix("ky"));
        assert!(is_proper_prefix("ts"));
        assert!(is_proper_prefix("n"));
        assert!(!is_proper_prefix("ka"));
        assert!(!is_proper_prefix("q"));
    }

    #[test]
    fn test_romaji_chars() {
        assert!(is_romaji_char('k'));
        assert!(is_romaji_char('-'));
        assert!(is_romaji_char('.'));
        assert!(!is_romaji_char('K'));
        assert!(!is_romaji_char('1'));
    }
}
