//! Jamo tables and syllable arithmetic.
//!
//! Indices follow Unicode's modern jamo order: 19 onsets, 21 vowels and 28
//! codas where coda 0 means "no coda". A precomposed syllable is
//! `0xAC00 + (onset * 21 + vowel) * 28 + coda`.
//!
//! Compound vowels and codas are fused from two simple parts. Every compound
//! entry can be split back into exactly the pair it was built from.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const ONSET_COUNT: usize = 19;
pub const VOWEL_COUNT: usize = 21;
pub const CODA_COUNT: usize = 28;

const SYLLABLE_BASE: u32 = 0xAC00;
const SYLLABLE_COUNT: u32 = (ONSET_COUNT * VOWEL_COUNT * CODA_COUNT) as u32;

/// Compatibility jamo shown for a bare onset.
const COMPAT_ONSETS: [char; ONSET_COUNT] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ', 'ㅋ',
    'ㅌ', 'ㅍ', 'ㅎ',
];

/// Compatibility jamo shown for an isolated vowel.
const COMPAT_VOWELS: [char; VOWEL_COUNT] = [
    'ㅏ', 'ㅐ', 'ㅑ', 'ㅒ', 'ㅓ', 'ㅔ', 'ㅕ', 'ㅖ', 'ㅗ', 'ㅘ', 'ㅙ', 'ㅚ', 'ㅛ', 'ㅜ', 'ㅝ', 'ㅞ',
    'ㅟ', 'ㅠ', 'ㅡ', 'ㅢ', 'ㅣ',
];

/// Onset index → coda index of the same consonant. 0: cannot close a syllable
/// (ㄸ ㅃ ㅉ).
const ONSET_TO_CODA: [usize; ONSET_COUNT] = [
    1, 2, 4, 7, 0, 8, 16, 17, 0, 19, 20, 21, 22, 0, 23, 24, 25, 26, 27,
];

/// (first, second, compound) vowel indices.
const COMPOUND_VOWELS: [(usize, usize, usize); 7] = [
    (8, 0, 9),    // ㅗ + ㅏ = ㅘ
    (8, 1, 10),   // ㅗ + ㅐ = ㅙ
    (8, 20, 11),  // ㅗ + ㅣ = ㅚ
    (13, 4, 14),  // ㅜ + ㅓ = ㅝ
    (13, 5, 15),  // ㅜ + ㅔ = ㅞ
    (13, 20, 16), // ㅜ + ㅣ = ㅟ
    (18, 20, 19), // ㅡ + ㅣ = ㅢ
];

/// (first, second, compound) coda indices.
const COMPOUND_CODAS: [(usize, usize, usize); 11] = [
    (1, 19, 3),   // ㄱ + ㅅ = ㄳ
    (4, 22, 5),   // ㄴ + ㅈ = ㄵ
    (4, 27, 6),   // ㄴ + ㅎ = ㄶ
    (8, 1, 9),    // ㄹ + ㄱ = ㄺ
    (8, 16, 10),  // ㄹ + ㅁ = ㄻ
    (8, 17, 11),  // ㄹ + ㅂ = ㄼ
    (8, 19, 12),  // ㄹ + ㅅ = ㄽ
    (8, 25, 13),  // ㄹ + ㅌ = ㄾ
    (8, 26, 14),  // ㄹ + ㅍ = ㄿ
    (8, 27, 15),  // ㄹ + ㅎ = ㅀ
    (17, 19, 18), // ㅂ + ㅅ = ㅄ
];

static COMPAT_ONSET_INDEX: Lazy<HashMap<char, usize>> = Lazy::new(|| {
    COMPAT_ONSETS
        .iter()
        .enumerate()
        .map(|(i, &c)| (c, i))
        .collect()
});

pub fn compat_onset(onset: usize) -> Option<char> {
    COMPAT_ONSETS.get(onset).copied()
}

pub fn compat_vowel(vowel: usize) -> Option<char> {
    COMPAT_VOWELS.get(vowel).copied()
}

/// Onset index of a compatibility consonant such as `'ㄱ'`.
pub fn onset_of_compat(ch: char) -> Option<usize> {
    COMPAT_ONSET_INDEX.get(&ch).copied()
}

/// Coda index for an onset consonant, if it can close a syllable.
pub fn onset_to_coda(onset: usize) -> Option<usize> {
    ONSET_TO_CODA.get(onset).copied().filter(|&c| c != 0)
}

/// Onset index for a simple coda.
pub fn coda_to_onset(coda: usize) -> Option<usize> {
    if coda == 0 {
        return None;
    }
    ONSET_TO_CODA.iter().position(|&c| c == coda)
}

pub fn combine_vowel(first: usize, second: usize) -> Option<usize> {
    COMPOUND_VOWELS
        .iter()
        .find(|&&(a, b, _)| a == first && b == second)
        .map(|&(_, _, c)| c)
}

pub fn split_vowel(compound: usize) -> Option<(usize, usize)> {
    COMPOUND_VOWELS
        .iter()
        .find(|&&(_, _, c)| c == compound)
        .map(|&(a, b, _)| (a, b))
}

pub fn combine_coda(first: usize, second: usize) -> Option<usize> {
    COMPOUND_CODAS
        .iter()
        .find(|&&(a, b, _)| a == first && b == second)
        .map(|&(_, _, c)| c)
}

pub fn split_coda(compound: usize) -> Option<(usize, usize)> {
    COMPOUND_CODAS
        .iter()
        .find(|&&(_, _, c)| c == compound)
        .map(|&(a, b, _)| (a, b))
}

/// All compound vowel entries as `(first, second, compound)`.
pub fn compound_vowels() -> &'static [(usize, usize, usize)] {
    &COMPOUND_VOWELS
}

/// All compound coda entries as `(first, second, compound)`.
pub fn compound_codas() -> &'static [(usize, usize, usize)] {
    &COMPOUND_CODAS
}

/// Precomposed syllable for the given indices.
pub fn compose(onset: usize, vowel: usize, coda: usize) -> Option<char> {
    if onset >= ONSET_COUNT || vowel >= VOWEL_COUNT || coda >= CODA_COUNT {
        return None;
    }
    let offset = ((onset * VOWEL_COUNT + vowel) * CODA_COUNT + coda) as u32;
    char::from_u32(SYLLABLE_BASE + offset)
}

/// Indices of a precomposed syllable.
pub fn decompose(ch: char) -> Option<(usize, usize, usize)> {
    let offset = (ch as u32).checked_sub(SYLLABLE_BASE)?;
    if offset >= SYLLABLE_COUNT {
        return None;
    }
    let offset = offset as usize;
    let coda = offset % CODA_COUNT;
    let vowel = (offset / CODA_COUNT) % VOWEL_COUNT;
    let onset = offset / (CODA_COUNT * VOWEL_COUNT);
    Some((onset, vowel, coda))
}
