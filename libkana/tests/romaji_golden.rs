use libkana::romaji::ROMAJI;
use libkana::TransliterationComposer;

fn transliterate(text: &str) -> String {
    let mut composer = TransliterationComposer::new();
    for ch in text.chars() {
        composer.input(ch);
    }
    composer.flush()
}

#[test]
fn golden_words() {
    let cases = [
        ("konnichiwa", "こんにちわ"),
        ("kitte", "きって"),
        ("sanpo", "さんぽ"),
        ("shinbun", "しんぶん"),
        ("zasshi", "ざっし"),
        ("kyouha", "きょうは"),
        ("tsukue", "つくえ"),
        ("konnyaku", "こんにゃく"),
        ("ra-men", "らーめん"),
        ("hai.", "はい。"),
    ];
    for (latin, kana) in cases {
        assert_eq!(transliterate(latin), kana, "{}", latin);
    }
}

#[test]
fn golden_words_resolve_before_flush() {
    let mut composer = TransliterationComposer::new();
    for ch in "konnichiwa".chars() {
        composer.input(ch);
    }
    assert_eq!(composer.composed(), "こんにちわ");
    assert_eq!(composer.pending(), "");
}

#[test]
fn every_key_resolves_on_its_own() {
    for (key, kana) in ROMAJI.entries() {
        let mut composer = TransliterationComposer::new();
        let mut last = None;
        for ch in key.chars() {
            last = Some(composer.input(ch));
        }
        let last = last.unwrap();
        assert_eq!(last.composing, *kana, "{}", key);
        assert_eq!(last.pending, "", "{}", key);
    }
}

#[test]
fn concatenated_keys_resolve_to_concatenated_kana() {
    let mut keys: Vec<(&str, &str)> = ROMAJI.entries().map(|(k, v)| (*k, *v)).collect();
    keys.sort();

    // Deterministic walk over the table
    let mut seed: u64 = 42;
    for _ in 0..300 {
        let mut latin = String::new();
        let mut expected = String::new();
        for _ in 0..5 {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let (key, kana) = keys[((seed >> 33) as usize) % keys.len()];
            latin.push_str(key);
            expected.push_str(kana);
        }

        let mut composer = TransliterationComposer::new();
        for ch in latin.chars() {
            composer.input(ch);
        }
        assert_eq!(composer.pending(), "", "{}", latin);
        assert_eq!(composer.composed(), expected, "{}", latin);
    }
}

#[test]
fn backspace_removes_passed_through_letters() {
    let mut composer = TransliterationComposer::new();
    for ch in "kyt".chars() {
        composer.input(ch);
    }
    // "kyt" cannot continue, so k and y went through literally
    assert_eq!(composer.composed(), "ky");
    assert_eq!(composer.pending(), "t");

    composer.delete_backward();
    composer.delete_backward();
    composer.input('a');
    assert_eq!(composer.flush(), "kあ");
}
