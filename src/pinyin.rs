use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    // A syllable token: Latin letters (v doubles as ü), an optional "u:"
    // colon digraph, and an optional trailing tone digit.
    static ref SYLLABLE_RE: Regex = Regex::new(r"[a-zA-ZüÜ]+:?[1-5]?").unwrap();
}

// Toned variants per base vowel, index 0..3 = tones 1..4.
fn toned_vowel(vowel: char, tone: u32) -> Option<char> {
    let variants = match vowel {
        'a' => ['ā', 'á', 'ǎ', 'à'],
        'e' => ['ē', 'é', 'ě', 'è'],
        'i' => ['ī', 'í', 'ǐ', 'ì'],
        'o' => ['ō', 'ó', 'ǒ', 'ò'],
        'u' => ['ū', 'ú', 'ǔ', 'ù'],
        'ü' => ['ǖ', 'ǘ', 'ǚ', 'ǜ'],
        _ => return None,
    };
    variants.get(tone as usize - 1).copied()
}

fn base_vowel(c: char) -> char {
    match c {
        'ā' | 'á' | 'ǎ' | 'à' => 'a',
        'ē' | 'é' | 'ě' | 'è' => 'e',
        'ī' | 'í' | 'ǐ' | 'ì' => 'i',
        'ō' | 'ó' | 'ǒ' | 'ò' => 'o',
        'ū' | 'ú' | 'ǔ' | 'ù' => 'u',
        'ǖ' | 'ǘ' | 'ǚ' | 'ǜ' => 'ü',
        _ => c,
    }
}

/// Byte index of the vowel that takes the tone mark.
///
/// Placement rules: a or e always takes the mark; in "ou" the o takes it;
/// otherwise the last vowel, where "last" is resolved by testing ü, u, o, i
/// in that order and taking the final occurrence of the first one present.
fn tone_mark_index(syllable: &str) -> Option<usize> {
    if let Some(i) = syllable.find('a') {
        return Some(i);
    }
    if let Some(i) = syllable.find('e') {
        return Some(i);
    }
    if let Some(i) = syllable.find("ou") {
        return Some(i);
    }
    for vowel in ['ü', 'u', 'o', 'i'] {
        if let Some(i) = syllable.rfind(vowel) {
            return Some(i);
        }
    }
    None
}

/// Convert a single numbered syllable, e.g. "ni3" → "nǐ", "lv4" → "lǜ".
fn convert_syllable(token: &str) -> String {
    let (base, tone) = match token.chars().last() {
        Some(digit @ '1'..='5') => {
            let cut = token.len() - digit.len_utf8();
            (&token[..cut], digit.to_digit(10).unwrap_or(0))
        }
        _ => (token, 0),
    };

    // Neutral tone (5, 0 or no digit): the digit is consumed, the letters
    // pass through as typed.
    if tone == 0 || tone == 5 {
        return base.to_string();
    }

    let syllable = base.to_lowercase().replace("u:", "ü").replace('v', "ü");

    let Some(idx) = tone_mark_index(&syllable) else {
        return syllable;
    };
    let Some(vowel) = syllable[idx..].chars().next() else {
        return syllable;
    };
    let Some(marked) = toned_vowel(vowel, tone) else {
        return syllable;
    };

    let mut out = String::with_capacity(syllable.len() + 2);
    out.push_str(&syllable[..idx]);
    out.push(marked);
    out.push_str(&syllable[idx + vowel.len_utf8()..]);
    out
}

/// Converts numbered pinyin to tone-marked pinyin, e.g. "ni3 hao3" → "nǐ hǎo".
///
/// Anything outside the syllable grammar (spaces, punctuation, Han text)
/// passes through verbatim, so the function is total and idempotent on its
/// own output.
pub fn numbered_to_toned(input: &str) -> String {
    SYLLABLE_RE
        .replace_all(input, |caps: &Captures| convert_syllable(&caps[0]))
        .into_owned()
}

/// Lossy normalization for tone-insensitive search: lower-case, strip the
/// diacritic off every toned vowel (ǖ → ü, not u) and trim. Tone digits are
/// left alone.
pub fn normalize_for_search(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(base_vowel)
        .collect::<String>()
        .trim()
        .to_string()
}
