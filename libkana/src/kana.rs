//! Hiragana / katakana conversion.
//!
//! The two syllabaries are laid out in parallel blocks, 0x60 code points
//! apart. Only the shared range (ぁ..ゖ / ァ..ヶ) is mapped; prolonged sound
//! marks, iteration marks and everything outside the kana blocks pass through.

const HIRAGANA_START: u32 = 0x3041;
const HIRAGANA_END: u32 = 0x3096;
const KATAKANA_START: u32 = 0x30A1;
const KATAKANA_END: u32 = 0x30F6;
const OFFSET: u32 = KATAKANA_START - HIRAGANA_START;

pub fn is_hiragana(c: char) -> bool {
    (HIRAGANA_START..=HIRAGANA_END).contains(&(c as u32))
}

pub fn is_katakana(c: char) -> bool {
    (KATAKANA_START..=KATAKANA_END).contains(&(c as u32))
}

/// Convert every hiragana char of `text` to katakana.
pub fn to_katakana(text: &str) -> String {
    text.chars()
        .map(|c| {
            if is_hiragana(c) {
                char::from_u32(c as u32 + OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Convert every katakana char of `text` to hiragana.
pub fn to_hiragana(text: &str) -> String {
    text.chars()
        .map(|c| {
            if is_katakana(c) {
                char::from_u32(c as u32 - OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}
