//! Soundex phonetic matching.

use super::{MatchKey, Matcher, Selector, StrategyError};

const CODE_LEN: usize = 4;

/// Soundex class of an ASCII letter: `'0'` for vowels, `'-'` for the
/// silent `H` and `W`, `'1'..='6'` for consonant groups.
const fn class(letter: u8) -> Option<u8> {
    match letter.to_ascii_uppercase() {
        b'A' | b'E' | b'I' | b'O' | b'U' | b'Y' => Some(b'0'),
        b'H' | b'W' => Some(b'-'),
        b'B' | b'F' | b'P' | b'V' => Some(b'1'),
        b'C' | b'G' | b'J' | b'K' | b'Q' | b'S' | b'X' | b'Z' => Some(b'2'),
        b'D' | b'T' => Some(b'3'),
        b'L' => Some(b'4'),
        b'M' | b'N' => Some(b'5'),
        b'R' => Some(b'6'),
        _ => None,
    }
}

/// Computes the four-character soundex code of an ASCII word.
///
/// Returns `None` for words containing non-ASCII characters or no letters
/// at all. Characters other than letters are ignored.
#[must_use]
pub fn soundex(word: &str) -> Option<String> {
    if !word.is_ascii() {
        return None;
    }
    let mut letters = word.bytes().skip_while(|byte| class(*byte).is_none());
    let first = letters.next()?;
    let mut code = vec![first.to_ascii_uppercase()];
    let mut previous = class(first);
    for byte in letters {
        if code.len() == CODE_LEN {
            break;
        }
        let Some(digit) = class(byte) else {
            continue;
        };
        if Some(digit) == previous || digit == b'-' {
            continue;
        }
        if digit != b'0' {
            code.push(digit);
        }
        previous = Some(digit);
    }
    code.resize(CODE_LEN, b'0');
    String::from_utf8(code).ok()
}

/// Selector comparing soundex codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoundexSelector;

struct SoundexMatcher {
    code: Option<String>,
}

impl Matcher for SoundexMatcher {
    fn is_match(&mut self, candidate: &str) -> bool {
        match (&self.code, soundex(candidate)) {
            (Some(query), Some(candidate)) => *query == candidate,
            _ => false,
        }
    }
}

impl Selector for SoundexSelector {
    fn begin(&self, key: &MatchKey<'_>) -> Result<Box<dyn Matcher>, StrategyError> {
        Ok(Box::new(SoundexMatcher {
            code: soundex(key.word),
        }))
    }
}
