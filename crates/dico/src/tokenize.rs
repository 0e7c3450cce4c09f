//! Quote- and escape-aware command line splitting.
//!
//! Tokens are separated by runs of spaces and tabs. A token starting with `"`
//! or `'` runs to the matching quote and may contain whitespace. Backslash
//! escapes are recognised everywhere:
//!
//! | Escape | Byte |
//! |--------|------|
//! | `\\`, `\"`, `\'` | the character itself |
//! | `\a`, `\b`, `\f` | BEL, BS, FF |
//! | `\n`, `\r`, `\t` | LF, CR, TAB |
//!
//! Any other escaped character is kept together with its backslash.

/// Reusable tokenizer.
///
/// The argument arena is cleared, never appended to, at the start of every
/// call, so the returned slice only ever holds the tokens of the last line.
#[derive(Debug, Default)]
pub struct Tokenizer {
    arena: Vec<String>,
}

impl Tokenizer {
    /// Creates a tokenizer with an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits `line` into arguments.
    pub fn tokenize(&mut self, line: &str) -> &[String] {
        self.arena.clear();
        let mut chars = line.chars().peekable();
        loop {
            while chars.next_if(|ch| matches!(ch, ' ' | '\t')).is_some() {}
            let Some(&first) = chars.peek() else {
                break;
            };
            let mut token = String::new();
            if matches!(first, '"' | '\'') {
                chars.next();
                while let Some(ch) = chars.next() {
                    match ch {
                        '\\' => push_escape(&mut token, chars.next()),
                        quote if quote == first => break,
                        other => token.push(other),
                    }
                }
            } else {
                while let Some(ch) = chars.next_if(|ch| !matches!(ch, ' ' | '\t')) {
                    if ch == '\\' {
                        push_escape(&mut token, chars.next());
                    } else {
                        token.push(ch);
                    }
                }
            }
            self.arena.push(token);
        }
        &self.arena
    }
}

fn push_escape(token: &mut String, escaped: Option<char>) {
    match escaped {
        Some(ch @ ('\\' | '"' | '\'')) => token.push(ch),
        Some('a') => token.push('\u{7}'),
        Some('b') => token.push('\u{8}'),
        Some('f') => token.push('\u{c}'),
        Some('n') => token.push('\n'),
        Some('r') => token.push('\r'),
        Some('t') => token.push('\t'),
        Some(other) => {
            token.push('\\');
            token.push(other);
        }
        None => token.push('\\'),
    }
}

/// Splits a single line without keeping a tokenizer around.
#[must_use]
pub fn tokenize(line: &str) -> Vec<String> {
    Tokenizer::new().tokenize(line).to_vec()
}

/// Renders `word` as a double-quoted token that [`Tokenizer`] reads back
/// unchanged.
#[must_use]
pub fn quote(word: &str) -> String {
    let mut out = String::with_capacity(word.len() + 2);
    out.push('"');
    for ch in word.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
