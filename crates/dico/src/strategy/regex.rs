//! POSIX regular expression strategies.
//!
//! Queries are rewritten into the syntax understood by the `regex` crate and
//! compiled case-insensitively. Matching is unanchored, as with `regexec`.

use ::regex::{Regex, RegexBuilder};

use super::{MatchKey, Matcher, Selector, StrategyError};

/// Flavour of POSIX regular expression accepted from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexSyntax {
    /// Extended (modern) expressions.
    Extended,
    /// Basic (obsolete) expressions: `\(`, `\{`, `\|`, `\+` and `\?` are
    /// operators while their bare forms are literals.
    Basic,
}

/// Rewrites a POSIX pattern into `regex` crate syntax.
///
/// GNU word anchors `\<` and `\>` become `\b`. Inside bracket expressions a
/// backslash is literal and character classes such as `[:alpha:]` are kept.
#[must_use]
pub fn translate(pattern: &str, syntax: RegexSyntax) -> String {
    let basic = syntax == RegexSyntax::Basic;
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut index = 0;
    let mut at_start = true;
    while let Some(&ch) = chars.get(index) {
        index += 1;
        let was_start = at_start;
        at_start = false;
        match ch {
            '\\' => {
                let Some(&next) = chars.get(index) else {
                    out.push_str(r"\\");
                    break;
                };
                index += 1;
                match next {
                    '(' | ')' | '{' | '}' | '|' | '+' | '?' if basic => {
                        out.push(next);
                        at_start = matches!(next, '(' | '|');
                    }
                    '<' | '>' => out.push_str(r"\b"),
                    'w' | 'W' | 's' | 'S' | 'b' | 'B' | '1'..='9' => {
                        out.push('\\');
                        out.push(next);
                    }
                    other => push_literal(&mut out, other),
                }
            }
            '[' => index = copy_bracket(&chars, index, &mut out),
            '*' if basic && was_start => out.push_str(r"\*"),
            '^' if basic && !was_start => out.push_str(r"\^"),
            '$' if basic && !at_end(&chars, index) => out.push_str(r"\$"),
            '(' | ')' | '{' | '}' | '|' | '+' | '?' if basic => push_literal(&mut out, ch),
            '^' => {
                out.push('^');
                at_start = true;
            }
            other => out.push(other),
        }
    }
    out
}

/// Rewrites a basic expression. See [`translate`].
#[must_use]
pub fn translate_basic(pattern: &str) -> String {
    translate(pattern, RegexSyntax::Basic)
}

fn push_literal(out: &mut String, ch: char) {
    let mut buf = [0_u8; 4];
    out.push_str(&::regex::escape(ch.encode_utf8(&mut buf)));
}

fn at_end(chars: &[char], index: usize) -> bool {
    match chars.get(index..) {
        None | Some([] | ['\\', ')' | '|', ..]) => true,
        Some(_) => false,
    }
}

/// Copies a bracket expression starting after its `[`, returning the index
/// after the closing `]`.
fn copy_bracket(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut index = start;
    out.push('[');
    if chars.get(index) == Some(&'^') {
        out.push('^');
        index += 1;
    }
    if chars.get(index) == Some(&']') {
        out.push_str(r"\]");
        index += 1;
    }
    while let Some(&ch) = chars.get(index) {
        match ch {
            ']' => {
                out.push(']');
                return index + 1;
            }
            '[' if chars.get(index + 1) == Some(&':') => {
                let close = chars
                    .get(index + 2..)
                    .and_then(|rest| rest.windows(2).position(|pair| pair == [':', ']']));
                if let Some(offset) = close {
                    let end = index + 2 + offset + 2;
                    out.extend(chars.get(index..end).unwrap_or_default());
                    index = end;
                } else {
                    out.push_str(r"\[");
                    index += 1;
                }
            }
            '\\' | '[' | '&' | '~' => {
                out.push('\\');
                out.push(ch);
                index += 1;
            }
            '-' if chars.get(index + 1) == Some(&'-') => {
                out.push_str(r"\-");
                index += 1;
            }
            other => {
                out.push(other);
                index += 1;
            }
        }
    }
    index
}

/// Selector compiling the query as a case-insensitive regular expression.
#[derive(Debug, Clone, Copy)]
pub struct RegexSelector {
    syntax: RegexSyntax,
}

impl RegexSelector {
    /// Creates a selector for the given syntax.
    #[must_use]
    pub const fn new(syntax: RegexSyntax) -> Self {
        Self { syntax }
    }
}

struct RegexMatcher {
    regex: Regex,
}

impl Matcher for RegexMatcher {
    fn is_match(&mut self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

impl Selector for RegexSelector {
    fn begin(&self, key: &MatchKey<'_>) -> Result<Box<dyn Matcher>, StrategyError> {
        let regex = RegexBuilder::new(&translate(key.word, self.syntax))
            .case_insensitive(true)
            .build()
            .map_err(|source| StrategyError::InvalidPattern {
                pattern: key.word.to_owned(),
                source,
            })?;
        Ok(Box::new(RegexMatcher { regex }))
    }
}
