//! Quoted-printable transfer encoding.

use super::{Codec, FilterMode, LineState};

/// RFC 2045 style quoted-printable.
///
/// Printable ASCII passes through, other bytes become `=XX`, whitespace
/// that would end a line is escaped and long lines are split with `=\n`
/// soft breaks. Decoding undoes all of that, turning CRLF into LF and
/// dropping unescaped trailing whitespace.
#[derive(Debug, Clone)]
pub struct QuotedPrintableCodec {
    mode: FilterMode,
}

impl QuotedPrintableCodec {
    /// Creates a codec for the given direction.
    #[must_use]
    pub const fn new(mode: FilterMode) -> Self {
        Self { mode }
    }
}

const fn is_literal(byte: u8) -> bool {
    matches!(byte, 33..=60 | 62..=126)
}

fn soft_break_if_needed(output: &mut Vec<u8>, line: &mut LineState, width: usize) {
    if line.max_line > 1 && line.line_len + width > line.max_line - 1 {
        output.extend_from_slice(b"=\n");
        line.line_len = 0;
    }
}

fn push_literal(byte: u8, output: &mut Vec<u8>, line: &mut LineState) {
    soft_break_if_needed(output, line, 1);
    output.push(byte);
    line.line_len += 1;
}

/// Upper-case hex digit for the low nibble of `nibble`.
const fn hex_digit(nibble: u8) -> u8 {
    match nibble & 0x0f {
        digit @ 0..=9 => b'0' + digit,
        letter => b'A' + letter - 10,
    }
}

fn push_escaped(byte: u8, output: &mut Vec<u8>, line: &mut LineState) {
    soft_break_if_needed(output, line, 3);
    output.push(b'=');
    output.push(hex_digit(byte >> 4));
    output.push(hex_digit(byte & 0x0f));
    line.line_len += 3;
}

fn encode(input: &[u8], output: &mut Vec<u8>, line: &mut LineState, last: bool) -> usize {
    let mut consumed = 0;
    let mut bytes = input.iter().copied().peekable();
    while let Some(byte) = bytes.next() {
        match byte {
            b'\n' => {
                output.push(b'\n');
                line.line_len = 0;
            }
            b' ' | b'\t' => match bytes.peek() {
                None if !last => break,
                None | Some(b'\n') => push_escaped(byte, output, line),
                Some(_) => push_literal(byte, output, line),
            },
            other if is_literal(other) => push_literal(other, output, line),
            other => push_escaped(other, output, line),
        }
        consumed += 1;
    }
    consumed
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

/// Outcome of decoding one escape sequence.
enum Escape {
    Byte(u8),
    SoftBreak(usize),
    Literal,
    Incomplete,
}

fn classify_escape(rest: &[u8], last: bool) -> Escape {
    match rest {
        [b'=', b'\n', ..] => Escape::SoftBreak(2),
        [b'=', b'\r', b'\n', ..] => Escape::SoftBreak(3),
        [b'=', high, low, ..] => match (hex_value(*high), hex_value(*low)) {
            (Some(high), Some(low)) => Escape::Byte(high << 4 | low),
            _ => Escape::Literal,
        },
        _ if last => Escape::Literal,
        _ => Escape::Incomplete,
    }
}

fn decode(input: &[u8], output: &mut Vec<u8>, last: bool) -> usize {
    let mut pos = 0;
    while let Some(rest) = input.get(pos..).filter(|rest| !rest.is_empty()) {
        match rest {
            [b'=', ..] => match classify_escape(rest, last) {
                Escape::Byte(byte) => {
                    output.push(byte);
                    pos += 3;
                }
                Escape::SoftBreak(width) => pos += width,
                Escape::Literal => {
                    output.push(b'=');
                    pos += 1;
                }
                Escape::Incomplete => break,
            },
            [b'\r', b'\n', ..] => {
                output.push(b'\n');
                pos += 2;
            }
            [b'\r'] if !last => break,
            [b' ' | b'\t', ..] => {
                let run = rest
                    .iter()
                    .take_while(|byte| matches!(byte, b' ' | b'\t'))
                    .count();
                let after = rest.get(run..).unwrap_or_default();
                match after {
                    [] if !last => break,
                    [] | [b'\n', ..] | [b'\r', b'\n', ..] => {}
                    [b'\r'] if !last => break,
                    _ => output.extend_from_slice(rest.get(..run).unwrap_or_default()),
                }
                pos += run;
            }
            [byte, ..] => {
                output.push(*byte);
                pos += 1;
            }
            [] => break,
        }
    }
    pos
}

impl Codec for QuotedPrintableCodec {
    fn xcode(
        &mut self,
        input: &[u8],
        output: &mut Vec<u8>,
        line: &mut LineState,
        last: bool,
    ) -> usize {
        match self.mode {
            FilterMode::Encode => encode(input, output, line, last),
            FilterMode::Decode => decode(input, output, last),
        }
    }
}
