//! Base64 transfer encoding.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::{Codec, FilterMode, LineState};

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Standard-alphabet base64 with `=` padding.
///
/// Encoding wraps lines at the configured maximum. Decoding skips every byte
/// outside the alphabet, so line breaks and stray whitespace are tolerated.
#[derive(Debug, Clone)]
pub struct Base64Codec {
    mode: FilterMode,
}

impl Base64Codec {
    /// Creates a codec for the given direction.
    #[must_use]
    pub const fn new(mode: FilterMode) -> Self {
        Self { mode }
    }

    fn encode(input: &[u8], output: &mut Vec<u8>, line: &mut LineState, last: bool) -> usize {
        let usable = if last {
            input.len()
        } else {
            input.len() - input.len() % 3
        };
        let Some(chunk) = input.get(..usable) else {
            return 0;
        };
        if chunk.is_empty() {
            return 0;
        }
        for symbol in STANDARD.encode(chunk).bytes() {
            if line.max_line > 0 && line.line_len >= line.max_line {
                output.push(b'\n');
                line.line_len = 0;
            }
            output.push(symbol);
            line.line_len += 1;
        }
        usable
    }

    fn decode(input: &[u8], output: &mut Vec<u8>, last: bool) -> usize {
        let mut quartet = Vec::with_capacity(4);
        let mut consumed = 0;
        for (offset, byte) in input.iter().enumerate() {
            if !is_alphabet(*byte) {
                if quartet.is_empty() {
                    consumed = offset + 1;
                }
                continue;
            }
            quartet.push(*byte);
            if quartet.len() == 4 {
                decode_group(&quartet, output);
                quartet.clear();
                consumed = offset + 1;
            }
        }
        if last {
            if quartet.len() > 1 {
                decode_group(&quartet, output);
            }
            consumed = input.len();
        }
        consumed
    }
}

fn is_alphabet(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'/' | b'=')
}

fn decode_group(group: &[u8], output: &mut Vec<u8>) {
    let data: Vec<u8> = group.iter().copied().take_while(|byte| *byte != b'=').collect();
    if data.len() < 2 {
        return;
    }
    if let Ok(decoded) = LENIENT.decode(&data) {
        output.extend_from_slice(&decoded);
    }
}

impl Codec for Base64Codec {
    fn xcode(
        &mut self,
        input: &[u8],
        output: &mut Vec<u8>,
        line: &mut LineState,
        last: bool,
    ) -> usize {
        match self.mode {
            FilterMode::Encode => Self::encode(input, output, line, last),
            FilterMode::Decode => Self::decode(input, output, last),
        }
    }
}
