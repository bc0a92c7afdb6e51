//! Text memory images.
//!
//! One word per line, most significant bit first:
//!
//! ```text
//! # sample: B counts up by 3
//! 1010000   # MOV B, 0
//! 011 1101  # MOV A, 13
//! ADD B, 3
//! ```
//!
//! `#` starts a comment, blank lines are skipped and whitespace inside a
//! binary word is ignored. A line starting with a letter is assembled as a
//! mnemonic instead.

use std::fs;
use std::path::Path;

use nandsim_core::{MemoryImage, MEMORY_WORDS, WORD_BITS};
use tracing::debug;

use crate::errors::{LineErrorKind, LoadError};
use crate::mnemonic::{looks_like_mnemonic, parse_instruction};

/// Parses image text into a memory image.
///
/// # Errors
///
/// Returns [`LoadError::Line`] for the first rejected line.
pub fn parse_image(text: &str) -> Result<MemoryImage, LoadError> {
    let mut words: Vec<[u8; WORD_BITS]> = Vec::with_capacity(MEMORY_WORDS);

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split_once('#').map_or(raw, |(code, _)| code).trim();
        if content.is_empty() {
            continue;
        }
        if words.len() == MEMORY_WORDS {
            return Err(LoadError::line(line, LineErrorKind::TooManyWords));
        }

        let word = if looks_like_mnemonic(content) {
            let instruction =
                parse_instruction(content).map_err(|kind| LoadError::line(line, kind))?;
            let value = instruction.encode();
            std::array::from_fn(|bit| (value >> bit) & 1)
        } else {
            parse_binary_word(content).map_err(|kind| LoadError::line(line, kind))?
        };
        words.push(word);
    }

    debug!(words = words.len(), "image text parsed");
    Ok(MemoryImage::from_bits(&words)?)
}

/// Reads and parses an image file.
///
/// # Errors
///
/// Returns [`LoadError::Io`] when the file cannot be read, otherwise as
/// [`parse_image`].
pub fn load_image(path: &Path) -> Result<MemoryImage, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_image(&text)
}

/// Parses an MSB-first binary word into bit-0-first tokens.
fn parse_binary_word(content: &str) -> Result<[u8; WORD_BITS], LineErrorKind> {
    let mut tokens = Vec::with_capacity(WORD_BITS);
    for c in content.chars().filter(|c| !c.is_whitespace()) {
        match c {
            '0' => tokens.push(0),
            '1' => tokens.push(1),
            other => return Err(LineErrorKind::InvalidBit(other)),
        }
    }
    if tokens.len() != WORD_BITS {
        return Err(LineErrorKind::WordWidth(tokens.len()));
    }
    tokens.reverse();
    let mut word = [0; WORD_BITS];
    word.copy_from_slice(&tokens);
    Ok(word)
}

#[cfg(test)]
mod tests {
    use nandsim_core::MemoryImage;
    use rstest::rstest;

    use super::parse_image;
    use crate::errors::{LineErrorKind, LoadError};

    const SAMPLE_TEXT: &str = "\
# bit6 ... bit0
1010000  # 0: mov b,0
0111101  # 1: mov a,13
100 0011 # 2: add b,3

0100001  # 3: add a,1
JNC 2
JMP 5
";

    #[test]
    fn sample_text_matches_builtin_sample() {
        let image = parse_image(SAMPLE_TEXT).expect("valid image");
        assert_eq!(image, MemoryImage::sample());
    }

    #[test]
    fn empty_text_is_an_all_low_image() {
        assert_eq!(parse_image("# nothing\n\n").expect("valid"), MemoryImage::default());
    }

    #[rstest]
    #[case::short("101\n", 1, LineErrorKind::WordWidth(3))]
    #[case::long("\n11110000\n", 2, LineErrorKind::WordWidth(8))]
    #[case::stray_digit("0102000\n", 1, LineErrorKind::InvalidBit('2'))]
    #[case::mnemonic("NOP\nMOV Q, 1\n", 2, LineErrorKind::InvalidRegister("Q".into()))]
    #[case::ninth_word("NOP\nNOP\nNOP\nNOP\nNOP\nNOP\nNOP\nNOP\nNOP\n", 9, LineErrorKind::TooManyWords)]
    fn rejected_lines_report_position(
        #[case] text: &str,
        #[case] line: usize,
        #[case] kind: LineErrorKind,
    ) {
        match parse_image(text) {
            Err(LoadError::Line {
                line: actual,
                kind: actual_kind,
            }) => {
                assert_eq!(actual, line);
                assert_eq!(actual_kind, kind);
            }
            other => panic!("expected line error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = super::load_image(&dir.path().join("absent.txt")).expect_err("missing file");
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
