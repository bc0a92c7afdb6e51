//! Validated ROM contents.

use thiserror::Error;

use crate::encoding::{bits_to_value, word_to_bits, MEMORY_WORDS, WORD_BITS, WORD_MASK};
use crate::fault::ErrorClass;

/// Rejections raised while building a memory image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ImageError {
    /// A word does not have exactly seven bits.
    #[error("word {word} has {width} bits, expected {WORD_BITS}")]
    WordWidth {
        /// Zero-based word index.
        word: usize,
        /// Number of bits supplied.
        width: usize,
    },
    /// A bit token is neither 0 nor 1.
    #[error("word {word} bit {bit} is {token}, expected 0 or 1")]
    InvalidToken {
        /// Zero-based word index.
        word: usize,
        /// Zero-based bit index, bit 0 first.
        bit: usize,
        /// Offending token.
        token: u8,
    },
    /// More words than the program counter can address.
    #[error("image has {count} words, at most {MEMORY_WORDS} fit")]
    TooManyWords {
        /// Number of words supplied.
        count: usize,
    },
    /// A packed word value does not fit in seven bits.
    #[error("word {word} value {value:#04x} exceeds seven bits")]
    WordOutOfRange {
        /// Zero-based word index.
        word: usize,
        /// Offending value.
        value: u8,
    },
}

impl ImageError {
    /// Every image error is caller input rejected before simulation.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::MalformedInput
    }
}

/// Eight 7-bit words, bit 0 first. Missing words are all-low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryImage {
    words: [[bool; WORD_BITS]; MEMORY_WORDS],
}

impl MemoryImage {
    /// Builds an image from per-word bit tokens (bit 0 first).
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::TooManyWords`] for more than eight words,
    /// [`ImageError::WordWidth`] for a word that is not seven tokens long and
    /// [`ImageError::InvalidToken`] for a token other than 0 or 1.
    pub fn from_bits<W: AsRef<[u8]>>(words: &[W]) -> Result<Self, ImageError> {
        if words.len() > MEMORY_WORDS {
            return Err(ImageError::TooManyWords { count: words.len() });
        }
        let mut image = Self::default();
        for (index, (slot, tokens)) in image.words.iter_mut().zip(words).enumerate() {
            let tokens = tokens.as_ref();
            if tokens.len() != WORD_BITS {
                return Err(ImageError::WordWidth {
                    word: index,
                    width: tokens.len(),
                });
            }
            for (bit, (level, token)) in slot.iter_mut().zip(tokens).enumerate() {
                *level = match *token {
                    0 => false,
                    1 => true,
                    token => {
                        return Err(ImageError::InvalidToken {
                            word: index,
                            bit,
                            token,
                        })
                    }
                };
            }
        }
        Ok(image)
    }

    /// Builds an image from packed word values.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::TooManyWords`] for more than eight words and
    /// [`ImageError::WordOutOfRange`] for a value above `0x7F`.
    pub fn from_words(words: &[u8]) -> Result<Self, ImageError> {
        if words.len() > MEMORY_WORDS {
            return Err(ImageError::TooManyWords { count: words.len() });
        }
        let mut image = Self::default();
        for (index, (slot, &value)) in image.words.iter_mut().zip(words).enumerate() {
            if value & !WORD_MASK != 0 {
                return Err(ImageError::WordOutOfRange { word: index, value });
            }
            *slot = word_to_bits(value);
        }
        Ok(image)
    }

    /// The demonstration program: count B up by 3 while A overflows, then
    /// park on a self-jump.
    ///
    /// ```text
    /// 0: MOV B, 0
    /// 1: MOV A, 13
    /// 2: ADD B, 3
    /// 3: ADD A, 1
    /// 4: JNC 2
    /// 5: JMP 5
    /// ```
    #[must_use]
    pub fn sample() -> Self {
        let mut image = Self::default();
        for (slot, value) in image.words.iter_mut().zip(SAMPLE_PROGRAM) {
            *slot = word_to_bits(value);
        }
        image
    }

    /// Bits of word `address` (wrapped to 3 bits), bit 0 first.
    #[must_use]
    pub const fn word(&self, address: usize) -> [bool; WORD_BITS] {
        self.words[address % MEMORY_WORDS]
    }

    /// Packed value of word `address` (wrapped to 3 bits).
    #[must_use]
    pub fn word_value(&self, address: usize) -> u8 {
        bits_to_value(&self.word(address))
    }

    /// All words, bit 0 first.
    #[must_use]
    pub const fn words(&self) -> &[[bool; WORD_BITS]; MEMORY_WORDS] {
        &self.words
    }
}

const SAMPLE_PROGRAM: [u8; 6] = [0x50, 0x3D, 0x43, 0x21, 0x62, 0x75];

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ImageError, MemoryImage};
    use crate::ErrorClass;

    #[test]
    fn missing_words_are_all_low() {
        let image = MemoryImage::from_bits(&[[1u8, 0, 0, 0, 0, 0, 1]]).expect("valid image");
        assert_eq!(image.word_value(0), 0x41);
        for address in 1..8 {
            assert_eq!(image.word_value(address), 0);
        }
    }

    #[rstest]
    #[case::short(vec![vec![0, 1, 0]], ImageError::WordWidth { word: 0, width: 3 })]
    #[case::long(
        vec![vec![0; 7], vec![0; 8]],
        ImageError::WordWidth { word: 1, width: 8 }
    )]
    #[case::token(
        vec![vec![0, 0, 2, 0, 0, 0, 0]],
        ImageError::InvalidToken { word: 0, bit: 2, token: 2 }
    )]
    #[case::count(vec![vec![0; 7]; 9], ImageError::TooManyWords { count: 9 })]
    fn malformed_bits_are_rejected(#[case] words: Vec<Vec<u8>>, #[case] expected: ImageError) {
        let err = MemoryImage::from_bits(&words).expect_err("image is malformed");
        assert_eq!(err, expected);
        assert_eq!(err.class(), ErrorClass::MalformedInput);
    }

    #[test]
    fn packed_words_must_fit_seven_bits() {
        assert_eq!(
            MemoryImage::from_words(&[0x7F, 0x80]),
            Err(ImageError::WordOutOfRange { word: 1, value: 0x80 })
        );
    }

    #[test]
    fn sample_program_matches_packed_form() {
        let image = MemoryImage::sample();
        let packed =
            MemoryImage::from_words(&[0x50, 0x3D, 0x43, 0x21, 0x62, 0x75]).expect("valid image");
        assert_eq!(image, packed);
        assert_eq!(image.word(0), [false, false, false, false, true, false, true]);
        assert_eq!(image.word_value(13), image.word_value(5));
    }
}
