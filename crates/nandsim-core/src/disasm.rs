//! Instruction disassembly for the 3-bit CPU.
//!
//! Converts ROM words into assembly text such as `ADD A, 3`, `JNC 2` or
//! `NOP`.

use crate::encoding::{format_msb_first, Instruction, MEMORY_WORDS};
use crate::image::MemoryImage;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled ROM word.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// ROM address (0-7).
    pub address: u8,
    /// Raw 7-bit word.
    pub word: u8,
    /// Word bits, most significant first.
    pub bits: String,
    /// Assembly text.
    pub text: String,
}

/// Disassembles one word.
#[must_use]
pub fn disassemble_word(word: u8) -> String {
    Instruction::decode(word).to_string()
}

/// Disassembles every word of an image, address 0 first.
#[must_use]
pub fn disassemble_image(image: &MemoryImage) -> Vec<DisassemblyRow> {
    (0..MEMORY_WORDS)
        .zip(0u8..)
        .map(|(index, address)| {
            let word = image.word_value(index);
            DisassemblyRow {
                address,
                word,
                bits: format_msb_first(&image.word(index)),
                text: disassemble_word(word),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{disassemble_image, disassemble_word};
    use crate::MemoryImage;

    #[test]
    fn sample_program_listing() {
        let rows = disassemble_image(&MemoryImage::sample());
        let text: Vec<&str> = rows.iter().map(|row| row.text.as_str()).collect();
        assert_eq!(
            text,
            [
                "MOV B, 0",
                "MOV A, 13",
                "ADD B, 3",
                "ADD A, 1",
                "JNC 2",
                "JMP 5",
                "NOP",
                "NOP"
            ]
        );
        assert_eq!(rows[1].bits, "0111101");
        assert_eq!(rows[5].address, 5);
        assert_eq!(rows[5].word, 0x75);
    }

    #[test]
    fn immediate_of_no_op_is_dropped() {
        assert_eq!(disassemble_word(0x1F), "NOP");
        assert_eq!(disassemble_word(0x0A), "NOP");
    }
}
