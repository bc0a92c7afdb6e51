//! Mnemonic resolution against the core opcode table.
//!
//! Accepted forms, case-insensitive, comma optional:
//!
//! ```text
//! ADD A, imm    MOV A, imm
//! ADD B, imm    MOV B, imm
//! JNC imm       JMP imm
//! NOP [imm]
//! ```
//!
//! Immediates are decimal, `0x` hex or `0b` binary and must fit in 4 bits.

use nandsim_core::{Instruction, Opcode, Register, IMMEDIATE_MASK};

use crate::errors::LineErrorKind;

/// Returns `true` when `text` starts with something that looks like a
/// mnemonic rather than a binary word.
#[must_use]
pub fn looks_like_mnemonic(text: &str) -> bool {
    text.trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
}

/// Parses one instruction.
///
/// # Errors
///
/// Returns the [`LineErrorKind`] describing the first problem found.
pub fn parse_instruction(text: &str) -> Result<Instruction, LineErrorKind> {
    let mut tokens = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty());

    let Some(head) = tokens.next() else {
        return Err(LineErrorKind::UnknownMnemonic(String::new()));
    };
    let mnemonic = head.to_ascii_uppercase();

    let instruction = match mnemonic.as_str() {
        "NOP" => {
            let immediate = tokens.next().map(parse_immediate).transpose()?;
            Instruction::new(Opcode::Nop, immediate.unwrap_or(0))
        }
        "ADD" | "MOV" => {
            let register = operand(&mut tokens, &mnemonic).and_then(parse_register)?;
            let immediate = operand(&mut tokens, &mnemonic).and_then(parse_immediate)?;
            let opcode = match (mnemonic.as_str(), register) {
                ("ADD", Register::A) => Opcode::AddA,
                ("ADD", Register::B) => Opcode::AddB,
                (_, Register::A) => Opcode::MovA,
                (_, Register::B) => Opcode::MovB,
            };
            Instruction::new(opcode, immediate)
        }
        "JNC" | "JMP" => {
            let opcode = if mnemonic == "JNC" {
                Opcode::Jnc
            } else {
                Opcode::Jmp
            };
            let immediate = operand(&mut tokens, &mnemonic).and_then(parse_immediate)?;
            Instruction::new(opcode, immediate)
        }
        _ => return Err(LineErrorKind::UnknownMnemonic(head.to_string())),
    };

    match tokens.next() {
        Some(extra) => Err(LineErrorKind::UnexpectedOperand(extra.to_string())),
        None => Ok(instruction),
    }
}

fn operand<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    mnemonic: &str,
) -> Result<&'a str, LineErrorKind> {
    tokens
        .next()
        .ok_or_else(|| LineErrorKind::MissingOperand(mnemonic.to_string()))
}

fn parse_register(token: &str) -> Result<Register, LineErrorKind> {
    match token.to_ascii_uppercase().as_str() {
        "A" => Ok(Register::A),
        "B" => Ok(Register::B),
        _ => Err(LineErrorKind::InvalidRegister(token.to_string())),
    }
}

fn parse_immediate(token: &str) -> Result<u8, LineErrorKind> {
    let lower = token.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        u8::from_str_radix(hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u8::from_str_radix(bin, 2)
    } else {
        lower.parse::<u8>()
    };
    match parsed {
        Ok(value) if value <= IMMEDIATE_MASK => Ok(value),
        _ => Err(LineErrorKind::InvalidImmediate(token.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use nandsim_core::{Instruction, Opcode};
    use rstest::rstest;

    use super::{looks_like_mnemonic, parse_instruction};
    use crate::errors::LineErrorKind;

    #[rstest]
    #[case("MOV B, 0", Opcode::MovB, 0)]
    #[case("mov a,13", Opcode::MovA, 13)]
    #[case("ADD B 3", Opcode::AddB, 3)]
    #[case("add A, 0x1", Opcode::AddA, 1)]
    #[case("JNC 0b10", Opcode::Jnc, 2)]
    #[case("JMP 5", Opcode::Jmp, 5)]
    #[case("NOP", Opcode::Nop, 0)]
    #[case("nop 7", Opcode::Nop, 7)]
    fn parses_instruction_forms(#[case] text: &str, #[case] opcode: Opcode, #[case] imm: u8) {
        assert_eq!(parse_instruction(text), Ok(Instruction::new(opcode, imm)));
    }

    #[rstest]
    #[case("HALT", LineErrorKind::UnknownMnemonic("HALT".into()))]
    #[case("MOV C, 1", LineErrorKind::InvalidRegister("C".into()))]
    #[case("ADD A", LineErrorKind::MissingOperand("ADD".into()))]
    #[case("mov b", LineErrorKind::MissingOperand("MOV".into()))]
    #[case("JMP", LineErrorKind::MissingOperand("JMP".into()))]
    #[case("JMP 16", LineErrorKind::InvalidImmediate("16".into()))]
    #[case("MOV A, x", LineErrorKind::InvalidImmediate("x".into()))]
    #[case("JNC 1 2", LineErrorKind::UnexpectedOperand("2".into()))]
    fn rejects_malformed_instructions(#[case] text: &str, #[case] expected: LineErrorKind) {
        assert_eq!(parse_instruction(text), Err(expected));
    }

    #[test]
    fn mnemonic_detection_skips_binary_words() {
        assert!(looks_like_mnemonic("  JMP 5"));
        assert!(!looks_like_mnemonic("1010000"));
        assert!(!looks_like_mnemonic(""));
    }

    #[test]
    fn display_output_parses_back() {
        for word in 0u8..0x80 {
            let instruction = Instruction::decode(word);
            if matches!(instruction.opcode, Opcode::Nop | Opcode::NopAlt) {
                continue;
            }
            assert_eq!(parse_instruction(&instruction.to_string()), Ok(instruction));
        }
    }
}
