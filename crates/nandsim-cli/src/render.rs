//! Text panel showing registers, carry, program counter and memory.
//!
//! Bits are shown most significant first. The memory row addressed by the
//! program counter carries a `>` cursor.

use std::fmt;

use nandsim_core::{disassemble_word, Snapshot, MEMORY_WORDS};

const TITLE: &str = "                3bit CPU Demo";
const LEFT_WIDTH: usize = 28;

/// Instruction set summary printed under the panel.
pub const INSTRUCTION_TABLE: &str = "\
  ########## 3bit cpu Instructions ##########

  6  5  4  3-0  carry  | mnemonic
  ---------------------|----------------
  0  1  0  Imd    x    | ADD A, Imd
  0  1  1  Imd    x    | MOV A, Imd
  1  0  0  Imd    x    | ADD B, Imd
  1  0  1  Imd    x    | MOV B, Imd
  1  1  0  Imd    0    | JNC Imd (jump if carry=0)
  1  1  1  Imd    x    | JMP Imd
  0  0  0  Imd    x    | NOP
  0  0  1  Imd    x    | NOP
";

/// Renders one panel frame for `snapshot`.
#[must_use]
pub fn render_panel(snapshot: &Snapshot) -> String {
    Panel(snapshot).to_string()
}

struct Panel<'a>(&'a Snapshot);

impl fmt::Display for Panel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        let left = [
            String::new(),
            format!(" Register B [{}]", snapshot.b_msb_first()),
            String::new(),
            format!(" Carry Flag [{}]", u8::from(snapshot.carry)),
            String::new(),
            " Program Counter".to_string(),
            format!(" [{}]", snapshot.pc_msb_first()),
            String::new(),
        ];
        let cursor = usize::from(snapshot.pc());

        writeln!(f, "{TITLE}")?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<24}Address    Memory",
            format!(" Register A [{}]", snapshot.a_msb_first())
        )?;
        for (address, label) in left.iter().enumerate().take(MEMORY_WORDS) {
            let marker = if address == cursor { '>' } else { ' ' };
            writeln!(
                f,
                "{label:<LEFT_WIDTH$}{marker}  {address}    [{}]  {}",
                snapshot.word_msb_first(address),
                disassemble_word(snapshot.word(address)),
            )?;
        }
        writeln!(f, "{:<LEFT_WIDTH$}      bit6 ... 0", format!(" tick {}", snapshot.ticks))
    }
}

/// One-line summary used in logs and manual mode prompts.
#[must_use]
pub fn render_status(snapshot: &Snapshot) -> String {
    format!(
        "tick {} pc={} a={} b={} carry={} next: {}",
        snapshot.ticks,
        snapshot.pc(),
        snapshot.a(),
        snapshot.b(),
        u8::from(snapshot.carry),
        snapshot.current_instruction(),
    )
}
