//! Error types for image loading and the front end.
//!
//! Loader errors carry the 1-based line of the offending text so they format
//! as `program.txt:3: error: ...` on stderr.

use std::io;
use std::path::PathBuf;

use nandsim_core::{CircuitError, ErrorClass, ImageError, SimError};
use thiserror::Error;

/// What went wrong on a single image line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineErrorKind {
    /// A binary word does not have seven bits.
    #[error("word has {0} bits, expected 7")]
    WordWidth(usize),
    /// A binary word contains something other than 0, 1 or whitespace.
    #[error("unexpected character `{0}` in binary word")]
    InvalidBit(char),
    /// The first token is not a known mnemonic.
    #[error("unknown mnemonic `{0}`")]
    UnknownMnemonic(String),
    /// `ADD`/`MOV` named something other than `A` or `B`.
    #[error("expected register A or B, found `{0}`")]
    InvalidRegister(String),
    /// A required operand is absent.
    #[error("missing operand for `{0}`")]
    MissingOperand(String),
    /// An immediate is not a number in `0..=15`.
    #[error("immediate `{0}` is not a value in 0..=15")]
    InvalidImmediate(String),
    /// Trailing text after a complete instruction.
    #[error("unexpected operand `{0}`")]
    UnexpectedOperand(String),
    /// A ninth word was supplied.
    #[error("image already holds 8 words")]
    TooManyWords,
}

/// Failures while turning image text into a [`nandsim_core::MemoryImage`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// The image file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A line was rejected.
    #[error("line {line}: {kind}")]
    Line {
        /// 1-based line number.
        line: usize,
        /// Rejection reason.
        kind: LineErrorKind,
    },
    /// The collected words were rejected by the core.
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl LoadError {
    /// Creates a line error.
    #[must_use]
    pub const fn line(line: usize, kind: LineErrorKind) -> Self {
        Self::Line { line, kind }
    }

    /// Returns the error class; unreadable files count as bad input.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::MalformedInput
    }
}

/// Top-level failure of a front-end command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The image could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// The CPU could not be constructed.
    #[error(transparent)]
    Circuit(#[from] CircuitError),
    /// The simulation faulted while running.
    #[error(transparent)]
    Sim(#[from] SimError),
    /// Writing output or reading commands failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// A snapshot could not be encoded as JSON.
    #[error("failed to encode snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Load(_) => 2,
            Self::Circuit(err) => match err.class() {
                ErrorClass::MalformedInput => 2,
                ErrorClass::MalformedCircuit => 3,
            },
            Self::Sim(_) => 3,
            Self::Io(_) | Self::Json(_) => 1,
        }
    }
}
