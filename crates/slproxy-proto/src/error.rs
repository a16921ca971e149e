//! Error types for the protocol layer.

use thiserror::Error;

/// Convenience type alias for Results using [`ParseError`].
pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Errors encountered when parsing or validating an IRC line.
///
/// A `ParseError` is fatal to the single line it was raised for and never to
/// the session that received it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Line was empty (or only whitespace / line terminators).
    #[error("empty line")]
    EmptyLine,

    /// An origin was present but no command followed it.
    #[error("missing command after origin")]
    MissingCommand,

    /// The command token was not letters or a three-digit numeric.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A known command arrived with fewer arguments than it requires.
    #[error("{command}: not enough arguments: expected {expected}, got {got}")]
    NotEnoughArguments {
        /// The command name.
        command: String,
        /// Minimum number of arguments.
        expected: usize,
        /// Arguments actually present.
        got: usize,
    },

    /// Parsing failed at a specific byte position.
    #[error("parsing failed at position {position}: {context}")]
    ParseContext {
        /// Byte position where parsing failed.
        position: usize,
        /// Description of what was being parsed.
        context: String,
    },
}
