//! Mode strings and mode-change parsing.

mod parse;
mod types;

pub use self::parse::{parse_mode_changes, ModeChanges};
pub use self::types::{ModeChange, ModeSet, Sign};
