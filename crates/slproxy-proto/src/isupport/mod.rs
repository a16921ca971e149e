//! ISUPPORT (RPL_ISUPPORT / 005) token parsing.
//!
//! The borrowed views here are what [`NetworkInfo`](crate::NetworkInfo)
//! folds into its owned capability table.
//!
//! # Reference
//! - Modern IRC documentation: <https://modern.ircdocs.horse/isupport.html>

mod parser;

pub use parser::{parse_params, ChanModes, Isupport, IsupportEntry, PrefixSpec};
