//! Nom-based line parser.
//!
//! Produces borrowed slices into the input; [`Line::parse`](super::Line::parse)
//! turns them into an owned line.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0},
    combinator::opt,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use crate::error::ParseError;

/// Parse the origin (the part after `:` and before the first space).
fn parse_origin(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Take the raw command token.
fn parse_command(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != ' ')(input)
}

/// RFC 2812: command = 1*letter / 3digit
fn is_valid_command(cmd: &str) -> bool {
    cmd.chars().all(|c| c.is_ascii_alphabetic())
        || (cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit()))
}

/// Split the parameters following the command.
///
/// Runs of spaces count as one separator. The returned flag tells whether
/// the last parameter was introduced by `:`.
fn parse_params(input: &str) -> (SmallVec<[&str; 15]>, bool) {
    let mut params: SmallVec<[&str; 15]> = SmallVec::new();
    let mut rest = input;

    while rest.starts_with(' ') {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            return (params, true);
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }

    (params, false)
}

/// A parsed line with borrowed string slices.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedLine<'a> {
    pub origin: Option<&'a str>,
    pub command: &'a str,
    pub params: SmallVec<[&'a str; 15]>,
    pub has_colon: bool,
}

fn parse_line(input: &str) -> IResult<&str, (Option<&str>, &str)> {
    let (input, _) = space0(input)?;
    let (input, origin) = opt(parse_origin)(input)?;
    let (input, _) = space0(input)?;
    let (input, command) = parse_command(input)?;
    Ok((input, (origin, command)))
}

impl<'a> ParsedLine<'a> {
    /// Parse one protocol line. Anything from the first CR or LF on is ignored.
    pub fn parse(input: &'a str) -> Result<Self, ParseError> {
        let input = &input[..input.find(['\r', '\n']).unwrap_or(input.len())];
        if input.trim_matches(' ').is_empty() {
            return Err(ParseError::EmptyLine);
        }

        let (rest, (origin, command)) = match parse_line(input) {
            Ok(parsed) => parsed,
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let position = input.len() - e.input.len();
                return Err(if e.input.trim_matches(' ').is_empty() {
                    ParseError::MissingCommand
                } else {
                    ParseError::ParseContext {
                        position,
                        context: format!("{:?}", e.code),
                    }
                });
            }
            Err(nom::Err::Incomplete(_)) => return Err(ParseError::MissingCommand),
        };

        if !is_valid_command(command) {
            return Err(ParseError::InvalidCommand(command.to_owned()));
        }

        let (params, has_colon) = parse_params(rest);
        Ok(ParsedLine {
            origin,
            command,
            params,
            has_colon,
        })
    }
}
