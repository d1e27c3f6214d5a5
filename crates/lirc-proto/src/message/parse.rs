//! Line parsing.
//!
//! ```text
//! [:prefix] <command> *( SP <middle> ) [ SP ":" <trailing> ]
//! ```
//!
//! Command tags are matched case-sensitively; no folding happens here.

use std::str::FromStr;

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0},
    combinator::opt,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use super::Message;
use crate::error::MessageParseError;
use crate::prefix::Prefix;

fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Command tag: letters, or exactly three digits.
fn parse_command(input: &str) -> IResult<&str, &str> {
    let (rest, cmd) = take_while1(|c: char| c.is_ascii_alphanumeric())(input)?;

    let is_all_letters = cmd.chars().all(|c| c.is_ascii_alphabetic());
    let is_three_digits = cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit());

    if is_all_letters || is_three_digits {
        Ok((rest, cmd))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::AlphaNumeric,
        )))
    }
}

/// Space-separated middles, then an optional `:`-introduced trailing
/// parameter that runs to end of line. Runs of spaces count as one
/// separator. Returns whether a trailing parameter was seen.
fn parse_params(input: &str) -> (SmallVec<[&str; 15]>, bool) {
    let mut params: SmallVec<[&str; 15]> = SmallVec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return (params, false);
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            return (params, true);
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }
}

fn parse_message(input: &str) -> IResult<&str, (Option<&str>, &str)> {
    let (input, _) = space0(input)?;
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;
    let (input, command) = parse_command(input)?;
    Ok((input, (prefix, command)))
}

impl FromStr for Message {
    type Err = MessageParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let (rest, (prefix, command)) = parse_message(line)
            .map_err(|_| MessageParseError::InvalidCommand(line.to_string()))?;

        // The command must end at a space or at end of line.
        if !(rest.is_empty() || rest.starts_with(' ')) {
            return Err(MessageParseError::InvalidCommand(line.to_string()));
        }

        let (params, trailing) = parse_params(rest);

        Ok(Message {
            prefix: prefix.map(Prefix::parse),
            command: command.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            trailing,
        })
    }
}
