use nom::{
    bytes::complete::take_while1, character::complete::char, error::VerboseError,
    sequence::separated_pair, IResult,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("could not parse: {0}")]
    Parse(String),
    #[error("parser did not finish: '{0}'")]
    ParserDidNotFinish(String),
}

impl<'s> From<nom::Err<VerboseError<&'s str>>> for ParseError {
    fn from(value: nom::Err<VerboseError<&'s str>>) -> Self {
        Self::Parse(value.to_string())
    }
}

pub type ParseResult<'s, T> = IResult<&'s str, T, VerboseError<&'s str>>;

pub fn is_segment_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

/// A tag prefix or code: lowercase letters, digits and hyphens.
pub fn segment(input: &str) -> ParseResult<&str> {
    take_while1(is_segment_char)(input)
}

pub fn full_tag(input: &str) -> ParseResult<(&str, &str)> {
    separated_pair(segment, char(':'), segment)(input)
}

/// Runs `parser` and requires that it consumes all of `input`.
pub fn complete<'s, T>(
    input: &'s str,
    parser: impl Fn(&'s str) -> ParseResult<'s, T>,
) -> Result<T, ParseError> {
    let (rest, value) = parser(input)?;

    if !rest.is_empty() {
        return Err(ParseError::ParserDidNotFinish(rest.to_owned()));
    }

    Ok(value)
}
