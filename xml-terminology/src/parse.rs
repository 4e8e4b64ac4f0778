use winnow::ascii::{digit1, multispace0, multispace1};
use winnow::combinator::{alt, delimited, opt, preceded, separated};
use winnow::error::{ParserError, StrContext};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::error::TerminologyError;
use crate::pointer::{PointerSegment, TermName};

fn ws<'a, F, O, E: ParserError<&'a str>>(inner: F) -> impl Parser<&'a str, O, E>
where
    F: Parser<&'a str, O, E>,
{
    delimited(multispace0, inner, multispace0)
}

fn parse_name(input: &mut &'_ str) -> PResult<TermName> {
    preceded(
        opt(':'),
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
    )
    .map(TermName::from)
    .context(StrContext::Label("term name"))
    .parse_next(input)
}

fn parse_index(input: &mut &'_ str) -> PResult<usize> {
    delimited('[', ws(digit1.parse_to::<usize>()), ']')
        .context(StrContext::Label("node index"))
        .parse_next(input)
}

fn parse_segment(input: &mut &'_ str) -> PResult<PointerSegment> {
    (parse_name, opt(parse_index))
        .map(|(name, index)| PointerSegment { name, index })
        .parse_next(input)
}

fn parse_separator(input: &mut &'_ str) -> PResult<()> {
    alt((ws('/').void(), ws(',').void(), multispace1.void())).parse_next(input)
}

fn parse_pointer(input: &mut &'_ str) -> PResult<Vec<PointerSegment>> {
    delimited(
        ws(opt('[')),
        separated(1.., parse_segment, parse_separator),
        ws(opt(']')),
    )
    .parse_next(input)
}

/// Parses the textual form of a pointer into its segments.
pub(crate) fn parse_segments(input: &str) -> Result<Vec<PointerSegment>, TerminologyError> {
    parse_pointer
        .parse(input)
        .map_err(|e| TerminologyError::PointerSyntax {
            input: input.to_string(),
            message: e.to_string(),
        })
}
