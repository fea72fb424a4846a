//! Token-level `nom` combinators shared by the filter grammar: names,
//! literals and the regex-literal forms.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, recognize},
    number::complete::double,
    sequence::{delimited, pair, preceded},
};
use serde_json::Value;

/// A combinator that takes a parser `inner` and produces a parser that
/// consumes surrounding whitespace.
pub(crate) fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

// --- Names ---

/// A plain identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// A field name, which may embed `*` and `?` wildcards. `*` and `**` on
/// their own are also field names; classification happens in the AST.
pub(crate) fn field_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || matches!(c, '_' | '*' | '?')),
        take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '*' | '?')),
    ))
    .parse(input)
}

// --- Literals ---

fn boolean(input: &str) -> IResult<&str, Value> {
    alt((
        map(tag("true"), |_| Value::Bool(true)),
        map(tag("false"), |_| Value::Bool(false)),
    ))
    .parse(input)
}

fn null(input: &str) -> IResult<&str, Value> {
    map(tag("null"), |_| Value::Null).parse(input)
}

fn string_literal(input: &str) -> IResult<&str, Value> {
    map(
        alt((
            delimited(char('\''), is_not("'"), char('\'')),
            delimited(char('"'), is_not("\""), char('"')),
        )),
        |s: &str| Value::String(s.to_string()),
    )
    .parse(input)
}

fn number(input: &str) -> IResult<&str, Value> {
    map(double, |n| {
        // Keep integral arguments as integers so functions like limit(2)
        // receive a JSON integer rather than 2.0.
        if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
            Value::from(n as i64)
        } else {
            Value::from(n)
        }
    })
    .parse(input)
}

/// Any literal argument value: null, boolean, number or quoted string.
pub(crate) fn literal(input: &str) -> IResult<&str, Value> {
    alt((null, boolean, number, string_literal)).parse(input)
}

// --- Regex literals ---

/// A regex literal: `~pattern~flags` or `/pattern/flags`. The only
/// recognized flag is `i` (case-insensitive); it is folded into the
/// pattern as an inline group so the caller compiles plain pattern text.
pub(crate) fn regex_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            pair(
                delimited(char('~'), is_not("~"), char('~')),
                take_while(|c| c == 'i'),
            ),
            pair(
                delimited(char('/'), is_not("/"), char('/')),
                take_while(|c| c == 'i'),
            ),
        )),
        |(pattern, flags): (&str, &str)| {
            if flags.is_empty() {
                pattern.to_string()
            } else {
                format!("(?i){pattern}")
            }
        },
    )
    .parse(input)
}

/// Consumes a `-` prefix if present.
pub(crate) fn negation(input: &str) -> IResult<&str, bool> {
    map(opt(preceded(multispace0, char('-'))), |n| n.is_some()).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("firstName,rest"), Ok((",rest", "firstName")));
        assert_eq!(identifier("_private"), Ok(("", "_private")));
        assert!(identifier("1bad").is_err());
    }

    #[test]
    fn test_field_name_with_wildcards() {
        assert_eq!(field_name("issue*"), Ok(("", "issue*")));
        assert_eq!(field_name("**,rest"), Ok((",rest", "**")));
        assert_eq!(field_name("issueSummar?"), Ok(("", "issueSummar?")));
        assert!(field_name("{nested}").is_err());
    }

    #[test]
    fn test_literals() {
        assert_eq!(literal("null"), Ok(("", Value::Null)));
        assert_eq!(literal("true"), Ok(("", json!(true))));
        assert_eq!(literal("2"), Ok(("", json!(2))));
        assert_eq!(literal("2.5"), Ok(("", json!(2.5))));
        assert_eq!(literal("'hi'"), Ok(("", json!("hi"))));
        assert_eq!(literal("\"hi\""), Ok(("", json!("hi"))));
    }

    #[test]
    fn test_regex_literal_forms() {
        assert_eq!(
            regex_literal("~iss[a-z]e.*~"),
            Ok(("", "iss[a-z]e.*".to_string()))
        );
        assert_eq!(
            regex_literal("/iss[a-z]e.*/"),
            Ok(("", "iss[a-z]e.*".to_string()))
        );
        assert_eq!(
            regex_literal("~issue~i,rest"),
            Ok((",rest", "(?i)issue".to_string()))
        );
    }

    #[test]
    fn test_unterminated_regex_fails() {
        assert!(regex_literal("~issue").is_err());
    }
}
