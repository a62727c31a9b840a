pub mod error;
pub mod token;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{alpha1, alphanumeric1, anychar, char, digit1, multispace1},
    combinator::{map, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
};
use smol_str::SmolStr;

use crate::{Target, target::Span};
use error::LexerError;
use token::{Token, TokenKind};

macro_rules! define_token_parser {
    ($name:ident, $tag:expr, $kind:expr) => {
        fn $name(input: Span) -> IResult<Span, Token> {
            map(tag($tag), |span: Span| Token {
                target: span.into(),
                kind: $kind,
            })
            .parse(input)
        }
    };
}

/// Splits `code` into tokens, dropping whitespace and `#` comments. The last
/// token is always [`TokenKind::Eof`].
pub fn tokenize(code: &str, file: Option<&SmolStr>) -> Result<Vec<Token>, LexerError> {
    let input = Span::new_extra(code, file);

    match preceded(trivia, many0(terminated(token, trivia))).parse(input) {
        Ok((rest, mut tokens)) if rest.fragment().is_empty() => {
            tokens.push(Token {
                target: rest.into(),
                kind: TokenKind::Eof,
            });
            Ok(tokens)
        }
        Ok((rest, _)) => Err(unexpected(rest)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(unexpected(e.input)),
        Err(nom::Err::Incomplete(_)) => Err(unexpected(input)),
    }
}

fn unexpected(rest: Span) -> LexerError {
    let target = Target::from(rest);

    match rest.fragment().chars().next() {
        Some('\'') | Some('"') | None => LexerError::UnterminatedString(target),
        Some(c) => LexerError::UnexpectedToken(target, c),
    }
}

fn trivia(input: Span) -> IResult<Span, ()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), pair(char('#'), opt(is_not("\r\n")))),
        ))),
    )
    .parse(input)
}

define_token_parser!(comma, ",", TokenKind::Comma);
define_token_parser!(l_paren, "(", TokenKind::LParen);
define_token_parser!(r_paren, ")", TokenKind::RParen);
define_token_parser!(l_bracket, "[", TokenKind::LBracket);
define_token_parser!(r_bracket, "]", TokenKind::RBracket);
define_token_parser!(semi_colon, ";", TokenKind::SemiColon);

fn punctuations(input: Span) -> IResult<Span, Token> {
    alt((l_paren, r_paren, l_bracket, r_bracket, comma, semi_colon)).parse(input)
}

fn token(input: Span) -> IResult<Span, Token> {
    alt((punctuations, string_literal, integer_literal, ident)).parse(input)
}

fn integer_literal(input: Span) -> IResult<Span, Token> {
    map(recognize(pair(opt(char('-')), digit1)), |span: Span| Token {
        target: span.into(),
        kind: TokenKind::IntegerLiteral(SmolStr::new(span.fragment())),
    })
    .parse(input)
}

/// `\\`, `\'`, `\"`, `\n`, `\t` and `\r` are unescaped; any other escape is
/// kept as written, so that regular expressions read naturally.
fn escape(input: Span) -> IResult<Span, String> {
    map(preceded(char('\\'), anychar), |c| match c {
        '\\' => "\\".to_string(),
        '\'' => "'".to_string(),
        '"' => "\"".to_string(),
        'n' => "\n".to_string(),
        't' => "\t".to_string(),
        'r' => "\r".to_string(),
        c => format!("\\{}", c),
    })
    .parse(input)
}

fn quoted<'a>(input: Span<'a>, quote: char, stop: &'static str) -> IResult<Span<'a>, String> {
    map(
        delimited(
            char(quote),
            many0(alt((
                map(is_not(stop), |span: Span<'a>| span.fragment().to_string()),
                escape,
            ))),
            char(quote),
        ),
        |parts: Vec<String>| parts.concat(),
    )
    .parse(input)
}

fn single_quoted(input: Span) -> IResult<Span, String> {
    quoted(input, '\'', "'\\")
}

fn double_quoted(input: Span) -> IResult<Span, String> {
    quoted(input, '"', "\"\\")
}

fn string_literal(input: Span) -> IResult<Span, Token> {
    let target = Target::from(input);

    map(alt((single_quoted, double_quoted)), move |s| Token {
        target: target.clone(),
        kind: TokenKind::StringLiteral(s),
    })
    .parse(input)
}

fn ident(input: Span) -> IResult<Span, Token> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |span: Span| {
            let kind = match *span.fragment() {
                "null" => TokenKind::Null,
                name => TokenKind::Ident(SmolStr::new(name)),
            };
            Token {
                target: span.into(),
                kind,
            }
        },
    )
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kinds(code: &str) -> Vec<TokenKind> {
        tokenize(code, None)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[rstest]
    #[case::empty("", vec![TokenKind::Eof])]
    #[case::comment_only("# nothing here", vec![TokenKind::Eof])]
    #[case::call(
        "reg_count('\\\\d', \"a1\")",
        vec![
            TokenKind::Ident(SmolStr::new("reg_count")),
            TokenKind::LParen,
            TokenKind::StringLiteral("\\d".to_string()),
            TokenKind::Comma,
            TokenKind::StringLiteral("a1".to_string()),
            TokenKind::RParen,
            TokenKind::Eof,
        ]
    )]
    #[case::statements(
        "null; -12 # trailing\n[x_1]",
        vec![
            TokenKind::Null,
            TokenKind::SemiColon,
            TokenKind::IntegerLiteral(SmolStr::new("-12")),
            TokenKind::LBracket,
            TokenKind::Ident(SmolStr::new("x_1")),
            TokenKind::RBracket,
            TokenKind::Eof,
        ]
    )]
    #[case::escapes(
        "'a\\'b\\n\\t\\\"\\d'",
        vec![TokenKind::StringLiteral("a'b\n\t\"\\d".to_string()), TokenKind::Eof]
    )]
    #[case::other_quote_inside("\"it's\"", vec![TokenKind::StringLiteral("it's".to_string()), TokenKind::Eof])]
    #[case::empty_string("''", vec![TokenKind::StringLiteral(String::new()), TokenKind::Eof])]
    fn test_tokenize(#[case] code: &str, #[case] expected: Vec<TokenKind>) {
        assert_eq!(kinds(code), expected);
    }

    #[test]
    fn test_token_targets() {
        let tokens = tokenize("a(\n  'x')", None).unwrap();
        assert_eq!(tokens[0].target, Target::new(1, 1));
        assert_eq!(tokens[2].target, Target::new(2, 3));
        assert_eq!(tokens[3].target, Target::new(2, 6));
        assert_eq!(tokens[4].target, Target::new(2, 7));
    }

    #[rstest]
    #[case::unexpected_character("a(1 @ 2)", LexerError::UnexpectedToken(Target::new(1, 5), '@'))]
    #[case::unterminated_string("a('abc", LexerError::UnterminatedString(Target::new(1, 3)))]
    #[case::dangling_escape("'abc\\", LexerError::UnterminatedString(Target::new(1, 1)))]
    fn test_tokenize_errors(#[case] code: &str, #[case] expected: LexerError) {
        assert_eq!(tokenize(code, None), Err(expected));
    }
}
