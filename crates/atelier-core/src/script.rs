//! Guard for user-supplied trigger scripts.
//!
//! Scripts never run inside the editor core; the host evaluates them in its
//! own sandbox. Before a script is stored on an object it is tokenised here
//! and rejected if it names anything that escapes that sandbox. String
//! literal contents are checked too, so `this["constructor"]` is caught.

use crate::error::{EditorError, EditorResult};
use winnow::ascii::{digit1, multispace1};
use winnow::combinator::{alt, cut_err, preceded};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_till, take_until, take_while};

/// Identifiers a trigger script may not reference.
pub const DISALLOWED: &[&str] = &[
    "eval",
    "Function",
    "window",
    "document",
    "globalThis",
    "fetch",
    "XMLHttpRequest",
    "import",
    "require",
    "process",
    "constructor",
    "__proto__",
];

#[derive(Debug, Clone, PartialEq)]
enum Token<'s> {
    Trivia,
    Ident(&'s str),
    Str(String),
    Number,
    Punct(char),
}

/// Reject a script that references a disallowed name.
pub fn check_script(code: &str) -> EditorResult<()> {
    let mut input = code;
    let tokens = tokenize(&mut input).map_err(|_| {
        EditorError::UnsafeScript("unterminated string or comment".into())
    })?;
    for token in tokens {
        match token {
            Token::Ident(name) if DISALLOWED.contains(&name) => {
                return Err(EditorError::UnsafeScript(format!("`{name}` is not allowed")));
            }
            Token::Str(text) => {
                if DISALLOWED.contains(&text.trim()) {
                    return Err(EditorError::UnsafeScript(format!(
                        "string literal names `{}`",
                        text.trim()
                    )));
                }
            }
            // Unicode escapes in identifiers, e.g. `\u0065val`.
            Token::Punct('\\') => {
                return Err(EditorError::UnsafeScript(
                    "escape sequences outside strings are not allowed".into(),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn tokenize<'s>(input: &mut &'s str) -> ModalResult<Vec<Token<'s>>> {
    let mut out = Vec::new();
    while !input.is_empty() {
        let token = alt((trivia, string_literal, identifier, number, punct)).parse_next(input)?;
        if token != Token::Trivia {
            out.push(token);
        }
    }
    Ok(out)
}

fn trivia<'s>(input: &mut &'s str) -> ModalResult<Token<'s>> {
    alt((
        multispace1.void(),
        preceded("//", take_till(0.., '\n')).void(),
        preceded("/*", cut_err((take_until(0.., "*/"), "*/"))).void(),
    ))
    .map(|()| Token::Trivia)
    .parse_next(input)
}

fn string_literal<'s>(input: &mut &'s str) -> ModalResult<Token<'s>> {
    let quote = one_of(['"', '\'', '`']).parse_next(input)?;
    let mut text = String::new();
    loop {
        let next: ModalResult<char> = any.parse_next(input);
        let Ok(c) = next else {
            return Err(ErrMode::Cut(ContextError::new()));
        };
        match c {
            '\\' => {
                let escaped: ModalResult<char> = any.parse_next(input);
                match escaped {
                    Ok(e) => text.push(e),
                    Err(_) => return Err(ErrMode::Cut(ContextError::new())),
                }
            }
            c if c == quote => break,
            c => text.push(c),
        }
    }
    Ok(Token::Str(text))
}

fn identifier<'s>(input: &mut &'s str) -> ModalResult<Token<'s>> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_' || c == '$'),
    )
        .take()
        .map(Token::Ident)
        .parse_next(input)
}

fn number<'s>(input: &mut &'s str) -> ModalResult<Token<'s>> {
    digit1.map(|_| Token::Number).parse_next(input)
}

fn punct<'s>(input: &mut &'s str) -> ModalResult<Token<'s>> {
    any.map(Token::Punct).parse_next(input)
}
