//! Lexer for statement text.
//!
//! Produces span-based tokens; text is sliced from the statement source only
//! when needed. Statement *extraction* (finding where one statement ends) is
//! a separate, character-level concern in [`crate::source`] - this lexer only
//! runs on one already-extracted statement at a time.

use logos::Logos;

/// All token kinds appearing inside a statement.
///
/// Keywords are defined before the identifier regex so they take precedence.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("<")]
    LAngle,

    #[token(">")]
    RAngle,

    #[token(":")]
    Colon,

    #[token(";")]
    Semi,

    #[token(",")]
    Comma,

    #[token("=")]
    Eq,

    #[token("return")]
    KwReturn,

    #[token("null")]
    KwNull,

    #[token("default")]
    KwDefault,

    #[token("true")]
    KwTrue,

    #[token("false")]
    KwFalse,

    /// Integer or decimal literal, optionally negative.
    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    /// Double-quoted string literal with backslash escapes.
    #[regex(r#""(?:[^"\\]|\\.)*""#)]
    Str,

    /// Identifier: type names, instance ids, member names, `_ref`.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
}

/// Span-based token over one statement's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

/// Tokenize one statement. On a lex error, returns the byte offset of the
/// offending fragment so the caller can report a line number.
pub fn lex(source: &str) -> Result<Vec<Token>, usize> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    while let Some(result) = lexer.next() {
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                start: lexer.span().start,
                end: lexer.span().end,
            }),
            Err(()) => return Err(lexer.span().start),
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod lexer_tests {
    use super::TokenKind::*;
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn definition_head() {
        assert_eq!(
            kinds("Point(1,2): p1 {"),
            vec![Ident, LParen, Number, Comma, Number, RParen, Colon, Ident, LBrace]
        );
    }

    #[test]
    fn keywords_take_precedence_over_idents() {
        assert_eq!(kinds("return null default true false"), vec![
            KwReturn, KwNull, KwDefault, KwTrue, KwFalse
        ]);
        // Longer identifiers that merely start with a keyword stay identifiers.
        assert_eq!(kinds("returns nullable"), vec![Ident, Ident]);
    }

    #[test]
    fn negative_and_decimal_numbers() {
        assert_eq!(kinds("-3 1.5 -0.25"), vec![Number, Number, Number]);
    }

    #[test]
    fn string_with_escapes_is_one_token() {
        let toks = lex(r#"name = "say \"hi\"";"#).unwrap();
        assert_eq!(toks[2].kind, Str);
        assert_eq!(&r#"name = "say \"hi\"";"#[toks[2].start..toks[2].end], r#""say \"hi\"""#);
    }

    #[test]
    fn ref_marker_lexes_as_ident_call() {
        assert_eq!(kinds("next = _ref(n1);"), vec![
            Ident, Eq, Ident, LParen, Ident, RParen, Semi
        ]);
    }

    #[test]
    fn lex_error_reports_offset() {
        assert_eq!(lex("x = #bad;"), Err(4));
    }
}
