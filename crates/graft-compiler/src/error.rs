//! Compilation errors.
//!
//! Any structural violation aborts compilation immediately; there is no
//! partial-document output and no recovery.

/// A fatal notation error, located by 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unrecognized token")]
    Lex,

    #[error("unbalanced delimiters")]
    Unbalanced,

    #[error("statement is missing its terminator")]
    UnexpectedEnd,

    #[error("expected {expected}, found `{found}`")]
    Unexpected {
        expected: &'static str,
        found: String,
    },

    #[error("constructor arguments must be literals")]
    NonLiteralArgument,

    #[error("document contains no definitions and no return")]
    EmptyDocument,
}
