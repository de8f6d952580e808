//! Line tokenizer: instruction-opcode text to `Instruction` records.
//!
//! The contract is strict: one instruction per non-blank line, in the same
//! order, never reordering or dropping lines. The first whitespace-delimited
//! token is the opcode; the rest are arguments. The only lexical subtlety is
//! that a double-quoted argument (backslash escapes allowed) is a single
//! token including its quotes, so string literals containing whitespace
//! survive the text form.

use crate::instruction::Instruction;
use crate::opcode::Opcode;

/// Errors produced while tokenizing an instruction text stream.
///
/// Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("line {line}: unknown opcode `{found}`")]
    UnknownOpcode { line: usize, found: String },

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },
}

/// Tokenize a line-oriented instruction text stream.
///
/// Blank (or whitespace-only) lines are skipped; every other line yields
/// exactly one instruction, in input order.
pub fn tokenize(text: &str) -> Result<Vec<Instruction>, TokenizeError> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let tokens = split_line(trimmed, line_no)?;
        // split_line never returns an empty vec for non-blank input
        let opcode = Opcode::from_str(&tokens[0]).ok_or_else(|| TokenizeError::UnknownOpcode {
            line: line_no,
            found: tokens[0].clone(),
        })?;
        out.push(Instruction::new(opcode, tokens[1..].to_vec()));
    }
    Ok(out)
}

/// Split one line into whitespace-delimited tokens, keeping quoted strings
/// (with their quotes) as single tokens.
fn split_line(line: &str, line_no: usize) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        if ch.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch != '"' {
            current.push(ch);
            continue;
        }

        // Quoted section: consume through the closing quote, escapes intact.
        current.push('"');
        let mut closed = false;
        while let Some(qc) = chars.next() {
            current.push(qc);
            match qc {
                '\\' => {
                    let Some(escaped) = chars.next() else {
                        return Err(TokenizeError::UnterminatedString { line: line_no });
                    };
                    current.push(escaped);
                }
                '"' => {
                    closed = true;
                    break;
                }
                _ => {}
            }
        }
        if !closed {
            return Err(TokenizeError::UnterminatedString { line: line_no });
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}
