//! The stack of line-buffered input sources.
//!
//! The compiler is a single-pass, line-buffered reader. Nested structures
//! (definition bodies, inline list-element object literals) are not parsed
//! by re-entering a recursive descent over the same character stream;
//! instead their raw lines are pushed as a new *source frame* and compiled
//! through the same statement parser, then popped. The frame stack bounds
//! what each nesting level has to look at to its own lines.
//!
//! Statement extraction scans raw characters and counts delimiter depth.
//! It deliberately does not special-case delimiters inside quoted string
//! literals - a `;` or `}` embedded in a string desynchronizes extraction.
//! This matches the notation's known limitation and is pinned by a test.

use std::collections::VecDeque;

use crate::error::{ParseError, ParseErrorKind};

/// One extracted statement: its raw text and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Statement {
    pub text: String,
    pub line: usize,
}

/// One buffered input source: numbered lines not yet consumed.
struct Frame {
    lines: VecDeque<(usize, String)>,
}

/// Stack of input sources. The top frame is always read first.
pub(crate) struct SourceStack {
    frames: Vec<Frame>,
}

impl SourceStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Push a new frame holding `text` split into lines, the first of which
    /// is numbered `first_line`.
    pub fn push_text(&mut self, text: &str, first_line: usize) {
        let lines = text
            .split('\n')
            .enumerate()
            .map(|(i, l)| (first_line + i, l.to_string()))
            .collect();
        self.frames.push(Frame { lines });
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Number of open frames. The root document is depth 1.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Extract the next statement from the top frame.
    ///
    /// Returns `Ok(None)` once the top frame holds nothing but whitespace.
    /// A statement ends at:
    /// - `;` at delimiter depth zero (assignments, bodyless definitions,
    ///   `return`),
    /// - the `}` closing the first `{` of a definition block, or
    /// - the `]` closing a bare list.
    ///
    /// A `=` at depth zero marks the statement as an assignment, whose only
    /// terminator is `;` - so assignment values may contain whole definition
    /// blocks.
    pub fn next_statement(&mut self) -> Result<Option<Statement>, ParseError> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(None);
        };

        let mut text = String::new();
        let mut start_line: Option<usize> = None;
        let mut first_sig: Option<char> = None;
        let mut depth: i32 = 0;
        let mut brace_opened = false;
        let mut is_assignment = false;
        let mut last_line = 1;

        while let Some((line_no, line)) = frame.lines.pop_front() {
            last_line = line_no;
            for (i, ch) in line.char_indices() {
                match ch {
                    '{' | '(' | '[' | '<' => {
                        depth += 1;
                        if ch == '{' {
                            brace_opened = true;
                        }
                    }
                    '}' | ')' | ']' | '>' => {
                        depth -= 1;
                        if depth < 0 {
                            return Err(ParseError::new(line_no, ParseErrorKind::Unbalanced));
                        }
                    }
                    '=' if depth == 0 => is_assignment = true,
                    _ => {}
                }
                if first_sig.is_none() && !ch.is_whitespace() {
                    first_sig = Some(ch);
                    start_line = Some(line_no);
                }
                text.push(ch);

                let terminated = if is_assignment {
                    ch == ';' && depth == 0
                } else if first_sig == Some('<') {
                    depth == 0 && (ch == ']' || ch == ';')
                } else {
                    depth == 0 && (ch == ';' || (ch == '}' && brace_opened))
                };
                if terminated {
                    let rest = &line[i + ch.len_utf8()..];
                    if !rest.trim().is_empty() {
                        frame.lines.push_front((line_no, rest.to_string()));
                    }
                    let line = start_line.unwrap_or(line_no);
                    return Ok(Some(Statement { text, line }));
                }
            }
            text.push('\n');
        }

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Err(ParseError::new(
                start_line.unwrap_or(last_line),
                ParseErrorKind::UnexpectedEnd,
            ))
        }
    }
}
