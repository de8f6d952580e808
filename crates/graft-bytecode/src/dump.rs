//! Instruction stream rendering - the tokenizer's inverse.

use crate::instruction::Instruction;

/// Render an instruction stream to its line-oriented text form.
///
/// One instruction per line, newline-terminated. The output round-trips:
/// `tokenize(&dump(stream))` reproduces `stream` exactly.
pub fn dump(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for instr in instructions {
        out.push_str(&instr.to_string());
        out.push('\n');
    }
    out
}
