//! The flat instruction record.

use serde::{Deserialize, Serialize};

use crate::opcode::Opcode;

/// One instruction: opcode tag plus ordered string arguments.
///
/// Produced once by the compiler (or the tokenizer), consumed once by the
/// executor, never mutated - the fields are private and there are no
/// setters. Arguments are verbatim wire tokens: a string literal keeps its
/// surrounding quotes, markers like `_ref(3)` keep their textual form.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Instruction {
    opcode: Opcode,
    args: Vec<String>,
}

impl Instruction {
    pub fn new(opcode: Opcode, args: Vec<String>) -> Self {
        Self { opcode, args }
    }

    #[inline]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    #[inline]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The `i`th argument, if present.
    #[inline]
    pub fn arg(&self, i: usize) -> Option<&str> {
        self.args.get(i).map(String::as_str)
    }
}

impl std::fmt::Display for Instruction {
    /// Renders the wire line: opcode followed by space-separated arguments.
    ///
    /// Arguments are stored in wire form already (quoted strings keep their
    /// quotes), so no re-escaping happens here.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.opcode.as_str())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod instruction_tests {
    use super::*;

    fn instr(opcode: Opcode, args: &[&str]) -> Instruction {
        Instruction::new(opcode, args.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn display_renders_wire_line() {
        assert_eq!(instr(Opcode::Push, &["1"]).to_string(), "PUSH 1");
        assert_eq!(
            instr(Opcode::Define, &["Point", "p1", "2"]).to_string(),
            "DEFINE Point p1 2"
        );
        assert_eq!(instr(Opcode::ListEnd, &[]).to_string(), "LIST_END");
    }

    #[test]
    fn quoted_arguments_stay_verbatim() {
        let i = instr(Opcode::Set, &["name", "\"hello world\""]);
        assert_eq!(i.to_string(), "SET name \"hello world\"");
        assert_eq!(i.arg(1), Some("\"hello world\""));
    }

    #[test]
    fn serializes_as_plain_data() {
        let i = instr(Opcode::Push, &["42"]);
        let json = serde_json::to_string(&i).unwrap();
        let back: Instruction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, i);
    }
}
