//! Instruction opcodes.

use serde::{Deserialize, Serialize};

/// The nine opcodes of the Graft instruction set.
///
/// The wire form is the SCREAMING_SNAKE name as the first token of a line.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Opcode {
    /// Push a literal onto the value stack.
    Push,
    /// Construct an instance and open its scope.
    Define,
    /// Assign a member of the innermost open instance.
    Set,
    /// Invoke a registered method on the innermost open instance.
    Call,
    /// Append to the innermost open list.
    Element,
    /// Open a list-builder frame with the declared item type(s).
    ListStart,
    /// Close the innermost list frame and stage the finished collection.
    ListEnd,
    /// Close the innermost open scope and flush its deferred references.
    End,
    /// Stop and return.
    Ret,
}

impl Opcode {
    /// Wire name of this opcode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "PUSH",
            Self::Define => "DEFINE",
            Self::Set => "SET",
            Self::Call => "CALL",
            Self::Element => "ELEMENT",
            Self::ListStart => "LIST_START",
            Self::ListEnd => "LIST_END",
            Self::End => "END",
            Self::Ret => "RET",
        }
    }

    /// Parse a wire name. Returns `None` for anything else.
    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "PUSH" => Self::Push,
            "DEFINE" => Self::Define,
            "SET" => Self::Set,
            "CALL" => Self::Call,
            "ELEMENT" => Self::Element,
            "LIST_START" => Self::ListStart,
            "LIST_END" => Self::ListEnd,
            "END" => Self::End,
            "RET" => Self::Ret,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
