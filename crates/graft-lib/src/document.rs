//! The `Document` façade: one compiled document, executable many times.

use tracing::debug;

use graft_bytecode::{Instruction, dump, tokenize};
use graft_compiler::compile;
use graft_vm::{TypeRegistry, Tracer, VM, Value};

use crate::{Error, Result};

/// A compiled document: the instruction stream between the two stages.
///
/// Compile once, execute as often as needed - each execution owns a fresh
/// machine, so two runs yield structurally equal but instance-distinct
/// graphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    instructions: Vec<Instruction>,
}

impl Document {
    /// Compile notation text.
    pub fn compile(notation: &str) -> Result<Self> {
        let instructions = compile(notation)?;
        debug!(instructions = instructions.len(), "document compiled");
        Ok(Self { instructions })
    }

    /// Tokenize an already-compiled instruction text stream.
    pub fn from_bytecode(text: &str) -> Result<Self> {
        let instructions = tokenize(text)?;
        Ok(Self { instructions })
    }

    /// Wrap an existing instruction stream.
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The line-oriented text form; round-trips through
    /// [`Document::from_bytecode`].
    pub fn bytecode_text(&self) -> String {
        dump(&self.instructions)
    }

    /// Execute against a registry, producing the document's root value.
    pub fn execute(&self, registry: &TypeRegistry) -> Result<Value> {
        Ok(VM::new(registry).execute(&self.instructions)?)
    }

    /// Execute with a tracer observing each instruction.
    pub fn execute_traced<T: Tracer>(
        &self,
        registry: &TypeRegistry,
        tracer: &mut T,
    ) -> Result<Value> {
        Ok(VM::new(registry).execute_with(&self.instructions, tracer)?)
    }
}

/// One-shot convenience: compile and execute in a single call.
pub fn decode(notation: &str, registry: &TypeRegistry) -> Result<Value> {
    Document::compile(notation)?.execute(registry)
}

impl std::str::FromStr for Document {
    type Err = Error;

    fn from_str(notation: &str) -> Result<Self> {
        Self::compile(notation)
    }
}
