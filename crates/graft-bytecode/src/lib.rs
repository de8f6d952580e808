//! Instruction model for Graft bytecode.
//!
//! This crate contains:
//! - `Opcode` / `Instruction` - the flat opcode + ordered-argument record
//! - `ArgShape` - classification of the argument markers (`_ref(id)`,
//!   `_stack()`, `null`, `default`) resolved downstream by the executor
//! - `tokenizer` - line-oriented text stream to instructions, one per line
//! - `dump` - instructions back to the text form (tokenizer inverse)
//!
//! Instructions are dumb carriers between the compiler and the executor:
//! no type checking happens here, all semantic validation is execution-time.

pub mod arg;
pub mod dump;
pub mod instruction;
pub mod opcode;
pub mod tokenizer;

pub use arg::ArgShape;
pub use dump::dump;
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use tokenizer::{TokenizeError, tokenize};
