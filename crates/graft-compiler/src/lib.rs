//! Compiler from Graft notation to the flat instruction stream.
//!
//! The notation is a declarative description of an object graph: typed
//! definitions with constructor arguments, member assignments, nested
//! collections, and `_ref(id)` references that may point forward. The
//! compiler translates it into a linear instruction stream in a single
//! pass, emitting references only to already-seen identifiers on the left
//! side of any reference - the ordering contract the executor's deferred
//! reference resolution depends on.
//!
//! - `lexer` - statement-level tokens
//! - `source` - the stack of line-buffered input sources
//! - `compiler` - statement parsing and instruction emission
//!
//! No type checking happens here; all semantic validation is execution-time.

pub mod compiler;
pub mod error;
mod lexer;
mod source;


pub use compiler::compile;
pub use error::{ParseError, ParseErrorKind};
