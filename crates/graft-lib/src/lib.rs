//! Graft: an object-graph notation pipeline.
//!
//! Two stages. The compiler turns declarative, human-authored notation
//! describing an object graph into a flat instruction stream; the executor
//! replays that stream through a stack machine, reconstructing the graph at
//! runtime - types with constructor arguments, nested collections, and
//! forward/self/cyclic references included.
//!
//! The [`Document`] façade glues the stages together:
//!
//! ```
//! use graft_lib::TypeRegistry;
//!
//! let mut registry = TypeRegistry::new();
//! registry.register("Point", |t| {
//!     t.field("x", "int").field("y", "int");
//!     t.ctor(&["int", "int"], |obj, args| {
//!         obj.set("x", args[0].clone());
//!         obj.set("y", args[1].clone());
//!         Ok(())
//!     });
//! });
//!
//! let root = graft_lib::decode("Point(1,2): p1 { } return p1;", &registry).unwrap();
//! let point = root.as_object().unwrap().borrow();
//! assert_eq!(point.field("x").as_int(), Some(1));
//! ```

pub mod document;


pub use document::{Document, decode};

pub use graft_bytecode::{ArgShape, Instruction, Opcode, TokenizeError};
pub use graft_compiler::{ParseError, ParseErrorKind};
pub use graft_vm::{
    CoercionError, ConstructError, Instance, NoopTracer, PrintTracer, RuntimeError, Tracer,
    TypeBuilder, TypeRegistry, Value, deep_eq,
};

/// Errors from any stage of the pipeline.
///
/// Every variant is unrecoverable for the current document: the input is a
/// fixed artifact, so callers should fail the enclosing operation rather
/// than retry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
