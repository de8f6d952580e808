//! Stack-machine executor for Graft instruction streams.
//!
//! This crate provides the runtime half of the pipeline:
//! - `engine` - the single-pass stack machine that replays an instruction
//!   stream into a live object graph, deferring forward references until
//!   their target's scope closes
//! - `construct` - the dynamic construction layer: a registry of type
//!   definitions with ordered constructors, type-expression resolution
//!   (nested generics included), and literal coercion
//! - `value` - the runtime value graph the machine builds

pub mod construct;
pub mod engine;
pub mod value;

// Re-export commonly used items at crate root
pub use construct::{
    CoercionError, ConstructError, Primitive, ResolvedType, TypeBuilder, TypeError, TypeHandle,
    TypeRegistry, coerce,
};
pub use engine::{NoopTracer, PrintTracer, RuntimeError, Tracer, VM};
pub use value::{Instance, MapData, ObjRef, Sequence, Value, deep_eq};
