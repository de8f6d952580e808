//! The execution engine: a single-pass stack machine over instruction
//! streams.
//!
//! Execution state (instance table, value stack, instance-id stack,
//! list-builder stack, pending dispatched references) lives for exactly one
//! top-level run: one document in, one root value out. Forward references
//! resolve lazily at the *target's own* END rather than via a second global
//! pass, which is what makes self-references and references to unfinished
//! ancestors work.

mod error;
mod patch;
mod trace;
mod vm;

#[cfg(test)]
mod vm_tests;

pub use error::RuntimeError;
pub use trace::{NoopTracer, PrintTracer, Tracer};
pub use vm::VM;
