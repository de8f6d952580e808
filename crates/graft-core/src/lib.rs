//! Core data structures for Graft.
//!
//! This crate contains the pieces shared by every pipeline stage:
//! - `interner` - cheap integer handles for instance-id tokens
//! - `escape` - string-literal quoting shared by the notation and the
//!   bytecode text form

pub mod escape;
pub mod interner;

pub use escape::{quote, unquote};
pub use interner::{Interner, Symbol};
