//! Errors that can occur during instruction execution.
//!
//! Every one of these is unrecoverable for the current document: the engine
//! never attempts partial reconstruction or skip-and-continue.

use crate::construct::{CoercionError, ConstructError, TypeError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Construct(#[from] ConstructError),

    /// An instruction with missing or unusable arguments.
    #[error("malformed instruction `{0}`")]
    Malformed(String),

    #[error("malformed literal `{0}`")]
    BadLiteral(String),

    #[error("duplicate DEFINE for id `{0}`")]
    DuplicateDefine(String),

    #[error("SET outside any open definition scope")]
    NoOpenScope,

    #[error("member values require an object owner")]
    OwnerNotObject,

    #[error("ELEMENT outside any open list")]
    NoOpenList,

    #[error("LIST_END without a matching LIST_START")]
    UnbalancedListEnd,

    #[error("LIST_START expects one or two item types, found {0}")]
    ListArity(usize),

    #[error("map literal has an odd element count ({0})")]
    OddMapElements(usize),

    #[error("END `{found}` does not match the open scope `{expected}`")]
    ScopeMismatch { expected: String, found: String },

    #[error("END `{0}` without a matching DEFINE")]
    EndWithoutScope(String),

    #[error("value stack underflow")]
    StackUnderflow,

    #[error("RET references unknown id `{0}`")]
    UnknownReturnId(String),

    #[error("{count} dispatched reference(s) unresolved at return (first target `{first}`)")]
    UnresolvedReferences { count: usize, first: String },

    #[error("instruction stream ended without RET")]
    MissingReturn,
}
