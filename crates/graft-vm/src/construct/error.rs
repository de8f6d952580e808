//! Errors raised by the construction layer.

/// Type-name resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("unknown type name `{0}`")]
    Unknown(String),

    #[error("malformed generic argument list in `{0}`")]
    MalformedGenerics(String),

    #[error("`{name}` expects {expected} generic argument(s), found {found}")]
    GenericArity {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// A literal or staged value cannot convert to a required type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoercionError {
    #[error("cannot coerce {value} to `{target}`")]
    Incompatible { value: String, target: String },

    #[error("integer {value} is out of range for `{target}`")]
    OutOfRange { value: String, target: String },

    #[error("null is not valid for `{target}`")]
    NullPrimitive { target: String },
}

/// Instance construction failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConstructError {
    /// No constructor matched the argument count and coercions. Names the
    /// target type and the rendered argument values.
    #[error("no constructor of `{type_name}` matches arguments ({args})")]
    NoMatch { type_name: String, args: String },

    #[error("`{type_name}` has no method `{method}`")]
    UnknownMethod { type_name: String, method: String },

    #[error(transparent)]
    Type(#[from] TypeError),

    /// Failure signalled by a user-registered constructor or method body.
    #[error("{0}")]
    Custom(String),
}
