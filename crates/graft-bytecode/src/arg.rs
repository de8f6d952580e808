//! Argument-marker classification.
//!
//! Instruction arguments may carry structure the executor resolves late:
//! `_ref(3)` names another instance, `_stack()` consumes the value stack,
//! `null` and `default` are placeholder literals. Everything else is a
//! plain literal token. Classification is purely textual - what a marker
//! *means* is the executor's business.

/// The shape of one instruction argument.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArgShape<'a> {
    /// `_ref(id)` - a reference to another instance by id token.
    Ref(&'a str),
    /// `_stack()` - pop the staged value from the value stack.
    Stack,
    /// `null`.
    Null,
    /// `default` - the target type's default value.
    Default,
    /// Anything else: a literal token (number, quoted string, bare word).
    Literal(&'a str),
}

impl<'a> ArgShape<'a> {
    /// Classify a wire argument token.
    pub fn classify(arg: &'a str) -> Self {
        if arg == "_stack()" {
            return Self::Stack;
        }
        if let Some(inner) = arg.strip_prefix("_ref(").and_then(|r| r.strip_suffix(')'))
            && !inner.is_empty()
        {
            return Self::Ref(inner);
        }
        match arg {
            "null" => Self::Null,
            "default" => Self::Default,
            _ => Self::Literal(arg),
        }
    }
}

/// Render a `_ref(id)` marker for the given id token.
pub fn ref_marker(id: &str) -> String {
    format!("_ref({id})")
}

/// The `_stack()` marker.
pub const STACK_MARKER: &str = "_stack()";

#[cfg(test)]
mod arg_tests {
    use super::*;

    #[test]
    fn classifies_markers() {
        assert_eq!(ArgShape::classify("_stack()"), ArgShape::Stack);
        assert_eq!(ArgShape::classify("_ref(3)"), ArgShape::Ref("3"));
        assert_eq!(ArgShape::classify("_ref(n1)"), ArgShape::Ref("n1"));
        assert_eq!(ArgShape::classify("null"), ArgShape::Null);
        assert_eq!(ArgShape::classify("default"), ArgShape::Default);
    }

    #[test]
    fn everything_else_is_literal() {
        assert_eq!(ArgShape::classify("42"), ArgShape::Literal("42"));
        assert_eq!(ArgShape::classify("\"null\""), ArgShape::Literal("\"null\""));
        assert_eq!(ArgShape::classify("_ref()"), ArgShape::Literal("_ref()"));
        assert_eq!(ArgShape::classify("_refx"), ArgShape::Literal("_refx"));
    }

    #[test]
    fn ref_marker_round_trips() {
        assert_eq!(ArgShape::classify(&ref_marker("p1")), ArgShape::Ref("p1"));
    }
}
