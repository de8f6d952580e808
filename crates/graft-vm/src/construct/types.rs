//! Type expressions and their textual form.
//!
//! A type description arrives as text (`int`, `Map<string,List<int>>`,
//! `Pair<int,int>`), written by whoever authored the notation. Parsing
//! splits the outermost `<...>` and recursively resolves each comma-separated
//! generic argument with bracket-depth-aware splitting - a naive comma split
//! breaks on nested generics.

use crate::construct::error::TypeError;
use crate::value::Value;

/// A lightweight handle to a registered type definition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TypeHandle(pub(crate) u32);

/// Built-in value types, addressed by keyword alias in the notation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Primitive {
    Bool,
    Int,
    Long,
    Float,
    Double,
    Str,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "string" => Self::Str,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Str => "string",
        }
    }

    /// The default value constructed for a zero-argument value type.
    pub fn default_value(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int | Self::Long => Value::Int(0),
            Self::Float | Self::Double => Value::Float(0.0),
            Self::Str => Value::Str(String::new()),
        }
    }
}

/// A fully resolved type identity.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ResolvedType {
    Primitive(Primitive),
    List(Box<ResolvedType>),
    Map(Box<ResolvedType>, Box<ResolvedType>),
    /// A registered type, possibly carrying generic arguments.
    Class {
        handle: TypeHandle,
        name: String,
        args: Vec<ResolvedType>,
    },
}

impl ResolvedType {
    /// The default value of this type: primitive zero values, empty
    /// collections of the declared item type (never null), null for class
    /// references.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Primitive(p) => p.default_value(),
            Self::List(item) => Value::empty_seq((**item).clone()),
            Self::Map(key, value) => Value::empty_map((**key).clone(), (**value).clone()),
            Self::Class { .. } => Value::Null,
        }
    }
}

impl std::fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.name()),
            Self::List(item) => write!(f, "List<{item}>"),
            Self::Map(key, value) => write!(f, "Map<{key},{value}>"),
            Self::Class { name, args, .. } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

/// Split `Name<inner>` into the base name and the raw inner text.
/// `Name` alone yields no inner text.
pub(crate) fn split_outer(text: &str) -> Result<(&str, Option<&str>), TypeError> {
    let Some(open) = text.find('<') else {
        if text.is_empty() || text.contains('>') || text.contains(',') {
            return Err(TypeError::MalformedGenerics(text.to_string()));
        }
        return Ok((text, None));
    };
    let Some(rest) = text[open..].strip_suffix('>') else {
        return Err(TypeError::MalformedGenerics(text.to_string()));
    };
    let base = &text[..open];
    let inner = &rest[1..];
    if base.is_empty() || inner.is_empty() {
        return Err(TypeError::MalformedGenerics(text.to_string()));
    }
    Ok((base, Some(inner)))
}

/// Split a generic argument list on top-level commas only - commas inside
/// nested `<>` are not separators.
pub(crate) fn split_generic_args<'a>(inner: &'a str, full: &str) -> Result<Vec<&'a str>, TypeError> {
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;

    for (i, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth < 0 {
                    return Err(TypeError::MalformedGenerics(full.to_string()));
                }
            }
            ',' if depth == 0 => {
                args.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(TypeError::MalformedGenerics(full.to_string()));
    }
    args.push(&inner[start..]);

    if args.iter().any(|a| a.is_empty()) {
        return Err(TypeError::MalformedGenerics(full.to_string()));
    }
    Ok(args)
}
