//! Literal and value coercion.
//!
//! Coercion converts a value to the exact type required by a constructor
//! parameter, declared member, or collection element type: identity if
//! already compatible, primitive text/number coercion otherwise, null
//! permitted for class and collection targets.

use crate::construct::error::CoercionError;
use crate::construct::types::{Primitive, ResolvedType};
use crate::value::Value;

/// Coerce `value` to `target`, or explain why it cannot be done.
///
/// Numeric rules: `int` requires the i32 range, `long` takes any integer;
/// `float`/`double` accept integers and decimals. Text coercion parses a
/// string into the numeric or boolean target. There is no implicit
/// narrowing of decimals to integers and no implicit number-to-string.
pub fn coerce(value: &Value, target: &ResolvedType) -> Result<Value, CoercionError> {
    match target {
        ResolvedType::Primitive(p) => coerce_primitive(value, *p, target),
        ResolvedType::List(item) => match value {
            Value::Null => Ok(Value::Null),
            Value::Seq(seq) if seq.borrow().item_type == **item => Ok(value.clone()),
            _ => Err(incompatible(value, target)),
        },
        ResolvedType::Map(key, val) => match value {
            Value::Null => Ok(Value::Null),
            Value::Map(map) => {
                let m = map.borrow();
                if m.key_type == **key && m.value_type == **val {
                    Ok(value.clone())
                } else {
                    Err(incompatible(value, target))
                }
            }
            _ => Err(incompatible(value, target)),
        },
        ResolvedType::Class { handle, .. } => match value {
            Value::Null => Ok(Value::Null),
            Value::Object(obj) if obj.borrow().handle() == *handle => Ok(value.clone()),
            _ => Err(incompatible(value, target)),
        },
    }
}

fn coerce_primitive(
    value: &Value,
    prim: Primitive,
    target: &ResolvedType,
) -> Result<Value, CoercionError> {
    if value.is_null() {
        return Err(CoercionError::NullPrimitive {
            target: target.to_string(),
        });
    }

    match prim {
        Primitive::Bool => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Str(s) => match s.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(incompatible(value, target)),
            },
            _ => Err(incompatible(value, target)),
        },
        Primitive::Int => match value {
            Value::Int(i) => check_i32(*i, target),
            Value::Str(s) => match s.parse::<i64>() {
                Ok(i) => check_i32(i, target),
                Err(_) => Err(incompatible(value, target)),
            },
            _ => Err(incompatible(value, target)),
        },
        Primitive::Long => match value {
            Value::Int(_) => Ok(value.clone()),
            Value::Str(s) => s
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| incompatible(value, target)),
            _ => Err(incompatible(value, target)),
        },
        Primitive::Float | Primitive::Double => match value {
            Value::Float(_) => Ok(value.clone()),
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            Value::Str(s) => s
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| incompatible(value, target)),
            _ => Err(incompatible(value, target)),
        },
        Primitive::Str => match value {
            Value::Str(_) => Ok(value.clone()),
            _ => Err(incompatible(value, target)),
        },
    }
}

fn check_i32(i: i64, target: &ResolvedType) -> Result<Value, CoercionError> {
    if i32::try_from(i).is_ok() {
        Ok(Value::Int(i))
    } else {
        Err(CoercionError::OutOfRange {
            value: i.to_string(),
            target: target.to_string(),
        })
    }
}

fn incompatible(value: &Value, target: &ResolvedType) -> CoercionError {
    CoercionError::Incompatible {
        value: value.render(),
        target: target.to_string(),
    }
}
