//! The runtime value graph.
//!
//! Collections and instances sit behind shared mutable cells so a deferred
//! reference can land *after* its container has already been consumed (set
//! into a field, staged on the value stack, or returned). Cyclic graphs are
//! plain `Rc` cycles: one document produces one caller-owned graph, and the
//! cycles are deliberately left uncollected.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use graft_core::escape::quote;

use crate::construct::{ResolvedType, TypeHandle};

pub type ObjRef = Rc<RefCell<Instance>>;
pub type SeqRef = Rc<RefCell<Sequence>>;
pub type MapRef = Rc<RefCell<MapData>>;

/// A value produced by executing an instruction stream.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(SeqRef),
    Map(MapRef),
    Object(ObjRef),
}

/// A single-item-type collection, built by a list literal.
pub struct Sequence {
    pub item_type: ResolvedType,
    pub items: Vec<Value>,
}

/// A key/value collection, built by a two-type list literal.
pub struct MapData {
    pub key_type: ResolvedType,
    pub value_type: ResolvedType,
    pub entries: Vec<(Value, Value)>,
}

/// A dynamic instance: type identity plus an ordered field map.
pub struct Instance {
    handle: TypeHandle,
    type_name: String,
    fields: IndexMap<String, Value>,
}

impl Instance {
    pub fn new(handle: TypeHandle, type_name: String) -> Self {
        Self {
            handle,
            type_name,
            fields: IndexMap::new(),
        }
    }

    #[inline]
    pub fn handle(&self) -> TypeHandle {
        self.handle
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Cloned field value; `Null` for an absent field.
    pub fn field(&self, field: &str) -> Value {
        self.fields.get(field).cloned().unwrap_or(Value::Null)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

impl Value {
    pub fn object(instance: Instance) -> Self {
        Self::Object(Rc::new(RefCell::new(instance)))
    }

    pub fn empty_seq(item_type: ResolvedType) -> Self {
        Self::Seq(Rc::new(RefCell::new(Sequence {
            item_type,
            items: Vec::new(),
        })))
    }

    pub fn empty_map(key_type: ResolvedType, value_type: ResolvedType) -> Self {
        Self::Map(Rc::new(RefCell::new(MapData {
            key_type,
            value_type,
            entries: Vec::new(),
        })))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&SeqRef> {
        match self {
            Self::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Whether two values are the same object instance (not merely equal).
    pub fn same_object(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }

    /// Shallow rendering for error messages: primitives verbatim, strings
    /// quoted, containers summarized by type and length.
    pub fn render(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => quote(s),
            Self::Seq(s) => {
                let s = s.borrow();
                format!("List<{}> of {}", s.item_type, s.items.len())
            }
            Self::Map(m) => {
                let m = m.borrow();
                format!("Map<{},{}> of {}", m.key_type, m.value_type, m.entries.len())
            }
            Self::Object(o) => o.borrow().type_name().to_string(),
        }
    }
}

impl std::fmt::Debug for Value {
    /// Shallow on purpose: the graph may be cyclic.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Deep structural equality over two value graphs.
///
/// Cycle-safe: object/collection pairs already under comparison are assumed
/// equal on re-entry, so two isomorphic cyclic graphs compare equal and the
/// walk always terminates. Distinct instances with equal contents compare
/// equal - use [`Value::same_object`] for identity.
pub fn deep_eq(a: &Value, b: &Value) -> bool {
    deep_eq_in(a, b, &mut Vec::new())
}

fn deep_eq_in(a: &Value, b: &Value, visited: &mut Vec<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Seq(x), Value::Seq(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let pair = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
            if visited.contains(&pair) {
                return true;
            }
            visited.push(pair);
            let x = x.borrow();
            let y = y.borrow();
            x.item_type == y.item_type
                && x.items.len() == y.items.len()
                && x.items
                    .iter()
                    .zip(&y.items)
                    .all(|(u, v)| deep_eq_in(u, v, visited))
        }
        (Value::Map(x), Value::Map(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let pair = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
            if visited.contains(&pair) {
                return true;
            }
            visited.push(pair);
            let x = x.borrow();
            let y = y.borrow();
            x.key_type == y.key_type
                && x.value_type == y.value_type
                && x.entries.len() == y.entries.len()
                && x.entries.iter().zip(&y.entries).all(|((uk, uv), (vk, vv))| {
                    deep_eq_in(uk, vk, visited) && deep_eq_in(uv, vv, visited)
                })
        }
        (Value::Object(x), Value::Object(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let pair = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
            if visited.contains(&pair) {
                return true;
            }
            visited.push(pair);
            let x = x.borrow();
            let y = y.borrow();
            x.handle() == y.handle()
                && x.field_count() == y.field_count()
                && x.fields()
                    .zip(y.fields())
                    .all(|((xf, xv), (yf, yv))| xf == yf && deep_eq_in(xv, yv, visited))
        }
        _ => false,
    }
}
