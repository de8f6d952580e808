//! The type registry: name → type definition, built at startup.
//!
//! A type definition carries the declared member types, the ordered
//! constructor list, and any methods. Constructors are plain closures over
//! `(&mut Instance, &[Value])`; the registry creates the instance shell
//! (declared fields at their defaults) and the selected constructor
//! initializes it from the coerced arguments.
//!
//! The registry also owns the type-resolution cache. Resolution is keyed by
//! the whitespace-stripped textual form and the cache is a concurrent map:
//! a registry shared by reference across concurrent executions is the only
//! legitimately shared state in the system.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;

use crate::construct::coerce::coerce;
use crate::construct::error::{ConstructError, TypeError};
use crate::construct::types::{
    Primitive, ResolvedType, TypeHandle, split_generic_args, split_outer,
};
use crate::value::{Instance, Value};

/// Constructor or method body: initializes/mutates an instance from
/// already-coerced arguments.
pub type MemberFn = Arc<dyn Fn(&mut Instance, &[Value]) -> Result<(), ConstructError> + Send + Sync>;

struct Constructor {
    /// Declared parameter types, textual form, positional.
    params: Vec<String>,
    build: MemberFn,
}

struct TypeDef {
    name: String,
    /// Declared member name → declared type text.
    fields: IndexMap<String, String>,
    /// Declaration order is selection order.
    ctors: Vec<Constructor>,
    methods: HashMap<String, MemberFn>,
}

/// Registry of constructible types.
#[derive(Default)]
pub struct TypeRegistry {
    types: Vec<TypeDef>,
    by_name: HashMap<String, TypeHandle>,
    /// Resolution cache, shared across executions; keyed by the
    /// whitespace-stripped type text.
    cache: DashMap<String, ResolvedType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under `name` and configure it through the builder.
    pub fn register(&mut self, name: &str, configure: impl FnOnce(&mut TypeBuilder<'_>)) -> TypeHandle {
        let handle = TypeHandle(self.types.len() as u32);
        self.types.push(TypeDef {
            name: name.to_string(),
            fields: IndexMap::new(),
            ctors: Vec::new(),
            methods: HashMap::new(),
        });
        self.by_name.insert(name.to_string(), handle);

        let def = self.types.last_mut().expect("just pushed");
        let mut builder = TypeBuilder { def };
        configure(&mut builder);
        handle
    }

    pub fn handle(&self, name: &str) -> Option<TypeHandle> {
        self.by_name.get(name).copied()
    }

    pub fn type_name(&self, handle: TypeHandle) -> &str {
        &self.types[handle.0 as usize].name
    }

    /// Declared type text of a member, if the type declares it.
    pub fn member_type(&self, handle: TypeHandle, field: &str) -> Option<&str> {
        self.types[handle.0 as usize]
            .fields
            .get(field)
            .map(String::as_str)
    }

    /// Resolve a textual type description to its canonical identity.
    ///
    /// Results are cached by the whitespace-stripped key; misses are not
    /// cached, so types registered later still resolve.
    pub fn resolve(&self, text: &str) -> Result<ResolvedType, TypeError> {
        let key: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }
        let resolved = self.resolve_key(&key)?;
        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }

    fn resolve_key(&self, key: &str) -> Result<ResolvedType, TypeError> {
        let (base, inner) = split_outer(key)?;
        let args = match inner {
            Some(inner) => split_generic_args(inner, key)?
                .into_iter()
                .map(|a| self.resolve_key(a))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        if let Some(prim) = Primitive::from_name(base) {
            if !args.is_empty() {
                return Err(TypeError::GenericArity {
                    name: base.to_string(),
                    expected: 0,
                    found: args.len(),
                });
            }
            return Ok(ResolvedType::Primitive(prim));
        }

        match base {
            "List" => {
                let mut args = args;
                if args.len() != 1 {
                    return Err(TypeError::GenericArity {
                        name: "List".to_string(),
                        expected: 1,
                        found: args.len(),
                    });
                }
                Ok(ResolvedType::List(Box::new(args.remove(0))))
            }
            "Map" => {
                let mut args = args;
                if args.len() != 2 {
                    return Err(TypeError::GenericArity {
                        name: "Map".to_string(),
                        expected: 2,
                        found: args.len(),
                    });
                }
                let value = args.remove(1);
                let key = args.remove(0);
                Ok(ResolvedType::Map(Box::new(key), Box::new(value)))
            }
            _ => {
                let handle = self
                    .by_name
                    .get(base)
                    .copied()
                    .ok_or_else(|| TypeError::Unknown(base.to_string()))?;
                Ok(ResolvedType::Class {
                    handle,
                    name: base.to_string(),
                    args,
                })
            }
        }
    }

    /// Construct an instance of `ty` from already-resolved argument values.
    ///
    /// Zero arguments on a value type produce its default directly. On a
    /// class type, constructors of matching arity are tried in declaration
    /// order; the first one whose every positional argument coerces is
    /// invoked - no further overload ranking. A class with zero arguments
    /// and no zero-arity constructor gets a bare instance with declared
    /// fields at their defaults.
    pub fn construct(&self, ty: &ResolvedType, args: &[Value]) -> Result<Value, ConstructError> {
        let ResolvedType::Class { handle, .. } = ty else {
            // Value types and collections construct from zero arguments only.
            if args.is_empty() {
                return Ok(ty.default_value());
            }
            return Err(ConstructError::NoMatch {
                type_name: ty.to_string(),
                args: render_args(args),
            });
        };

        let def = &self.types[handle.0 as usize];
        'candidates: for ctor in def.ctors.iter().filter(|c| c.params.len() == args.len()) {
            let mut coerced = Vec::with_capacity(args.len());
            for (arg, param) in args.iter().zip(&ctor.params) {
                let param_type = self.resolve(param)?;
                match coerce(arg, &param_type) {
                    Ok(value) => coerced.push(value),
                    Err(_) => continue 'candidates,
                }
            }
            let mut instance = self.new_instance(*handle)?;
            (ctor.build)(&mut instance, &coerced)?;
            return Ok(Value::object(instance));
        }

        if args.is_empty() {
            return Ok(Value::object(self.new_instance(*handle)?));
        }
        Err(ConstructError::NoMatch {
            type_name: def.name.clone(),
            args: render_args(args),
        })
    }

    /// Invoke a registered method on an instance.
    pub fn invoke_method(
        &self,
        handle: TypeHandle,
        method: &str,
        instance: &mut Instance,
        args: &[Value],
    ) -> Result<(), ConstructError> {
        let def = &self.types[handle.0 as usize];
        let body = def
            .methods
            .get(method)
            .ok_or_else(|| ConstructError::UnknownMethod {
                type_name: def.name.clone(),
                method: method.to_string(),
            })?;
        body(instance, args)
    }

    /// Instance shell: declared fields initialized to their defaults.
    fn new_instance(&self, handle: TypeHandle) -> Result<Instance, ConstructError> {
        let def = &self.types[handle.0 as usize];
        let mut instance = Instance::new(handle, def.name.clone());
        for (field, type_text) in &def.fields {
            let field_type = self.resolve(type_text)?;
            instance.set(field, field_type.default_value());
        }
        Ok(instance)
    }
}

fn render_args(args: &[Value]) -> String {
    args.iter()
        .map(Value::render)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Configuration handle passed to [`TypeRegistry::register`] callbacks.
pub struct TypeBuilder<'a> {
    def: &'a mut TypeDef,
}

impl TypeBuilder<'_> {
    /// Declare a member and its type text.
    pub fn field(&mut self, name: &str, type_text: &str) -> &mut Self {
        self.def.fields.insert(name.to_string(), type_text.to_string());
        self
    }

    /// Declare a constructor. Declaration order is selection order.
    pub fn ctor<F>(&mut self, params: &[&str], build: F) -> &mut Self
    where
        F: Fn(&mut Instance, &[Value]) -> Result<(), ConstructError> + Send + Sync + 'static,
    {
        self.def.ctors.push(Constructor {
            params: params.iter().map(|p| p.to_string()).collect(),
            build: Arc::new(build),
        });
        self
    }

    /// Declare a method, invocable through the CALL opcode.
    pub fn method<F>(&mut self, name: &str, body: F) -> &mut Self
    where
        F: Fn(&mut Instance, &[Value]) -> Result<(), ConstructError> + Send + Sync + 'static,
    {
        self.def.methods.insert(name.to_string(), Arc::new(body));
        self
    }
}
