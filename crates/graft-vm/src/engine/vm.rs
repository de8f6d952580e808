//! The stack machine.
//!
//! One forward pass over the instruction stream - O(instructions) time,
//! O(open-scope depth) auxiliary memory, no lookahead. DEFINE's explicit
//! argument count and the strict LIST_START/LIST_END pairing are what make
//! the single pass possible.

use std::collections::HashSet;
use std::rc::Rc;
use std::cell::RefCell;

use graft_bytecode::{ArgShape, Instruction, Opcode};
use graft_core::escape::{is_quoted, unquote};
use graft_core::{Interner, Symbol};
use indexmap::IndexMap;

use crate::construct::{ResolvedType, TypeRegistry, coerce};
use crate::value::{MapData, Sequence, Value};

use super::error::RuntimeError;
use super::patch::{Deferred, ListFrame, Patch};
use super::trace::{NoopTracer, Tracer};

/// How an operand resolved: a usable value now, or a dispatched reference
/// against a not-yet-closed instance.
enum Operand {
    Ready(Value),
    Deferred(Symbol),
}

/// Execution state for one run. Create a fresh machine per document;
/// concurrent executions each own an independent one (only the registry's
/// type cache is shared).
pub struct VM<'r> {
    registry: &'r TypeRegistry,
    /// Id-token interner; symbols index the tables below.
    ids: Interner,
    /// Instance table: entries added once on DEFINE, never removed.
    instances: IndexMap<Symbol, Value>,
    /// Ids whose scope has closed (END executed). Only these are readable
    /// by `_ref`; anything else dispatches.
    closed: HashSet<Symbol>,
    /// Instance-id stack: currently-open definition scopes.
    open: Vec<Symbol>,
    /// Value stack: literals and finished collections staged for `_stack()`.
    values: Vec<Value>,
    /// List-builder stack.
    frames: Vec<ListFrame>,
    /// Dispatched references awaiting their target's END.
    pending: Vec<Deferred>,
}

impl<'r> VM<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            ids: Interner::new(),
            instances: IndexMap::new(),
            closed: HashSet::new(),
            open: Vec::new(),
            values: Vec::new(),
            frames: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Execute an instruction stream to its RET.
    ///
    /// Convenience wrapper using `NoopTracer`, which compiles away.
    pub fn execute(self, instructions: &[Instruction]) -> Result<Value, RuntimeError> {
        self.execute_with(instructions, &mut NoopTracer)
    }

    /// Execute with a tracer for debugging.
    pub fn execute_with<T: Tracer>(
        mut self,
        instructions: &[Instruction],
        tracer: &mut T,
    ) -> Result<Value, RuntimeError> {
        for (index, instruction) in instructions.iter().enumerate() {
            tracer.trace_instruction(index, instruction);
            match instruction.opcode() {
                Opcode::Push => self.exec_push(instruction)?,
                Opcode::Define => self.exec_define(instruction, tracer)?,
                Opcode::Set => self.exec_set(instruction, tracer)?,
                Opcode::Call => self.exec_call(instruction)?,
                Opcode::ListStart => self.exec_list_start(instruction)?,
                Opcode::Element => self.exec_element(instruction, tracer)?,
                Opcode::ListEnd => self.exec_list_end(instruction)?,
                Opcode::End => self.exec_end(instruction, tracer)?,
                Opcode::Ret => return self.exec_ret(instruction),
            }
        }
        Err(RuntimeError::MissingReturn)
    }

    fn exec_push(&mut self, instruction: &Instruction) -> Result<(), RuntimeError> {
        let raw = req(instruction, 0)?;
        let value = match ArgShape::classify(raw) {
            ArgShape::Null => Value::Null,
            ArgShape::Literal(text) => parse_literal(text)?,
            // References and stack markers have no meaning in PUSH.
            _ => return Err(RuntimeError::Malformed(instruction.to_string())),
        };
        self.values.push(value);
        Ok(())
    }

    fn exec_define<T: Tracer>(
        &mut self,
        instruction: &Instruction,
        tracer: &mut T,
    ) -> Result<(), RuntimeError> {
        let type_text = req(instruction, 0)?;
        let id_token = req(instruction, 1)?;
        let argc: usize = req(instruction, 2)?
            .parse()
            .map_err(|_| RuntimeError::Malformed(instruction.to_string()))?;

        if argc > self.values.len() {
            return Err(RuntimeError::StackUnderflow);
        }
        // The tail of the stack is the arguments in original push order.
        let args = self.values.split_off(self.values.len() - argc);

        let sym = self.ids.intern(id_token);
        if self.instances.contains_key(&sym) {
            return Err(RuntimeError::DuplicateDefine(id_token.to_string()));
        }

        let ty = self.registry.resolve(type_text)?;
        let value = self.registry.construct(&ty, &args)?;
        self.instances.insert(sym, value);
        self.open.push(sym);
        tracer.trace_define(id_token);
        Ok(())
    }

    fn exec_set<T: Tracer>(
        &mut self,
        instruction: &Instruction,
        tracer: &mut T,
    ) -> Result<(), RuntimeError> {
        let field = req(instruction, 0)?;
        let raw = req(instruction, 1)?;

        let owner_sym = *self.open.last().ok_or(RuntimeError::NoOpenScope)?;
        let owner = match self.instances.get(&owner_sym) {
            Some(Value::Object(obj)) => obj.clone(),
            Some(_) => return Err(RuntimeError::OwnerNotObject),
            None => return Err(RuntimeError::Malformed(instruction.to_string())),
        };

        // Resolve against the member's declared type, when the type
        // declares one; undeclared members take the value as-is.
        let declared = {
            let handle = owner.borrow().handle();
            self.registry.member_type(handle, field).map(str::to_string)
        };
        let expected = match &declared {
            Some(text) => Some(self.registry.resolve(text)?),
            None => None,
        };

        match self.resolve_operand(raw, expected.as_ref())? {
            Operand::Ready(value) => owner.borrow_mut().set(field, value),
            Operand::Deferred(target) => {
                owner.borrow_mut().set(field, Value::Null);
                self.pending.push(Deferred {
                    target,
                    patch: Patch::Field {
                        owner: owner.clone(),
                        field: field.to_string(),
                    },
                });
                tracer.trace_defer(self.ids.resolve(target));
            }
        }
        Ok(())
    }

    fn exec_call(&mut self, instruction: &Instruction) -> Result<(), RuntimeError> {
        let method = req(instruction, 0)?;
        let argc: usize = req(instruction, 1)?
            .parse()
            .map_err(|_| RuntimeError::Malformed(instruction.to_string()))?;

        if argc > self.values.len() {
            return Err(RuntimeError::StackUnderflow);
        }
        let args = self.values.split_off(self.values.len() - argc);

        let owner_sym = *self.open.last().ok_or(RuntimeError::NoOpenScope)?;
        let owner = match self.instances.get(&owner_sym) {
            Some(Value::Object(obj)) => obj.clone(),
            Some(_) => return Err(RuntimeError::OwnerNotObject),
            None => return Err(RuntimeError::Malformed(instruction.to_string())),
        };

        let handle = owner.borrow().handle();
        self.registry
            .invoke_method(handle, method, &mut owner.borrow_mut(), &args)?;
        Ok(())
    }

    fn exec_list_start(&mut self, instruction: &Instruction) -> Result<(), RuntimeError> {
        let type_args = instruction.args();
        if type_args.is_empty() || type_args.len() > 2 {
            return Err(RuntimeError::ListArity(type_args.len()));
        }
        let types = type_args
            .iter()
            .map(|t| self.registry.resolve(t))
            .collect::<Result<Vec<_>, _>>()?;
        self.frames.push(ListFrame::new(types));
        Ok(())
    }

    fn exec_element<T: Tracer>(
        &mut self,
        instruction: &Instruction,
        tracer: &mut T,
    ) -> Result<(), RuntimeError> {
        let raw = req(instruction, 0)?;
        let expected = self
            .frames
            .last()
            .ok_or(RuntimeError::NoOpenList)?
            .next_item_type()
            .clone();

        match self.resolve_operand(raw, Some(&expected))? {
            Operand::Ready(value) => {
                let frame = self.frames.last_mut().ok_or(RuntimeError::NoOpenList)?;
                frame.items.push(value);
            }
            Operand::Deferred(target) => {
                let frame = self.frames.last_mut().ok_or(RuntimeError::NoOpenList)?;
                let index = frame.items.len();
                frame.items.push(Value::Null);
                frame.deferred.push((target, index));
                tracer.trace_defer(self.ids.resolve(target));
            }
        }
        Ok(())
    }

    fn exec_list_end(&mut self, _instruction: &Instruction) -> Result<(), RuntimeError> {
        let mut frame = self.frames.pop().ok_or(RuntimeError::UnbalancedListEnd)?;

        if frame.types.len() == 1 {
            let item_type = frame.types.pop().ok_or(RuntimeError::UnbalancedListEnd)?;
            let seq = Rc::new(RefCell::new(Sequence {
                item_type,
                items: frame.items,
            }));
            for (target, index) in frame.deferred {
                self.pending.push(Deferred {
                    target,
                    patch: Patch::SeqSlot {
                        seq: seq.clone(),
                        index,
                    },
                });
            }
            self.values.push(Value::Seq(seq));
            return Ok(());
        }

        // Two declared types: consecutive elements pair into map entries.
        if frame.items.len() % 2 != 0 {
            return Err(RuntimeError::OddMapElements(frame.items.len()));
        }
        let value_type = frame.types.pop().ok_or(RuntimeError::UnbalancedListEnd)?;
        let key_type = frame.types.pop().ok_or(RuntimeError::UnbalancedListEnd)?;

        let mut entries = Vec::with_capacity(frame.items.len() / 2);
        let mut items = frame.items.into_iter();
        while let (Some(key), Some(value)) = (items.next(), items.next()) {
            entries.push((key, value));
        }
        let map = Rc::new(RefCell::new(MapData {
            key_type,
            value_type,
            entries,
        }));
        for (target, index) in frame.deferred {
            let patch = if index % 2 == 0 {
                Patch::MapKey {
                    map: map.clone(),
                    entry: index / 2,
                }
            } else {
                Patch::MapValue {
                    map: map.clone(),
                    entry: index / 2,
                }
            };
            self.pending.push(Deferred { target, patch });
        }
        self.values.push(Value::Map(map));
        Ok(())
    }

    fn exec_end<T: Tracer>(
        &mut self,
        instruction: &Instruction,
        tracer: &mut T,
    ) -> Result<(), RuntimeError> {
        let id_token = req(instruction, 0)?;
        let sym = self.ids.intern(id_token);

        match self.open.pop() {
            Some(top) if top == sym => {}
            Some(top) => {
                return Err(RuntimeError::ScopeMismatch {
                    expected: self.ids.resolve(top).to_string(),
                    found: id_token.to_string(),
                });
            }
            None => return Err(RuntimeError::EndWithoutScope(id_token.to_string())),
        }
        self.closed.insert(sym);

        // The target is now readable: land every dispatched reference
        // waiting on it and discard them.
        let value = self
            .instances
            .get(&sym)
            .cloned()
            .ok_or_else(|| RuntimeError::Malformed(instruction.to_string()))?;
        let mut resolved = 0usize;
        let pending = std::mem::take(&mut self.pending);
        for deferred in pending {
            if deferred.target == sym {
                deferred.patch.apply(value.clone());
                resolved += 1;
            } else {
                self.pending.push(deferred);
            }
        }
        tracer.trace_close(id_token, resolved);
        Ok(())
    }

    fn exec_ret(mut self, instruction: &Instruction) -> Result<Value, RuntimeError> {
        let raw = req(instruction, 0)?;
        let value = match ArgShape::classify(raw) {
            ArgShape::Stack => self.values.pop().ok_or(RuntimeError::StackUnderflow)?,
            ArgShape::Ref(token) | ArgShape::Literal(token) => {
                let sym = self.ids.intern(token);
                self.instances
                    .get(&sym)
                    .cloned()
                    .ok_or_else(|| RuntimeError::UnknownReturnId(token.to_string()))?
            }
            _ => return Err(RuntimeError::Malformed(instruction.to_string())),
        };

        if !self.pending.is_empty() {
            let first = self.ids.resolve(self.pending[0].target).to_string();
            return Err(RuntimeError::UnresolvedReferences {
                count: self.pending.len(),
                first,
            });
        }
        Ok(value)
    }

    /// Resolve a SET/ELEMENT/RET operand against an optional expected type.
    ///
    /// `_stack()` pops the value stack; a literal is parsed and coerced;
    /// `_ref(id)` reads the instance table iff the target's scope has
    /// closed, and dispatches otherwise - a reference to an unbuilt object
    /// is never an error here. Deferred values skip coercion: their type is
    /// unknowable until the target closes.
    fn resolve_operand(
        &mut self,
        raw: &str,
        expected: Option<&ResolvedType>,
    ) -> Result<Operand, RuntimeError> {
        match ArgShape::classify(raw) {
            ArgShape::Stack => {
                let value = self.values.pop().ok_or(RuntimeError::StackUnderflow)?;
                Ok(Operand::Ready(self.finish(value, expected)?))
            }
            ArgShape::Ref(token) => {
                let sym = self.ids.intern(token);
                if self.closed.contains(&sym) {
                    let value = self
                        .instances
                        .get(&sym)
                        .cloned()
                        .ok_or_else(|| RuntimeError::BadLiteral(raw.to_string()))?;
                    Ok(Operand::Ready(self.finish(value, expected)?))
                } else {
                    Ok(Operand::Deferred(sym))
                }
            }
            ArgShape::Null => Ok(Operand::Ready(self.finish(Value::Null, expected)?)),
            ArgShape::Default => Ok(Operand::Ready(match expected {
                Some(ty) => ty.default_value(),
                None => Value::Null,
            })),
            ArgShape::Literal(text) => {
                let value = parse_literal(text)?;
                Ok(Operand::Ready(self.finish(value, expected)?))
            }
        }
    }

    fn finish(
        &self,
        value: Value,
        expected: Option<&ResolvedType>,
    ) -> Result<Value, RuntimeError> {
        match expected {
            Some(ty) => Ok(coerce(&value, ty)?),
            None => Ok(value),
        }
    }
}

/// Parse a literal wire token: quoted string, boolean, integer, decimal, or
/// bare word (kept as text).
fn parse_literal(text: &str) -> Result<Value, RuntimeError> {
    if is_quoted(text) {
        return unquote(text)
            .map(Value::Str)
            .ok_or_else(|| RuntimeError::BadLiteral(text.to_string()));
    }
    match text {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::Int(i));
    }
    if let Ok(f) = text.parse::<f64>() {
        return Ok(Value::Float(f));
    }
    Ok(Value::Str(text.to_string()))
}

fn req<'a>(instruction: &'a Instruction, index: usize) -> Result<&'a str, RuntimeError> {
    instruction
        .arg(index)
        .ok_or_else(|| RuntimeError::Malformed(instruction.to_string()))
}
