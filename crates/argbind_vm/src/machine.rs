//! The stack machine.

use crate::error::RuntimeError;
use crate::send::dispatch;
use crate::value::{HashKey, Object, Value};
use argbind_ir::{Instruction, Op};
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::{debug, trace};

/// Local variables of one scope, in assignment order.
pub type Scope = IndexMap<String, Value, FxBuildHasher>;

/// Executes instruction streams against a value stack, a chain of local
/// scopes, global variables and a `self` object.
pub struct Machine {
    stack: Vec<Value>,
    /// Outermost first.
    scopes: Vec<Scope>,
    globals: FxHashMap<String, Value>,
    self_value: Value,
    argc: u32,
}

impl Machine {
    /// A machine with one empty scope and a plain `main` object as `self`.
    pub fn new() -> Self {
        Self::with_self(Value::object(Object::new("main")))
    }

    pub fn with_self(self_value: Value) -> Self {
        Self {
            stack: Vec::new(),
            scopes: vec![Scope::default()],
            globals: FxHashMap::default(),
            self_value,
            argc: 0,
        }
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Run a parameter-binding stream against call-time arguments.
    pub fn bind_arguments(&mut self, stream: &[Instruction], args: Vec<Value>) -> Result<(), RuntimeError> {
        let depth = self.stack.len();
        self.stack.push(Value::array(args));
        self.execute(stream)?;
        self.check_balanced(depth)
    }

    /// Run a multiple-assignment stream with `value` as the right-hand side.
    pub fn assign(&mut self, stream: &[Instruction], value: &Value) -> Result<(), RuntimeError> {
        let depth = self.stack.len();
        self.stack.push(value.splat_array());
        self.execute(stream)?;
        self.check_balanced(depth)
    }

    /// Execute `stream` on the current stack.
    pub fn execute(&mut self, stream: &[Instruction]) -> Result<(), RuntimeError> {
        debug!(instructions = stream.len(), "executing stream");
        let jumps = block_targets(stream)?;
        let mut pc = 0;
        while pc < stream.len() {
            let op = &stream[pc].op;
            trace!(pc, %op, depth = self.stack.len());
            match op {
                Op::If => {
                    if !self.pop(pc)?.truthy() {
                        pc = jumps[pc] + 1;
                        continue;
                    }
                }
                Op::Else => {
                    pc = jumps[pc] + 1;
                    continue;
                }
                Op::End => {}
                op => self.step(op, pc)?,
            }
            pc += 1;
        }
        Ok(())
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Look a local up from the innermost scope outwards.
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Define a local in the innermost scope.
    pub fn define_local(&mut self, name: &str, value: Value) {
        self.innermost().insert(name.to_string(), value);
    }

    /// The innermost scope's locals, in assignment order.
    pub fn locals(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.scopes
            .last()
            .into_iter()
            .flat_map(|scope| scope.iter().map(|(k, v)| (k.as_str(), v)))
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn self_value(&self) -> &Value {
        &self.self_value
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    fn innermost(&mut self) -> &mut Scope {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::default());
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn check_balanced(&self, depth: usize) -> Result<(), RuntimeError> {
        if self.stack.len() != depth {
            return Err(RuntimeError::UnbalancedStack {
                extra: self.stack.len() as isize - depth as isize,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Instructions
    // ========================================================================

    fn step(&mut self, op: &Op, pc: usize) -> Result<(), RuntimeError> {
        match op {
            Op::PushNil => self.stack.push(Value::Nil),
            Op::PushTrue => self.stack.push(Value::Bool(true)),
            Op::PushFalse => self.stack.push(Value::Bool(false)),
            Op::PushInt(n) => self.stack.push(Value::Integer(*n)),
            Op::PushString(s) => self.stack.push(Value::string(s)),
            Op::PushSymbol(s) => self.stack.push(Value::symbol(s)),
            Op::PushSelf => self.stack.push(self.self_value.clone()),

            Op::CreateArray { count } => {
                let items = self.pop_n(*count as usize, pc)?;
                self.stack.push(Value::array(items));
            }
            Op::CreateHash { count } => {
                let flat = self.pop_n(*count as usize * 2, pc)?;
                let mut entries = IndexMap::with_capacity(*count as usize);
                for pair in flat.chunks(2) {
                    entries.insert(pair[0].to_key()?, pair[1].clone());
                }
                self.stack.push(Value::hash(entries));
            }

            Op::VariableGet { name } => {
                let value = self
                    .local(name)
                    .cloned()
                    .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() })?;
                self.stack.push(value);
            }
            Op::VariableSet { name, local_only } => {
                let value = self.pop(pc)?;
                self.set_local(name, value, *local_only);
            }
            Op::InstanceVariableGet { name } => {
                let value = match &self.self_value {
                    Value::Object(object) => object.borrow().ivars.get(name).cloned().unwrap_or(Value::Nil),
                    _ => Value::Nil,
                };
                self.stack.push(value);
            }
            Op::InstanceVariableSet { name } => {
                let value = self.pop(pc)?;
                match &self.self_value {
                    Value::Object(object) => {
                        object.borrow_mut().ivars.insert(name.clone(), value);
                    }
                    other => {
                        return Err(RuntimeError::TypeError {
                            message: format!("can't modify instance variables of {}", other.class_name()),
                        })
                    }
                }
            }
            Op::GlobalVariableGet { name } => {
                let value = self.globals.get(name).cloned().unwrap_or(Value::Nil);
                self.stack.push(value);
            }
            Op::GlobalVariableSet { name } => {
                let value = self.pop(pc)?;
                self.globals.insert(name.clone(), value);
            }

            Op::Dup => {
                let top = self.peek(pc)?.clone();
                self.stack.push(top);
            }
            Op::Pop => {
                self.pop(pc)?;
            }

            Op::ArrayShift => {
                let value = self.with_sequence(pc, |items| {
                    if items.is_empty() {
                        Value::Nil
                    } else {
                        items.remove(0)
                    }
                })?;
                self.stack.push(value);
            }
            Op::ArrayPop => {
                let value = self.with_sequence(pc, |items| items.pop().unwrap_or(Value::Nil))?;
                self.stack.push(value);
            }
            Op::ArrayIsEmpty => {
                let empty = self.with_sequence(pc, |items| items.is_empty())?;
                self.stack.push(Value::Bool(empty));
            }
            Op::ToArray => {
                let value = self.pop(pc)?;
                self.stack.push(value.coerce_to_array()?);
            }

            Op::StageKeywordHash => {
                let staged = self.with_sequence(pc, |items| {
                    if items.last().is_some_and(Value::is_keyword_hash) {
                        items.pop()
                    } else {
                        None
                    }
                })?;
                // Copy so the caller's hash is never modified.
                let hash = match staged {
                    Some(Value::Hash(entries)) => Value::hash(entries.borrow().clone()),
                    _ => Value::hash(IndexMap::new()),
                };
                self.stack.push(hash);
            }
            Op::HashHasKey { name } => {
                let found = self.with_keywords(pc, |entries| entries.contains_key(&HashKey::symbol(name)))?;
                self.stack.push(Value::Bool(found));
            }
            Op::HashDelete { name } => {
                let value = self
                    .with_keywords(pc, |entries| entries.shift_remove(&HashKey::symbol(name)))?
                    .ok_or_else(|| RuntimeError::MissingKeyword { name: name.clone() })?;
                self.stack.push(value);
            }
            Op::CheckExtraKeywords => {
                let names = self.with_keywords(pc, |entries| {
                    entries
                        .keys()
                        .map(|key| match key.as_symbol() {
                            Some(name) => name.to_string(),
                            None => key.to_value().inspect(),
                        })
                        .collect::<Vec<_>>()
                })?;
                if !names.is_empty() {
                    return Err(RuntimeError::UnknownKeywords { names });
                }
            }

            Op::PushArgc { count } => self.argc = *count,
            Op::Send {
                message,
                attr_assign,
                ..
            } => {
                let receiver = self.pop(pc)?;
                let args = self.pop_n(self.argc as usize, pc)?;
                let result = dispatch(&receiver, message, &args)?;
                if *attr_assign {
                    self.stack.push(args.last().cloned().unwrap_or(Value::Nil));
                } else {
                    self.stack.push(result);
                }
            }

            Op::If | Op::Else | Op::End => {}
        }
        Ok(())
    }

    fn set_local(&mut self, name: &str, value: Value, local_only: bool) {
        if !local_only {
            for scope in self.scopes.iter_mut().rev() {
                if let Some(slot) = scope.get_mut(name) {
                    *slot = value;
                    return;
                }
            }
        }
        self.innermost().insert(name.to_string(), value);
    }

    fn pop(&mut self, pc: usize) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow { pc })
    }

    fn peek(&self, pc: usize) -> Result<&Value, RuntimeError> {
        self.stack.last().ok_or(RuntimeError::StackUnderflow { pc })
    }

    /// Pop `n` values, returned in push order.
    fn pop_n(&mut self, n: usize, pc: usize) -> Result<Vec<Value>, RuntimeError> {
        if self.stack.len() < n {
            return Err(RuntimeError::StackUnderflow { pc });
        }
        let at = self.stack.len() - n;
        Ok(self.stack.split_off(at))
    }

    /// Run `f` on the array on top of the stack.
    fn with_sequence<T>(&mut self, pc: usize, f: impl FnOnce(&mut Vec<Value>) -> T) -> Result<T, RuntimeError> {
        match self.peek(pc)? {
            Value::Array(items) => Ok(f(&mut items.borrow_mut())),
            other => Err(RuntimeError::conversion(&other.class_name(), "Array")),
        }
    }

    /// Run `f` on the hash on top of the stack.
    fn with_keywords<T>(
        &mut self,
        pc: usize,
        f: impl FnOnce(&mut IndexMap<HashKey, Value>) -> T,
    ) -> Result<T, RuntimeError> {
        match self.peek(pc)? {
            Value::Hash(entries) => Ok(f(&mut entries.borrow_mut())),
            other => Err(RuntimeError::conversion(&other.class_name(), "Hash")),
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

/// For each `if`, the index of its `else` (or `end` when there is none); for
/// each `else`, the index of its `end`. Other entries are unused.
fn block_targets(stream: &[Instruction]) -> Result<Vec<usize>, RuntimeError> {
    let mut targets = vec![0; stream.len()];
    let mut open: Vec<(usize, Option<usize>)> = Vec::new();
    for (pc, instruction) in stream.iter().enumerate() {
        match instruction.op {
            Op::If => open.push((pc, None)),
            Op::Else => match open.last_mut() {
                Some((_, slot @ None)) => *slot = Some(pc),
                _ => return Err(RuntimeError::MalformedBlock { op: "else", pc }),
            },
            Op::End => match open.pop() {
                Some((if_pc, Some(else_pc))) => {
                    targets[if_pc] = else_pc;
                    targets[else_pc] = pc;
                }
                Some((if_pc, None)) => targets[if_pc] = pc,
                None => return Err(RuntimeError::MalformedBlock { op: "end", pc }),
            },
            _ => {}
        }
    }
    if let Some((pc, _)) = open.pop() {
        return Err(RuntimeError::MalformedBlock { op: "if", pc });
    }
    Ok(targets)
}
