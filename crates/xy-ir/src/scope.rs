//! Lexical scope stack for lowering.
//!
//! Each frame is independent: lookups consult the innermost frame only, so a
//! function body never sees variables of the code that declared it.

use std::collections::HashMap;

use thiserror::Error;

use crate::{BlockRef, SlotId, Value};

/// What a name currently refers to in the active frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Undeclared,
    Declared(SlotId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("scope stack is empty")]
pub struct ScopeUnderflow;

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeFrame {
    /// Block that code lowered in this frame is appended to
    pub target: BlockRef,
    symbols: HashMap<String, SlotId>,
    return_value: Option<Value>,
}

impl ScopeFrame {
    fn new(target: BlockRef) -> Self {
        ScopeFrame {
            target,
            symbols: HashMap::new(),
            return_value: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: BlockRef) {
        self.frames.push(ScopeFrame::new(target));
    }

    pub fn pop(&mut self) -> Result<ScopeFrame, ScopeUnderflow> {
        self.frames.pop().ok_or(ScopeUnderflow)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn active(&self) -> Result<&ScopeFrame, ScopeUnderflow> {
        self.frames.last().ok_or(ScopeUnderflow)
    }

    fn active_mut(&mut self) -> Result<&mut ScopeFrame, ScopeUnderflow> {
        self.frames.last_mut().ok_or(ScopeUnderflow)
    }

    /// Target block of the active frame.
    pub fn target(&self) -> Result<BlockRef, ScopeUnderflow> {
        Ok(self.active()?.target)
    }

    /// Binds `name` in the active frame. A second declaration of the same
    /// name replaces the first.
    pub fn declare(&mut self, name: &str, slot: SlotId) -> Result<(), ScopeUnderflow> {
        self.active_mut()?.symbols.insert(name.to_string(), slot);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Binding, ScopeUnderflow> {
        Ok(match self.active()?.symbols.get(name) {
            Some(slot) => Binding::Declared(*slot),
            None => Binding::Undeclared,
        })
    }

    pub fn set_return_value(&mut self, value: Value) -> Result<(), ScopeUnderflow> {
        self.active_mut()?.return_value = Some(value);
        Ok(())
    }

    pub fn return_value(&self) -> Result<Option<Value>, ScopeUnderflow> {
        Ok(self.active()?.return_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockId, FuncId};

    fn block(func: usize) -> BlockRef {
        BlockRef {
            func: FuncId(func),
            block: BlockId(0),
        }
    }

    #[test]
    fn test_push_and_pop() {
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.pop(), Err(ScopeUnderflow));

        scopes.push(block(0));
        scopes.push(block(1));
        assert_eq!(scopes.depth(), 2);
        assert_eq!(scopes.target(), Ok(block(1)));

        let frame = scopes.pop().unwrap();
        assert_eq!(frame.target, block(1));
        assert_eq!(scopes.target(), Ok(block(0)));
    }

    #[test]
    fn test_lookup_is_innermost_only() {
        let mut scopes = ScopeStack::new();
        scopes.push(block(0));
        scopes.declare("x", SlotId(0)).unwrap();
        assert_eq!(scopes.resolve("x"), Ok(Binding::Declared(SlotId(0))));

        scopes.push(block(1));
        assert_eq!(scopes.resolve("x"), Ok(Binding::Undeclared));

        scopes.pop().unwrap();
        assert_eq!(scopes.resolve("x"), Ok(Binding::Declared(SlotId(0))));
    }

    #[test]
    fn test_redeclaration_overwrites() {
        let mut scopes = ScopeStack::new();
        scopes.push(block(0));
        scopes.declare("x", SlotId(0)).unwrap();
        scopes.declare("x", SlotId(4)).unwrap();
        assert_eq!(scopes.resolve("x"), Ok(Binding::Declared(SlotId(4))));
    }

    #[test]
    fn test_return_value_is_per_frame() {
        let mut scopes = ScopeStack::new();
        scopes.push(block(0));
        scopes.set_return_value(Value::Const(1)).unwrap();

        scopes.push(block(1));
        assert_eq!(scopes.return_value(), Ok(None));
        scopes.set_return_value(Value::Const(2)).unwrap();
        scopes.set_return_value(Value::Const(3)).unwrap();
        assert_eq!(scopes.return_value(), Ok(Some(Value::Const(3))));

        scopes.pop().unwrap();
        assert_eq!(scopes.return_value(), Ok(Some(Value::Const(1))));
    }

    #[test]
    fn test_operations_on_empty_stack() {
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.resolve("x"), Err(ScopeUnderflow));
        assert_eq!(scopes.declare("x", SlotId(0)), Err(ScopeUnderflow));
        assert_eq!(scopes.set_return_value(Value::Const(0)), Err(ScopeUnderflow));
    }
}
