//! IR module: the unit handed to code generation.

use std::collections::HashMap;

use crate::{FuncId, IrFunction};

/// A complete IR module.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IrModule {
    pub name: String,

    /// All functions, indexed by `FuncId`
    pub functions: Vec<IrFunction>,

    /// Name to id, for call resolution
    pub(crate) index: HashMap<String, FuncId>,

    /// Function run by the execution engine
    pub entry: Option<FuncId>,
}

impl IrModule {
    pub fn new(name: impl Into<String>) -> Self {
        IrModule {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Gets a function by ID.
    pub fn function(&self, id: FuncId) -> Option<&IrFunction> {
        self.functions.get(id.0)
    }

    pub(crate) fn function_mut(&mut self, id: FuncId) -> &mut IrFunction {
        &mut self.functions[id.0]
    }

    /// Finds a function by name.
    pub fn find_function(&self, name: &str) -> Option<&IrFunction> {
        self.index.get(name).and_then(|id| self.function(*id))
    }

    pub fn set_entry(&mut self, id: FuncId) {
        self.entry = Some(id);
    }

    pub fn entry_function(&self) -> Option<&IrFunction> {
        self.entry.and_then(|id| self.function(id))
    }

    /// Iterates over body-less functions.
    pub fn externals(&self) -> impl Iterator<Item = &IrFunction> {
        self.functions.iter().filter(|f| f.is_external())
    }
}
