//! Intermediate Representation (IR) for the xy compiler
//!
//! A deliberately small, single-block-per-function representation: every
//! variable lives in an explicit stack slot, every computed value is a
//! numbered temporary, and each function ends in one terminator. The
//! [`lower`] module turns the AST into this form; `xy-codegen` hands it to
//! Cranelift.

pub mod lower;
pub mod scope;
pub mod types;
pub mod value;
pub mod instruction;
pub mod function;
pub mod module;
pub mod builder;
mod printer;

// ============================================================================
// ID Types (using newtype pattern for type safety)
// ============================================================================

/// Unique identifier for a function within a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub usize);

/// Unique identifier for a basic block within a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// Unique identifier for a stack slot (variable storage) within a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

/// Unique identifier for a temporary value within a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(pub usize);

/// A block addressed from outside its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRef {
    pub func: FuncId,
    pub block: BlockId,
}

// ============================================================================
// Display Implementations for ID types
// ============================================================================

impl std::fmt::Display for FuncId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "func{}", self.0)
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "_slot{}", self.0)
    }
}

impl std::fmt::Display for TempId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "_temp{}", self.0)
    }
}

// ============================================================================
// Re-exports (public API)
// ============================================================================

pub use types::*;
pub use value::*;
pub use instruction::*;
pub use function::*;
pub use module::*;
pub use builder::BuildError;
pub use scope::{Binding, ScopeFrame, ScopeStack, ScopeUnderflow};
pub use lower::{LowerError, LowerOptions, Lowerer, UndeclaredPolicy};

// ============================================================================
// Tests
// ============================================================================
