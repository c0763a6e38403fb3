//! IR type system.
//!
//! xy only computes with signed 64-bit integers; `Void` exists for the
//! entry function, which returns nothing.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    /// Signed 64-bit integer
    I64,
    /// No value
    Void,
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::I64 => write!(f, "i64"),
            IrType::Void => write!(f, "void"),
        }
    }
}

/// Visibility of a function to the code generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Linkage {
    /// Has a body in this module
    Internal,
    /// Body-less; resolved against host symbols at JIT time
    External,
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Linkage::Internal => write!(f, "internal"),
            Linkage::External => write!(f, "external"),
        }
    }
}
