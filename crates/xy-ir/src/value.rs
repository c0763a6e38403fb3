//! IR values (operands).

use std::fmt;

use crate::TempId;

/// An operand: something an instruction can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// Integer constant
    Const(i64),
    /// Result of an earlier instruction in the same function
    Temp(TempId),
    /// Incoming argument by position
    Param(usize),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Const(n) => write!(f, "{}", n),
            Value::Temp(t) => write!(f, "{}", t),
            Value::Param(i) => write!(f, "arg{}", i),
        }
    }
}
