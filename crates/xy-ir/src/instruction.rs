//! IR instructions and basic blocks.

use std::fmt;

use crate::{BlockId, FuncId, SlotId, TempId, Value};

/// Integer arithmetic the IR can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// Signed division
    SDiv,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::SDiv => "sdiv",
        };
        write!(f, "{}", s)
    }
}

/// A non-terminating instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Reserve an uninitialized 8-byte stack slot
    Alloca { slot: SlotId },
    /// dest = *slot
    Load { dest: TempId, slot: SlotId },
    /// *slot = value
    Store { slot: SlotId, value: Value },
    /// dest = left op right
    BinaryOp {
        dest: TempId,
        op: BinOp,
        left: Value,
        right: Value,
    },
    /// dest = func(args)
    Call {
        dest: TempId,
        func: FuncId,
        args: Vec<Value>,
    },
    /// Write the program result into the module's result cell
    PublishResult(Value),
}

/// How control leaves a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Return(Option<Value>),
    /// Not yet terminated. Code generation rejects blocks left in this state.
    Unreachable,
}

/// A basic block: straight-line instructions plus a terminator.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
}

impl Block {
    pub fn new(id: BlockId, label: impl Into<String>) -> Self {
        Block {
            id,
            label: label.into(),
            instructions: Vec::new(),
            terminator: Terminator::Unreachable,
        }
    }

    pub fn push(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }
}
