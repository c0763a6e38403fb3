//! Text form of the IR, used by `xyc ir`.

use std::fmt;

use crate::{Instruction, IrFunction, IrModule, Terminator};

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for func in &self.functions {
            writeln!(f)?;
            self.fmt_function(func, f)?;
        }
        Ok(())
    }
}

impl IrModule {
    fn fmt_function(&self, func: &IrFunction, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = (0..func.param_count)
            .map(|i| format!("arg{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        if func.is_external() {
            return writeln!(f, "extern fn {}({}) -> {}", func.name, params, func.return_type);
        }

        writeln!(f, "fn {}({}) -> {} {} {{", func.name, params, func.return_type, func.linkage)?;
        for block in &func.blocks {
            writeln!(f, "{}:", block.label)?;
            for inst in &block.instructions {
                write!(f, "    ")?;
                self.fmt_instruction(func, inst, f)?;
                writeln!(f)?;
            }
            match &block.terminator {
                Terminator::Return(Some(value)) => writeln!(f, "    return {}", value)?,
                Terminator::Return(None) => writeln!(f, "    return")?,
                Terminator::Unreachable => writeln!(f, "    unreachable")?,
            }
        }
        writeln!(f, "}}")
    }

    fn fmt_instruction(&self, func: &IrFunction, inst: &Instruction, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match inst {
            Instruction::Alloca { slot } => {
                write!(f, "{} = alloca {}", slot, func.slot_name(*slot).unwrap_or("?"))
            }
            Instruction::Load { dest, slot } => write!(f, "{} = load {}", dest, slot),
            Instruction::Store { slot, value } => write!(f, "store {}, {}", slot, value),
            Instruction::BinaryOp { dest, op, left, right } => {
                write!(f, "{} = {} {}, {}", dest, op, left, right)
            }
            Instruction::Call { dest, func: callee, args } => {
                let args = args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                match self.function(*callee) {
                    Some(target) => write!(f, "{} = call @{}({})", dest, target.name, args),
                    None => write!(f, "{} = call {}({})", dest, callee, args),
                }
            }
            Instruction::PublishResult(value) => write!(f, "publish {}", value),
        }
    }
}
