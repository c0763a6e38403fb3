//! Construction interface used by the lowering engine.
//!
//! The lowerer only ever threads the handles returned here; it never looks
//! inside blocks or instructions. Handles are only valid for the module that
//! produced them.

use thiserror::Error;

use crate::{
    BinOp, BlockRef, FuncId, Instruction, IrFunction, IrModule, IrType, Linkage, SlotId,
    Terminator, Value,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("function `{0}` is already defined")]
    DuplicateFunction(String),
}

impl IrModule {
    /// Declares a function. Internal functions still need a block before
    /// anything can be emitted into them.
    pub fn create_function(
        &mut self,
        name: &str,
        param_count: usize,
        linkage: Linkage,
        return_type: IrType,
    ) -> Result<FuncId, BuildError> {
        if self.index.contains_key(name) {
            return Err(BuildError::DuplicateFunction(name.to_string()));
        }
        let id = FuncId(self.functions.len());
        self.functions.push(IrFunction::new(
            id,
            name.to_string(),
            param_count,
            return_type,
            linkage,
        ));
        self.index.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn create_block(&mut self, func: FuncId, label: &str) -> BlockRef {
        let block = self.function_mut(func).new_block(label);
        BlockRef { func, block }
    }

    pub fn lookup_function(&self, name: &str) -> Option<FuncId> {
        self.index.get(name).copied()
    }

    pub fn emit_constant_int(&self, value: i64) -> Value {
        Value::Const(value)
    }

    /// Reserves uninitialized storage for `name` at the current end of `block`.
    pub fn emit_alloca(&mut self, block: BlockRef, name: &str) -> SlotId {
        let func = self.function_mut(block.func);
        let slot = func.add_slot(name);
        func.block_mut(block.block).push(Instruction::Alloca { slot });
        slot
    }

    pub fn emit_load(&mut self, slot: SlotId, block: BlockRef) -> Value {
        let func = self.function_mut(block.func);
        let dest = func.add_temp();
        func.block_mut(block.block).push(Instruction::Load { dest, slot });
        Value::Temp(dest)
    }

    pub fn emit_store(&mut self, value: Value, slot: SlotId, block: BlockRef) {
        self.function_mut(block.func)
            .block_mut(block.block)
            .push(Instruction::Store { slot, value });
    }

    pub fn emit_binop(&mut self, op: BinOp, left: Value, right: Value, block: BlockRef) -> Value {
        let func = self.function_mut(block.func);
        let dest = func.add_temp();
        func.block_mut(block.block).push(Instruction::BinaryOp {
            dest,
            op,
            left,
            right,
        });
        Value::Temp(dest)
    }

    pub fn emit_call(&mut self, callee: FuncId, args: Vec<Value>, block: BlockRef) -> Value {
        let func = self.function_mut(block.func);
        let dest = func.add_temp();
        func.block_mut(block.block).push(Instruction::Call {
            dest,
            func: callee,
            args,
        });
        Value::Temp(dest)
    }

    pub fn emit_publish_result(&mut self, value: Value, block: BlockRef) {
        self.function_mut(block.func)
            .block_mut(block.block)
            .push(Instruction::PublishResult(value));
    }

    pub fn emit_return(&mut self, value: Option<Value>, block: BlockRef) {
        self.function_mut(block.func).block_mut(block.block).terminator = Terminator::Return(value);
    }
}
