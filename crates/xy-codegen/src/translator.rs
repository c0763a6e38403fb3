//! Function translation logic for converting xy IR to Cranelift IR

use cranelift::codegen::ir::StackSlot;
use cranelift::prelude::*;
use cranelift_jit::JITModule;
use cranelift_module::{DataId, FuncId as ClifFuncId, Module};
use std::collections::HashMap;

use xy_ir::{
    BinOp, Block as IrBlock, FuncId, Instruction, IrFunction, SlotId, TempId, Terminator,
    Value as IrValue,
};

use crate::error::CodegenError;

// Alias Cranelift types to avoid conflicts
use cranelift::prelude::Value as ClifValue;

/// Context for translating a single function
pub(crate) struct FunctionTranslator<'a> {
    /// Module reference for declaring function and data references
    module: &'a mut JITModule,
    /// Map from xy function IDs to Cranelift function IDs
    func_id_map: &'a HashMap<FuncId, ClifFuncId>,
    /// Data object the entry function publishes its result into
    result_cell: DataId,
    /// Current IR function being translated
    ir_func: &'a IrFunction,
    slots: HashMap<SlotId, StackSlot>,
    temps: HashMap<TempId, ClifValue>,
    params: Vec<ClifValue>,
    pointer_type: Type,
}

impl<'a> FunctionTranslator<'a> {
    pub(crate) fn new(
        module: &'a mut JITModule,
        func_id_map: &'a HashMap<FuncId, ClifFuncId>,
        result_cell: DataId,
        ir_func: &'a IrFunction,
        pointer_type: Type,
    ) -> Self {
        Self {
            module,
            func_id_map,
            result_cell,
            ir_func,
            slots: HashMap::new(),
            temps: HashMap::new(),
            params: Vec::new(),
            pointer_type,
        }
    }

    /// Translate the entire function
    pub(crate) fn translate(&mut self, mut builder: FunctionBuilder) -> Result<(), CodegenError> {
        let ir_func = self.ir_func;
        for ir_block in &ir_func.blocks {
            let block = builder.create_block();
            if ir_block.id == ir_func.entry_block {
                builder.append_block_params_for_function_params(block);
                self.params = builder.block_params(block).to_vec();
            }
            builder.switch_to_block(block);
            builder.seal_block(block);

            self.translate_block(&mut builder, ir_block)?;
        }

        builder.finalize();
        Ok(())
    }

    fn translate_block(&mut self, builder: &mut FunctionBuilder, block: &IrBlock) -> Result<(), CodegenError> {
        for inst in &block.instructions {
            self.translate_instruction(builder, inst)?;
        }

        match &block.terminator {
            Terminator::Return(Some(value)) => {
                let value = self.translate_value(builder, value)?;
                builder.ins().return_(&[value]);
            }
            Terminator::Return(None) => {
                builder.ins().return_(&[]);
            }
            Terminator::Unreachable => {
                return Err(CodegenError::MissingTerminator {
                    function: self.ir_func.name.clone(),
                    block: block.label.clone(),
                });
            }
        }
        Ok(())
    }

    fn translate_instruction(&mut self, builder: &mut FunctionBuilder, inst: &Instruction) -> Result<(), CodegenError> {
        match inst {
            Instruction::Alloca { slot } => {
                let stack_slot = builder.create_sized_stack_slot(StackSlotData::new(
                    StackSlotKind::ExplicitSlot,
                    8,
                    3,
                ));
                self.slots.insert(*slot, stack_slot);
            }

            Instruction::Load { dest, slot } => {
                let stack_slot = self.slot(*slot)?;
                let value = builder.ins().stack_load(types::I64, stack_slot, 0);
                self.temps.insert(*dest, value);
            }

            Instruction::Store { slot, value } => {
                let stack_slot = self.slot(*slot)?;
                let value = self.translate_value(builder, value)?;
                builder.ins().stack_store(value, stack_slot, 0);
            }

            Instruction::BinaryOp { dest, op, left, right } => {
                let lhs = self.translate_value(builder, left)?;
                let rhs = self.translate_value(builder, right)?;
                let result = match op {
                    BinOp::Add => builder.ins().iadd(lhs, rhs),
                    BinOp::Sub => builder.ins().isub(lhs, rhs),
                    BinOp::Mul => builder.ins().imul(lhs, rhs),
                    // Traps on a zero divisor and on i64::MIN / -1.
                    BinOp::SDiv => builder.ins().sdiv(lhs, rhs),
                };
                self.temps.insert(*dest, result);
            }

            Instruction::Call { dest, func, args } => {
                let clif_id = *self
                    .func_id_map
                    .get(func)
                    .ok_or(CodegenError::UnknownFunction(*func))?;
                let func_ref = self.module.declare_func_in_func(clif_id, builder.func);

                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.translate_value(builder, arg)?);
                }

                let call = builder.ins().call(func_ref, &arg_values);
                let result = builder.inst_results(call).first().copied().ok_or_else(|| {
                    self.malformed(format!("call to {} produces no value", func))
                })?;
                self.temps.insert(*dest, result);
            }

            Instruction::PublishResult(value) => {
                let value = self.translate_value(builder, value)?;
                let gv = self.module.declare_data_in_func(self.result_cell, builder.func);
                let addr = builder.ins().symbol_value(self.pointer_type, gv);
                builder.ins().store(MemFlags::new(), value, addr, 0);
            }
        }
        Ok(())
    }

    fn translate_value(&self, builder: &mut FunctionBuilder, value: &IrValue) -> Result<ClifValue, CodegenError> {
        match value {
            IrValue::Const(n) => Ok(builder.ins().iconst(types::I64, *n)),
            IrValue::Temp(temp) => self
                .temps
                .get(temp)
                .copied()
                .ok_or_else(|| self.malformed(format!("{} used before definition", temp))),
            IrValue::Param(index) => self
                .params
                .get(*index)
                .copied()
                .ok_or_else(|| self.malformed(format!("no parameter {}", index))),
        }
    }

    fn slot(&self, slot: SlotId) -> Result<StackSlot, CodegenError> {
        self.slots
            .get(&slot)
            .copied()
            .ok_or_else(|| self.malformed(format!("{} used before its alloca", slot)))
    }

    fn malformed(&self, message: String) -> CodegenError {
        CodegenError::Malformed {
            function: self.ir_func.name.clone(),
            message,
        }
    }
}
