//! xy JIT execution engine using Cranelift
//!
//! Translates a finished [`IrModule`] to native code in memory and runs its
//! entry function. Extern functions are bound to host symbols registered on
//! the engine; the built-in runtime provides `printi`.

mod error;
mod runtime;
mod translator;

pub use error::CodegenError;
pub use runtime::{xy_printi, HostSymbol};

use cranelift::prelude::*;
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{default_libcall_names, DataDescription, DataId, FuncId as ClifFuncId, Linkage, Module};
use log::debug;
use std::collections::HashMap;

use xy_ir::{FuncId, IrFunction, IrModule, IrType};

use crate::runtime::RuntimeSymbols;
use crate::translator::FunctionTranslator;

/// Symbol name of the data object holding the program result.
const RESULT_CELL: &str = "xy.result";

/// Builds Cranelift JIT modules for xy programs.
pub struct JitEngine {
    symbols: RuntimeSymbols,
}

impl JitEngine {
    /// An engine with the built-in runtime registered.
    pub fn new() -> Self {
        Self {
            symbols: RuntimeSymbols::builtin(),
        }
    }

    /// Registers a host function that `extern name(...)` can bind to.
    ///
    /// `ptr` must point to an `extern "C"` function taking `arity` `i64`
    /// arguments and returning `i64`, and must stay valid while programs
    /// compiled by this engine run.
    pub fn with_symbol(mut self, name: &str, ptr: *const u8, arity: usize) -> Self {
        self.symbols.insert(name, ptr, arity);
        self
    }

    /// Compiles the module and runs its entry function, returning the value
    /// the program published.
    pub fn compile_and_run(self, module: IrModule) -> Result<i64, CodegenError> {
        let program = self.compile(module)?;
        Ok(program.run())
    }

    /// Compiles the module to native code without running it.
    pub fn compile(self, ir_module: IrModule) -> Result<CompiledProgram, CodegenError> {
        let entry = ir_module.entry_function().ok_or(CodegenError::NoEntry)?;
        if entry.param_count != 0 || entry.return_type != IrType::Void {
            return Err(CodegenError::InvalidEntry(entry.name.clone()));
        }
        let entry_id = entry.id;

        // Reject unresolvable externs before the JIT linker sees them
        for ext in ir_module.externals() {
            let symbol = self
                .symbols
                .get(&ext.name)
                .ok_or_else(|| CodegenError::UnresolvedSymbol { name: ext.name.clone() })?;
            if symbol.arity != ext.param_count {
                return Err(CodegenError::SignatureMismatch {
                    name: ext.name.clone(),
                    declared: ext.param_count,
                    expected: symbol.arity,
                });
            }
        }

        let mut codegen = CodeGenerator::new(&self.symbols)?;
        codegen.declare_functions(&ir_module)?;
        let result_cell = codegen.declare_result_cell()?;

        for function in ir_module.functions.iter().filter(|f| !f.is_external()) {
            codegen.compile_function(function, result_cell)?;
        }

        codegen.finish(entry_id, result_cell)
    }
}

impl Default for JitEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Native code for one module, ready to run once.
///
/// Dropping a program without running it leaks its code memory.
pub struct CompiledProgram {
    module: JITModule,
    entry: *const u8,
    result: *const u8,
}

impl CompiledProgram {
    /// Runs the entry function, then frees the code.
    pub fn run(self) -> i64 {
        // SAFETY: `entry` was produced by `finalize_definitions` for a
        // zero-argument, void function in `module`, which is still alive.
        let main: extern "C" fn() = unsafe { std::mem::transmute(self.entry) };
        main();

        // SAFETY: `result` points to the 8-byte zero-initialized result cell.
        let value = unsafe { std::ptr::read_unaligned(self.result as *const i64) };

        // SAFETY: nothing refers to the module's code or data past this point.
        unsafe { self.module.free_memory() };
        value
    }
}

/// Per-compilation Cranelift state.
struct CodeGenerator {
    module: JITModule,
    ctx: codegen::Context,
    func_builder_ctx: FunctionBuilderContext,
    pointer_type: Type,
    func_id_map: HashMap<FuncId, ClifFuncId>,
}

impl CodeGenerator {
    fn new(symbols: &RuntimeSymbols) -> Result<Self, CodegenError> {
        let isa_builder = cranelift_native::builder()
            .map_err(|e| CodegenError::Isa(format!("failed to create ISA builder: {}", e)))?;

        let mut flag_builder = settings::builder();
        flag_builder
            .set("use_colocated_libcalls", "false")
            .map_err(|e| CodegenError::Isa(format!("failed to set use_colocated_libcalls: {}", e)))?;
        flag_builder
            .set("is_pic", "false")
            .map_err(|e| CodegenError::Isa(format!("failed to set is_pic: {}", e)))?;

        let isa = isa_builder
            .finish(settings::Flags::new(flag_builder))
            .map_err(|e| CodegenError::Isa(format!("failed to create ISA: {}", e)))?;
        let pointer_type = isa.pointer_type();

        let mut builder = JITBuilder::with_isa(isa, default_libcall_names());
        for (name, symbol) in symbols.iter() {
            builder.symbol(name.as_str(), symbol.ptr);
        }

        let module = JITModule::new(builder);
        Ok(Self {
            ctx: module.make_context(),
            module,
            func_builder_ctx: FunctionBuilderContext::new(),
            pointer_type,
            func_id_map: HashMap::new(),
        })
    }

    fn signature_for(&self, func: &IrFunction) -> Signature {
        let mut signature = self.module.make_signature();
        for _ in 0..func.param_count {
            signature.params.push(AbiParam::new(types::I64));
        }
        if func.return_type == IrType::I64 {
            signature.returns.push(AbiParam::new(types::I64));
        }
        signature
    }

    /// Declares every function up front so calls can refer forward.
    fn declare_functions(&mut self, ir_module: &IrModule) -> Result<(), CodegenError> {
        for function in &ir_module.functions {
            let signature = self.signature_for(function);
            let linkage = if function.is_external() {
                Linkage::Import
            } else {
                Linkage::Local
            };
            let id = self.module.declare_function(&function.name, linkage, &signature)?;
            self.func_id_map.insert(function.id, id);
        }
        Ok(())
    }

    fn declare_result_cell(&mut self) -> Result<DataId, CodegenError> {
        let data_id = self.module.declare_data(RESULT_CELL, Linkage::Local, true, false)?;
        let mut desc = DataDescription::new();
        desc.define_zeroinit(8);
        self.module.define_data(data_id, &desc)?;
        Ok(data_id)
    }

    fn compile_function(&mut self, ir_func: &IrFunction, result_cell: DataId) -> Result<(), CodegenError> {
        let clif_func_id = *self
            .func_id_map
            .get(&ir_func.id)
            .ok_or(CodegenError::UnknownFunction(ir_func.id))?;

        self.ctx.func.signature = self.signature_for(ir_func);

        let builder = FunctionBuilder::new(&mut self.ctx.func, &mut self.func_builder_ctx);
        let mut translator = FunctionTranslator::new(
            &mut self.module,
            &self.func_id_map,
            result_cell,
            ir_func,
            self.pointer_type,
        );
        translator.translate(builder)?;

        if let Err(errors) = cranelift::codegen::verify_function(&self.ctx.func, self.module.isa()) {
            return Err(CodegenError::Verifier {
                function: ir_func.name.clone(),
                errors: errors.to_string(),
            });
        }

        self.module.define_function(clif_func_id, &mut self.ctx)?;
        debug!("defined function `{}`", ir_func.name);

        self.module.clear_context(&mut self.ctx);
        Ok(())
    }

    fn finish(mut self, entry: FuncId, result_cell: DataId) -> Result<CompiledProgram, CodegenError> {
        self.module.finalize_definitions()?;
        debug!("finalized {} function(s)", self.func_id_map.len());

        let entry_id = *self
            .func_id_map
            .get(&entry)
            .ok_or(CodegenError::UnknownFunction(entry))?;
        let entry = self.module.get_finalized_function(entry_id);
        let (result, _) = self.module.get_finalized_data(result_cell);

        Ok(CompiledProgram {
            module: self.module,
            entry,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use xy_ir::{BinOp, Linkage as IrLinkage, Value};

    thread_local! {
        static TRACE: RefCell<Vec<i64>> = const { RefCell::new(Vec::new()) };
    }

    extern "C" fn trace(value: i64) -> i64 {
        TRACE.with(|t| t.borrow_mut().push(value));
        value
    }

    /// A module whose entry publishes `value` and returns.
    fn publishing(value: i64) -> IrModule {
        let mut module = IrModule::new("test");
        let main = module.create_function("main", 0, IrLinkage::Internal, IrType::Void).unwrap();
        let entry = module.create_block(main, "entry");
        module.set_entry(main);
        let value = module.emit_constant_int(value);
        module.emit_publish_result(value, entry);
        module.emit_return(None, entry);
        module
    }

    #[test]
    fn test_literal_round_trip() {
        for n in [0, 1, -1, 42, i64::MAX, i64::MIN] {
            assert_eq!(JitEngine::new().compile_and_run(publishing(n)).unwrap(), n);
        }
    }

    #[test]
    fn test_arithmetic_and_slots() {
        // x = 5; y = 7; x = x + y; return x * 2 - 100 / 7
        let mut module = IrModule::new("test");
        let main = module.create_function("main", 0, IrLinkage::Internal, IrType::Void).unwrap();
        let b = module.create_block(main, "entry");
        module.set_entry(main);

        let x = module.emit_alloca(b, "x");
        module.emit_store(Value::Const(5), x, b);
        let y = module.emit_alloca(b, "y");
        module.emit_store(Value::Const(7), y, b);
        let lx = module.emit_load(x, b);
        let ly = module.emit_load(y, b);
        let sum = module.emit_binop(BinOp::Add, lx, ly, b);
        module.emit_store(sum, x, b);
        let lx = module.emit_load(x, b);
        let doubled = module.emit_binop(BinOp::Mul, lx, Value::Const(2), b);
        let quotient = module.emit_binop(BinOp::SDiv, Value::Const(-100), Value::Const(7), b);
        let result = module.emit_binop(BinOp::Sub, doubled, quotient, b);
        module.emit_publish_result(result, b);
        module.emit_return(None, b);

        // 24 - (-14), signed division truncates toward zero
        assert_eq!(JitEngine::new().compile_and_run(module).unwrap(), 38);
    }

    #[test]
    fn test_internal_call_with_params() {
        let mut module = IrModule::new("test");
        let main = module.create_function("main", 0, IrLinkage::Internal, IrType::Void).unwrap();
        let sub = module.create_function("sub", 2, IrLinkage::Internal, IrType::I64).unwrap();
        module.set_entry(main);

        let sb = module.create_block(sub, "entry");
        let diff = module.emit_binop(BinOp::Sub, Value::Param(0), Value::Param(1), sb);
        module.emit_return(Some(diff), sb);

        let mb = module.create_block(main, "entry");
        let result = module.emit_call(sub, vec![Value::Const(10), Value::Const(3)], mb);
        module.emit_publish_result(result, mb);
        module.emit_return(None, mb);

        assert_eq!(JitEngine::new().compile_and_run(module).unwrap(), 7);
    }

    #[test]
    fn test_host_symbol_call_order() {
        let mut module = IrModule::new("test");
        let main = module.create_function("main", 0, IrLinkage::Internal, IrType::Void).unwrap();
        let t = module.create_function("trace", 1, IrLinkage::External, IrType::I64).unwrap();
        let b = module.create_block(main, "entry");
        module.set_entry(main);

        let left = module.emit_call(t, vec![Value::Const(1)], b);
        let right = module.emit_call(t, vec![Value::Const(2)], b);
        let sum = module.emit_binop(BinOp::Add, left, right, b);
        module.emit_publish_result(sum, b);
        module.emit_return(None, b);

        TRACE.with(|t| t.borrow_mut().clear());
        let engine = JitEngine::new().with_symbol("trace", trace as *const u8, 1);
        assert_eq!(engine.compile_and_run(module).unwrap(), 3);
        TRACE.with(|t| assert_eq!(*t.borrow(), vec![1, 2]));
    }

    #[test]
    fn test_unresolved_symbol() {
        let mut module = publishing(0);
        module.create_function("mystery", 1, IrLinkage::External, IrType::I64).unwrap();

        let err = JitEngine::new().compile(module).err().unwrap();
        assert!(matches!(err, CodegenError::UnresolvedSymbol { ref name } if name == "mystery"));
    }

    #[test]
    fn test_symbol_arity_mismatch() {
        let mut module = publishing(0);
        module.create_function("printi", 2, IrLinkage::External, IrType::I64).unwrap();

        let err = JitEngine::new().compile(module).err().unwrap();
        assert!(matches!(err, CodegenError::SignatureMismatch { declared: 2, expected: 1, .. }));
    }

    #[test]
    fn test_missing_terminator() {
        let mut module = IrModule::new("test");
        let main = module.create_function("main", 0, IrLinkage::Internal, IrType::Void).unwrap();
        module.create_block(main, "entry");
        module.set_entry(main);

        let err = JitEngine::new().compile(module).err().unwrap();
        assert!(matches!(err, CodegenError::MissingTerminator { .. }));
    }

    #[test]
    fn test_no_entry() {
        let module = IrModule::new("test");
        let err = JitEngine::new().compile(module).err().unwrap();
        assert!(matches!(err, CodegenError::NoEntry));
    }

    #[test]
    fn test_unknown_callee() {
        let mut module = IrModule::new("test");
        let main = module.create_function("main", 0, IrLinkage::Internal, IrType::Void).unwrap();
        let b = module.create_block(main, "entry");
        module.set_entry(main);
        let v = module.emit_call(FuncId(99), vec![], b);
        module.emit_publish_result(v, b);
        module.emit_return(None, b);

        let err = JitEngine::new().compile(module).err().unwrap();
        assert!(matches!(err, CodegenError::UnknownFunction(FuncId(99))));
    }
}
