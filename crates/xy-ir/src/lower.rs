//! AST → IR Lowering
//!
//! Walks the root [`Block`] depth-first, left to right, and builds an
//! [`IrModule`] whose entry function `main` runs the top-level statements.
//! The first fault aborts lowering of the whole module.

use log::{debug, trace};
use thiserror::Error;

use xy_ast::*;

use crate::builder::BuildError;
use crate::scope::{Binding, ScopeStack, ScopeUnderflow};
use crate::{BinOp, BlockRef, FuncId, IrModule, IrType, Linkage, SlotId, Value};

/// Name of the generated entry function.
pub const ENTRY_FUNCTION: &str = "main";

/// Errors produced during lowering. Every variant carries the span of the
/// node that caused it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LowerError {
    #[error("unsupported operator `{op}`")]
    UnsupportedOperator { op: BinaryOp, span: Span },

    #[error("no such function `{name}`")]
    UndefinedFunction { name: String, span: Span },

    #[error("function `{name}` finishes without returning a value")]
    MissingReturn { name: String, span: Span },

    #[error("use of undeclared variable `{name}`")]
    UndeclaredVariable { name: String, span: Span },

    #[error("function `{name}` takes {expected} argument(s) but {found} were supplied")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("function `{name}` is already defined")]
    DuplicateFunction { name: String, span: Span },

    #[error("{what} cannot be used as a value")]
    NotAValue { what: &'static str, span: Span },

    #[error("internal error: scope stack underflow")]
    ScopeUnderflow { span: Span },
}

impl LowerError {
    pub fn span(&self) -> Span {
        match self {
            LowerError::UnsupportedOperator { span, .. }
            | LowerError::UndefinedFunction { span, .. }
            | LowerError::MissingReturn { span, .. }
            | LowerError::UndeclaredVariable { span, .. }
            | LowerError::ArityMismatch { span, .. }
            | LowerError::DuplicateFunction { span, .. }
            | LowerError::NotAValue { span, .. }
            | LowerError::ScopeUnderflow { span } => *span,
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            LowerError::UnsupportedOperator { .. } => "E2001",
            LowerError::UndefinedFunction { .. } => "E2002",
            LowerError::MissingReturn { .. } => "E2003",
            LowerError::UndeclaredVariable { .. } => "E2004",
            LowerError::ArityMismatch { .. } => "E2005",
            LowerError::DuplicateFunction { .. } => "E2006",
            LowerError::NotAValue { .. } => "E2007",
            LowerError::ScopeUnderflow { .. } => "E2999",
        }
    }
}

/// What happens when a name is read before anything bound it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndeclaredPolicy {
    /// Allocate fresh, uninitialized storage and read from it. The value
    /// read is indeterminate.
    #[default]
    AutoDeclare,
    /// Fail with [`LowerError::UndeclaredVariable`].
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LowerOptions {
    pub undeclared: UndeclaredPolicy,
}

/// How a name is being used when it turns out to be unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// Result of lowering one node.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Lowered {
    Value(Value),
    /// Result of a store; has no value
    Store(SlotId),
    Function(FuncId),
}

/// Main lowering context.
pub struct Lowerer {
    module: IrModule,
    scopes: ScopeStack,
    options: LowerOptions,
}

impl Lowerer {
    pub fn new(options: LowerOptions) -> Self {
        Self {
            module: IrModule::new("xy"),
            scopes: ScopeStack::new(),
            options,
        }
    }

    /// Lowers a whole program. The root block becomes the body of the entry
    /// function; its return value is published to the result cell.
    pub fn lower_program(mut self, root: &Node<Block>) -> Result<IrModule, LowerError> {
        let span = root.span;

        let main = self.declare_function(ENTRY_FUNCTION, 0, Linkage::Internal, IrType::Void, span)?;
        let entry = self.module.create_block(main, "entry");
        self.module.set_entry(main);
        debug!("built entry function `{}`", ENTRY_FUNCTION);

        self.push_scope(entry);
        self.lower_block(root)?;

        let result = self
            .scopes
            .return_value()
            .map_err(|_| LowerError::ScopeUnderflow { span })?
            .ok_or_else(|| LowerError::MissingReturn {
                name: ENTRY_FUNCTION.to_string(),
                span,
            })?;
        self.module.emit_publish_result(result, entry);
        self.module.emit_return(None, entry);
        self.pop_scope(span)?;

        Ok(self.module)
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    fn push_scope(&mut self, target: BlockRef) {
        self.scopes.push(target);
        debug!("push scope (depth {}) -> {}:{}", self.scopes.depth(), target.func, target.block);
    }

    fn pop_scope(&mut self, span: Span) -> Result<(), LowerError> {
        self.scopes.pop().map_err(|_| LowerError::ScopeUnderflow { span })?;
        debug!("pop scope (depth {})", self.scopes.depth());
        Ok(())
    }

    fn target(&self, span: Span) -> Result<BlockRef, LowerError> {
        self.scopes.target().map_err(|_| LowerError::ScopeUnderflow { span })
    }

    fn resolve(&self, name: &str, span: Span) -> Result<Binding, LowerError> {
        self.scopes.resolve(name).map_err(|_| LowerError::ScopeUnderflow { span })
    }

    /// Binds a fresh slot for `name` in the active frame.
    fn allocate(&mut self, name: &str, span: Span) -> Result<SlotId, LowerError> {
        let target = self.target(span)?;
        let slot = self.module.emit_alloca(target, name);
        self.scopes
            .declare(name, slot)
            .map_err(|_: ScopeUnderflow| LowerError::ScopeUnderflow { span })?;
        debug!("declare `{}` as {}", name, slot);
        Ok(slot)
    }

    /// The one place that decides what an unbound name means.
    fn bind_undeclared(&mut self, name: &str, access: Access, span: Span) -> Result<SlotId, LowerError> {
        match (access, self.options.undeclared) {
            (Access::Read, UndeclaredPolicy::Reject) => Err(LowerError::UndeclaredVariable {
                name: name.to_string(),
                span,
            }),
            (Access::Read, UndeclaredPolicy::AutoDeclare) | (Access::Write, _) => {
                self.allocate(name, span)
            }
        }
    }

    fn slot_for(&mut self, name: &str, access: Access, span: Span) -> Result<SlotId, LowerError> {
        match self.resolve(name, span)? {
            Binding::Declared(slot) => Ok(slot),
            Binding::Undeclared => self.bind_undeclared(name, access, span),
        }
    }

    fn declare_function(
        &mut self,
        name: &str,
        param_count: usize,
        linkage: Linkage,
        return_type: IrType,
        span: Span,
    ) -> Result<FuncId, LowerError> {
        self.module
            .create_function(name, param_count, linkage, return_type)
            .map_err(|err| match err {
                BuildError::DuplicateFunction(name) => LowerError::DuplicateFunction { name, span },
            })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Lowers statements in order. The block's result is its last statement's.
    fn lower_block(&mut self, block: &Node<Block>) -> Result<Option<Lowered>, LowerError> {
        let mut last = None;
        for stmt in &block.value.stmts {
            last = Some(self.lower_stmt(stmt)?);
        }
        Ok(last)
    }

    fn lower_stmt(&mut self, stmt: &Node<Stmt>) -> Result<Lowered, LowerError> {
        match &stmt.value {
            Stmt::Expression(expr) => self.lower_expr(expr),
            Stmt::Return(expr) => {
                let value = self.lower_value(expr)?;
                self.scopes
                    .set_return_value(value)
                    .map_err(|_| LowerError::ScopeUnderflow { span: stmt.span })?;
                trace!("record return value {}", value);
                Ok(Lowered::Value(value))
            }
            Stmt::FunctionDecl(func) => self.lower_function_decl(func, stmt.span),
            Stmt::ExternDecl(decl) => self.lower_extern_decl(decl),
        }
    }

    fn lower_extern_decl(&mut self, decl: &ExternDecl) -> Result<Lowered, LowerError> {
        let name = &decl.name.value.name;
        let id = self.declare_function(name, decl.arity(), Linkage::External, IrType::I64, decl.name.span)?;
        debug!("declare extern `{}`/{} as {}", name, decl.arity(), id);
        Ok(Lowered::Function(id))
    }

    fn lower_function_decl(&mut self, func: &FunctionDecl, span: Span) -> Result<Lowered, LowerError> {
        let name = &func.name.value.name;
        let id = self.declare_function(name, func.arity(), Linkage::Internal, IrType::I64, func.name.span)?;
        let entry = self.module.create_block(id, "entry");
        debug!("lower function `{}`/{} as {}", name, func.arity(), id);

        self.push_scope(entry);

        for (index, param) in func.params.iter().enumerate() {
            let slot = self.allocate(&param.value.name, param.span)?;
            self.module.emit_store(Value::Param(index), slot, entry);
        }

        self.lower_block(&func.body)?;

        let value = self
            .scopes
            .return_value()
            .map_err(|_| LowerError::ScopeUnderflow { span })?
            .ok_or_else(|| LowerError::MissingReturn {
                name: name.clone(),
                span: func.name.span,
            })?;
        self.module.emit_return(Some(value), entry);

        self.pop_scope(span)?;
        Ok(Lowered::Function(id))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Lowers an expression that must produce a value.
    fn lower_value(&mut self, expr: &Node<Expr>) -> Result<Value, LowerError> {
        match self.lower_expr(expr)? {
            Lowered::Value(value) => Ok(value),
            Lowered::Store(slot) => {
                trace!("store to {} used as a value", slot);
                Err(LowerError::NotAValue {
                    what: "the result of an assignment",
                    span: expr.span,
                })
            }
            Lowered::Function(id) => {
                trace!("{} used as a value", id);
                Err(LowerError::NotAValue {
                    what: "a function",
                    span: expr.span,
                })
            }
        }
    }

    fn lower_expr(&mut self, expr: &Node<Expr>) -> Result<Lowered, LowerError> {
        let span = expr.span;
        match &expr.value {
            Expr::IntegerLiteral(n) => {
                trace!("lower literal {}", n);
                Ok(Lowered::Value(self.module.emit_constant_int(*n)))
            }

            Expr::Identifier(ident) => {
                trace!("lower read of `{}`", ident.name);
                let slot = self.slot_for(&ident.name, Access::Read, span)?;
                let target = self.target(span)?;
                Ok(Lowered::Value(self.module.emit_load(slot, target)))
            }

            Expr::BinaryOp { left, op, right } => {
                trace!("lower binary `{}`", op);
                let bin_op = arithmetic_op(*op)
                    .ok_or(LowerError::UnsupportedOperator { op: *op, span })?;
                let left = self.lower_value(left)?;
                let right = self.lower_value(right)?;
                let target = self.target(span)?;
                Ok(Lowered::Value(self.module.emit_binop(bin_op, left, right, target)))
            }

            Expr::Assignment { target, value } => {
                trace!("lower assignment to `{}`", target.value.name);
                let slot = self.slot_for(&target.value.name, Access::Write, target.span)?;
                let value = self.lower_value(value)?;
                let block = self.target(span)?;
                self.module.emit_store(value, slot, block);
                Ok(Lowered::Store(slot))
            }

            Expr::MethodCall { callee, args } => {
                let name = &callee.value.name;
                trace!("lower call to `{}`", name);
                // Only declared functions produce values; the void entry is not callable.
                let (func, expected) = self
                    .module
                    .lookup_function(name)
                    .and_then(|id| self.module.function(id))
                    .filter(|f| f.return_type != IrType::Void)
                    .map(|f| (f.id, f.param_count))
                    .ok_or_else(|| LowerError::UndefinedFunction {
                        name: name.clone(),
                        span: callee.span,
                    })?;

                if expected != args.len() {
                    return Err(LowerError::ArityMismatch {
                        name: name.clone(),
                        expected,
                        found: args.len(),
                        span,
                    });
                }

                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.lower_value(arg)?);
                }
                let target = self.target(span)?;
                Ok(Lowered::Value(self.module.emit_call(func, values, target)))
            }
        }
    }
}

impl Default for Lowerer {
    fn default() -> Self {
        Self::new(LowerOptions::default())
    }
}

fn arithmetic_op(op: BinaryOp) -> Option<BinOp> {
    match op {
        BinaryOp::Add => Some(BinOp::Add),
        BinaryOp::Sub => Some(BinOp::Sub),
        BinaryOp::Mul => Some(BinOp::Mul),
        BinaryOp::Div => Some(BinOp::SDiv),
        BinaryOp::Mod
        | BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq => None,
    }
}

/// Lowers `root` with the given options.
pub fn lower(root: &Node<Block>, options: LowerOptions) -> Result<IrModule, LowerError> {
    Lowerer::new(options).lower_program(root)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Instruction, Terminator};

    fn dummy_span() -> Span {
        Span::new(0, 0, 0)
    }

    fn node<T>(value: T) -> Node<T> {
        Node::new(value, dummy_span())
    }

    fn parse(source: &str) -> Node<Block> {
        xy_parser::parse_source(source, 0).unwrap()
    }

    fn lower_source(source: &str) -> Result<IrModule, LowerError> {
        lower(&parse(source), LowerOptions::default())
    }

    fn lower_strict(source: &str) -> Result<IrModule, LowerError> {
        let options = LowerOptions {
            undeclared: UndeclaredPolicy::Reject,
        };
        lower(&parse(source), options)
    }

    fn entry_instructions(module: &IrModule) -> &[Instruction] {
        let main = module.entry_function().unwrap();
        &main.block(main.entry_block).instructions
    }

    #[test]
    fn test_entry_function_shape() {
        let module = lower_source("return 42").unwrap();
        let main = module.entry_function().unwrap();

        assert_eq!(main.name, ENTRY_FUNCTION);
        assert_eq!(main.param_count, 0);
        assert_eq!(main.return_type, IrType::Void);
        assert_eq!(main.linkage, Linkage::Internal);
        assert_eq!(
            main.block(main.entry_block).instructions,
            vec![Instruction::PublishResult(Value::Const(42))]
        );
        assert_eq!(main.block(main.entry_block).terminator, Terminator::Return(None));
    }

    #[test]
    fn test_lowering_from_hand_built_ast() {
        // x = 5; return x
        let root = node(Block::new(vec![
            node(Stmt::Expression(node(Expr::Assignment {
                target: node(Ident::new("x")),
                value: Box::new(node(Expr::IntegerLiteral(5))),
            }))),
            node(Stmt::Return(node(Expr::Identifier(Ident::new("x"))))),
        ]));

        let module = Lowerer::default().lower_program(&root).unwrap();
        let main = module.entry_function().unwrap();
        assert_eq!(main.slots.len(), 1);
        assert_eq!(main.slot_name(SlotId(0)), Some("x"));
    }

    #[test]
    fn test_assignment_reuses_slot() {
        let module = lower_source("x = 5; y = 7; x = x + y; return x;").unwrap();
        let main = module.entry_function().unwrap();

        let names: Vec<_> = main.slots.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_auto_declare_on_read() {
        let module = lower_source("z = z + 1; return z;").unwrap();
        let insts = entry_instructions(&module);

        // The assignment binds `z` before its right-hand side reads it.
        assert_eq!(insts[0], Instruction::Alloca { slot: SlotId(0) });
        assert!(matches!(insts[1], Instruction::Load { slot: SlotId(0), .. }));
        assert_eq!(module.entry_function().unwrap().slots.len(), 1);

        let module = lower_source("return w").unwrap();
        let insts = entry_instructions(&module);
        assert_eq!(insts[0], Instruction::Alloca { slot: SlotId(0) });
        assert_eq!(insts[1], Instruction::Load { dest: crate::TempId(0), slot: SlotId(0) });
    }

    #[test]
    fn test_reject_policy() {
        let err = lower_strict("return y + 1").unwrap_err();
        assert!(matches!(err, LowerError::UndeclaredVariable { ref name, .. } if name == "y"));
        assert_eq!(err.code(), "E2004");

        // Assignment still declares under the strict policy.
        assert!(lower_strict("y = 1; return y").is_ok());
    }

    #[test]
    fn test_unsupported_operators() {
        for source in ["return 1 % 2", "return 1 == 2", "return 1 < 2", "return 1 >= 2"] {
            let err = lower_source(source).unwrap_err();
            assert!(matches!(err, LowerError::UnsupportedOperator { .. }), "{}", source);
        }
    }

    #[test]
    fn test_unsupported_operator_lowers_no_operands() {
        // The call on the left would fail first if operands were lowered.
        let err = lower_source("return missing() % 2").unwrap_err();
        assert!(matches!(err, LowerError::UnsupportedOperator { op: BinaryOp::Mod, .. }));
    }

    #[test]
    fn test_undefined_function() {
        let err = lower_source("return nope(1)").unwrap_err();
        assert_eq!(
            err,
            LowerError::UndefinedFunction {
                name: "nope".to_string(),
                span: Span::new(7, 11, 0),
            }
        );
    }

    #[test]
    fn test_undefined_function_lowers_no_arguments() {
        // Under the strict policy, lowering `a` would fail with a different error.
        let err = lower_strict("return nope(a)").unwrap_err();
        assert!(matches!(err, LowerError::UndefinedFunction { .. }));
    }

    #[test]
    fn test_entry_function_is_not_callable() {
        let err = lower_strict("x = 1\nreturn main(q)").unwrap_err();
        assert_eq!(
            err,
            LowerError::UndefinedFunction {
                name: "main".to_string(),
                span: Span::new(13, 17, 0),
            }
        );
    }

    #[test]
    fn test_call_before_declaration_is_undefined() {
        let err = lower_source("x = f(1); fn f(a) { return a } return x").unwrap_err();
        assert!(matches!(err, LowerError::UndefinedFunction { .. }));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = lower_source("fn f(a, b) { return a } return f(1)").unwrap_err();
        assert!(matches!(
            err,
            LowerError::ArityMismatch { expected: 2, found: 1, .. }
        ));
    }

    #[test]
    fn test_duplicate_function() {
        let err = lower_source("extern f(a); fn f(a) { return a } return 0").unwrap_err();
        assert!(matches!(err, LowerError::DuplicateFunction { ref name, .. } if name == "f"));

        let err = lower_source("fn main() { return 0 } return 0").unwrap_err();
        assert!(matches!(err, LowerError::DuplicateFunction { .. }));
    }

    #[test]
    fn test_missing_return_in_function() {
        let err = lower_source("fn f(a) { a + 1 } return 0").unwrap_err();
        assert!(matches!(err, LowerError::MissingReturn { ref name, .. } if name == "f"));
    }

    #[test]
    fn test_missing_return_in_entry() {
        let err = lower_source("x = 1").unwrap_err();
        assert!(matches!(err, LowerError::MissingReturn { ref name, .. } if name == ENTRY_FUNCTION));

        let err = lower_source("").unwrap_err();
        assert!(matches!(err, LowerError::MissingReturn { .. }));
    }

    #[test]
    fn test_function_parameters_are_stored() {
        let module = lower_source("fn add(a, b) { return a + b } return add(1, 2)").unwrap();
        let add = module.find_function("add").unwrap();

        assert_eq!(add.param_count, 2);
        assert_eq!(add.return_type, IrType::I64);
        let insts = &add.block(add.entry_block).instructions;
        assert_eq!(insts[0], Instruction::Alloca { slot: SlotId(0) });
        assert_eq!(insts[1], Instruction::Store { slot: SlotId(0), value: Value::Param(0) });
        assert_eq!(insts[2], Instruction::Alloca { slot: SlotId(1) });
        assert_eq!(insts[3], Instruction::Store { slot: SlotId(1), value: Value::Param(1) });
        assert!(matches!(add.block(add.entry_block).terminator, Terminator::Return(Some(_))));
    }

    #[test]
    fn test_scope_isolation() {
        let module = lower_source(
            "x = 10
             fn f(a) { x = a; return x }
             fn g(b) { return x }
             return x",
        )
        .unwrap();

        // `g` cannot see `x` from `f` or from the top level: it gets its own slot.
        let g = module.find_function("g").unwrap();
        let names: Vec<_> = g.slots.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "x"]);

        // The top level kept a single `x`.
        assert_eq!(module.entry_function().unwrap().slots.len(), 1);
    }

    #[test]
    fn test_recursion_resolves() {
        assert!(lower_source("fn f(n) { return f(n) } return 0").is_ok());
    }

    #[test]
    fn test_statements_after_return_are_lowered() {
        let module = lower_source("return 1; x = 2; return 3").unwrap();
        let insts = entry_instructions(&module);

        assert!(insts.iter().any(|i| matches!(i, Instruction::Store { value: Value::Const(2), .. })));
        assert_eq!(insts.last(), Some(&Instruction::PublishResult(Value::Const(3))));
    }

    #[test]
    fn test_store_result_is_not_a_value() {
        let err = lower_source("return x = 5").unwrap_err();
        assert!(matches!(err, LowerError::NotAValue { .. }));
        assert_eq!(err.code(), "E2007");
    }

    #[test]
    fn test_operand_order() {
        let module = lower_source("extern t(v); return t(1) + t(2)").unwrap();
        let insts = entry_instructions(&module);

        let call_args: Vec<_> = insts
            .iter()
            .filter_map(|i| match i {
                Instruction::Call { args, .. } => Some(args[0]),
                _ => None,
            })
            .collect();
        assert_eq!(call_args, vec![Value::Const(1), Value::Const(2)]);
    }

    #[test]
    fn test_error_spans_point_at_source() {
        let source = "x = 1\nreturn x % 2";
        let err = lower_source(source).unwrap_err();
        let span = err.span();
        assert_eq!(&source[span.start..span.end], "x % 2");
    }
}
