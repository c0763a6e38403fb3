//! Error types for code generation and execution

use cranelift_module::ModuleError;
use thiserror::Error;
use xy_ir::FuncId;

/// Error type for code generation failures
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("failed to configure the native target: {0}")]
    Isa(String),

    #[error("module has no entry function")]
    NoEntry,

    #[error("entry function `{0}` must take no arguments and return nothing")]
    InvalidEntry(String),

    #[error("no host symbol for extern function `{name}`")]
    UnresolvedSymbol { name: String },

    #[error("extern function `{name}` is declared with {declared} parameter(s) but the host symbol takes {expected}")]
    SignatureMismatch {
        name: String,
        declared: usize,
        expected: usize,
    },

    #[error("block `{block}` in function `{function}` has no terminator")]
    MissingTerminator { function: String, block: String },

    #[error("call to unknown function {0}")]
    UnknownFunction(FuncId),

    #[error("malformed function `{function}`: {message}")]
    Malformed { function: String, message: String },

    #[error("verifier errors in function `{function}`:\n{errors}")]
    Verifier { function: String, errors: String },

    #[error(transparent)]
    Module(#[from] ModuleError),
}
