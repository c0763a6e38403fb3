//! xy Compiler Driver Library
//!
//! The module driver: source text in, program result out
//! (lex → parse → lower → JIT). The `xyc` binary is a thin CLI over this.

pub mod pipeline;

pub use pipeline::{
    compile_to_ir, parse, read_source, run_program, run_source, run_source_with, DriverError,
    RunOptions,
};
