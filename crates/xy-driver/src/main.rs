use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::OnceLock;
use xy_lexer::{Lexer, TokenKind};

use xy_driver::{DriverError, RunOptions};

fn version_string() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| {
        format!(
            "{} (host {})",
            env!("CARGO_PKG_VERSION"),
            target_lexicon::Triple::host()
        )
    })
}

#[derive(Parser)]
#[command(
    name = "xyc",
    version = version_string(),
    about = "xy compiler: lowers xy programs to IR and runs them with a JIT"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); overrides XYC_LOG
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program and run it
    ///
    /// Integer division by zero (or i64::MIN / -1) traps and kills the process.
    Run {
        /// Input xy file
        input: PathBuf,

        /// Reject reads of variables that were never assigned
        #[arg(long)]
        strict: bool,
    },

    /// Lower a program and print its IR
    Ir {
        /// Input xy file
        input: PathBuf,

        /// Write the IR to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reject reads of variables that were never assigned
        #[arg(long)]
        strict: bool,
    },

    /// Lex a file and show tokens (debug)
    Lex {
        /// Input xy file
        input: PathBuf,

        /// Show token positions
        #[arg(short, long)]
        positions: bool,
    },

    /// Parse a file and show the AST (debug)
    Parse {
        /// Input xy file
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run { input, strict } => run_command(input, RunOptions { strict }),
        Commands::Ir { input, output, strict } => ir_command(input, output, RunOptions { strict }),
        Commands::Lex { input, positions } => lex_command(input, positions),
        Commands::Parse { input } => parse_command(input),
    }
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().filter_or("XYC_LOG", "warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();
}

fn run_command(input: PathBuf, options: RunOptions) -> ExitCode {
    let filename = input.to_string_lossy().to_string();
    let source = match xy_driver::read_source(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match xy_driver::run_source(&source, options) {
        Ok(result) => {
            println!("Result: {}", result);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_driver_error(&err, &filename, &source);
            ExitCode::FAILURE
        }
    }
}

fn ir_command(input: PathBuf, output: Option<PathBuf>, options: RunOptions) -> ExitCode {
    let filename = input.to_string_lossy().to_string();
    let source = match xy_driver::read_source(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let module = match xy_driver::compile_to_ir(&source, options) {
        Ok(module) => module,
        Err(err) => {
            report_driver_error(&err, &filename, &source);
            return ExitCode::FAILURE;
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = fs::write(&path, module.to_string()) {
                eprintln!("Error writing {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
        None => print!("{}", module),
    }
    ExitCode::SUCCESS
}

fn lex_command(input: PathBuf, positions: bool) -> ExitCode {
    let filename = input.to_string_lossy().to_string();
    let source = match xy_driver::read_source(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tokens = Lexer::new(&source).tokenize();

    println!("Tokens for {}:\n", filename);
    for (i, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Eof {
            println!("{:4} | {:?}", i, token.kind);
            break;
        }

        if positions {
            println!(
                "{:4} | {:16?} | {:?} | {}..{}",
                i, token.kind, token.value, token.span.start, token.span.end
            );
        } else {
            println!("{:4} | {:16?} | {:?}", i, token.kind, token.value);
        }
    }

    let errors: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Error).collect();
    if !errors.is_empty() {
        for token in errors {
            report_error("E0001", "Lexical error", &token.value, token.span.start, token.span.end, &filename, &source);
        }
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn parse_command(input: PathBuf) -> ExitCode {
    let filename = input.to_string_lossy().to_string();
    let source = match xy_driver::read_source(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match xy_driver::parse(&source) {
        Ok(root) => {
            println!("{:#?}", root);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_driver_error(&err, &filename, &source);
            ExitCode::FAILURE
        }
    }
}

fn report_driver_error(err: &DriverError, filename: &str, source: &str) {
    match err {
        DriverError::Io { .. } => eprintln!("Error: {}", err),
        DriverError::Lex(tokens) => {
            for token in tokens {
                report_error("E0001", "Lexical error", &token.value, token.span.start, token.span.end, filename, source);
            }
        }
        DriverError::Parse(errors) => {
            for e in errors {
                report_error("E1000", "Parse error", &e.message, e.span.start, e.span.end, filename, source);
            }
        }
        DriverError::Lower(e) => {
            let span = e.span();
            report_error(e.code(), "Lowering failed", &e.to_string(), span.start, span.end, filename, source);
        }
        DriverError::Codegen(e) => {
            let report = Report::build(ReportKind::Error, (filename, 0..0))
                .with_code("E3000")
                .with_message(format!("Execution failed: {}", e))
                .finish();
            if report.eprint((filename, Source::from(source))).is_err() {
                eprintln!("error[E3000]: {}", e);
            }
        }
    }
}

fn report_error(code: &str, title: &str, message: &str, start: usize, end: usize, filename: &str, source: &str) {
    let span = (filename, start..end);
    let report = Report::build(ReportKind::Error, span.clone())
        .with_code(code)
        .with_message(title)
        .with_label(
            Label::new(span)
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish();
    if report.eprint((filename, Source::from(source))).is_err() {
        eprintln!("error[{}]: {}: {}", code, title, message);
    }
}
