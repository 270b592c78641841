use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use coral::diagnostic::render_diagnostics;

#[derive(Parser)]
#[command(
    name = "coral",
    version,
    about = "Coral compiler back-end: RV32 code generation"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate assembly from a typed-AST JSON file
    Build {
        /// Input typed-AST file (.ast.json)
        input: PathBuf,
        /// Output assembly file (default: <input>.s)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Original source file, for rendered diagnostics
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Validate a typed-AST file and report its diagnostics
    Check {
        /// Input typed-AST file (.ast.json)
        input: PathBuf,
        /// Original source file, for rendered diagnostics
        #[arg(long)]
        source: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            input,
            output,
            source,
        } => cmd_build(&input, output, source),
        Command::Check { input, source } => cmd_check(&input, source),
    }
}

fn read_program(path: &Path) -> coral::ast::Program {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: cannot read {}: {}", path.display(), err);
            process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("error: malformed program AST in {}: {}", path.display(), err);
            process::exit(1);
        }
    }
}

/// Surface front-end diagnostics; exits when the program has errors.
fn report_diagnostics(program: &coral::ast::Program, input: &Path, source: Option<PathBuf>) {
    if program.errors.is_empty() {
        return;
    }
    let source_text = source.as_ref().and_then(|p| std::fs::read_to_string(p).ok());
    let filename = source
        .as_deref()
        .unwrap_or(input)
        .to_string_lossy()
        .into_owned();
    render_diagnostics(&program.errors, &filename, source_text.as_deref());
    if program.has_errors() {
        process::exit(1);
    }
}

fn cmd_build(input: &Path, output: Option<PathBuf>, source: Option<PathBuf>) {
    let program = read_program(input);
    report_diagnostics(&program, input, source);

    let assembly = coral::compile(&program);
    let out_path = output.unwrap_or_else(|| input.with_extension("s"));
    if let Err(err) = std::fs::write(&out_path, assembly) {
        eprintln!("error: cannot write {}: {}", out_path.display(), err);
        process::exit(1);
    }
    println!("wrote {}", out_path.display());
}

fn cmd_check(input: &Path, source: Option<PathBuf>) {
    let program = read_program(input);
    report_diagnostics(&program, input, source);
    println!(
        "ok: {} declarations, {} top-level statements",
        program.declarations.len(),
        program.statements.len()
    );
}
