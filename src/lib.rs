pub mod ast;
pub mod codegen;
pub mod diagnostic;
pub mod span;
pub mod types;

pub use codegen::emitter::RiscvEmitter;
pub use codegen::{EmitContext, EmitStrategy, Generator};

use diagnostic::Diagnostic;

/// Generate RV32 assembly for a well-typed program using the stock
/// emission strategy.
pub fn compile(program: &ast::Program) -> String {
    let mut strategy = RiscvEmitter::new();
    Generator::new().generate(program, &mut strategy)
}

/// Parse a typed-AST JSON document and generate assembly for it.
///
/// Returns the front-end diagnostics instead when the program carries
/// errors; code is never generated for an erroneous program.
pub fn compile_json(json: &str) -> Result<String, Vec<Diagnostic>> {
    let program: ast::Program = match serde_json::from_str(json) {
        Ok(program) => program,
        Err(err) => {
            return Err(vec![Diagnostic::error(
                format!("malformed program AST: {}", err),
                span::Span::dummy(),
            )])
        }
    };
    if program.has_errors() {
        return Err(program.errors);
    }
    Ok(compile(&program))
}
