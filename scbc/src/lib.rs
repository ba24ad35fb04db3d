pub mod codegen;
mod error;
pub mod grammer;

pub use arch::Target;
pub use codegen::{CodeGen, Output};
pub use error::Error;
pub use grammer::lexer::Lexer;
pub use grammer::parser::Parser;

/// Lex, parse and generate in one go.
pub fn compile(source: &str, target: Target) -> Result<Output, Error> {
    let tokens = Lexer::new(source).parse()?;
    let ast = Parser::new(tokens.into_iter()).parse();
    CodeGen::new(target).generate(&ast)
}
