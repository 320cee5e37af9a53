//! SQL front end: lexer, parser and statement tree

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::Statement;
pub use parser::Parser;

/// Parse a single statement
pub fn parse(sql: &str) -> crate::error::Result<Statement> {
    Parser::new(sql)?.parse()
}
