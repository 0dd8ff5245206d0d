//! Source text to IR: tokens, the lexer and the single-pass compiler.

pub mod compiler;
pub mod lexer;
pub mod token;

pub use compiler::Compiler;
pub use lexer::{Lexer, ParsePoint};
pub use token::{Token, TokenKind, TokenValue};
