//! Bulan - a small ahead-of-time compiler for a C-like scripting language.
//!
//! Source text is lexed and parsed in a single pass straight into a flat,
//! label based IR, which one of several backends turns into text: a readable
//! IR dump, fasm x86-64 assembly for Windows, or an HTML page with a script.
//!
//! # Primary Usage
//!
//! ```
//! use bulan::{compile, Target};
//!
//! let source = b"extern exit; function main() { exit(); }";
//! let compiled = compile("main.bn", source, Target::FasmX86_64Win32);
//! assert!(compiled.result.is_ok());
//! assert!(compiled.output.contains("call exit"));
//! ```
//!
//! # Architecture
//!
//! - [`core`] - errors, diagnostics and the arena-backed session
//! - [`frontend`] - tokens, lexer and the parser/IR builder
//! - [`ir`] - instructions, operands and functions
//! - [`codegen`] - targets, the [`Backend`] trait, IR and html-js backends
//! - [`x64`] - Windows x64 calling convention and the fasm backend

pub mod codegen;
pub mod core;
pub mod frontend;
pub mod ir;
pub mod x64;

use bumpalo::Bump;

pub use codegen::{Backend, Target};
pub use self::core::{CompilationSession, CompileError, CompileResult, Diagnostics, Loc, SessionStats};
pub use frontend::{Compiler, Lexer};
pub use ir::{Arg, Function, Inst, InstKind, Program};

/// Generated text plus the outcome of one compilation.
#[derive(Debug)]
pub struct Compiled {
    /// Everything the backend produced, including output generated before a
    /// failure.
    pub output: String,
    pub result: CompileResult<SessionStats>,
}

/// Compile `source` for `target`. `path` is only used in locations.
pub fn compile(path: &str, source: &[u8], target: Target) -> Compiled {
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let mut compiler = Compiler::new(&session, Lexer::new(path, source));
    let mut backend = target.backend();
    let mut output = String::new();

    log::debug!("compiling {path} for target {target}");
    let result = compiler
        .compile_program(&mut *backend, &mut output)
        .map(|()| {
            let stats = session.stats();
            log::info!("{stats}");
            log::debug!("arena holds {} bytes", session.memory_used());
            stats
        });

    Compiled { output, result }
}
