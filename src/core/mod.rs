//! Core compiler infrastructure shared by the frontend and every backend.
//!
//! - `diagnostics` - source locations and the error stream sink
//! - `error` - the [`CompileError`] taxonomy
//! - `session` - arena-backed name interning and statistics

pub mod diagnostics;
pub mod error;
pub mod session;

pub use diagnostics::{Diagnostics, Loc};
pub use error::{CompileError, CompileResult};
pub use session::{CompilationSession, SessionStats};
