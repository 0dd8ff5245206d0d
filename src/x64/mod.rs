//! x86-64 architecture-specific components.
//!
//! - Microsoft x64 calling convention and frame layout
//! - fasm source generation for win32 targets

pub mod calling_convention;
pub mod fasm;

pub use calling_convention::{CCAssigner, CCAssignment, FunctionFrame, Reg, Win64Assigner};
pub use fasm::FasmBackend;
