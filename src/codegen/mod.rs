// This module defines the code generation targets of the bulan compiler and the Backend trait
// every generator implements. A backend is driven by the program compiler in four steps: the
// program prolog once, each finished Function as soon as it has been parsed, the static data
// blob once after the last function, and finally the program epilog. Backends append text to
// a shared output buffer and report operand-kind violations as CompileError::UnexpectedArg at
// the source location of the offending instruction.

//! Code generation targets and the [`Backend`] trait.

use std::fmt;

use crate::core::CompileResult;
use crate::ir::Function;
use crate::x64::fasm::FasmBackend;

pub mod html_js;
pub mod ir;

pub use html_js::HtmlJsBackend;
pub use ir::IrBackend;

/// Append one formatted line to a `String` output buffer.
///
/// Writing into a `String` cannot fail, so the `fmt::Result` is dropped.
macro_rules! emit {
    ($out:expr, $($arg:tt)*) => {{
        use std::fmt::Write as _;
        let _ = writeln!($out, $($arg)*);
    }};
}
pub(crate) use emit;

/// A text generator driven once per program.
pub trait Backend {
    /// Emitted before the first function.
    fn program_prolog(&mut self, _out: &mut String) {}

    /// Lower one completed function.
    fn function(&mut self, out: &mut String, func: &Function<'_>) -> CompileResult<()>;

    /// Emitted once after all functions, with every string literal's bytes.
    fn static_data(&mut self, _out: &mut String, _data: &[u8]) {}

    /// Emitted last.
    fn program_epilog(&mut self, _out: &mut String) {}
}

/// Output format selected with `-t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Target {
    Ir,
    #[default]
    FasmX86_64Win32,
    HtmlJs,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Ir, Target::FasmX86_64Win32, Target::HtmlJs];

    pub fn name(self) -> &'static str {
        match self {
            Target::Ir => "ir",
            Target::FasmX86_64Win32 => "fasm_x86-64_win32",
            Target::HtmlJs => "html-js",
        }
    }

    pub fn from_name(name: &str) -> Option<Target> {
        Self::ALL.into_iter().find(|target| target.name() == name)
    }

    /// File the generated program is written to when no `-o` is given.
    /// `None` means standard output.
    pub fn default_output(self) -> Option<&'static str> {
        match self {
            Target::Ir => None,
            Target::FasmX86_64Win32 => Some("a.s"),
            Target::HtmlJs => Some("a.html"),
        }
    }

    /// Fresh generator for this target.
    pub fn backend(self) -> Box<dyn Backend> {
        match self {
            Target::Ir => Box::new(IrBackend),
            Target::FasmX86_64Win32 => Box::new(FasmBackend::new()),
            Target::HtmlJs => Box::new(HtmlJsBackend::new()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_names_round_trip() {
        for target in Target::ALL {
            assert_eq!(Target::from_name(target.name()), Some(target));
        }
        assert_eq!(Target::from_name("list"), None);
        assert_eq!(Target::from_name("fasm"), None);
        assert_eq!(Target::default(), Target::FasmX86_64Win32);
    }

    #[test]
    fn test_default_outputs() {
        assert_eq!(Target::Ir.default_output(), None);
        assert_eq!(Target::FasmX86_64Win32.default_output(), Some("a.s"));
        assert_eq!(Target::HtmlJs.default_output(), Some("a.html"));
    }
}
