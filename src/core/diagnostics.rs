//! Source locations and the diagnostic sink.
//!
//! Diagnostics are plain text lines of the form `<file>:<line>:<col>: <message>`.
//! Reporting never fails: a broken error stream just loses the message, the
//! caller still gets the failure through its `Result`.

use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use super::error::CompileError;

/// A position in an input file. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Loc {
    pub path: Rc<str>,
    pub line: usize,
    pub col: usize,
}

impl Loc {
    pub fn new(path: Rc<str>, line: usize, col: usize) -> Self {
        Self { path, line, col }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.col)
    }
}

/// Writes compile errors to an error stream.
pub struct Diagnostics<W: Write> {
    stream: W,
}

impl Diagnostics<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> Diagnostics<W> {
    pub fn new(stream: W) -> Self {
        Self { stream }
    }

    /// Emit the error's primary line followed by its notes.
    pub fn report(&mut self, err: &CompileError) {
        let _ = writeln!(self.stream, "{err}");
        for note in err.notes() {
            let _ = writeln!(self.stream, "{note}");
        }
    }

    pub fn into_inner(self) -> W {
        self.stream
    }
}
