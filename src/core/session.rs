// This module provides arena-based compilation session management using the bumpalo crate.
// CompilationSession borrows the arena that owns every name referenced by the IR: function
// names, callee names and extern symbols are interned once and handed out as `&'arena str`,
// so instructions can be cloned and moved freely while all names stay valid until the arena
// is dropped after code generation. The session also gathers SessionStats (functions,
// instructions, locals, labels, static data bytes) which the driver logs once the program
// has been generated.

//! Arena-based compilation session management.

use bumpalo::Bump;
use hashbrown::HashMap;
use std::cell::RefCell;
use std::fmt;

use crate::ir::Function;

/// Arena-based compilation session.
///
/// All interned names share the arena lifetime, so a [`Function`] built during
/// the session can be handed to any backend without copying its strings.
pub struct CompilationSession<'arena> {
    /// Arena allocator owning interned names.
    arena: &'arena Bump,

    /// Session statistics for debugging.
    stats: RefCell<SessionStats>,

    /// String interning for names used by instructions.
    interned_strings: RefCell<HashMap<String, &'arena str>>,
}

impl<'arena> CompilationSession<'arena> {
    /// Create a new compilation session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: RefCell::new(SessionStats::default()),
            interned_strings: RefCell::new(HashMap::new()),
        }
    }

    /// Intern a string in the arena.
    pub fn intern_str(&self, s: &str) -> &'arena str {
        let mut strings = self.interned_strings.borrow_mut();
        if let Some(&interned) = strings.get(s) {
            return interned;
        }

        let interned: &'arena str = self.arena.alloc_str(s);
        strings.insert(s.to_string(), interned);
        interned
    }

    /// Record a fully parsed function.
    pub fn record_function(&self, func: &Function<'_>) {
        let mut stats = self.stats.borrow_mut();
        stats.functions_compiled += 1;
        stats.instructions_emitted += func.insts.len();
        stats.locals_allocated += func.locals_count;
        stats.labels_allocated += func.labels_count;

        if stats.largest_function_size < func.insts.len() || stats.largest_function_name.is_empty() {
            stats.largest_function_size = func.insts.len();
            stats.largest_function_name = func.name.to_string();
        }
    }

    /// Record bytes appended to the static data blob.
    pub fn record_static_data(&self, bytes: usize) {
        self.stats.borrow_mut().static_data_bytes += bytes;
    }

    /// Snapshot of the statistics gathered so far.
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }

    /// Bytes currently held by the arena.
    pub fn memory_used(&self) -> usize {
        self.arena.allocated_bytes()
    }
}

/// Compilation statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub functions_compiled: usize,
    pub instructions_emitted: usize,
    pub locals_allocated: usize,
    pub labels_allocated: usize,
    pub static_data_bytes: usize,
    pub largest_function_name: String,
    pub largest_function_size: usize,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compilation Session Statistics:")?;
        writeln!(f, "  Functions compiled: {}", self.functions_compiled)?;
        writeln!(f, "  Instructions emitted: {}", self.instructions_emitted)?;
        writeln!(f, "  Locals allocated: {}", self.locals_allocated)?;
        writeln!(f, "  Labels allocated: {}", self.labels_allocated)?;
        writeln!(f, "  Static data: {} bytes", self.static_data_bytes)?;

        if !self.largest_function_name.is_empty() {
            writeln!(
                f,
                "  Largest function: {} ({} instructions)",
                self.largest_function_name, self.largest_function_size
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_returns_same_slice() {
        let arena = Bump::new();
        let session = CompilationSession::new(&arena);

        let a = session.intern_str("putchar");
        let b = session.intern_str(&String::from("putchar"));
        assert_eq!(a, "putchar");
        assert!(std::ptr::eq(a, b));
        assert!(session.memory_used() > 0);
    }

    #[test]
    fn test_stats_display() {
        let arena = Bump::new();
        let session = CompilationSession::new(&arena);
        session.record_static_data(3);

        let text = session.stats().to_string();
        assert!(text.contains("Static data: 3 bytes"));
        assert!(!text.contains("Largest function"));
    }
}
