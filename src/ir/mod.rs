//! The flat, label based intermediate representation.
//!
//! A [`Function`] is a straight sequence of [`Inst`]s in program order. Control
//! flow is expressed with `LABEL` markers plus `JMP`/`BRANCH` instructions that
//! name those labels. Each instruction carries up to three [`Arg`] operands in
//! fixed, kind dependent positions:
//!
//! ```text
//! LOCAL_INIT    [local]
//! LOCAL_ASSIGN  [local, value]
//! JMP           [label]
//! BRANCH        [true label, false label, condition]
//! FUNCALL       [name, list]
//! EXTERN        [name]
//! ADD .. NE     [dest local, lhs, rhs]
//! LABEL         [label]
//! ```
//!
//! Operand kinds are only checked when a backend consumes the instruction.

use std::fmt;

use crate::core::{CompileError, CompileResult, Loc};

pub mod dump;

/// What a value operand may be, as worded in diagnostics.
pub const VALUE_KINDS: &str = "integer value, local variable index or static data";

/// Discriminant of an [`Arg`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    None,
    IntValue,
    LocalIndex,
    Label,
    StaticData,
    Name,
    List,
}

impl ArgKind {
    pub fn display(self) -> &'static str {
        match self {
            ArgKind::None => "none",
            ArgKind::IntValue => "integer value",
            ArgKind::LocalIndex => "local variable index",
            ArgKind::Label => "label",
            ArgKind::StaticData => "static data",
            ArgKind::Name => "name",
            ArgKind::List => "list",
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// An instruction operand. Names live in the compilation arena.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Arg<'a> {
    #[default]
    None,
    Int(i64),
    /// Slot in the enclosing function's local storage.
    Local(usize),
    /// Function scoped label.
    Label(usize),
    /// Byte offset into the program's static data.
    Static(usize),
    Name(&'a str),
    /// Call operands. Never contains another list.
    List(Vec<Arg<'a>>),
}

impl<'a> Arg<'a> {
    /// Build a call operand list.
    pub fn list(args: Vec<Arg<'a>>) -> Self {
        debug_assert!(args.iter().all(|arg| arg.kind() != ArgKind::List));
        Arg::List(args)
    }

    /// Whether this operand can be read as a 64-bit value.
    pub fn is_value(&self) -> bool {
        matches!(self, Arg::Int(_) | Arg::Local(_) | Arg::Static(_))
    }

    pub fn kind(&self) -> ArgKind {
        match self {
            Arg::None => ArgKind::None,
            Arg::Int(_) => ArgKind::IntValue,
            Arg::Local(_) => ArgKind::LocalIndex,
            Arg::Label(_) => ArgKind::Label,
            Arg::Static(_) => ArgKind::StaticData,
            Arg::Name(_) => ArgKind::Name,
            Arg::List(_) => ArgKind::List,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstKind {
    Nop,
    LocalInit,
    LocalAssign,
    Jmp,
    Branch,
    Funcall,
    Extern,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Label,
}

impl InstKind {
    pub fn display(self) -> &'static str {
        match self {
            InstKind::Nop => "NOP",
            InstKind::LocalInit => "LOCAL_INIT",
            InstKind::LocalAssign => "LOCAL_ASSIGN",
            InstKind::Jmp => "JMP",
            InstKind::Branch => "BRANCH",
            InstKind::Funcall => "FUNCALL",
            InstKind::Extern => "EXTERN",
            InstKind::Add => "ADD",
            InstKind::Sub => "SUB",
            InstKind::Lt => "LT",
            InstKind::Le => "LE",
            InstKind::Gt => "GT",
            InstKind::Ge => "GE",
            InstKind::Eq => "EQ",
            InstKind::Ne => "NE",
            InstKind::Label => "LABEL",
        }
    }

    /// Whether this is one of the binary arithmetic/comparison operations.
    pub fn is_binop(self) -> bool {
        matches!(
            self,
            InstKind::Add
                | InstKind::Sub
                | InstKind::Lt
                | InstKind::Le
                | InstKind::Gt
                | InstKind::Ge
                | InstKind::Eq
                | InstKind::Ne
        )
    }
}

impl fmt::Display for InstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inst<'a> {
    pub kind: InstKind,
    pub loc: Loc,
    pub args: [Arg<'a>; 3],
}

impl<'a> Inst<'a> {
    pub fn new(kind: InstKind, loc: Loc, args: [Arg<'a>; 3]) -> Self {
        Self { kind, loc, args }
    }

    pub fn label(loc: Loc, label: usize) -> Self {
        Self::new(InstKind::Label, loc, [Arg::Label(label), Arg::None, Arg::None])
    }

    pub fn jmp(loc: Loc, label: usize) -> Self {
        Self::new(InstKind::Jmp, loc, [Arg::Label(label), Arg::None, Arg::None])
    }

    pub fn branch(loc: Loc, then_label: usize, else_label: usize, cond: Arg<'a>) -> Self {
        Self::new(
            InstKind::Branch,
            loc,
            [Arg::Label(then_label), Arg::Label(else_label), cond],
        )
    }

    pub fn extern_decl(loc: Loc, name: &'a str) -> Self {
        Self::new(InstKind::Extern, loc, [Arg::Name(name), Arg::None, Arg::None])
    }

    /// Operand `index` as a value: an integer, a local or a static data offset.
    pub fn expect_value(&self, index: usize) -> CompileResult<&Arg<'a>> {
        let arg = &self.args[index];
        if !arg.is_value() {
            return Err(self.unexpected_arg(index, VALUE_KINDS));
        }
        Ok(arg)
    }

    pub fn expect_local(&self, index: usize) -> CompileResult<usize> {
        match self.args[index] {
            Arg::Local(local) => Ok(local),
            _ => Err(self.unexpected_arg(index, ArgKind::LocalIndex.display())),
        }
    }

    pub fn expect_label(&self, index: usize) -> CompileResult<usize> {
        match self.args[index] {
            Arg::Label(label) => Ok(label),
            _ => Err(self.unexpected_arg(index, ArgKind::Label.display())),
        }
    }

    pub fn expect_name(&self, index: usize) -> CompileResult<&'a str> {
        match self.args[index] {
            Arg::Name(name) => Ok(name),
            _ => Err(self.unexpected_arg(index, ArgKind::Name.display())),
        }
    }

    pub fn expect_list(&self, index: usize) -> CompileResult<&[Arg<'a>]> {
        match &self.args[index] {
            Arg::List(args) => Ok(args),
            _ => Err(self.unexpected_arg(index, ArgKind::List.display())),
        }
    }

    /// Error for operand `index` not being one of `expected`.
    pub fn unexpected_arg(&self, index: usize, expected: &'static str) -> CompileError {
        CompileError::UnexpectedArg {
            loc: self.loc.clone(),
            inst: self.kind,
            index,
            expected,
            found: self.args[index].kind(),
        }
    }
}

/// A parsed function: its instructions plus local/label counters.
#[derive(Debug, Clone, PartialEq)]
pub struct Function<'a> {
    pub name: &'a str,
    pub loc: Loc,
    pub insts: Vec<Inst<'a>>,
    pub locals_count: usize,
    pub labels_count: usize,
    /// Parameters occupy local slots `0..params_count`.
    pub params_count: usize,
}

impl<'a> Function<'a> {
    pub fn new(name: &'a str, loc: Loc) -> Self {
        Self {
            name,
            loc,
            insts: Vec::new(),
            locals_count: 0,
            labels_count: 0,
            params_count: 0,
        }
    }

    pub fn push_inst(&mut self, inst: Inst<'a>) {
        log::trace!("{}: {} {:?}", self.name, inst.kind, inst.args);
        self.insts.push(inst);
    }

    pub fn alloc_local(&mut self) -> usize {
        let local = self.locals_count;
        self.locals_count += 1;
        local
    }

    pub fn alloc_label(&mut self) -> usize {
        let label = self.labels_count;
        self.labels_count += 1;
        label
    }
}

/// All functions of a program plus the static data blob their string
/// literals point into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program<'a> {
    pub functions: Vec<Function<'a>>,
    pub static_data: Vec<u8>,
}
