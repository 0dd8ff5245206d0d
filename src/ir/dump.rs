//! Human readable rendering of the IR, used by the `ir` target.

use std::fmt::{self, Write};

use super::{Arg, Function, InstKind};
use crate::core::CompileResult;

impl fmt::Display for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::None => write!(f, "NONE"),
            Arg::Int(value) => write!(f, "${value}"),
            Arg::Local(local) => write!(f, "#{local}"),
            Arg::Label(label) => write!(f, ".L{label}"),
            Arg::Static(offset) => write!(f, "static[{offset}]"),
            Arg::Name(name) => write!(f, "\"{name}\""),
            Arg::List(args) => {
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Append the textual form of `func` to `out`.
pub fn dump_function(out: &mut String, func: &Function<'_>) -> CompileResult<()> {
    let _ = writeln!(
        out,
        "{}() [locals={}, params={}]",
        func.name, func.locals_count, func.params_count
    );
    for inst in &func.insts {
        let [a, b, c] = &inst.args;
        let _ = match inst.kind {
            InstKind::Nop => writeln!(out, "    nop"),
            InstKind::Label => writeln!(out, ".L{}:", inst.expect_label(0)?),
            InstKind::LocalInit => writeln!(out, "    local_init   #{}", inst.expect_local(0)?),
            InstKind::LocalAssign => {
                inst.expect_local(0)?;
                writeln!(out, "    {a} = {b}")
            }
            InstKind::Extern => {
                inst.expect_name(0)?;
                writeln!(out, "    _ = extern {a}")
            }
            InstKind::Funcall => {
                inst.expect_name(0)?;
                inst.expect_list(1)?;
                writeln!(out, "    _ = funcall {a}, {b}")
            }
            InstKind::Add
            | InstKind::Sub
            | InstKind::Lt
            | InstKind::Le
            | InstKind::Gt
            | InstKind::Ge
            | InstKind::Eq
            | InstKind::Ne => {
                inst.expect_local(0)?;
                let op = inst.kind.display().to_ascii_lowercase();
                writeln!(out, "    {a} = {op} {b}, {c}")
            }
            InstKind::Branch => {
                inst.expect_label(0)?;
                inst.expect_label(1)?;
                writeln!(out, "    _ = branch {a}, {b}, {c}")
            }
            InstKind::Jmp => writeln!(out, "    _ = jmp .L{}", inst.expect_label(0)?),
        };
    }
    Ok(())
}
