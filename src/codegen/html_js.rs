//! The `html-js` target: an HTML page whose script runs the program.
//!
//! Locals become entries of a per-function `vars` array and binary operations go
//! through a scratch `acc` variable. Labels, jumps and branches have no lowering
//! here; functions using `if` or `while` lose their control flow.

use super::{emit, Backend};
use crate::core::CompileResult;
use crate::ir::{Arg, Function, Inst, InstKind};

#[derive(Debug, Default)]
pub struct HtmlJsBackend {
    /// Control flow instructions skipped so far.
    dropped: usize,
}

impl HtmlJsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn compile_inst(&mut self, out: &mut String, func: &str, inst: &Inst<'_>) -> CompileResult<()> {
        match inst.kind {
            InstKind::Nop => {}
            InstKind::Extern => {
                inst.expect_name(0)?;
            }
            InstKind::LocalInit => {
                inst.expect_local(0)?;
                emit!(out, "        vars.push(0);");
            }
            InstKind::LocalAssign => {
                let dest = inst.expect_local(0)?;
                let value = operand(inst.expect_value(1)?);
                emit!(out, "        vars[{dest}] = {value};");
            }
            InstKind::Add
            | InstKind::Sub
            | InstKind::Lt
            | InstKind::Le
            | InstKind::Gt
            | InstKind::Ge
            | InstKind::Eq
            | InstKind::Ne => {
                let dest = inst.expect_local(0)?;
                let lhs = operand(inst.expect_value(1)?);
                let rhs = operand(inst.expect_value(2)?);
                emit!(out, "        acc = {lhs};");
                match inst.kind {
                    InstKind::Add => emit!(out, "        acc += {rhs};"),
                    InstKind::Sub => emit!(out, "        acc -= {rhs};"),
                    kind => emit!(out, "        acc = +(acc {} {rhs});", comparison(kind)),
                }
                emit!(out, "        vars[{dest}] = acc;");
            }
            InstKind::Funcall => {
                let name = inst.expect_name(0)?;
                let args = inst.expect_list(1)?;
                if !args.iter().all(Arg::is_value) {
                    return Err(inst.unexpected_arg(1, "list of values"));
                }
                let args: Vec<String> = args.iter().map(operand).collect();
                emit!(out, "        {name}({});", args.join(", "));
            }
            InstKind::Jmp | InstKind::Branch | InstKind::Label => {
                self.dropped += 1;
                log::warn!(
                    "{}: html-js: {} in `{func}` has no lowering and is dropped",
                    inst.loc,
                    inst.kind
                );
            }
        }
        Ok(())
    }
}

/// Script expression for a value operand.
fn operand(arg: &Arg<'_>) -> String {
    match *arg {
        Arg::Local(local) => format!("vars[{local}]"),
        Arg::Int(value) => value.to_string(),
        Arg::Static(offset) => offset.to_string(),
        _ => String::from("undefined"),
    }
}

fn comparison(kind: InstKind) -> &'static str {
    match kind {
        InstKind::Lt => "<",
        InstKind::Le => "<=",
        InstKind::Gt => ">",
        InstKind::Ge => ">=",
        InstKind::Eq => "===",
        _ => "!==",
    }
}

impl Backend for HtmlJsBackend {
    fn program_prolog(&mut self, out: &mut String) {
        emit!(out, "<!DOCTYPE html>");
        emit!(out, "<html>");
        emit!(out, "<head>");
        emit!(out, "    <title>Bulan's Generated HTML-JS</title>");
        emit!(out, "</head>");
        emit!(out, "<body>");
        emit!(out, "<div id=\"console\"></div>");
        emit!(out, "    <script>");
        emit!(out, "    const putchar = (c) => {{");
        emit!(out, "        const el = document.getElementById(\"console\");");
        emit!(out, "        if (c === 10) el.innerHTML += \"<br/>\";");
        emit!(out, "        else el.innerHTML += String.fromCharCode(c);");
        emit!(out, "    }};");
    }

    fn function(&mut self, out: &mut String, func: &Function<'_>) -> CompileResult<()> {
        log::debug!("html-js: generating `{}` ({} instructions)", func.name, func.insts.len());

        emit!(out, "    function {}(...args) {{", func.name);
        emit!(out, "        let vars = [];");
        emit!(out, "        let acc = 0;");
        for param in 0..func.params_count {
            emit!(out, "        vars.push(args[{param}] ?? 0);");
        }
        for inst in &func.insts {
            self.compile_inst(out, func.name, inst)?;
        }
        emit!(out, "    }}");
        Ok(())
    }

    fn static_data(&mut self, out: &mut String, data: &[u8]) {
        let bytes: Vec<String> = data.iter().map(u8::to_string).collect();
        emit!(out, "    const static_data = new Uint8Array([{}]);", bytes.join(", "));
    }

    fn program_epilog(&mut self, out: &mut String) {
        if self.dropped > 0 {
            log::warn!("html-js: dropped {} control flow instructions", self.dropped);
        }
        emit!(out, "    main();");
        emit!(out, "    </script>");
        emit!(out, "</body>");
        emit!(out, "</html>");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CompileError, Loc};

    fn loc() -> Loc {
        Loc::new("page.bn".into(), 1, 1)
    }

    fn body(func: &Function<'_>) -> Vec<String> {
        let mut out = String::new();
        HtmlJsBackend::new().function(&mut out, func).unwrap();
        out.lines().map(|line| line.trim().to_string()).collect()
    }

    #[test]
    fn test_accumulator_sequence() {
        let mut func = Function::new("main", loc());
        let x = func.alloc_local();
        let t = func.alloc_local();
        func.push_inst(Inst::new(InstKind::LocalInit, loc(), [Arg::Local(x), Arg::None, Arg::None]));
        func.push_inst(Inst::new(
            InstKind::LocalAssign,
            loc(),
            [Arg::Local(x), Arg::Int(2), Arg::None],
        ));
        func.push_inst(Inst::new(InstKind::LocalInit, loc(), [Arg::Local(t), Arg::None, Arg::None]));
        func.push_inst(Inst::new(
            InstKind::Sub,
            loc(),
            [Arg::Local(t), Arg::Local(x), Arg::Int(1)],
        ));
        func.push_inst(Inst::new(
            InstKind::Eq,
            loc(),
            [Arg::Local(t), Arg::Local(t), Arg::Int(1)],
        ));

        assert_eq!(
            body(&func),
            [
                "function main(...args) {",
                "let vars = [];",
                "let acc = 0;",
                "vars.push(0);",
                "vars[0] = 2;",
                "vars.push(0);",
                "acc = vars[0];",
                "acc -= 1;",
                "vars[1] = acc;",
                "acc = vars[1];",
                "acc = +(acc === 1);",
                "vars[1] = acc;",
                "}",
            ]
        );
    }

    #[test]
    fn test_call_and_params() {
        let mut func = Function::new("show", loc());
        let c = func.alloc_local();
        func.params_count = 1;
        func.push_inst(Inst::extern_decl(loc(), "putchar"));
        func.push_inst(Inst::new(
            InstKind::Funcall,
            loc(),
            [Arg::Name("putchar"), Arg::list(vec![Arg::Local(c), Arg::Static(3)]), Arg::None],
        ));

        assert_eq!(
            body(&func),
            [
                "function show(...args) {",
                "let vars = [];",
                "let acc = 0;",
                "vars.push(args[0] ?? 0);",
                "putchar(vars[0], 3);",
                "}",
            ]
        );
    }

    #[test]
    fn test_control_flow_is_dropped() {
        let mut func = Function::new("main", loc());
        let l = func.alloc_label();
        func.push_inst(Inst::branch(loc(), l, l, Arg::Int(1)));
        func.push_inst(Inst::label(loc(), l));
        func.push_inst(Inst::jmp(loc(), l));

        let mut backend = HtmlJsBackend::new();
        let mut out = String::new();
        backend.function(&mut out, &func).unwrap();
        assert_eq!(backend.dropped, 3);
        assert!(!out.contains("L0"));
    }

    #[test]
    fn test_bad_assign_source() {
        let mut func = Function::new("main", loc());
        func.push_inst(Inst::new(
            InstKind::LocalAssign,
            loc(),
            [Arg::Local(0), Arg::Label(0), Arg::None],
        ));

        let err = HtmlJsBackend::new()
            .function(&mut String::new(), &func)
            .unwrap_err();
        assert!(matches!(err, CompileError::UnexpectedArg { index: 1, .. }));
    }

    #[test]
    fn test_page_frame() {
        let mut backend = HtmlJsBackend::new();
        let mut out = String::new();
        backend.program_prolog(&mut out);
        backend.static_data(&mut out, b"hi\0");
        backend.program_epilog(&mut out);

        assert!(out.starts_with("<!DOCTYPE html>\n"));
        assert!(out.contains("const putchar = (c) => {"));
        assert!(out.contains("const static_data = new Uint8Array([104, 105, 0]);"));
        assert!(out.ends_with("    main();\n    </script>\n</body>\n</html>\n"));
    }
}
