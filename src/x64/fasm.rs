// This module lowers bulan IR to flat assembler (fasm) source for x86-64 Windows, producing an
// MS64 COFF object that links against the C runtime. Code generation is a plain stack machine:
// every local lives in a fixed 8-byte slot below rbp, binary operations load their operands
// into rax and rcx, compute, and store the result back to the destination slot. Calls follow
// the Microsoft x64 convention described by Win64Assigner. Incoming parameters are spilled to
// their slots in the function prolog so the body never needs to know where they arrived.
// Per-function frame data is allocated in a bump arena that is reset after every function.

//! fasm x86-64 win32 backend.

use bumpalo::Bump;
use hashbrown::HashSet;

use super::calling_convention::{CCAssigner, CCAssignment, FunctionFrame, Reg, Win64Assigner};
use crate::codegen::{emit, Backend};
use crate::core::CompileResult;
use crate::ir::{Arg, Function, Inst, InstKind, VALUE_KINDS};

/// Generator state that outlives a single function.
pub struct FasmBackend {
    /// Scratch arena for frame layouts, reset after every function.
    frame_arena: Bump,
    /// Symbols already announced with `extrn`.
    declared_externs: HashSet<String>,
    /// Argument placement for the call being lowered.
    call_assigner: Win64Assigner,
}

impl Default for FasmBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FasmBackend {
    pub fn new() -> Self {
        Self {
            frame_arena: Bump::new(),
            declared_externs: HashSet::new(),
            call_assigner: Win64Assigner::new(),
        }
    }

    fn gen_prologue(&self, out: &mut String, func: &Function<'_>) {
        let frame = FunctionFrame::new(&self.frame_arena, func.locals_count, func.params_count);

        emit!(out, "public {}", func.name);
        emit!(out, "{}:", func.name);
        emit!(out, "    push rbp");
        emit!(out, "    mov  rbp, rsp");
        if frame.frame_size > 0 {
            emit!(out, "    sub  rsp, {}", frame.frame_size);
        }

        for (param, assignment) in frame.param_assignments.iter().enumerate() {
            let slot = FunctionFrame::slot_offset(param);
            if let Some(reg) = assignment.reg {
                emit!(out, "    mov  QWORD [rbp - {slot}], {reg}");
            } else if let Some(stack_off) = assignment.stack_off {
                let incoming = FunctionFrame::incoming_offset(stack_off);
                emit!(out, "    mov  rax, QWORD [rbp + {incoming}]");
                emit!(out, "    mov  QWORD [rbp - {slot}], rax");
            }
        }
    }

    fn gen_epilogue(&self, out: &mut String) {
        emit!(out, "    mov  rsp, rbp");
        emit!(out, "    pop  rbp");
        emit!(out, "    ret");
    }

    fn compile_inst(&mut self, out: &mut String, inst: &Inst<'_>) -> CompileResult<()> {
        match inst.kind {
            InstKind::Nop => {}
            InstKind::Label => emit!(out, ".L{}:", inst.expect_label(0)?),
            InstKind::Jmp => emit!(out, "    jmp  .L{}", inst.expect_label(0)?),
            InstKind::LocalInit => {
                let slot = FunctionFrame::slot_offset(inst.expect_local(0)?);
                emit!(out, "    mov  QWORD [rbp - {slot}], 0");
            }
            InstKind::LocalAssign => {
                let slot = FunctionFrame::slot_offset(inst.expect_local(0)?);
                load_value(out, Reg::Rax, inst.expect_value(1)?);
                emit!(out, "    mov  QWORD [rbp - {slot}], rax");
            }
            InstKind::Add
            | InstKind::Sub
            | InstKind::Lt
            | InstKind::Le
            | InstKind::Gt
            | InstKind::Ge
            | InstKind::Eq
            | InstKind::Ne => {
                let slot = FunctionFrame::slot_offset(inst.expect_local(0)?);
                load_value(out, Reg::Rax, inst.expect_value(1)?);
                load_value(out, Reg::Rcx, inst.expect_value(2)?);
                match inst.kind {
                    InstKind::Add => emit!(out, "    add  rax, rcx"),
                    InstKind::Sub => emit!(out, "    sub  rax, rcx"),
                    kind => {
                        emit!(out, "    cmp  rax, rcx");
                        emit!(out, "    {} al", set_mnemonic(kind));
                        emit!(out, "    movzx rax, al");
                    }
                }
                emit!(out, "    mov  QWORD [rbp - {slot}], rax");
            }
            InstKind::Branch => {
                let then_label = inst.expect_label(0)?;
                let else_label = inst.expect_label(1)?;
                load_value(out, Reg::Rax, inst.expect_value(2)?);
                emit!(out, "    cmp  rax, 1");
                emit!(out, "    je   .L{then_label}");
                emit!(out, "    jmp  .L{else_label}");
            }
            InstKind::Extern => {
                let name = inst.expect_name(0)?;
                if self.declared_externs.insert(name.to_string()) {
                    emit!(out, "    extrn {name}");
                } else {
                    log::trace!("extern `{name}` already declared");
                }
            }
            InstKind::Funcall => {
                let name = inst.expect_name(0)?;
                let args = inst.expect_list(1)?;
                if !args.iter().all(Arg::is_value) {
                    return Err(inst.unexpected_arg(1, "list of values"));
                }
                self.gen_call(out, name, args);
            }
        }
        Ok(())
    }

    fn gen_call(&mut self, out: &mut String, name: &str, args: &[Arg<'_>]) {
        let assigner = &mut self.call_assigner;
        assigner.reset();
        let assignments: Vec<CCAssignment> = args
            .iter()
            .map(|_| {
                let mut assignment = CCAssignment::new();
                assigner.assign_arg(&mut assignment);
                assignment
            })
            .collect();
        let area = assigner.get_stack_size();

        emit!(out, "    sub  rsp, {area}");
        // Stack arguments go through rax, so store them before filling the
        // argument registers.
        for (arg, assignment) in args.iter().zip(&assignments) {
            if let Some(stack_off) = assignment.stack_off {
                load_value(out, Reg::Rax, arg);
                emit!(out, "    mov  QWORD [rsp + {stack_off}], rax");
            }
        }
        for (arg, assignment) in args.iter().zip(&assignments) {
            if let Some(reg) = assignment.reg {
                load_value(out, reg, arg);
            }
        }
        emit!(out, "    call {name}");
        emit!(out, "    add  rsp, {area}");
    }
}

/// Materialize a value operand in `reg`. Non-value operands are rejected by
/// the caller before this point.
fn load_value(out: &mut String, reg: Reg, arg: &Arg<'_>) {
    match *arg {
        Arg::Local(local) => {
            emit!(out, "    mov  {reg}, QWORD [rbp - {}]", FunctionFrame::slot_offset(local))
        }
        Arg::Int(value) => emit!(out, "    mov  {reg}, {value}"),
        Arg::Static(offset) => {
            emit!(out, "    mov  {reg}, static_data");
            if offset > 0 {
                emit!(out, "    add  {reg}, {offset}");
            }
        }
        _ => debug_assert!(false, "{VALUE_KINDS} expected, found {}", arg.kind()),
    }
}

fn set_mnemonic(kind: InstKind) -> &'static str {
    match kind {
        InstKind::Lt => "setl",
        InstKind::Le => "setle",
        InstKind::Gt => "setg",
        InstKind::Ge => "setge",
        InstKind::Eq => "sete",
        _ => "setne",
    }
}

impl Backend for FasmBackend {
    fn program_prolog(&mut self, out: &mut String) {
        emit!(out, "format MS64 COFF");
        emit!(out, "");
        emit!(out, "section '.text' code readable executable");
        emit!(out, "");
    }

    fn function(&mut self, out: &mut String, func: &Function<'_>) -> CompileResult<()> {
        log::debug!(
            "fasm: generating `{}` ({} instructions, {} locals)",
            func.name,
            func.insts.len(),
            func.locals_count
        );

        self.gen_prologue(out, func);
        self.frame_arena.reset();
        for inst in &func.insts {
            self.compile_inst(out, inst)?;
        }
        self.gen_epilogue(out);
        emit!(out, "");
        Ok(())
    }

    fn static_data(&mut self, out: &mut String, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let bytes: Vec<String> = data.iter().map(|byte| format!("0x{byte:02X}")).collect();
        emit!(out, "section '.data' data readable writeable");
        emit!(out, "static_data: db {}", bytes.join(", "));
    }
}
