// This module implements the Microsoft x64 calling convention used by the fasm win32 target.
// It provides the CCAssigner trait and the Win64Assigner implementation that decide where each
// integer argument travels: the first four go in RCX, RDX, R8 and R9, every later one goes to
// the stack above the 32-byte shadow space the caller always reserves. The same assignment is
// used on both sides of a call: the caller stores overflow arguments at [rsp + stack_off] and
// the callee, after pushing rbp, finds them at [rbp + 16 + stack_off]. FunctionFrame lays out
// a function's local slots below the frame pointer and keeps the frame 16-byte aligned.

//! Windows x64 calling convention and frame layout.

use std::fmt;

use bumpalo::{collections::Vec as BumpVec, Bump};

/// Bytes the caller reserves for the callee to home its register arguments.
pub const SHADOW_SPACE: u32 = 32;

/// Size of one local slot and of one stack argument.
pub const SLOT_SIZE: u32 = 8;

/// General purpose registers the generator names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    Rax,
    Rcx,
    Rdx,
    R8,
    R9,
}

impl Reg {
    pub fn name(self) -> &'static str {
        match self {
            Reg::Rax => "rax",
            Reg::Rcx => "rcx",
            Reg::Rdx => "rdx",
            Reg::R8 => "r8",
            Reg::R9 => "r9",
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a single argument is passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CCAssignment {
    /// Assigned register (if any).
    pub reg: Option<Reg>,
    /// Offset from the stack pointer at the call (if assigned to stack).
    pub stack_off: Option<u32>,
}

impl CCAssignment {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Trait for calling convention argument assignment.
pub trait CCAssigner {
    /// Assign the next argument according to the calling convention.
    fn assign_arg(&mut self, arg: &mut CCAssignment);

    /// Reset state for a new call.
    fn reset(&mut self);

    /// Stack space the caller reserves around the call, 16-byte aligned.
    fn get_stack_size(&self) -> u32;
}

/// Microsoft x64 assigner for integer sized arguments.
#[derive(Debug, Default)]
pub struct Win64Assigner {
    /// Arguments assigned so far.
    arg_cnt: usize,
    /// Bytes of overflow arguments above the shadow space.
    stack: u32,
}

impl Win64Assigner {
    pub const ARG_REGS: [Reg; 4] = [Reg::Rcx, Reg::Rdx, Reg::R8, Reg::R9];

    pub fn new() -> Self {
        Self::default()
    }

    /// Align a value up to the specified power of two alignment.
    pub fn align_up(value: u32, align: u32) -> u32 {
        (value + align - 1) & !(align - 1)
    }
}

impl CCAssigner for Win64Assigner {
    fn assign_arg(&mut self, arg: &mut CCAssignment) {
        if let Some(&reg) = Self::ARG_REGS.get(self.arg_cnt) {
            arg.reg = Some(reg);
            arg.stack_off = None;
        } else {
            arg.reg = None;
            arg.stack_off = Some(SHADOW_SPACE + self.stack);
            self.stack += SLOT_SIZE;
        }
        self.arg_cnt += 1;
    }

    fn reset(&mut self) {
        self.arg_cnt = 0;
        self.stack = 0;
    }

    fn get_stack_size(&self) -> u32 {
        Self::align_up(SHADOW_SPACE + self.stack, 16)
    }
}

/// Stack frame of one generated function.
///
/// ```text
/// rbp + 16 + off:  incoming stack argument (off >= 32)
/// rbp + 8:         return address
/// rbp:             saved rbp
/// rbp - 8*(i+1):   local slot i
/// ```
#[derive(Debug)]
pub struct FunctionFrame<'a> {
    /// Bytes reserved below rbp for local slots.
    pub frame_size: u32,
    /// Where each incoming parameter arrives.
    pub param_assignments: BumpVec<'a, CCAssignment>,
}

impl<'a> FunctionFrame<'a> {
    /// Create the frame for a function with `locals_count` slots, the first
    /// `params_count` of which hold parameters.
    pub fn new(arena: &'a Bump, locals_count: usize, params_count: usize) -> Self {
        let mut assigner = Win64Assigner::new();
        let mut param_assignments = BumpVec::with_capacity_in(params_count, arena);
        for _ in 0..params_count {
            let mut assignment = CCAssignment::new();
            assigner.assign_arg(&mut assignment);
            param_assignments.push(assignment);
        }

        let mut frame = Self {
            frame_size: 0,
            param_assignments,
        };
        frame.calculate_frame_size(locals_count.max(params_count));
        frame
    }

    /// Distance below rbp of local slot `local`.
    pub fn slot_offset(local: usize) -> u64 {
        (local as u64 + 1) * SLOT_SIZE as u64
    }

    /// Distance above rbp of an incoming stack argument.
    pub fn incoming_offset(stack_off: u32) -> u32 {
        16 + stack_off
    }

    fn calculate_frame_size(&mut self, slots: usize) {
        let size = slots as u32 * SLOT_SIZE;
        self.frame_size = Win64Assigner::align_up(size, 16);
    }
}
