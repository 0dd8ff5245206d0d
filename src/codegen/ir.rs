//! The `ir` target: a readable dump of every function and the static data.

use super::{emit, Backend};
use crate::core::CompileResult;
use crate::ir::dump::dump_function;
use crate::ir::Function;

pub struct IrBackend;

impl Backend for IrBackend {
    fn function(&mut self, out: &mut String, func: &Function<'_>) -> CompileResult<()> {
        dump_function(out, func)
    }

    fn static_data(&mut self, out: &mut String, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let bytes: Vec<String> = data.iter().map(|byte| format!("0x{byte:02X}")).collect();
        emit!(out, "static_data: [{}]", bytes.join(", "));
    }
}
