use crate::cpu::decode;
use crate::cpu::regs::RegisterFile;
use std::fmt::Write;

pub fn trace(regs: &RegisterFile, step: u64, inst: u32) {
    let pc = regs.pc();
    match decode::decode(inst) {
        Some(instr) => tracing::trace!(
            "[{:08}] pc=0x{:08x} inst=0x{:08x} ra=0x{:08x} sp=0x{:08x} {:?}",
            step,
            pc,
            inst,
            regs.get(1),
            regs.get(2),
            instr
        ),
        None => tracing::trace!("[{:08}] pc=0x{:08x} inst=0x{:08x}", step, pc, inst),
    }
}

pub fn stack_moved(sp: u32) {
    tracing::debug!("new sp: 0x{sp:08x}");
}

/// Register contents, four per line, for post-mortem reports.
pub fn register_dump(regs: &RegisterFile) -> String {
    let mut out = format!("pc=0x{:08x}", regs.pc());
    for (n, value) in regs.snapshot().iter().enumerate() {
        let sep = if n % 4 == 0 { '\n' } else { ' ' };
        let _ = write!(out, "{sep}x{n:<2}=0x{value:08x}");
    }
    out
}
