use super::bits::{extract_bitfield, sign_extend};
use super::decode::{BType, Format, IType, JType, RType, SType, UType};
use super::regs::RegisterFile;
use super::trap::{ExecError, WithPc};
use crate::mem::{Memory, Width};

pub mod opcodes {
    pub const LUI: u8 = 0b0110111;
    pub const AUIPC: u8 = 0b0010111;
    pub const JAL: u8 = 0b1101111;
    pub const JALR: u8 = 0b1100111;
    pub const BRANCH: u8 = 0b1100011;
    pub const LOAD: u8 = 0b0000011;
    pub const STORE: u8 = 0b0100011;
    pub const OP_IMM: u8 = 0b0010011;
    pub const OP: u8 = 0b0110011;
    pub const MISC_MEM: u8 = 0b0001111;
    pub const SYSTEM: u8 = 0b1110011;
}

const FUNCT7_ALT: u32 = 0b0100000;
const LOAD_FUNCT3: [u8; 5] = [0, 1, 2, 4, 5];
const STORE_FUNCT3: [u8; 3] = [0, 1, 2];

/// What the engine should do with the pc after a handler ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Fall through to `pc + 4`.
    Next,
    Jump(u32),
    Halt,
}

/// Decodes the raw word in its own format and executes it against the
/// machine state. `regs.pc()` is the address of the instruction.
pub type Handler = fn(&mut RegisterFile, &mut Memory, u32) -> Result<Flow, ExecError>;

pub struct OpcodeEntry {
    pub opcode: u8,
    pub name: &'static str,
    pub format: Format,
    pub handler: Handler,
}

const ENTRIES: [OpcodeEntry; 11] = [
    OpcodeEntry {
        opcode: opcodes::LUI,
        name: "lui",
        format: Format::U,
        handler: lui,
    },
    OpcodeEntry {
        opcode: opcodes::AUIPC,
        name: "auipc",
        format: Format::U,
        handler: auipc,
    },
    OpcodeEntry {
        opcode: opcodes::JAL,
        name: "jal",
        format: Format::J,
        handler: jal,
    },
    OpcodeEntry {
        opcode: opcodes::JALR,
        name: "jalr",
        format: Format::I,
        handler: jalr,
    },
    OpcodeEntry {
        opcode: opcodes::BRANCH,
        name: "branch",
        format: Format::B,
        handler: branch,
    },
    OpcodeEntry {
        opcode: opcodes::LOAD,
        name: "load",
        format: Format::I,
        handler: load,
    },
    OpcodeEntry {
        opcode: opcodes::STORE,
        name: "store",
        format: Format::S,
        handler: store,
    },
    OpcodeEntry {
        opcode: opcodes::OP_IMM,
        name: "arith-imm",
        format: Format::I,
        handler: arith_imm,
    },
    OpcodeEntry {
        opcode: opcodes::OP,
        name: "arith-reg",
        format: Format::R,
        handler: arith_reg,
    },
    OpcodeEntry {
        opcode: opcodes::MISC_MEM,
        name: "fence",
        format: Format::I,
        handler: fence,
    },
    OpcodeEntry {
        opcode: opcodes::SYSTEM,
        name: "ecall",
        format: Format::R,
        handler: ecall,
    },
];

pub static OPCODE_TABLE: [OpcodeEntry; 11] = ENTRIES;

const fn index(entries: &[OpcodeEntry]) -> [Option<u8>; 128] {
    let mut table = [None; 128];
    let mut i = 0;
    while i < entries.len() {
        table[entries[i].opcode as usize] = Some(i as u8);
        i += 1;
    }
    table
}

static DISPATCH: [Option<u8>; 128] = index(&ENTRIES);

/// Looks up the handler for a 7-bit opcode.
pub fn lookup(opcode: u8) -> Option<&'static OpcodeEntry> {
    let slot = (*DISPATCH.get(opcode as usize)?)?;
    Some(&OPCODE_TABLE[slot as usize])
}

fn invalid(pc: u32, inst: u32, field: &'static str, value: impl Into<u32>) -> ExecError {
    ExecError::InvalidEncoding {
        pc,
        inst,
        field,
        value: value.into(),
    }
}

fn lui(regs: &mut RegisterFile, _mem: &mut Memory, inst: u32) -> Result<Flow, ExecError> {
    let op = UType::decode(inst);
    regs.set(op.rd, op.imm);
    Ok(Flow::Next)
}

fn auipc(regs: &mut RegisterFile, _mem: &mut Memory, inst: u32) -> Result<Flow, ExecError> {
    let op = UType::decode(inst);
    regs.set(op.rd, op.imm.wrapping_add(regs.pc()));
    Ok(Flow::Next)
}

fn jal(regs: &mut RegisterFile, _mem: &mut Memory, inst: u32) -> Result<Flow, ExecError> {
    let op = JType::decode(inst);
    let pc = regs.pc();
    regs.set(op.rd, pc.wrapping_add(4));
    Ok(Flow::Jump(pc.wrapping_add(JType::sign_extend(op.imm) as u32)))
}

// Links before reading the base, so `rd == rs1` jumps relative to pc + 4.
// The target keeps its low bit.
fn jalr(regs: &mut RegisterFile, _mem: &mut Memory, inst: u32) -> Result<Flow, ExecError> {
    let op = IType::decode(inst);
    regs.set(op.rd, regs.pc().wrapping_add(4));
    let base = regs.get(op.rs1);
    Ok(Flow::Jump(base.wrapping_add(IType::sign_extend(op.imm) as u32)))
}

fn branch(regs: &mut RegisterFile, _mem: &mut Memory, inst: u32) -> Result<Flow, ExecError> {
    let op = BType::decode(inst);
    let pc = regs.pc();
    let rs1 = regs.get_signed(op.rs1);
    let rs2 = regs.get_signed(op.rs2);

    let taken = match op.funct3 {
        0b000 => rs1 == rs2,
        0b001 => rs1 != rs2,
        0b100 => rs1 < rs2,
        0b101 => rs1 >= rs2,
        0b110 => (rs1 as u32) < (rs2 as u32),
        0b111 => (rs1 as u32) >= (rs2 as u32),
        f => return Err(invalid(pc, inst, "funct3", f)),
    };

    if taken {
        Ok(Flow::Jump(pc.wrapping_add(BType::sign_extend(op.imm) as u32)))
    } else {
        Ok(Flow::Next)
    }
}

fn load(regs: &mut RegisterFile, mem: &mut Memory, inst: u32) -> Result<Flow, ExecError> {
    let op = IType::decode(inst);
    let pc = regs.pc();
    let Some(width) = Width::from_funct3(op.funct3).filter(|_| LOAD_FUNCT3.contains(&op.funct3))
    else {
        return Err(invalid(pc, inst, "funct3", op.funct3));
    };
    let zero_extend = op.funct3 & 0b100 != 0;

    let addr = regs
        .get(op.rs1)
        .wrapping_add(IType::sign_extend(op.imm) as u32);
    let raw = mem.peek(addr, width).with_pc(pc)?;
    let value = if zero_extend {
        raw
    } else {
        sign_extend(raw, width.bits() - 1) as u32
    };
    regs.set(op.rd, value);
    Ok(Flow::Next)
}

fn store(regs: &mut RegisterFile, mem: &mut Memory, inst: u32) -> Result<Flow, ExecError> {
    let op = SType::decode(inst);
    let pc = regs.pc();
    let Some(width) = Width::from_funct3(op.funct3).filter(|_| STORE_FUNCT3.contains(&op.funct3))
    else {
        return Err(invalid(pc, inst, "funct3", op.funct3));
    };

    let addr = regs
        .get(op.rs1)
        .wrapping_add(SType::sign_extend(op.imm) as u32);
    mem.poke(addr, regs.get(op.rs2), width).with_pc(pc)?;
    Ok(Flow::Next)
}

/// `funct7 == 0` shifts in zeros, `0b0100000` replicates the sign bit.
fn shift_right(value: i32, shamt: u32, funct7: u32) -> Option<u32> {
    match funct7 {
        0 => Some((value as u32) >> shamt),
        FUNCT7_ALT => Some((value >> shamt) as u32),
        _ => None,
    }
}

fn arith_imm(regs: &mut RegisterFile, _mem: &mut Memory, inst: u32) -> Result<Flow, ExecError> {
    let op = IType::decode(inst);
    let pc = regs.pc();
    let rs1 = regs.get_signed(op.rs1);
    let imm = IType::sign_extend(op.imm);
    // Shifts reuse the upper immediate bits as funct7.
    let funct7 = extract_bitfield(op.imm, 11, 5);
    let shamt = extract_bitfield(op.imm, 4, 0);

    let value = match op.funct3 {
        0b000 => rs1.wrapping_add(imm) as u32,
        0b010 => (rs1 < imm) as u32,
        0b011 => ((rs1 as u32) < (imm as u32)) as u32,
        0b100 => (rs1 ^ imm) as u32,
        0b110 => (rs1 | imm) as u32,
        0b111 => (rs1 & imm) as u32,
        0b001 => {
            if funct7 != 0 {
                return Err(invalid(pc, inst, "funct7", funct7));
            }
            (rs1 as u32) << shamt
        }
        _ => shift_right(rs1, shamt, funct7).ok_or_else(|| invalid(pc, inst, "funct7", funct7))?,
    };
    regs.set(op.rd, value);
    Ok(Flow::Next)
}

fn arith_reg(regs: &mut RegisterFile, _mem: &mut Memory, inst: u32) -> Result<Flow, ExecError> {
    let op = RType::decode(inst);
    let pc = regs.pc();
    let rs1 = regs.get_signed(op.rs1);
    let rs2 = regs.get_signed(op.rs2);
    let shamt = (rs2 as u32) & 0x1f;
    let funct7 = op.funct7 as u32;

    let value = match (op.funct3, funct7) {
        (0b000, 0) => rs1.wrapping_add(rs2) as u32,
        (0b000, FUNCT7_ALT) => rs1.wrapping_sub(rs2) as u32,
        (0b001, 0) => (rs1 as u32) << shamt,
        (0b010, 0) => (rs1 < rs2) as u32,
        (0b011, 0) => ((rs1 as u32) < (rs2 as u32)) as u32,
        (0b100, 0) => (rs1 ^ rs2) as u32,
        (0b101, _) => {
            shift_right(rs1, shamt, funct7).ok_or_else(|| invalid(pc, inst, "funct7", funct7))?
        }
        (0b110, 0) => (rs1 | rs2) as u32,
        (0b111, 0) => (rs1 & rs2) as u32,
        _ => return Err(invalid(pc, inst, "funct7", funct7)),
    };
    regs.set(op.rd, value);
    Ok(Flow::Next)
}

fn fence(_regs: &mut RegisterFile, _mem: &mut Memory, _inst: u32) -> Result<Flow, ExecError> {
    Ok(Flow::Next)
}

fn ecall(_regs: &mut RegisterFile, _mem: &mut Memory, _inst: u32) -> Result<Flow, ExecError> {
    Ok(Flow::Halt)
}
