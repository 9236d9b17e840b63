//! RV32I instruction encoders, handy for assembling small images by hand.

use super::exec::opcodes;

pub const OP_LUI: u32 = opcodes::LUI as u32;
pub const OP_AUIPC: u32 = opcodes::AUIPC as u32;
pub const OP_JAL: u32 = opcodes::JAL as u32;
pub const OP_JALR: u32 = opcodes::JALR as u32;
pub const OP_BRANCH: u32 = opcodes::BRANCH as u32;
pub const OP_LOAD: u32 = opcodes::LOAD as u32;
pub const OP_STORE: u32 = opcodes::STORE as u32;
pub const OP_IMM: u32 = opcodes::OP_IMM as u32;
pub const OP_REG: u32 = opcodes::OP as u32;
pub const OP_FENCE: u32 = opcodes::MISC_MEM as u32;
pub const OP_SYSTEM: u32 = opcodes::SYSTEM as u32;

pub const ECALL: u32 = OP_SYSTEM;
pub const FENCE: u32 = 0x0ff0_0000 | OP_FENCE;

fn r5(r: u8) -> u32 {
    (r & 0x1f) as u32
}

pub fn r_type(op: u32, rd: u8, funct3: u32, rs1: u8, rs2: u8, funct7: u32) -> u32 {
    (funct7 & 0x7f) << 25
        | r5(rs2) << 20
        | r5(rs1) << 15
        | (funct3 & 0x7) << 12
        | r5(rd) << 7
        | (op & 0x7f)
}

pub fn i_type(op: u32, rd: u8, funct3: u32, rs1: u8, imm: i32) -> u32 {
    ((imm as u32) & 0xfff) << 20 | r5(rs1) << 15 | (funct3 & 0x7) << 12 | r5(rd) << 7 | (op & 0x7f)
}

pub fn s_type(op: u32, funct3: u32, rs1: u8, rs2: u8, imm: i32) -> u32 {
    let imm = imm as u32;
    ((imm >> 5) & 0x7f) << 25
        | r5(rs2) << 20
        | r5(rs1) << 15
        | (funct3 & 0x7) << 12
        | (imm & 0x1f) << 7
        | (op & 0x7f)
}

pub fn b_type(op: u32, funct3: u32, rs1: u8, rs2: u8, imm: i32) -> u32 {
    let imm = imm as u32;
    ((imm >> 12) & 0x1) << 31
        | ((imm >> 5) & 0x3f) << 25
        | r5(rs2) << 20
        | r5(rs1) << 15
        | (funct3 & 0x7) << 12
        | ((imm >> 1) & 0xf) << 8
        | ((imm >> 11) & 0x1) << 7
        | (op & 0x7f)
}

pub fn u_type(op: u32, rd: u8, imm: u32) -> u32 {
    (imm & 0xffff_f000) | r5(rd) << 7 | (op & 0x7f)
}

pub fn j_type(op: u32, rd: u8, imm: i32) -> u32 {
    let imm = imm as u32;
    ((imm >> 20) & 0x1) << 31
        | ((imm >> 1) & 0x3ff) << 21
        | ((imm >> 11) & 0x1) << 20
        | ((imm >> 12) & 0xff) << 12
        | r5(rd) << 7
        | (op & 0x7f)
}

pub fn lui(rd: u8, imm: u32) -> u32 {
    u_type(OP_LUI, rd, imm)
}

pub fn auipc(rd: u8, imm: u32) -> u32 {
    u_type(OP_AUIPC, rd, imm)
}

pub fn jal(rd: u8, off: i32) -> u32 {
    j_type(OP_JAL, rd, off)
}

pub fn jalr(rd: u8, rs1: u8, off: i32) -> u32 {
    i_type(OP_JALR, rd, 0, rs1, off)
}

pub fn beq(rs1: u8, rs2: u8, off: i32) -> u32 {
    b_type(OP_BRANCH, 0b000, rs1, rs2, off)
}

pub fn bne(rs1: u8, rs2: u8, off: i32) -> u32 {
    b_type(OP_BRANCH, 0b001, rs1, rs2, off)
}

pub fn blt(rs1: u8, rs2: u8, off: i32) -> u32 {
    b_type(OP_BRANCH, 0b100, rs1, rs2, off)
}

pub fn bge(rs1: u8, rs2: u8, off: i32) -> u32 {
    b_type(OP_BRANCH, 0b101, rs1, rs2, off)
}

pub fn bltu(rs1: u8, rs2: u8, off: i32) -> u32 {
    b_type(OP_BRANCH, 0b110, rs1, rs2, off)
}

pub fn bgeu(rs1: u8, rs2: u8, off: i32) -> u32 {
    b_type(OP_BRANCH, 0b111, rs1, rs2, off)
}

pub fn lb(rd: u8, rs1: u8, off: i32) -> u32 {
    i_type(OP_LOAD, rd, 0b000, rs1, off)
}

pub fn lh(rd: u8, rs1: u8, off: i32) -> u32 {
    i_type(OP_LOAD, rd, 0b001, rs1, off)
}

pub fn lw(rd: u8, rs1: u8, off: i32) -> u32 {
    i_type(OP_LOAD, rd, 0b010, rs1, off)
}

pub fn lbu(rd: u8, rs1: u8, off: i32) -> u32 {
    i_type(OP_LOAD, rd, 0b100, rs1, off)
}

pub fn lhu(rd: u8, rs1: u8, off: i32) -> u32 {
    i_type(OP_LOAD, rd, 0b101, rs1, off)
}

pub fn sb(rs1: u8, rs2: u8, off: i32) -> u32 {
    s_type(OP_STORE, 0b000, rs1, rs2, off)
}

pub fn sh(rs1: u8, rs2: u8, off: i32) -> u32 {
    s_type(OP_STORE, 0b001, rs1, rs2, off)
}

pub fn sw(rs1: u8, rs2: u8, off: i32) -> u32 {
    s_type(OP_STORE, 0b010, rs1, rs2, off)
}

pub fn addi(rd: u8, rs1: u8, imm: i32) -> u32 {
    i_type(OP_IMM, rd, 0b000, rs1, imm)
}

pub fn slti(rd: u8, rs1: u8, imm: i32) -> u32 {
    i_type(OP_IMM, rd, 0b010, rs1, imm)
}

pub fn sltiu(rd: u8, rs1: u8, imm: i32) -> u32 {
    i_type(OP_IMM, rd, 0b011, rs1, imm)
}

pub fn xori(rd: u8, rs1: u8, imm: i32) -> u32 {
    i_type(OP_IMM, rd, 0b100, rs1, imm)
}

pub fn ori(rd: u8, rs1: u8, imm: i32) -> u32 {
    i_type(OP_IMM, rd, 0b110, rs1, imm)
}

pub fn andi(rd: u8, rs1: u8, imm: i32) -> u32 {
    i_type(OP_IMM, rd, 0b111, rs1, imm)
}

pub fn slli(rd: u8, rs1: u8, shamt: u32) -> u32 {
    i_type(OP_IMM, rd, 0b001, rs1, (shamt & 0x1f) as i32)
}

pub fn srli(rd: u8, rs1: u8, shamt: u32) -> u32 {
    i_type(OP_IMM, rd, 0b101, rs1, (shamt & 0x1f) as i32)
}

pub fn srai(rd: u8, rs1: u8, shamt: u32) -> u32 {
    i_type(OP_IMM, rd, 0b101, rs1, (0b0100000 << 5 | (shamt & 0x1f)) as i32)
}

pub fn add(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(OP_REG, rd, 0b000, rs1, rs2, 0)
}

pub fn sub(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(OP_REG, rd, 0b000, rs1, rs2, 0b0100000)
}

pub fn sll(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(OP_REG, rd, 0b001, rs1, rs2, 0)
}

pub fn slt(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(OP_REG, rd, 0b010, rs1, rs2, 0)
}

pub fn sltu(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(OP_REG, rd, 0b011, rs1, rs2, 0)
}

pub fn xor(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(OP_REG, rd, 0b100, rs1, rs2, 0)
}

pub fn srl(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(OP_REG, rd, 0b101, rs1, rs2, 0)
}

pub fn sra(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(OP_REG, rd, 0b101, rs1, rs2, 0b0100000)
}

pub fn or(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(OP_REG, rd, 0b110, rs1, rs2, 0)
}

pub fn and(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r_type(OP_REG, rd, 0b111, rs1, rs2, 0)
}

/// Lays out a bootable image: the reset words at 0 and 4 followed by
/// `program` starting at address 8.
pub fn image(sp: u32, program: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + program.len() * 4);
    bytes.extend_from_slice(&sp.to_le_bytes());
    bytes.extend_from_slice(&8u32.to_le_bytes());
    for word in program {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    bytes
}
