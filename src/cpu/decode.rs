use super::bits::{extract_bitfield, sign_extend};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
}

impl Format {
    pub fn decode(self, inst: u32) -> Instr {
        match self {
            Format::R => Instr::R(RType::decode(inst)),
            Format::I => Instr::I(IType::decode(inst)),
            Format::S => Instr::S(SType::decode(inst)),
            Format::B => Instr::B(BType::decode(inst)),
            Format::U => Instr::U(UType::decode(inst)),
            Format::J => Instr::J(JType::decode(inst)),
        }
    }
}

/// A decoded instruction word. Immediates are kept unsigned; each handler
/// decides whether to sign-extend them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instr {
    R(RType),
    I(IType),
    S(SType),
    B(BType),
    U(UType),
    J(JType),
}

impl Instr {
    pub fn op(&self) -> u8 {
        match self {
            Instr::R(i) => i.op,
            Instr::I(i) => i.op,
            Instr::S(i) => i.op,
            Instr::B(i) => i.op,
            Instr::U(i) => i.op,
            Instr::J(i) => i.op,
        }
    }
}

/// Decodes `inst` using the format registered for its opcode, or `None`
/// when the opcode has no handler.
pub fn decode(inst: u32) -> Option<Instr> {
    let entry = super::exec::lookup(opcode(inst))?;
    Some(entry.format.decode(inst))
}

pub fn opcode(inst: u32) -> u8 {
    extract_bitfield(inst, 6, 0) as u8
}

fn reg(inst: u32, msb: u32, lsb: u32) -> u8 {
    extract_bitfield(inst, msb, lsb) as u8
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RType {
    pub op: u8,
    pub rd: u8,
    pub funct3: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub funct7: u8,
}

impl RType {
    pub fn decode(inst: u32) -> Self {
        Self {
            op: opcode(inst),
            rd: reg(inst, 11, 7),
            funct3: reg(inst, 14, 12),
            rs1: reg(inst, 19, 15),
            rs2: reg(inst, 24, 20),
            funct7: reg(inst, 31, 25),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IType {
    pub op: u8,
    pub rd: u8,
    pub funct3: u8,
    pub rs1: u8,
    pub imm: u32,
}

impl IType {
    pub fn decode(inst: u32) -> Self {
        Self {
            op: opcode(inst),
            rd: reg(inst, 11, 7),
            funct3: reg(inst, 14, 12),
            rs1: reg(inst, 19, 15),
            imm: extract_bitfield(inst, 31, 20),
        }
    }

    pub fn sign_extend(imm: u32) -> i32 {
        sign_extend(imm, 11)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SType {
    pub op: u8,
    pub funct3: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm: u32,
}

impl SType {
    pub fn decode(inst: u32) -> Self {
        let imm11_5 = extract_bitfield(inst, 31, 25) << 5;
        let imm4_0 = extract_bitfield(inst, 11, 7);
        Self {
            op: opcode(inst),
            funct3: reg(inst, 14, 12),
            rs1: reg(inst, 19, 15),
            rs2: reg(inst, 24, 20),
            imm: imm11_5 | imm4_0,
        }
    }

    pub fn sign_extend(imm: u32) -> i32 {
        sign_extend(imm, 11)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BType {
    pub op: u8,
    pub funct3: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm: u32,
}

impl BType {
    pub fn decode(inst: u32) -> Self {
        let imm12 = extract_bitfield(inst, 31, 31) << 12;
        let imm11 = extract_bitfield(inst, 7, 7) << 11;
        let imm10_5 = extract_bitfield(inst, 30, 25) << 5;
        let imm4_1 = extract_bitfield(inst, 11, 8) << 1;
        Self {
            op: opcode(inst),
            funct3: reg(inst, 14, 12),
            rs1: reg(inst, 19, 15),
            rs2: reg(inst, 24, 20),
            imm: imm12 | imm11 | imm10_5 | imm4_1,
        }
    }

    pub fn sign_extend(imm: u32) -> i32 {
        sign_extend(imm, 12)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UType {
    pub op: u8,
    pub rd: u8,
    pub imm: u32,
}

impl UType {
    pub fn decode(inst: u32) -> Self {
        Self {
            op: opcode(inst),
            rd: reg(inst, 11, 7),
            imm: extract_bitfield(inst, 31, 12) << 12,
        }
    }

    pub fn sign_extend(imm: u32) -> i32 {
        sign_extend(imm, 31)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JType {
    pub op: u8,
    pub rd: u8,
    pub imm: u32,
}

impl JType {
    pub fn decode(inst: u32) -> Self {
        let imm20 = extract_bitfield(inst, 31, 31) << 20;
        let imm19_12 = extract_bitfield(inst, 19, 12) << 12;
        let imm11 = extract_bitfield(inst, 20, 20) << 11;
        let imm10_1 = extract_bitfield(inst, 30, 21) << 1;
        Self {
            op: opcode(inst),
            rd: reg(inst, 11, 7),
            imm: imm20 | imm19_12 | imm11 | imm10_1,
        }
    }

    pub fn sign_extend(imm: u32) -> i32 {
        sign_extend(imm, 20)
    }
}
