use crate::mem::MemError;
use std::io;
use thiserror::Error;

/// Fatal execution errors. Every variant records the pc of the instruction
/// that could not complete.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("unaligned {width}-byte access to 0x{addr:08x} at pc=0x{pc:08x}")]
    UnalignedAccess { pc: u32, addr: u32, width: u32 },

    #[error("invalid encoding at pc=0x{pc:08x} inst=0x{inst:08x}: {field}=0b{value:b}")]
    InvalidEncoding {
        pc: u32,
        inst: u32,
        field: &'static str,
        value: u32,
    },

    #[error("unimplemented opcode 0b{opcode:07b} at pc=0x{pc:08x}")]
    UnimplementedOpcode { pc: u32, opcode: u8 },

    #[error("console I/O failed at pc=0x{pc:08x}: {source}")]
    Console { pc: u32, source: io::Error },
}

impl ExecError {
    pub fn pc(&self) -> u32 {
        match self {
            ExecError::UnalignedAccess { pc, .. }
            | ExecError::InvalidEncoding { pc, .. }
            | ExecError::UnimplementedOpcode { pc, .. }
            | ExecError::Console { pc, .. } => *pc,
        }
    }

    /// True when the operator aborted a blocking console read.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, ExecError::Console { source, .. } if source.kind() == io::ErrorKind::Interrupted)
    }
}

/// Trait for adding PC context to errors raised below the execution engine
pub trait WithPc<T> {
    fn with_pc(self, pc: u32) -> Result<T, ExecError>;
}

impl<T> WithPc<T> for Result<T, MemError> {
    fn with_pc(self, pc: u32) -> Result<T, ExecError> {
        self.map_err(|err| match err {
            MemError::Unaligned { addr, width } => ExecError::UnalignedAccess { pc, addr, width },
            MemError::Console(source) => ExecError::Console { pc, source },
        })
    }
}
