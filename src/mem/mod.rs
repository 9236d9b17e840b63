use crate::console::Console;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Address of the memory-mapped console port.
pub const IO_PORT: u32 = 0xA000_1000;

const PAGE_BITS: u32 = 12;
const PAGE_SIZE: usize = 1 << PAGE_BITS;
const PAGE_MASK: u32 = PAGE_SIZE as u32 - 1;

#[derive(Error, Debug)]
pub enum MemError {
    #[error("unaligned {width}-byte access at 0x{addr:08x}")]
    Unaligned { addr: u32, width: u32 },

    #[error("console I/O failed: {0}")]
    Console(#[from] io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    Byte = 1,
    Half = 2,
    Word = 4,
}

impl Width {
    pub fn bytes(self) -> u32 {
        self as u32
    }

    pub fn bits(self) -> u32 {
        self.bytes() * 8
    }

    /// Width selected by the low two bits of a load/store `funct3`.
    pub fn from_funct3(funct3: u8) -> Option<Self> {
        match funct3 & 0b11 {
            0 => Some(Width::Byte),
            1 => Some(Width::Half),
            2 => Some(Width::Word),
            _ => None,
        }
    }

    fn mask(self) -> u32 {
        match self {
            Width::Byte => 0xff,
            Width::Half => 0xffff,
            Width::Word => 0xffff_ffff,
        }
    }
}

/// Sparse byte-addressable memory over the full 32-bit space.
///
/// Pages are allocated on first write; unwritten bytes read as zero.
pub struct Memory {
    pages: HashMap<u32, Box<[u8; PAGE_SIZE]>>,
    console: Box<dyn Console>,
    pub enforce_alignment: bool,
    /// Also store port writes in backing memory so they can be inspected.
    pub mirror_port_writes: bool,
    io_wait: Duration,
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("pages", &self.pages.len())
            .field("enforce_alignment", &self.enforce_alignment)
            .field("mirror_port_writes", &self.mirror_port_writes)
            .field("io_wait", &self.io_wait)
            .finish()
    }
}

impl Memory {
    pub fn new(console: Box<dyn Console>) -> Self {
        Self {
            pages: HashMap::new(),
            console,
            enforce_alignment: false,
            mirror_port_writes: false,
            io_wait: Duration::ZERO,
        }
    }

    fn check_alignment(&self, addr: u32, width: Width) -> Result<(), MemError> {
        if self.enforce_alignment && addr % width.bytes() != 0 {
            return Err(MemError::Unaligned {
                addr,
                width: width.bytes(),
            });
        }
        Ok(())
    }

    fn read_u8(&self, addr: u32) -> u8 {
        self.pages
            .get(&(addr >> PAGE_BITS))
            .map_or(0, |page| page[(addr & PAGE_MASK) as usize])
    }

    fn write_u8(&mut self, addr: u32, v: u8) {
        let page = self
            .pages
            .entry(addr >> PAGE_BITS)
            .or_insert_with(|| Box::new([0; PAGE_SIZE]));
        page[(addr & PAGE_MASK) as usize] = v;
    }

    fn load(&self, addr: u32, width: Width) -> u32 {
        (0..width.bytes()).fold(0, |val, i| {
            val | (self.read_u8(addr.wrapping_add(i)) as u32) << (8 * i)
        })
    }

    fn store(&mut self, addr: u32, value: u32, width: Width) {
        for i in 0..width.bytes() {
            self.write_u8(addr.wrapping_add(i), (value >> (8 * i)) as u8);
        }
    }

    /// Reads a little-endian value of `width` bytes. Reading the I/O port
    /// blocks for one console character instead.
    pub fn peek(&mut self, addr: u32, width: Width) -> Result<u32, MemError> {
        self.check_alignment(addr, width)?;
        if addr == IO_PORT {
            let start = Instant::now();
            let res = self.console.read_char();
            self.io_wait += start.elapsed();
            return Ok(res? & width.mask());
        }
        Ok(self.load(addr, width))
    }

    /// Writes the low `width` bytes of `value` little-endian. Writing the
    /// I/O port prints the low byte on the console.
    pub fn poke(&mut self, addr: u32, value: u32, width: Width) -> Result<(), MemError> {
        self.check_alignment(addr, width)?;
        if addr == IO_PORT {
            self.console.write_byte(value as u8)?;
            if !self.mirror_port_writes {
                return Ok(());
            }
        }
        self.store(addr, value, width);
        Ok(())
    }

    /// Stores `bytes` verbatim starting at `addr`, without port side effects.
    pub fn write_bytes(&mut self, addr: u32, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            self.write_u8(addr.wrapping_add(i as u32), *b);
        }
    }

    /// Total time spent blocked on console reads.
    pub fn io_wait(&self) -> Duration {
        self.io_wait
    }
}
