//! Raw program images.
//!
//! An image is copied verbatim to address 0. The first two words double as a
//! reset vector: the word at 0 is the initial stack pointer and the word at 4
//! the entry point (the Cortex-M vector table layout).

use crate::cpu::Machine;
use crate::cpu::regs::SP;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SP_VECTOR: u32 = 0;
const PC_VECTOR: u32 = 4;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("image is {len} bytes; at least 8 are needed for the reset vector")]
    TooShort { len: usize },

    #[error("image is {len} bytes and does not fit in a 32-bit address space")]
    TooLarge { len: usize },
}

pub fn load_image_file(path: impl AsRef<Path>) -> Result<Vec<u8>, LoadError> {
    let path = path.as_ref();
    fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_word(image: &[u8], addr: u32) -> u32 {
    let at = addr as usize;
    u32::from_le_bytes([image[at], image[at + 1], image[at + 2], image[at + 3]])
}

impl Machine {
    /// Copies `image` to address 0 and applies the reset vector.
    pub fn boot(&mut self, image: &[u8]) -> Result<(), LoadError> {
        if image.len() < 8 {
            return Err(LoadError::TooShort { len: image.len() });
        }
        if u32::try_from(image.len()).is_err() {
            return Err(LoadError::TooLarge { len: image.len() });
        }

        self.mem.write_bytes(0, image);

        let sp = read_word(image, SP_VECTOR);
        let pc = read_word(image, PC_VECTOR);
        self.regs.set_pc(pc);
        self.regs.set(SP, sp);
        tracing::debug!("loaded {} bytes, pc=0x{pc:08x} sp=0x{sp:08x}", image.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::BufferConsole;
    use crate::mem::Width;

    fn machine() -> Machine {
        Machine::new(Box::new(BufferConsole::default()))
    }

    #[test]
    fn boot_applies_reset_vector() {
        let mut m = machine();
        let mut image = vec![0x00, 0x10, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00];
        image.extend_from_slice(&[0xaa, 0xbb]);
        m.boot(&image).unwrap();
        assert_eq!(m.regs.pc(), 0x20);
        assert_eq!(m.regs.get(SP), 0x1000);
        assert_eq!(m.regs.sp_max(), 0x1000);
        assert_eq!(m.regs.sp_min(), Some(0x1000));
        assert_eq!(m.mem.peek(8, Width::Half).unwrap(), 0xbbaa);
        assert_eq!(m.mem.peek(10, Width::Byte).unwrap(), 0);
    }

    #[test]
    fn rejects_images_without_reset_vector() {
        let mut m = machine();
        assert!(matches!(
            m.boot(&[1, 2, 3]),
            Err(LoadError::TooShort { len: 3 })
        ));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_image_file("/definitely/not/here.bin").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.bin"));
    }
}
