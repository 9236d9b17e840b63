pub const SP: u8 = 2;

/// General purpose registers plus the program counter.
///
/// `x0` is hardwired to zero. Every write to the stack pointer (`x2`) also
/// updates the high/low watermarks reported at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    regs: [u32; 32],
    pc: u32,
    sp_max: u32,
    sp_min: Option<u32>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, n: u8) -> u32 {
        self.regs[n as usize]
    }

    pub fn get_signed(&self, n: u8) -> i32 {
        self.get(n) as i32
    }

    pub fn set(&mut self, n: u8, value: u32) {
        if n != 0 {
            self.regs[n as usize] = value;
        }
        if n == SP {
            self.sp_max = self.sp_max.max(value);
            self.sp_min = Some(self.sp_min.map_or(value, |min| min.min(value)));
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn sp_max(&self) -> u32 {
        self.sp_max
    }

    /// `None` until the stack pointer has been written at least once.
    pub fn sp_min(&self) -> Option<u32> {
        self.sp_min
    }

    pub fn snapshot(&self) -> [u32; 32] {
        self.regs
    }
}
