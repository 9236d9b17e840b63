use crate::cpu::Machine;
use std::fmt;
use std::time::Duration;

/// End-of-run statistics. Time blocked on console input is excluded from
/// the compute time the frequency estimate is based on.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub cycles: u64,
    pub wall: Duration,
    pub io_wait: Duration,
    pub sp_max: u32,
    pub sp_min: Option<u32>,
}

impl RunReport {
    pub fn new(machine: &Machine, wall: Duration) -> Self {
        Self {
            cycles: machine.cycles,
            wall,
            io_wait: machine.mem.io_wait(),
            sp_max: machine.regs.sp_max(),
            sp_min: machine.regs.sp_min(),
        }
    }

    pub fn compute(&self) -> Duration {
        self.wall.saturating_sub(self.io_wait)
    }

    /// Emulated clock rate in kHz; 0 when no compute time was measured.
    pub fn frequency_khz(&self) -> f64 {
        let secs = self.compute().as_secs_f64();
        if secs > 0.0 {
            (self.cycles as f64 / 1000.0) / secs
        } else {
            0.0
        }
    }

    pub fn deepest_stack(&self) -> u32 {
        self.sp_min
            .map_or(0, |min| self.sp_max.saturating_sub(min))
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cycle Count: {}", self.cycles)?;
        writeln!(f, "Frequency: {:.2} KHz", self.frequency_khz())?;
        writeln!(f, "Total time: {:.6}", self.wall.as_secs_f64())?;
        writeln!(f, "Compute time: {:.6}", self.compute().as_secs_f64())?;
        writeln!(f, "I/O wait time: {:.6}", self.io_wait.as_secs_f64())?;
        writeln!(f, "Max SP: 0x{:x}", self.sp_max)?;
        match self.sp_min {
            Some(min) => writeln!(f, "Min SP: 0x{min:x}")?,
            None => writeln!(f, "Min SP: n/a")?,
        }
        write!(f, "Deepest Stack: 0x{:x}", self.deepest_stack())
    }
}
