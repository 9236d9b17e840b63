pub mod bits;
pub mod decode;
pub mod encode;
pub mod exec;
pub mod regs;
pub mod trap;

use crate::console::Console;
use crate::debug;
use crate::mem::{Memory, Width};
use exec::Flow;
use regs::{RegisterFile, SP};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use trap::{ExecError, WithPc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The program executed `ecall`.
    Halted,
    /// The stop flag was raised or the operator aborted a console read.
    Interrupted,
    CycleLimit,
}

pub struct Machine {
    pub regs: RegisterFile,
    pub mem: Memory,
    /// Instructions completed so far.
    pub cycles: u64,
    /// Stop after this many instructions (0 = run until halt).
    pub max_cycles: u64,
    pub trace: bool,
    state: State,
    stop: Arc<AtomicBool>,
}

impl Machine {
    pub fn new(console: Box<dyn Console>) -> Self {
        Self {
            regs: RegisterFile::new(),
            mem: Memory::new(console),
            cycles: 0,
            max_cycles: 0,
            trace: false,
            state: State::Running,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Raising the returned flag makes `run` return `Interrupted` before the
    /// next fetch.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Fetches, decodes and executes one instruction.
    ///
    /// On error the pc still points at the faulting instruction and the
    /// cycle counter is unchanged.
    pub fn step(&mut self) -> Result<State, ExecError> {
        if self.state == State::Halted {
            return Ok(State::Halted);
        }

        // Fetch
        let pc = self.regs.pc();
        let inst = self.mem.peek(pc, Width::Word).with_pc(pc)?;

        // Decode
        let opcode = decode::opcode(inst);
        let entry = exec::lookup(opcode).ok_or(ExecError::UnimplementedOpcode { pc, opcode })?;
        if self.trace {
            debug::trace(&self.regs, self.cycles, inst);
        }

        // Execute
        let sp = self.regs.get(SP);
        match (entry.handler)(&mut self.regs, &mut self.mem, inst)? {
            Flow::Halt => {
                self.regs.set_pc(pc.wrapping_add(4));
                self.state = State::Halted;
            }
            Flow::Jump(target) => self.regs.set_pc(target),
            Flow::Next => self.regs.set_pc(pc.wrapping_add(4)),
        }
        if self.trace && self.regs.get(SP) != sp {
            debug::stack_moved(self.regs.get(SP));
        }

        self.cycles += 1;
        Ok(self.state)
    }

    pub fn run(&mut self) -> Result<RunOutcome, ExecError> {
        while self.state == State::Running {
            if self.stop.load(Ordering::Relaxed) {
                return Ok(RunOutcome::Interrupted);
            }
            if self.max_cycles != 0 && self.cycles >= self.max_cycles {
                return Ok(RunOutcome::CycleLimit);
            }
            match self.step() {
                Ok(_) => {}
                Err(e) if e.is_interrupt() => {
                    tracing::info!("interrupted at pc=0x{:08x}", e.pc());
                    return Ok(RunOutcome::Interrupted);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(RunOutcome::Halted)
    }
}
