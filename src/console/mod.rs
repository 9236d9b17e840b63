//! Operator console behind the memory-mapped I/O port.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, IsTerminal, Read, Write};
use std::rc::Rc;

pub trait Console {
    /// Blocks until the operator supplies one character and returns its code.
    fn read_char(&mut self) -> io::Result<u32>;

    fn write_byte(&mut self, byte: u8) -> io::Result<()>;
}

/// Console attached to the process' stdin/stdout.
///
/// A terminal stdin is read one key press at a time in raw mode; anything
/// else (pipes, files) is read one byte at a time.
#[derive(Debug, Default)]
pub struct TerminalConsole;

impl TerminalConsole {
    pub fn new() -> Self {
        Self
    }
}

struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn key_code(key: KeyEvent) -> Option<io::Result<u32>> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let code = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "interrupted by operator",
            )));
        }
        KeyCode::Char(c) => c as u32,
        KeyCode::Enter => 13,
        KeyCode::Tab => 9,
        KeyCode::Backspace => 127,
        KeyCode::Esc => 27,
        _ => return None,
    };
    Some(Ok(code))
}

impl Console for TerminalConsole {
    fn read_char(&mut self) -> io::Result<u32> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            let mut byte = [0u8; 1];
            stdin.lock().read_exact(&mut byte)?;
            return Ok(byte[0] as u32);
        }

        let _raw = RawMode::enable()?;
        loop {
            if let Event::Key(key) = event::read()? {
                if let Some(code) = key_code(key) {
                    return code;
                }
            }
        }
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(&[byte])?;
        out.flush()
    }
}

/// In-memory console: input is scripted up front and output is captured.
///
/// Reading past the end of the script fails with `UnexpectedEof`.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    input: VecDeque<u8>,
    output: Rc<RefCell<Vec<u8>>>,
}

impl BufferConsole {
    pub fn new(input: impl AsRef<[u8]>) -> Self {
        Self {
            input: input.as_ref().iter().copied().collect(),
            output: Rc::default(),
        }
    }

    /// Shared handle to everything written so far; stays valid after the
    /// console has been moved into a `Memory`.
    pub fn output(&self) -> Rc<RefCell<Vec<u8>>> {
        Rc::clone(&self.output)
    }
}

impl Console for BufferConsole {
    fn read_char(&mut self) -> io::Result<u32> {
        self.input
            .pop_front()
            .map(u32::from)
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "console input exhausted"))
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.borrow_mut().push(byte);
        Ok(())
    }
}
