use rv32_emu::console::BufferConsole;
use rv32_emu::cpu::encode::{self, *};
use rv32_emu::cpu::trap::ExecError;
use rv32_emu::cpu::{Machine, RunOutcome};
use rv32_emu::mem::{IO_PORT, Width};
use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::rc::Rc;

const STACK_TOP: u32 = 0x8000;

/// Prints the NUL-terminated string at 0x30 through the console port.
fn hello_image() -> Vec<u8> {
    let mut image = encode::image(
        STACK_TOP,
        &[
            lui(5, IO_PORT),  // 0x08
            addi(6, 0, 0x30), // 0x0c
            lbu(7, 6, 0),     // 0x10
            beq(7, 0, 16),    // 0x14 -> 0x24
            sb(5, 7, 0),      // 0x18
            addi(6, 6, 1),    // 0x1c
            jal(0, -16),      // 0x20 -> 0x10
            ECALL,            // 0x24
        ],
    );
    image.resize(0x30, 0);
    image.extend_from_slice(b"Hi!\0");
    image
}

fn boot(image: &[u8], input: &str) -> (Machine, Rc<RefCell<Vec<u8>>>) {
    let console = BufferConsole::new(input);
    let output = console.output();
    let mut machine = Machine::new(Box::new(console));
    machine.boot(image).unwrap();
    (machine, output)
}

#[test]
fn prints_string_from_data_section() {
    let (mut m, out) = boot(&hello_image(), "");
    assert_eq!(m.run().unwrap(), RunOutcome::Halted);
    assert_eq!(out.borrow().as_slice(), b"Hi!");
    assert_eq!(m.cycles, 2 + 3 * 5 + 2 + 1);
}

#[test]
fn computes_fibonacci() {
    let image = encode::image(
        STACK_TOP,
        &[
            addi(10, 0, 0),    // 0x08: a
            addi(11, 0, 1),    // 0x0c: b
            addi(12, 0, 10),   // 0x10: n
            beq(12, 0, 24),    // 0x14 -> 0x2c
            add(13, 10, 11),   // 0x18
            addi(10, 11, 0),   // 0x1c
            addi(11, 13, 0),   // 0x20
            addi(12, 12, -1),  // 0x24
            jal(0, -20),       // 0x28 -> 0x14
            ECALL,             // 0x2c
        ],
    );
    let (mut m, _) = boot(&image, "");
    assert_eq!(m.run().unwrap(), RunOutcome::Halted);
    assert_eq!(m.regs.get(10), 55);
    assert_eq!(m.regs.get(11), 89);
}

#[test]
fn spills_to_the_stack() {
    let image = encode::image(
        STACK_TOP,
        &[
            addi(2, 2, -8),
            addi(5, 0, 0x123),
            sw(2, 5, 4),
            lw(6, 2, 4),
            addi(2, 2, 8),
            ECALL,
        ],
    );
    let (mut m, _) = boot(&image, "");
    assert_eq!(m.run().unwrap(), RunOutcome::Halted);
    assert_eq!(m.regs.get(6), 0x123);
    assert_eq!(m.regs.get(2), STACK_TOP);
    assert_eq!(m.mem.peek(STACK_TOP - 4, Width::Word).unwrap(), 0x123);
    assert_eq!(m.regs.sp_max(), STACK_TOP);
    assert_eq!(m.regs.sp_min(), Some(STACK_TOP - 8));
}

#[test]
fn uppercases_console_input() {
    // loop { c = getc(); if c == '\n' break; putc(c - 32) }
    let image = encode::image(
        STACK_TOP,
        &[
            lui(5, IO_PORT),   // 0x08
            addi(8, 0, 10),    // 0x0c
            lbu(6, 5, 0),      // 0x10
            beq(6, 8, 16),     // 0x14 -> 0x24
            addi(6, 6, -32),   // 0x18
            sb(5, 6, 0),       // 0x1c
            jal(0, -16),       // 0x20 -> 0x10
            ECALL,             // 0x24
        ],
    );
    let (mut m, out) = boot(&image, "rust\n");
    assert_eq!(m.run().unwrap(), RunOutcome::Halted);
    assert_eq!(out.borrow().as_slice(), b"RUST");
}

#[test]
fn enforced_alignment_rejects_misaligned_load() {
    let image = encode::image(STACK_TOP, &[addi(5, 0, 0x101), lw(6, 5, 0), ECALL]);

    let (mut m, _) = boot(&image, "");
    m.mem.enforce_alignment = true;
    let err = m.run().unwrap_err();
    assert!(matches!(
        err,
        ExecError::UnalignedAccess {
            pc: 0x0c,
            addr: 0x101,
            width: 4
        }
    ));

    let (mut m, _) = boot(&image, "");
    assert_eq!(m.run().unwrap(), RunOutcome::Halted);
}

fn image_path(name: &str, image: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("rv32-emu-{}-{name}.bin", std::process::id()));
    std::fs::write(&path, image).unwrap();
    path
}

fn run_binary(args: &[&str], image: &[u8], name: &str, stdin: &[u8]) -> Output {
    let path = image_path(name, image);
    let mut child = Command::new(env!("CARGO_BIN_EXE_rv32-emu"))
        .arg(&path)
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start emulator");
    child.stdin.take().unwrap().write_all(stdin).unwrap();
    let output = child.wait_with_output().unwrap();
    let _ = std::fs::remove_file(path);
    output
}

#[test]
fn binary_runs_image_and_prints_report() {
    let output = run_binary(&[], &hello_image(), "hello", b"");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.starts_with("Hi!"));
    assert!(stdout.contains("Cycle Count: 20"));
    assert!(stdout.contains("Max SP: 0x8000"));
}

#[test]
fn binary_reads_piped_stdin() {
    let image = encode::image(
        STACK_TOP,
        &[lui(5, IO_PORT), lbu(6, 5, 0), sb(5, 6, 0), ECALL],
    );
    let output = run_binary(&[], &image, "echo", b"z");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with('z'));
}

#[test]
fn binary_reports_fatal_error() {
    let image = encode::image(STACK_TOP, &[addi(1, 0, 1), 0x0000_007f]);
    let output = run_binary(&[], &image, "bad", b"");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("CPU error: unimplemented opcode 0b1111111 at pc=0x0000000c"));
    assert!(stderr.contains("x1 =0x00000001"));
    assert!(stdout.contains("Cycle Count: 1"));
}

#[test]
fn binary_honours_cycle_limit() {
    let image = encode::image(STACK_TOP, &[jal(0, 0)]);
    let output = run_binary(&["--max-cycles", "50"], &image, "spin", b"");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Cycle Count: 50"));
}

#[cfg(unix)]
#[test]
fn binary_prints_report_after_sigint() {
    let image = encode::image(STACK_TOP, &[jal(0, 0)]);
    let path = image_path("sigint", &image);
    let child = Command::new(env!("CARGO_BIN_EXE_rv32-emu"))
        .arg(&path)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start emulator");

    std::thread::sleep(std::time::Duration::from_millis(500));
    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    let _ = std::fs::remove_file(path);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Cycle Count: "));
    assert!(!stdout.contains("Cycle Count: 0\n"));
}
