use rv32_emu::config::Config;
use rv32_emu::console::TerminalConsole;
use rv32_emu::cpu::{Machine, RunOutcome};
use rv32_emu::report::RunReport;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, fmt};

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::get()?;
    init_logging(if config.trace {
        "trace"
    } else {
        config.log_level.as_str()
    });

    let image = rv32_emu::loader::load_image_file(&config.image)?;

    let mut machine = Machine::new(Box::new(TerminalConsole::new()));
    machine.mem.enforce_alignment = config.enforce_alignment;
    machine.mem.mirror_port_writes = config.mirror_port_writes;
    machine.max_cycles = config.max_cycles;
    machine.trace = config.trace;
    machine.boot(&image)?;

    let stop = machine.stop_handle();
    ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))?;

    let start = Instant::now();
    let result = machine.run();
    let wall = start.elapsed();

    let failed = match result {
        Ok(RunOutcome::Halted) => {
            tracing::info!("halted at pc=0x{:08x}", machine.regs.pc());
            false
        }
        Ok(RunOutcome::Interrupted) => {
            tracing::warn!("interrupted at pc=0x{:08x}", machine.regs.pc());
            false
        }
        Ok(RunOutcome::CycleLimit) => {
            tracing::warn!("stopped after {} instructions", machine.cycles);
            false
        }
        Err(e) => {
            eprintln!("CPU error: {e}");
            eprintln!("{}", rv32_emu::debug::register_dump(&machine.regs));
            true
        }
    };

    println!();
    println!("{}", RunReport::new(&machine, wall));

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
