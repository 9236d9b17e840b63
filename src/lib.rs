pub mod config;
pub mod console;
pub mod cpu;
pub mod debug;
pub mod loader;
pub mod mem;
pub mod report;
