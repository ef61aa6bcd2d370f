#[macro_use]
extern crate log;

pub mod config;
pub mod cpm;
pub mod cpu;
pub mod disassembler;
#[cfg(feature = "display")]
pub mod display;
pub mod error;
pub mod gameboy;
pub mod gpu;
pub mod mem;
pub mod profiler;

pub use crate::error::{Error, Result};
