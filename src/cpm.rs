//! Runs CP/M-80 programs on a bare Z80 with just enough BDOS to print.

use std::path::Path;

use crate::cpu::{Cpu, Trace, Variant};
use crate::error::Result;
use crate::mem::{Bus, System};

/// Transient program area start.
pub const ENTRY: u16 = 0x0100;
const BDOS: u16 = 0x0005;
/// Top of the TPA, reported through the word at 0006.
const TPA_TOP: u16 = 0xfe00;

pub struct Cpm {
  pub cpu: Cpu,
  pub system: System,
  tracers: Vec<Box<dyn Trace>>,

  output: String,
  calls: Vec<u8>,
}

impl Cpm {
  pub fn new() -> Cpm {
    Cpm {
      cpu: Cpu::new(Variant::Z80),
      system: System::new(),
      tracers: Vec::new(),
      output: String::new(),
      calls: Vec::new(),
    }
  }

  pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
    self.system.memory.clear();
    let size = self.system.memory.load_ram(path.as_ref(), ENTRY)?;
    info!("Loaded {} byte CP/M program from {}", size, path.as_ref().display());
    self.prepare();
    Ok(size)
  }

  pub fn load_bytes(&mut self, image: &[u8]) -> Result<()> {
    self.system.memory.clear();
    self.system.memory.load_ram_bytes(image, ENTRY)?;
    self.prepare();
    Ok(())
  }

  fn prepare(&mut self) {
    let memory = &mut self.system.memory;
    memory.wb(BDOS, 0xc9);
    memory.ww(BDOS + 1, TPA_TOP);

    self.cpu.reset();
    self.cpu.regs.pc = ENTRY;
    // The final RET lands on the warm boot vector at 0000.
    self.cpu.regs.sp = TPA_TOP - 2;
    memory.ww(TPA_TOP - 2, 0x0000);

    self.output.clear();
    self.calls.clear();
  }

  pub fn attach(&mut self, tracer: Box<dyn Trace>) {
    self.tracers.push(tracer);
  }

  pub fn output(&self) -> &str {
    &self.output
  }

  /// BDOS function numbers in call order.
  pub fn calls(&self) -> &[u8] {
    &self.calls
  }

  pub fn step(&mut self) -> Result<u32> {
    if self.cpu.regs.pc == BDOS {
      self.bdos();
    }
    for tracer in self.tracers.iter_mut() {
      tracer.executing(&self.cpu, &self.system);
    }
    let cycles = self.cpu.step(&mut self.system)?;
    for tracer in self.tracers.iter_mut() {
      tracer.executed(&self.cpu, cycles);
    }
    Ok(cycles)
  }

  /// Run until the program returns to 0000 or halts. Nothing raises
  /// interrupts here, so a HALT is final. Returns the cycles spent.
  pub fn run(&mut self) -> Result<u64> {
    let start = self.cpu.cycles();
    while self.cpu.regs.pc != 0 {
      if self.cpu.is_halted() {
        warn!("HALT at {:#06x}", self.cpu.regs.pc);
        break;
      }
      self.step()?;
    }
    Ok(self.cpu.cycles() - start)
  }

  pub fn finish(&mut self) {
    for tracer in self.tracers.iter_mut() {
      tracer.finish(&self.cpu, &self.system);
    }
  }

  fn bdos(&mut self) {
    let function = self.cpu.regs.c();
    info!("BDOS {}", function);
    self.calls.push(function);
    match function {
      2 => self.output.push(self.cpu.regs.e() as char),
      9 => {
        let mut address = self.cpu.regs.de();
        loop {
          let c = self.system.peek(address);
          if c == b'$' {
            break;
          }
          self.output.push(c as char);
          address = address.wrapping_add(1);
          if address == self.cpu.regs.de() {
            warn!("unterminated BDOS string");
            break;
          }
        }
      }
      _ => info!("BDOS function {} ignored", function),
    }
  }
}
