use std::fmt::Write;

use crate::cpu::{Cpu, Trace};
use crate::disassembler::{disassemble, hex16, hex8};
use crate::mem::Bus;

/// Counts how often each opcode and each address is executed.
pub struct Profiler {
  instructions: [u64; 0x100],
  addresses: Vec<u64>,
}

impl Profiler {
  pub fn new() -> Profiler {
    Profiler {
      instructions: [0; 0x100],
      addresses: vec![0; 0x10000],
    }
  }

  pub fn instruction_count(&self, opcode: u8) -> u64 {
    self.instructions[usize::from(opcode)]
  }

  pub fn address_count(&self, address: u16) -> u64 {
    self.addresses[usize::from(address)]
  }

  /// Opcode counts, then every executed address with its count and mnemonic.
  pub fn report(&self, cpu: &Cpu, bus: &dyn Bus) -> String {
    let mut out = String::from("** instructions\n");
    for (opcode, &count) in self.instructions.iter().enumerate() {
      if count > 0 {
        let _ = writeln!(out, "{}\t{}", hex8(opcode as u8), count);
      }
    }
    out.push_str("** addresses\n");
    for (address, &count) in self.addresses.iter().enumerate() {
      if count > 0 {
        let (text, _) = disassemble(cpu, bus, address as u16);
        let _ = writeln!(out, "{}\t{}\t{}", hex16(address as u16), count, text);
      }
    }
    out
  }
}

impl Trace for Profiler {
  fn executing(&mut self, cpu: &Cpu, bus: &dyn Bus) {
    let pc = cpu.regs.pc;
    self.instructions[usize::from(bus.peek(pc))] += 1;
    self.addresses[usize::from(pc)] += 1;
  }

  fn finish(&mut self, cpu: &Cpu, bus: &dyn Bus) {
    info!("Profile:\n{}", self.report(cpu, bus));
  }
}
