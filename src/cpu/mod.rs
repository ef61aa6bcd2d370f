mod alu;
mod exec;
pub mod flags;
pub mod reg;
pub mod table;

#[cfg(test)]
mod optest;

use crate::error::{Error, Result};
use crate::mem::Bus;

pub use self::flags::{FlagBits, StatusFlags};
pub use self::reg::{Register16, Registers};
pub use self::table::{Instruction, InstructionSet, Mode, Opcode, Prefix};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Variant {
  /// Zilog Z80.
  Z80,
  /// Sharp LR35902, the Game Boy CPU.
  Lr35902,
}

impl Variant {
  pub fn has_shadow_registers(self) -> bool {
    self == Variant::Z80
  }

  /// IX/IY and the DD/FD prefixes.
  pub fn has_index_registers(self) -> bool {
    self == Variant::Z80
  }

  /// ED prefix and the `IN`/`OUT` port space.
  pub fn has_extended_set(self) -> bool {
    self == Variant::Z80
  }

  /// The PO/PE/P/M condition slots are reused for FF00 page loads.
  pub fn has_gameboy_io(self) -> bool {
    self == Variant::Lr35902
  }

  pub fn flag_bits(self) -> FlagBits {
    match self {
      Variant::Z80 => flags::Z80,
      Variant::Lr35902 => flags::LR35902,
    }
  }
}

/// Observer called around every instruction the CPU executes.
pub trait Trace {
  fn executing(&mut self, cpu: &Cpu, bus: &dyn Bus);

  fn executed(&mut self, _cpu: &Cpu, _cycles: u32) {}

  /// Called once when the host shuts the machine down.
  fn finish(&mut self, _cpu: &Cpu, _bus: &dyn Bus) {}
}

/// Register that HL-based opcodes operate on after a DD/FD prefix.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Index {
  HL,
  IX,
  IY,
}

pub struct Cpu {
  pub regs: Registers,

  /// Interrupt flip-flops. IFF1 is the Game Boy's IME.
  pub iff1: bool,
  pub iff2: bool,
  /// Interrupt mode 0, 1 or 2.
  pub im: u8,

  variant: Variant,
  bits: FlagBits,
  instructions: InstructionSet,

  halted: bool,
  /// Set by EI; maskable interrupts wait until the next instruction is done.
  ei_delay: bool,

  /// Total T-states since power on.
  cycles: u64,

  index: Index,
  /// Effective (IX+d) address, fetched at most once per instruction.
  displaced: Option<u16>,
  extra: u32,
}

impl Cpu {
  pub fn new(variant: Variant) -> Cpu {
    let mut cpu = Cpu {
      regs: Registers::new(),
      iff1: false,
      iff2: false,
      im: 0,

      variant: variant,
      bits: variant.flag_bits(),
      instructions: InstructionSet::new(variant),

      halted: false,
      ei_delay: false,
      cycles: 0,

      index: Index::HL,
      displaced: None,
      extra: 0,
    };
    cpu.reset();
    cpu
  }

  /// Power-on state: PC at zero, interrupts off, mode 0.
  pub fn reset(&mut self) {
    self.regs = Registers::new();
    if self.variant == Variant::Z80 {
      self.regs.af.word = 0xffff;
      self.regs.sp = 0xffff;
    }
    self.iff1 = false;
    self.iff2 = false;
    self.im = 0;
    self.halted = false;
    self.ei_delay = false;
  }

  pub fn variant(&self) -> Variant {
    self.variant
  }

  pub fn instructions(&self) -> &InstructionSet {
    &self.instructions
  }

  pub fn cycles(&self) -> u64 {
    self.cycles
  }

  pub fn is_halted(&self) -> bool {
    self.halted
  }

  /// Leave HALT without taking an interrupt.
  pub fn wake(&mut self) {
    self.halted = false;
  }

  pub fn flags(&self) -> StatusFlags {
    StatusFlags::unpack(self.regs.f(), &self.bits)
  }

  pub fn set_flags(&mut self, flags: StatusFlags) {
    let kept = self.regs.f() & (self.bits.x | self.bits.y);
    self.regs.set_f(kept | flags.pack(&self.bits));
  }

  /// Run one instruction and return the T-states it took.
  pub fn step(&mut self, bus: &mut dyn Bus) -> Result<u32> {
    let start = self.cycles;
    self.ei_delay = false;
    if self.halted {
      self.refresh();
      self.cycles += 4;
      return Ok(4);
    }
    let opcode = self.fetch_opcode(bus);
    self.execute(bus, opcode)?;
    Ok((self.cycles - start) as u32)
  }

  /// Offer an interrupt to the CPU. Returns the T-states spent entering it,
  /// or zero when a maskable request is refused.
  ///
  /// `value` is the byte the interrupting device supplies: an instruction in
  /// IM0, the low vector table byte in IM2, the target address on the
  /// LR35902.
  pub fn interrupt(&mut self, bus: &mut dyn Bus, maskable: bool, value: u8) -> Result<u32> {
    if maskable && (!self.iff1 || self.ei_delay) {
      return Ok(0);
    }
    let start = self.cycles;
    self.halted = false;

    match self.variant {
      Variant::Lr35902 => {
        assert!(maskable, "the LR35902 has no non-maskable interrupt");
        self.iff1 = false;
        self.iff2 = false;
        let pc = self.regs.pc;
        self.push(bus, pc);
        self.regs.pc = u16::from(value);
        self.cycles += 20;
      }
      Variant::Z80 => {
        self.refresh();
        if !maskable {
          self.iff1 = false;
          self.restart(bus, 0x66);
          self.cycles += 11;
        } else {
          self.iff1 = false;
          self.iff2 = false;
          match self.im {
            0 => {
              assert!(
                ![0xcb, 0xdd, 0xed, 0xfd].contains(&value),
                "prefix byte {:#04x} supplied in interrupt mode 0",
                value
              );
              self.execute(bus, value)?;
              self.cycles += 2;
            }
            1 => {
              self.restart(bus, 0x38);
              self.cycles += 13;
            }
            _ => {
              let pc = self.regs.pc;
              self.push(bus, pc);
              let vector = (u16::from(self.regs.i) << 8) | u16::from(value);
              self.regs.pc = bus.rw(vector);
              self.regs.memptr.word = self.regs.pc;
              self.cycles += 19;
            }
          }
        }
      }
    }
    Ok((self.cycles - start) as u32)
  }

  fn execute(&mut self, bus: &mut dyn Bus, first: u8) -> Result<()> {
    let pc = self.regs.pc.wrapping_sub(1);
    self.index = Index::HL;
    self.displaced = None;

    let mut opcode = first;
    if self.variant.has_index_registers() {
      while opcode == 0xdd || opcode == 0xfd {
        self.index = if opcode == 0xdd { Index::IX } else { Index::IY };
        self.cycles += 4;
        opcode = self.fetch_opcode(bus);
      }
    }

    let prefix = match opcode {
      0xcb => match self.index {
        Index::HL => {
          opcode = self.fetch_opcode(bus);
          Prefix::CB
        }
        index => {
          // DDCB d op: the displacement comes before the opcode.
          let d = self.fetch_byte(bus);
          opcode = self.fetch_byte(bus);
          let address = self.index_base().wrapping_add(d as i8 as u16);
          self.displaced = Some(address);
          self.regs.memptr.word = address;
          self.cycles += 4;
          if index == Index::IX {
            Prefix::DDCB
          } else {
            Prefix::FDCB
          }
        }
      },
      0xed if self.variant.has_extended_set() => {
        self.index = Index::HL;
        opcode = self.fetch_opcode(bus);
        Prefix::ED
      }
      _ => match self.index {
        Index::HL => Prefix::None,
        Index::IX => Prefix::DD,
        Index::IY => Prefix::FD,
      },
    };

    let (exec, cycles, extra) = {
      let instruction = self.instructions.get(prefix, opcode);
      let cycles = match prefix {
        // Every DDCB/FDCB form costs the same as its (HL) twin.
        Prefix::DDCB | Prefix::FDCB => {
          self.instructions.get(Prefix::CB, (opcode & 0xf8) | 6).cycles
        }
        _ => instruction.cycles,
      };
      (instruction.exec, cycles, instruction.extra)
    };
    let before = self.cycles;
    self.cycles += u64::from(cycles);
    self.extra = extra;
    exec(self, bus, Opcode::decode(opcode));
    if self.cycles == before {
      return Err(Error::UnhandledOpcode {
        prefix: prefix,
        opcode: opcode,
        pc: pc,
      });
    }
    Ok(())
  }

  /// Charge the extra cost of a taken branch or repeated block step.
  fn take(&mut self) {
    self.cycles += u64::from(self.extra);
  }

  fn refresh(&mut self) {
    if self.variant == Variant::Z80 {
      let r = self.regs.r;
      self.regs.r = (r & 0x80) | (r.wrapping_add(1) & 0x7f);
    }
  }

  fn fetch_opcode(&mut self, bus: &mut dyn Bus) -> u8 {
    self.refresh();
    self.fetch_byte(bus)
  }

  fn fetch_byte(&mut self, bus: &mut dyn Bus) -> u8 {
    let value = bus.rb(self.regs.pc);
    self.regs.pc = self.regs.pc.wrapping_add(1);
    value
  }

  fn fetch_word(&mut self, bus: &mut dyn Bus) -> u16 {
    let low = u16::from(self.fetch_byte(bus));
    let high = u16::from(self.fetch_byte(bus));
    (high << 8) | low
  }

  fn push(&mut self, bus: &mut dyn Bus, value: u16) {
    self.regs.sp = self.regs.sp.wrapping_sub(1);
    bus.wb(self.regs.sp, (value >> 8) as u8);
    self.regs.sp = self.regs.sp.wrapping_sub(1);
    bus.wb(self.regs.sp, value as u8);
  }

  fn pop(&mut self, bus: &mut dyn Bus) -> u16 {
    let low = u16::from(bus.rb(self.regs.sp));
    self.regs.sp = self.regs.sp.wrapping_add(1);
    let high = u16::from(bus.rb(self.regs.sp));
    self.regs.sp = self.regs.sp.wrapping_add(1);
    (high << 8) | low
  }

  fn restart(&mut self, bus: &mut dyn Bus, address: u16) {
    let pc = self.regs.pc;
    self.push(bus, pc);
    self.regs.pc = address;
    self.regs.memptr.word = address;
  }

  fn flag(&self, mask: u8) -> bool {
    self.regs.f() & mask != 0
  }

  fn set_flag(&mut self, mask: u8, on: bool) {
    let f = self.regs.f();
    self.regs.set_f(if on { f | mask } else { f & !mask });
  }

  /// The register HL-based opcodes use: HL, or IX/IY after a prefix.
  fn index_base(&self) -> u16 {
    match self.index {
      Index::HL => self.regs.hl.word,
      Index::IX => self.regs.ix.word,
      Index::IY => self.regs.iy.word,
    }
  }

  fn set_index_base(&mut self, value: u16) {
    match self.index {
      Index::HL => self.regs.hl.word = value,
      Index::IX => self.regs.ix.word = value,
      Index::IY => self.regs.iy.word = value,
    }
  }

  /// Address of the `(HL)` operand. Under DD/FD this fetches the
  /// displacement on first use and charges for the address calculation.
  fn hl_address(&mut self, bus: &mut dyn Bus) -> u16 {
    if self.index == Index::HL {
      return self.regs.hl.word;
    }
    if let Some(address) = self.displaced {
      return address;
    }
    let d = self.fetch_byte(bus) as i8;
    let address = self.index_base().wrapping_add(d as u16);
    self.displaced = Some(address);
    self.regs.memptr.word = address;
    self.cycles += 8;
    address
  }

  fn indexed(&self) -> bool {
    self.index != Index::HL
  }

  /// 8-bit register by table index. `follow` maps H/L onto the halves of
  /// IX/IY under a prefix. Index 6 is memory and is not handled here.
  fn get_r(&self, r: u8, follow: bool) -> u8 {
    let regs = &self.regs;
    match r {
      0 => regs.b(),
      1 => regs.c(),
      2 => regs.d(),
      3 => regs.e(),
      4 if follow && self.indexed() => (self.index_base() >> 8) as u8,
      4 => regs.h(),
      5 if follow && self.indexed() => self.index_base() as u8,
      5 => regs.l(),
      7 => regs.a(),
      _ => panic!("register index {} is not a register", r),
    }
  }

  fn set_r(&mut self, r: u8, value: u8, follow: bool) {
    match r {
      0 => self.regs.set_b(value),
      1 => self.regs.set_c(value),
      2 => self.regs.set_d(value),
      3 => self.regs.set_e(value),
      4 if follow && self.indexed() => {
        let word = (self.index_base() & 0x00ff) | (u16::from(value) << 8);
        self.set_index_base(word)
      }
      4 => self.regs.set_h(value),
      5 if follow && self.indexed() => {
        let word = (self.index_base() & 0xff00) | u16::from(value);
        self.set_index_base(word)
      }
      5 => self.regs.set_l(value),
      7 => self.regs.set_a(value),
      _ => panic!("register index {} is not a register", r),
    }
  }

  fn read_r(&mut self, bus: &mut dyn Bus, r: u8) -> u8 {
    if r == 6 {
      let address = self.hl_address(bus);
      bus.rb(address)
    } else {
      self.get_r(r, true)
    }
  }

  fn write_r(&mut self, bus: &mut dyn Bus, r: u8, value: u8) {
    if r == 6 {
      let address = self.hl_address(bus);
      bus.wb(address, value)
    } else {
      self.set_r(r, value, true)
    }
  }

  /// Register pair by table index, with SP in slot 3.
  fn rp(&self, p: u8) -> u16 {
    match p {
      0 => self.regs.bc.word,
      1 => self.regs.de.word,
      2 => self.index_base(),
      _ => self.regs.sp,
    }
  }

  fn set_rp(&mut self, p: u8, value: u16) {
    match p {
      0 => self.regs.bc.word = value,
      1 => self.regs.de.word = value,
      2 => self.set_index_base(value),
      _ => self.regs.sp = value,
    }
  }

  /// Register pair by table index, with AF in slot 3.
  fn rp2(&self, p: u8) -> u16 {
    match p {
      3 => self.regs.af.word,
      _ => self.rp(p),
    }
  }

  fn set_rp2(&mut self, p: u8, value: u16) {
    match p {
      3 => self.regs.af.word = value & (0xff00 | u16::from(self.bits.used())),
      _ => self.set_rp(p, value),
    }
  }

  /// Condition code test for slots 0 to 7.
  fn condition(&self, cc: u8) -> bool {
    match cc {
      0 => !self.flag(self.bits.zero),
      1 => self.flag(self.bits.zero),
      2 => !self.flag(self.bits.carry),
      3 => self.flag(self.bits.carry),
      4 => !self.flag(self.bits.parity),
      5 => self.flag(self.bits.parity),
      6 => !self.flag(self.bits.sign),
      _ => self.flag(self.bits.sign),
    }
  }
}
