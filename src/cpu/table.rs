use std::fmt;

use crate::cpu::{Cpu, Variant};
use crate::mem::Bus;

/// Handler bound to an opcode. Handlers add only conditional costs; the
/// base cost comes from the table.
pub type Exec = fn(&mut Cpu, &mut dyn Bus, Opcode);

/// An opcode split into the fields of the canonical Z80 decode table.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Opcode {
  pub value: u8,
  pub x: u8,
  pub y: u8,
  pub z: u8,
  pub p: u8,
  pub q: u8,
}

impl Opcode {
  pub fn decode(value: u8) -> Opcode {
    let y = (value >> 3) & 0x7;
    Opcode {
      value: value,
      x: value >> 6,
      y: y,
      z: value & 0x7,
      p: y >> 1,
      q: y & 1,
    }
  }
}

/// Operand bytes that follow the opcode.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
  Implied,
  /// One byte: `{n}` or a signed `{d}`.
  Immediate,
  /// Two bytes: `{nn}`.
  Absolute,
  /// One signed byte relative to the next instruction: `{e}`.
  Relative,
}

#[derive(Clone)]
pub struct Instruction {
  pub exec: Exec,
  pub mode: Mode,
  pub template: String,
  /// Base cost in T-states. Zero marks an opcode with no handler.
  pub cycles: u32,
  /// Added when a condition holds or a block instruction repeats.
  pub extra: u32,
}

impl Instruction {
  fn new<S: Into<String>>(exec: Exec, mode: Mode, template: S, cycles: u32) -> Instruction {
    Instruction {
      exec: exec,
      mode: mode,
      template: template.into(),
      cycles: cycles,
      extra: 0,
    }
  }

  fn with_extra(mut self, extra: u32) -> Instruction {
    self.extra = extra;
    self
  }

  fn unknown() -> Instruction {
    Instruction::new(Cpu::unhandled, Mode::Implied, "", 0)
  }

  pub fn is_known(&self) -> bool {
    self.cycles != 0
  }
}

impl fmt::Debug for Instruction {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Instruction")
      .field("mode", &self.mode)
      .field("template", &self.template)
      .field("cycles", &self.cycles)
      .field("extra", &self.extra)
      .finish()
  }
}

/// Which table an opcode was looked up in.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Prefix {
  None,
  CB,
  DD,
  ED,
  FD,
  DDCB,
  FDCB,
}

impl fmt::Display for Prefix {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let name = match self {
      Prefix::None => "unprefixed",
      Prefix::CB => "CB",
      Prefix::DD => "DD",
      Prefix::ED => "ED",
      Prefix::FD => "FD",
      Prefix::DDCB => "DDCB",
      Prefix::FDCB => "FDCB",
    };
    f.write_str(name)
  }
}

/// The three 256-entry tables of one variant. DD and FD reuse the base
/// table with HL redirected, DDCB and FDCB reuse the CB table.
pub struct InstructionSet {
  base: Vec<Instruction>,
  cb: Vec<Instruction>,
  ed: Vec<Instruction>,
}

impl InstructionSet {
  pub fn new(variant: Variant) -> InstructionSet {
    let build = |entry: fn(Opcode) -> Instruction| -> Vec<Instruction> {
      (0..=255u8).map(|value| entry(Opcode::decode(value))).collect()
    };
    match variant {
      Variant::Z80 => InstructionSet {
        base: build(z80_base),
        cb: build(z80_cb),
        ed: build(z80_ed),
      },
      Variant::Lr35902 => InstructionSet {
        base: build(lr35902_base),
        cb: build(lr35902_cb),
        ed: build(|_| Instruction::unknown()),
      },
    }
  }

  pub fn table(&self, prefix: Prefix) -> &[Instruction] {
    match prefix {
      Prefix::None | Prefix::DD | Prefix::FD => &self.base,
      Prefix::CB | Prefix::DDCB | Prefix::FDCB => &self.cb,
      Prefix::ED => &self.ed,
    }
  }

  pub fn get(&self, prefix: Prefix, opcode: u8) -> &Instruction {
    &self.table(prefix)[usize::from(opcode)]
  }
}

const R: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];
const RP: [&str; 4] = ["BC", "DE", "HL", "SP"];
const RP2: [&str; 4] = ["BC", "DE", "HL", "AF"];
const CC: [&str; 8] = ["NZ", "Z", "NC", "C", "PO", "PE", "P", "M"];
const ALU: [&str; 8] = [
  "ADD A,", "ADC A,", "SUB ", "SBC A,", "AND ", "XOR ", "OR ", "CP ",
];
const ROT: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SLL", "SRL"];
const ACC: [&str; 8] = ["RLCA", "RRCA", "RLA", "RRA", "DAA", "CPL", "SCF", "CCF"];
const BLOCK: [[&str; 4]; 4] = [
  ["LDI", "CPI", "INI", "OUTI"],
  ["LDD", "CPD", "IND", "OUTD"],
  ["LDIR", "CPIR", "INIR", "OTIR"],
  ["LDDR", "CPDR", "INDR", "OTDR"],
];
const IM: [&str; 8] = ["0", "0", "1", "2", "0", "0", "1", "2"];

/// Cost of an 8-bit register operand, or the memory form when `r` is (HL).
fn r_cost(r: u8, register: u32, memory: u32) -> u32 {
  if r == 6 {
    memory
  } else {
    register
  }
}

fn z80_base(op: Opcode) -> Instruction {
  use self::Mode::*;
  let (x, y, z, p, q) = (op.x, op.y, op.z, op.p, op.q);
  let (yr, zr) = (R[y as usize], R[z as usize]);
  match (x, z) {
    (0, 0) => match y {
      0 => Instruction::new(Cpu::nop, Implied, "NOP", 4),
      1 => Instruction::new(Cpu::ex_af, Implied, "EX AF,AF'", 4),
      2 => Instruction::new(Cpu::djnz, Relative, "DJNZ {e}", 8).with_extra(5),
      3 => Instruction::new(Cpu::jr, Relative, "JR {e}", 12),
      _ => Instruction::new(Cpu::jr_cc, Relative, format!("JR {},{{e}}", CC[y as usize - 4]), 7)
        .with_extra(5),
    },
    (0, 1) if q == 0 => {
      Instruction::new(Cpu::ld_rp_nn, Absolute, format!("LD {},{{nn}}", RP[p as usize]), 10)
    }
    (0, 1) => Instruction::new(Cpu::add_hl_rp, Implied, format!("ADD HL,{}", RP[p as usize]), 11),
    (0, 2) => match (q, p) {
      (0, 0) => Instruction::new(Cpu::ld_indirect, Implied, "LD (BC),A", 7),
      (0, 1) => Instruction::new(Cpu::ld_indirect, Implied, "LD (DE),A", 7),
      (0, 2) => Instruction::new(Cpu::ld_indirect, Absolute, "LD ({nn}),HL", 16),
      (0, _) => Instruction::new(Cpu::ld_indirect, Absolute, "LD ({nn}),A", 13),
      (_, 0) => Instruction::new(Cpu::ld_indirect, Implied, "LD A,(BC)", 7),
      (_, 1) => Instruction::new(Cpu::ld_indirect, Implied, "LD A,(DE)", 7),
      (_, 2) => Instruction::new(Cpu::ld_indirect, Absolute, "LD HL,({nn})", 16),
      (_, _) => Instruction::new(Cpu::ld_indirect, Absolute, "LD A,({nn})", 13),
    },
    (0, 3) if q == 0 => Instruction::new(Cpu::inc_rp, Implied, format!("INC {}", RP[p as usize]), 6),
    (0, 3) => Instruction::new(Cpu::dec_rp, Implied, format!("DEC {}", RP[p as usize]), 6),
    (0, 4) => Instruction::new(Cpu::inc_r, Implied, format!("INC {}", yr), r_cost(y, 4, 11)),
    (0, 5) => Instruction::new(Cpu::dec_r, Implied, format!("DEC {}", yr), r_cost(y, 4, 11)),
    (0, 6) => {
      Instruction::new(Cpu::ld_r_n, Immediate, format!("LD {},{{n}}", yr), r_cost(y, 7, 10))
    }
    (0, _) => Instruction::new(Cpu::accumulator_op, Implied, ACC[y as usize], 4),
    (1, _) if y == 6 && z == 6 => Instruction::new(Cpu::halt, Implied, "HALT", 4),
    (1, _) => Instruction::new(
      Cpu::ld_r_r,
      Implied,
      format!("LD {},{}", yr, zr),
      if y == 6 || z == 6 { 7 } else { 4 },
    ),
    (2, _) => Instruction::new(
      Cpu::alu_r,
      Implied,
      format!("{}{}", ALU[y as usize], zr),
      r_cost(z, 4, 7),
    ),
    (_, 0) => Instruction::new(Cpu::ret_cc, Implied, format!("RET {}", CC[y as usize]), 5)
      .with_extra(6),
    (_, 1) => match (q, p) {
      (0, _) => Instruction::new(Cpu::pop_rp, Implied, format!("POP {}", RP2[p as usize]), 10),
      (_, 0) => Instruction::new(Cpu::ret, Implied, "RET", 10),
      (_, 1) => Instruction::new(Cpu::exx, Implied, "EXX", 4),
      (_, 2) => Instruction::new(Cpu::jp_hl, Implied, "JP (HL)", 4),
      (_, _) => Instruction::new(Cpu::ld_sp_hl, Implied, "LD SP,HL", 6),
    },
    (_, 2) => {
      Instruction::new(Cpu::jp_cc, Absolute, format!("JP {},{{nn}}", CC[y as usize]), 10)
    }
    (_, 3) => match y {
      0 => Instruction::new(Cpu::jp, Absolute, "JP {nn}", 10),
      1 => Instruction::unknown(),
      2 => Instruction::new(Cpu::out_n, Immediate, "OUT ({n}),A", 11),
      3 => Instruction::new(Cpu::in_n, Immediate, "IN A,({n})", 11),
      4 => Instruction::new(Cpu::ex_sp_hl, Implied, "EX (SP),HL", 19),
      5 => Instruction::new(Cpu::ex_de_hl, Implied, "EX DE,HL", 4),
      6 => Instruction::new(Cpu::di, Implied, "DI", 4),
      _ => Instruction::new(Cpu::ei, Implied, "EI", 4),
    },
    (_, 4) => Instruction::new(Cpu::call_cc, Absolute, format!("CALL {},{{nn}}", CC[y as usize]), 10)
      .with_extra(7),
    (_, 5) => match (q, p) {
      (0, _) => Instruction::new(Cpu::push_rp, Implied, format!("PUSH {}", RP2[p as usize]), 11),
      (_, 0) => Instruction::new(Cpu::call, Absolute, "CALL {nn}", 17),
      _ => Instruction::unknown(),
    },
    (_, 6) => Instruction::new(Cpu::alu_n, Immediate, format!("{}{{n}}", ALU[y as usize]), 7),
    (_, _) => Instruction::new(Cpu::rst, Implied, format!("RST {:02X}H", y * 8), 11),
  }
}

fn z80_cb(op: Opcode) -> Instruction {
  let (y, z) = (op.y, op.z);
  let zr = R[z as usize];
  match op.x {
    0 => Instruction::new(
      Cpu::cb_rotate,
      Mode::Implied,
      format!("{} {}", ROT[y as usize], zr),
      r_cost(z, 8, 15),
    ),
    1 => Instruction::new(Cpu::cb_bit, Mode::Implied, format!("BIT {},{}", y, zr), r_cost(z, 8, 12)),
    2 => Instruction::new(Cpu::cb_res, Mode::Implied, format!("RES {},{}", y, zr), r_cost(z, 8, 15)),
    _ => Instruction::new(Cpu::cb_set, Mode::Implied, format!("SET {},{}", y, zr), r_cost(z, 8, 15)),
  }
}

fn z80_ed(op: Opcode) -> Instruction {
  use self::Mode::*;
  let (y, z, p, q) = (op.y, op.z, op.p, op.q);
  match op.x {
    1 => match z {
      0 if y == 6 => Instruction::new(Cpu::in_r_c, Implied, "IN (C)", 12),
      0 => Instruction::new(Cpu::in_r_c, Implied, format!("IN {},(C)", R[y as usize]), 12),
      1 if y == 6 => Instruction::new(Cpu::out_c_r, Implied, "OUT (C),0", 12),
      1 => Instruction::new(Cpu::out_c_r, Implied, format!("OUT (C),{}", R[y as usize]), 12),
      2 if q == 0 => Instruction::new(Cpu::sbc_hl_rp, Implied, format!("SBC HL,{}", RP[p as usize]), 15),
      2 => Instruction::new(Cpu::adc_hl_rp, Implied, format!("ADC HL,{}", RP[p as usize]), 15),
      3 if q == 0 => {
        Instruction::new(Cpu::ld_nn_rp, Absolute, format!("LD ({{nn}}),{}", RP[p as usize]), 20)
      }
      3 => Instruction::new(Cpu::ld_rp_indirect, Absolute, format!("LD {},({{nn}})", RP[p as usize]), 20),
      4 => Instruction::new(Cpu::neg, Implied, "NEG", 8),
      5 if y == 1 => Instruction::new(Cpu::retn, Implied, "RETI", 14),
      5 => Instruction::new(Cpu::retn, Implied, "RETN", 14),
      6 => Instruction::new(Cpu::im, Implied, format!("IM {}", IM[y as usize]), 8),
      _ => match y {
        0 => Instruction::new(Cpu::ld_special, Implied, "LD I,A", 9),
        1 => Instruction::new(Cpu::ld_special, Implied, "LD R,A", 9),
        2 => Instruction::new(Cpu::ld_special, Implied, "LD A,I", 9),
        3 => Instruction::new(Cpu::ld_special, Implied, "LD A,R", 9),
        4 => Instruction::new(Cpu::rrd, Implied, "RRD", 18),
        5 => Instruction::new(Cpu::rld, Implied, "RLD", 18),
        _ => Instruction::new(Cpu::nop, Implied, "NOP", 8),
      },
    },
    2 if z <= 3 && y >= 4 => {
      Instruction::new(Cpu::block, Implied, BLOCK[y as usize - 4][z as usize], 16).with_extra(5)
    }
    _ => Instruction::unknown(),
  }
}

fn lr35902_base(op: Opcode) -> Instruction {
  use self::Mode::*;
  let (x, y, z, p, q) = (op.x, op.y, op.z, op.p, op.q);
  let (yr, zr) = (R[y as usize], R[z as usize]);
  match (x, z) {
    (0, 0) => match y {
      0 => Instruction::new(Cpu::nop, Implied, "NOP", 4),
      1 => Instruction::new(Cpu::ld_nn_sp, Absolute, "LD ({nn}),SP", 20),
      2 => Instruction::new(Cpu::stop, Immediate, "STOP", 4),
      3 => Instruction::new(Cpu::jr, Relative, "JR {e}", 12),
      _ => Instruction::new(Cpu::jr_cc, Relative, format!("JR {},{{e}}", CC[y as usize - 4]), 8)
        .with_extra(4),
    },
    (0, 1) if q == 0 => {
      Instruction::new(Cpu::ld_rp_nn, Absolute, format!("LD {},{{nn}}", RP[p as usize]), 12)
    }
    (0, 1) => Instruction::new(Cpu::add_hl_rp, Implied, format!("ADD HL,{}", RP[p as usize]), 8),
    (0, 2) => {
      let template = match (q, p) {
        (0, 0) => "LD (BC),A",
        (0, 1) => "LD (DE),A",
        (0, 2) => "LDI (HL),A",
        (0, _) => "LDD (HL),A",
        (_, 0) => "LD A,(BC)",
        (_, 1) => "LD A,(DE)",
        (_, 2) => "LDI A,(HL)",
        (_, _) => "LDD A,(HL)",
      };
      Instruction::new(Cpu::ld_indirect, Implied, template, 8)
    }
    (0, 3) if q == 0 => Instruction::new(Cpu::inc_rp, Implied, format!("INC {}", RP[p as usize]), 8),
    (0, 3) => Instruction::new(Cpu::dec_rp, Implied, format!("DEC {}", RP[p as usize]), 8),
    (0, 4) => Instruction::new(Cpu::inc_r, Implied, format!("INC {}", yr), r_cost(y, 4, 12)),
    (0, 5) => Instruction::new(Cpu::dec_r, Implied, format!("DEC {}", yr), r_cost(y, 4, 12)),
    (0, 6) => {
      Instruction::new(Cpu::ld_r_n, Immediate, format!("LD {},{{n}}", yr), r_cost(y, 8, 12))
    }
    (0, _) => Instruction::new(Cpu::accumulator_op, Implied, ACC[y as usize], 4),
    (1, _) if y == 6 && z == 6 => Instruction::new(Cpu::halt, Implied, "HALT", 4),
    (1, _) => Instruction::new(
      Cpu::ld_r_r,
      Implied,
      format!("LD {},{}", yr, zr),
      if y == 6 || z == 6 { 8 } else { 4 },
    ),
    (2, _) => Instruction::new(
      Cpu::alu_r,
      Implied,
      format!("{}{}", ALU[y as usize], zr),
      r_cost(z, 4, 8),
    ),
    (_, 0) => match y {
      4 => Instruction::new(Cpu::ret_cc, Immediate, "LD (FF00+{n}),A", 12),
      5 => Instruction::new(Cpu::ret_cc, Immediate, "ADD SP,{d}", 16),
      6 => Instruction::new(Cpu::ret_cc, Immediate, "LD A,(FF00+{n})", 12),
      7 => Instruction::new(Cpu::ret_cc, Immediate, "LD HL,SP+{d}", 12),
      _ => Instruction::new(Cpu::ret_cc, Implied, format!("RET {}", CC[y as usize]), 8)
        .with_extra(12),
    },
    (_, 1) => match (q, p) {
      (0, _) => Instruction::new(Cpu::pop_rp, Implied, format!("POP {}", RP2[p as usize]), 12),
      (_, 0) => Instruction::new(Cpu::ret, Implied, "RET", 16),
      (_, 1) => Instruction::new(Cpu::reti, Implied, "RETI", 16),
      (_, 2) => Instruction::new(Cpu::jp_hl, Implied, "JP (HL)", 4),
      (_, _) => Instruction::new(Cpu::ld_sp_hl, Implied, "LD SP,HL", 8),
    },
    (_, 2) => match y {
      4 => Instruction::new(Cpu::jp_cc, Implied, "LD (FF00+C),A", 8),
      5 => Instruction::new(Cpu::jp_cc, Absolute, "LD ({nn}),A", 16),
      6 => Instruction::new(Cpu::jp_cc, Implied, "LD A,(FF00+C)", 8),
      7 => Instruction::new(Cpu::jp_cc, Absolute, "LD A,({nn})", 16),
      _ => Instruction::new(Cpu::jp_cc, Absolute, format!("JP {},{{nn}}", CC[y as usize]), 12)
        .with_extra(4),
    },
    (_, 3) => match y {
      0 => Instruction::new(Cpu::jp, Absolute, "JP {nn}", 16),
      6 => Instruction::new(Cpu::di, Implied, "DI", 4),
      7 => Instruction::new(Cpu::ei, Implied, "EI", 4),
      _ => Instruction::unknown(),
    },
    (_, 4) if y < 4 => {
      Instruction::new(Cpu::call_cc, Absolute, format!("CALL {},{{nn}}", CC[y as usize]), 12)
        .with_extra(12)
    }
    (_, 5) => match (q, p) {
      (0, _) => Instruction::new(Cpu::push_rp, Implied, format!("PUSH {}", RP2[p as usize]), 16),
      (_, 0) => Instruction::new(Cpu::call, Absolute, "CALL {nn}", 24),
      _ => Instruction::unknown(),
    },
    (_, 6) => Instruction::new(Cpu::alu_n, Immediate, format!("{}{{n}}", ALU[y as usize]), 8),
    (_, 7) => Instruction::new(Cpu::rst, Implied, format!("RST {:02X}H", y * 8), 16),
    _ => Instruction::unknown(),
  }
}

fn lr35902_cb(op: Opcode) -> Instruction {
  let (y, z) = (op.y, op.z);
  let zr = R[z as usize];
  match op.x {
    0 => {
      let name = if y == 6 { "SWAP" } else { ROT[y as usize] };
      Instruction::new(Cpu::cb_rotate, Mode::Implied, format!("{} {}", name, zr), r_cost(z, 8, 16))
    }
    1 => Instruction::new(Cpu::cb_bit, Mode::Implied, format!("BIT {},{}", y, zr), r_cost(z, 8, 12)),
    2 => Instruction::new(Cpu::cb_res, Mode::Implied, format!("RES {},{}", y, zr), r_cost(z, 8, 16)),
    _ => Instruction::new(Cpu::cb_set, Mode::Implied, format!("SET {},{}", y, zr), r_cost(z, 8, 16)),
  }
}
