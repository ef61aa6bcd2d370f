use crate::cpu::{Cpu, Mode, Prefix, Trace};
use crate::mem::Bus;

const R: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];

pub fn hex8(value: u8) -> String {
  format!("{:02x}", value)
}

pub fn hex16(value: u16) -> String {
  format!("{:04x}", value)
}

pub fn binary(value: u8) -> String {
  format!("{:08b}", value)
}

pub fn invalid(value: u8) -> String {
  format!("Invalid instruction: {}({})", hex8(value), binary(value))
}

fn signed(value: u8) -> String {
  let d = value as i8;
  if d < 0 {
    format!("-{}", hex8(i16::from(d).abs() as u8))
  } else {
    format!("+{}", hex8(d as u8))
  }
}

/// Two-line register dump: alternates and index registers, then the main set.
pub fn state(cpu: &Cpu) -> String {
  let regs = &cpu.regs;
  format!(
    "IX={} IY={}\tAF'={} BC'={} DE'={} HL'={}\n\
     PC={} SP={}\tA ={} F ={} B ={} C ={} D ={} E ={} H ={} L ={}",
    hex16(regs.ix.word),
    hex16(regs.iy.word),
    hex16(regs.af_alt.word),
    hex16(regs.bc_alt.word),
    hex16(regs.de_alt.word),
    hex16(regs.hl_alt.word),
    hex16(regs.pc),
    hex16(regs.sp),
    hex8(regs.a()),
    cpu.flags(),
    hex8(regs.b()),
    hex8(regs.c()),
    hex8(regs.d()),
    hex8(regs.e()),
    hex8(regs.h()),
    hex8(regs.l()),
  )
}

struct Reader<'a> {
  bus: &'a dyn Bus,
  addr: u16,
}

impl<'a> Reader<'a> {
  fn byte(&mut self) -> u8 {
    let value = self.bus.peek(self.addr);
    self.addr = self.addr.wrapping_add(1);
    value
  }

  fn word(&mut self) -> u16 {
    let low = u16::from(self.byte());
    (u16::from(self.byte()) << 8) | low
  }
}

/// Rename plain H and L operands to the halves of `index`.
fn index_halves(text: &str, index: &str) -> String {
  let mut parts = text.splitn(2, ' ');
  let mnemonic = parts.next().unwrap_or("");
  match parts.next() {
    Some(operands) => {
      let operands: Vec<String> = operands
        .split(',')
        .map(|operand| match operand {
          "H" | "L" => format!("{}{}", index, operand),
          _ => operand.to_string(),
        })
        .collect();
      format!("{} {}", mnemonic, operands.join(","))
    }
    None => text.to_string(),
  }
}

/// Decode the instruction at `pc`. Returns the mnemonic and the address of
/// the following instruction.
pub fn disassemble(cpu: &Cpu, bus: &dyn Bus, pc: u16) -> (String, u16) {
  let set = cpu.instructions();
  let variant = cpu.variant();
  let mut reader = Reader { bus: bus, addr: pc };

  let mut index = None;
  let mut opcode = reader.byte();
  if variant.has_index_registers() {
    while opcode == 0xdd || opcode == 0xfd {
      index = Some(if opcode == 0xdd { "IX" } else { "IY" });
      opcode = reader.byte();
    }
  }

  let mut displacement = None;
  let mut copy = None;
  let instruction = match opcode {
    0xcb if index.is_some() => {
      displacement = Some(reader.byte());
      opcode = reader.byte();
      if opcode & 0x07 != 6 && opcode & 0xc0 != 0x40 {
        copy = Some(R[usize::from(opcode & 0x07)]);
      }
      set.get(Prefix::CB, (opcode & 0xf8) | 6)
    }
    0xcb => {
      opcode = reader.byte();
      set.get(Prefix::CB, opcode)
    }
    0xed if variant.has_extended_set() => {
      index = None;
      opcode = reader.byte();
      set.get(Prefix::ED, opcode)
    }
    _ => {
      let instruction = set.get(Prefix::None, opcode);
      if index.is_some() && instruction.template.contains("(HL)") && instruction.template != "JP (HL)" {
        displacement = Some(reader.byte());
      }
      instruction
    }
  };

  if !instruction.is_known() {
    return (invalid(opcode), reader.addr);
  }

  let mut text = instruction.template.clone();
  if let Some(name) = index {
    if text != "EX DE,HL" {
      let memory = match displacement {
        Some(d) => format!("({}{})", name, signed(d)),
        None => format!("({})", name),
      };
      text = text.replace("(HL)", &memory).replace("HL", name);
      if displacement.is_none() {
        text = index_halves(&text, name);
      }
    }
  }

  match instruction.mode {
    Mode::Implied => (),
    Mode::Immediate => {
      let n = reader.byte();
      let d = signed(n);
      text = text
        .replace("{n}", &hex8(n))
        .replace("+{d}", &d)
        .replace("{d}", &d);
    }
    Mode::Absolute => {
      let nn = reader.word();
      text = text.replace("{nn}", &hex16(nn));
    }
    Mode::Relative => {
      let e = reader.byte();
      let target = reader.addr.wrapping_add(e as i8 as u16);
      text = text.replace("{e}", &hex16(target));
    }
  }
  if let Some(register) = copy {
    text = format!("{},{}", text, register);
  }
  (text, reader.addr)
}

/// Logs every instruction and the register state at `trace!` level.
pub struct Tracer;

impl Trace for Tracer {
  fn executing(&mut self, cpu: &Cpu, bus: &dyn Bus) {
    let pc = cpu.regs.pc;
    let (text, next) = disassemble(cpu, bus, pc);
    let raw: String = (0..next.wrapping_sub(pc))
      .map(|i| hex8(bus.peek(pc.wrapping_add(i))))
      .collect();
    trace!("{}\n{}\t{}\t{}", state(cpu), hex16(pc), raw, text);
  }
}
