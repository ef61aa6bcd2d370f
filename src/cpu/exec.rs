use crate::cpu::{Cpu, Opcode, Register16, Variant};
use crate::mem::Bus;

/// Base of the LR35902's high page: I/O registers and HRAM.
const HIGH_PAGE: u16 = 0xff00;

impl Cpu {
  pub(super) fn unhandled(&mut self, _: &mut dyn Bus, _: Opcode) {}

  pub(super) fn nop(&mut self, _: &mut dyn Bus, _: Opcode) {}

  pub(super) fn ex_af(&mut self, _: &mut dyn Bus, _: Opcode) {
    self.regs.ex_af();
  }

  pub(super) fn exx(&mut self, _: &mut dyn Bus, _: Opcode) {
    self.regs.exx();
  }

  fn jump_relative(&mut self, offset: u8) {
    self.regs.pc = self.regs.pc.wrapping_add(offset as i8 as u16);
    self.regs.memptr.word = self.regs.pc;
  }

  pub(super) fn djnz(&mut self, bus: &mut dyn Bus, _: Opcode) {
    let offset = self.fetch_byte(bus);
    let b = self.regs.b().wrapping_sub(1);
    self.regs.set_b(b);
    if b != 0 {
      self.jump_relative(offset);
      self.take();
    }
  }

  pub(super) fn jr(&mut self, bus: &mut dyn Bus, _: Opcode) {
    let offset = self.fetch_byte(bus);
    self.jump_relative(offset);
  }

  pub(super) fn jr_cc(&mut self, bus: &mut dyn Bus, op: Opcode) {
    self.jr_conditional_flag(bus, op.y - 4);
  }

  /// JR cc,e. The displacement is relative to the following instruction.
  fn jr_conditional_flag(&mut self, bus: &mut dyn Bus, cc: u8) -> bool {
    let offset = self.fetch_byte(bus);
    let taken = self.condition(cc);
    if taken {
      self.jump_relative(offset);
      self.take();
    }
    taken
  }

  pub(super) fn ld_rp_nn(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let value = self.fetch_word(bus);
    self.set_rp(op.p, value);
  }

  pub(super) fn add_hl_rp(&mut self, _: &mut dyn Bus, op: Opcode) {
    let result = self.add16(self.index_base(), self.rp(op.p));
    self.set_index_base(result);
  }

  /// The x=0, z=2 group: loads through BC, DE, HL or an absolute address.
  pub(super) fn ld_indirect(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let a = self.regs.a();
    match (op.q, op.p) {
      (0, 0) | (0, 1) => {
        let address = self.rp(op.p);
        bus.wb(address, a);
        self.regs.memptr = Register16::from_bytes(a, (address as u8).wrapping_add(1));
      }
      (1, 0) | (1, 1) => {
        let address = self.rp(op.p);
        let value = bus.rb(address);
        self.regs.set_a(value);
        self.regs.memptr.word = address.wrapping_add(1);
      }
      (_, p) if self.variant == Variant::Lr35902 => {
        // LDI/LDD through HL.
        let hl = self.regs.hl.word;
        if op.q == 0 {
          bus.wb(hl, a);
        } else {
          let value = bus.rb(hl);
          self.regs.set_a(value);
        }
        self.regs.hl.word = if p == 2 {
          hl.wrapping_add(1)
        } else {
          hl.wrapping_sub(1)
        };
      }
      (0, 2) => {
        let address = self.fetch_word(bus);
        let value = self.index_base();
        bus.ww(address, value);
        self.regs.memptr.word = address.wrapping_add(1);
      }
      (0, _) => {
        let address = self.fetch_word(bus);
        bus.wb(address, a);
        self.regs.memptr = Register16::from_bytes(a, (address as u8).wrapping_add(1));
      }
      (_, 2) => {
        let address = self.fetch_word(bus);
        let value = bus.rw(address);
        self.set_index_base(value);
        self.regs.memptr.word = address.wrapping_add(1);
      }
      (_, _) => {
        let address = self.fetch_word(bus);
        let value = bus.rb(address);
        self.regs.set_a(value);
        self.regs.memptr.word = address.wrapping_add(1);
      }
    }
  }

  pub(super) fn inc_rp(&mut self, _: &mut dyn Bus, op: Opcode) {
    let value = self.rp(op.p).wrapping_add(1);
    self.set_rp(op.p, value);
  }

  pub(super) fn dec_rp(&mut self, _: &mut dyn Bus, op: Opcode) {
    let value = self.rp(op.p).wrapping_sub(1);
    self.set_rp(op.p, value);
  }

  pub(super) fn inc_r(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let value = self.read_r(bus, op.y);
    let result = self.increment(value);
    self.write_r(bus, op.y, result);
  }

  pub(super) fn dec_r(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let value = self.read_r(bus, op.y);
    let result = self.decrement(value);
    self.write_r(bus, op.y, result);
  }

  pub(super) fn ld_r_n(&mut self, bus: &mut dyn Bus, op: Opcode) {
    if op.y == 6 {
      let address = self.hl_address(bus);
      let value = self.fetch_byte(bus);
      bus.wb(address, value);
      if self.indexed() {
        // LD (IX+d),n overlaps the operand fetch with the address add.
        self.cycles -= 3;
      }
    } else {
      let value = self.fetch_byte(bus);
      self.set_r(op.y, value, true);
    }
  }

  /// RLCA RRCA RLA RRA DAA CPL SCF CCF.
  pub(super) fn accumulator_op(&mut self, _: &mut dyn Bus, op: Opcode) {
    match op.y {
      0..=3 => self.rotate_accumulator(op.y),
      4 => self.daa(),
      5 => self.cpl(),
      6 => self.scf(),
      _ => self.ccf(),
    }
  }

  pub(super) fn ld_nn_sp(&mut self, bus: &mut dyn Bus, _: Opcode) {
    let address = self.fetch_word(bus);
    let sp = self.regs.sp;
    bus.ww(address, sp);
  }

  pub(super) fn stop(&mut self, bus: &mut dyn Bus, _: Opcode) {
    // STOP is followed by a padding byte.
    self.fetch_byte(bus);
    debug!("STOP at {:#06x}", self.regs.pc.wrapping_sub(2));
    self.halted = true;
  }

  pub(super) fn halt(&mut self, _: &mut dyn Bus, _: Opcode) {
    self.halted = true;
  }

  pub(super) fn ld_r_r(&mut self, bus: &mut dyn Bus, op: Opcode) {
    if op.y == 6 {
      let value = self.get_r(op.z, false);
      let address = self.hl_address(bus);
      bus.wb(address, value);
    } else if op.z == 6 {
      let address = self.hl_address(bus);
      let value = bus.rb(address);
      self.set_r(op.y, value, false);
    } else {
      let value = self.get_r(op.z, true);
      self.set_r(op.y, value, true);
    }
  }

  pub(super) fn alu_r(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let value = self.read_r(bus, op.z);
    self.alu(op.y, value);
  }

  pub(super) fn alu_n(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let value = self.fetch_byte(bus);
    self.alu(op.y, value);
  }

  pub(super) fn ret_cc(&mut self, bus: &mut dyn Bus, op: Opcode) {
    self.return_conditional_flag(bus, op.y);
  }

  /// RET cc. On the LR35902 slots 4 to 7 hold the FF00+n loads and the
  /// SP-relative arithmetic instead.
  fn return_conditional_flag(&mut self, bus: &mut dyn Bus, cc: u8) -> bool {
    if self.variant.has_gameboy_io() && cc >= 4 {
      match cc {
        4 => {
          let offset = self.fetch_byte(bus);
          let a = self.regs.a();
          bus.wb(HIGH_PAGE + u16::from(offset), a);
        }
        5 => {
          let offset = self.fetch_byte(bus);
          self.regs.sp = self.add_sp(offset);
        }
        6 => {
          let offset = self.fetch_byte(bus);
          let value = bus.rb(HIGH_PAGE + u16::from(offset));
          self.regs.set_a(value);
        }
        _ => {
          let offset = self.fetch_byte(bus);
          self.regs.hl.word = self.add_sp(offset);
        }
      }
      return false;
    }
    let taken = self.condition(cc);
    if taken {
      self.regs.pc = self.pop(bus);
      self.regs.memptr.word = self.regs.pc;
      self.take();
    }
    taken
  }

  pub(super) fn pop_rp(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let value = self.pop(bus);
    self.set_rp2(op.p, value);
  }

  pub(super) fn ret(&mut self, bus: &mut dyn Bus, _: Opcode) {
    self.regs.pc = self.pop(bus);
    self.regs.memptr.word = self.regs.pc;
  }

  /// LR35902 RETI: return and enable interrupts at once.
  pub(super) fn reti(&mut self, bus: &mut dyn Bus, op: Opcode) {
    self.ret(bus, op);
    self.iff1 = true;
    self.iff2 = true;
  }

  /// Z80 RETN and RETI both restore IFF1 from IFF2.
  pub(super) fn retn(&mut self, bus: &mut dyn Bus, op: Opcode) {
    self.ret(bus, op);
    self.iff1 = self.iff2;
  }

  pub(super) fn jp_hl(&mut self, _: &mut dyn Bus, _: Opcode) {
    self.regs.pc = self.index_base();
  }

  pub(super) fn ld_sp_hl(&mut self, _: &mut dyn Bus, _: Opcode) {
    self.regs.sp = self.index_base();
  }

  pub(super) fn jp_cc(&mut self, bus: &mut dyn Bus, op: Opcode) {
    self.jump_conditional_flag(bus, op.y);
  }

  /// JP cc,nn. On the LR35902 slots 4 to 7 hold the (FF00+C) and absolute
  /// accumulator loads.
  fn jump_conditional_flag(&mut self, bus: &mut dyn Bus, cc: u8) -> bool {
    if self.variant.has_gameboy_io() && cc >= 4 {
      let a = self.regs.a();
      match cc {
        4 => bus.wb(HIGH_PAGE + u16::from(self.regs.c()), a),
        5 => {
          let address = self.fetch_word(bus);
          bus.wb(address, a);
        }
        6 => {
          let value = bus.rb(HIGH_PAGE + u16::from(self.regs.c()));
          self.regs.set_a(value);
        }
        _ => {
          let address = self.fetch_word(bus);
          let value = bus.rb(address);
          self.regs.set_a(value);
        }
      }
      return false;
    }
    let target = self.fetch_word(bus);
    self.regs.memptr.word = target;
    let taken = self.condition(cc);
    if taken {
      self.regs.pc = target;
      self.take();
    }
    taken
  }

  pub(super) fn jp(&mut self, bus: &mut dyn Bus, _: Opcode) {
    self.regs.pc = self.fetch_word(bus);
    self.regs.memptr.word = self.regs.pc;
  }

  pub(super) fn out_n(&mut self, bus: &mut dyn Bus, _: Opcode) {
    let port = self.fetch_byte(bus);
    let a = self.regs.a();
    bus.port_out(port, a);
    self.regs.memptr = Register16::from_bytes(a, port.wrapping_add(1));
  }

  pub(super) fn in_n(&mut self, bus: &mut dyn Bus, _: Opcode) {
    let port = self.fetch_byte(bus);
    let a = self.regs.a();
    let value = bus.port_in(port);
    self.regs.set_a(value);
    self.regs.memptr.word = ((u16::from(a) << 8) | u16::from(port)).wrapping_add(1);
  }

  pub(super) fn ex_sp_hl(&mut self, bus: &mut dyn Bus, _: Opcode) {
    let sp = self.regs.sp;
    let value = bus.rw(sp);
    let hl = self.index_base();
    bus.ww(sp, hl);
    self.set_index_base(value);
    self.regs.memptr.word = value;
  }

  pub(super) fn ex_de_hl(&mut self, _: &mut dyn Bus, _: Opcode) {
    std::mem::swap(&mut self.regs.de, &mut self.regs.hl);
  }

  pub(super) fn di(&mut self, _: &mut dyn Bus, _: Opcode) {
    self.iff1 = false;
    self.iff2 = false;
  }

  pub(super) fn ei(&mut self, _: &mut dyn Bus, _: Opcode) {
    self.iff1 = true;
    self.iff2 = true;
    self.ei_delay = true;
  }

  pub(super) fn call_cc(&mut self, bus: &mut dyn Bus, op: Opcode) {
    self.call_conditional_flag(bus, op.y);
  }

  fn call_conditional_flag(&mut self, bus: &mut dyn Bus, cc: u8) -> bool {
    let target = self.fetch_word(bus);
    self.regs.memptr.word = target;
    let taken = self.condition(cc);
    if taken {
      self.restart(bus, target);
      self.take();
    }
    taken
  }

  pub(super) fn push_rp(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let value = self.rp2(op.p);
    self.push(bus, value);
  }

  pub(super) fn call(&mut self, bus: &mut dyn Bus, _: Opcode) {
    let target = self.fetch_word(bus);
    self.restart(bus, target);
  }

  pub(super) fn rst(&mut self, bus: &mut dyn Bus, op: Opcode) {
    self.restart(bus, u16::from(op.y) * 8);
  }

  /// CB operand. DDCB/FDCB forms always address (IX+d).
  fn cb_read(&mut self, bus: &mut dyn Bus, z: u8) -> u8 {
    if z == 6 || self.indexed() {
      let address = self.hl_address(bus);
      bus.rb(address)
    } else {
      self.get_r(z, false)
    }
  }

  /// Write back a CB result. The indexed forms also copy the result into
  /// register `z` unless `z` names memory.
  fn cb_write(&mut self, bus: &mut dyn Bus, z: u8, value: u8) {
    if z == 6 || self.indexed() {
      let address = self.hl_address(bus);
      bus.wb(address, value);
    }
    if z != 6 {
      self.set_r(z, value, false);
    }
  }

  pub(super) fn cb_rotate(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let value = self.cb_read(bus, op.z);
    let result = self.rotate(op.y, value);
    self.cb_write(bus, op.z, result);
  }

  pub(super) fn cb_bit(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let value = self.cb_read(bus, op.z);
    let xy = if op.z == 6 || self.indexed() {
      self.regs.memptr.high()
    } else {
      value
    };
    self.bit(op.y, value, xy);
  }

  pub(super) fn cb_res(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let value = self.cb_read(bus, op.z);
    self.cb_write(bus, op.z, value & !(1 << op.y));
  }

  pub(super) fn cb_set(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let value = self.cb_read(bus, op.z);
    self.cb_write(bus, op.z, value | (1 << op.y));
  }

  pub(super) fn in_r_c(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let bc = self.regs.bc.word;
    let value = bus.port_in(bc as u8);
    self.regs.memptr.word = bc.wrapping_add(1);
    self.adjust_szpxy(value);
    self.set_flag(self.bits.half_carry, false);
    self.set_flag(self.bits.subtract, false);
    if op.y != 6 {
      self.set_r(op.y, value, false);
    }
  }

  pub(super) fn out_c_r(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let bc = self.regs.bc.word;
    let value = if op.y == 6 { 0 } else { self.get_r(op.y, false) };
    bus.port_out(bc as u8, value);
    self.regs.memptr.word = bc.wrapping_add(1);
  }

  pub(super) fn sbc_hl_rp(&mut self, _: &mut dyn Bus, op: Opcode) {
    let result = self.sbc16(self.regs.hl.word, self.rp(op.p));
    self.regs.hl.word = result;
  }

  pub(super) fn adc_hl_rp(&mut self, _: &mut dyn Bus, op: Opcode) {
    let result = self.adc16(self.regs.hl.word, self.rp(op.p));
    self.regs.hl.word = result;
  }

  pub(super) fn ld_nn_rp(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let address = self.fetch_word(bus);
    let value = self.rp(op.p);
    bus.ww(address, value);
    self.regs.memptr.word = address.wrapping_add(1);
  }

  pub(super) fn ld_rp_indirect(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let address = self.fetch_word(bus);
    let value = bus.rw(address);
    self.set_rp(op.p, value);
    self.regs.memptr.word = address.wrapping_add(1);
  }

  pub(super) fn neg(&mut self, _: &mut dyn Bus, _: Opcode) {
    self.negate();
  }

  pub(super) fn im(&mut self, _: &mut dyn Bus, op: Opcode) {
    self.im = match op.y & 0x3 {
      2 => 1,
      3 => 2,
      _ => 0,
    };
    debug!("interrupt mode {}", self.im);
  }

  /// LD I,A  LD R,A  LD A,I  LD A,R.
  pub(super) fn ld_special(&mut self, _: &mut dyn Bus, op: Opcode) {
    match op.y {
      0 => self.regs.i = self.regs.a(),
      1 => self.regs.r = self.regs.a(),
      _ => {
        let value = if op.y == 2 { self.regs.i } else { self.regs.r };
        self.regs.set_a(value);
        self.adjust_szxy(value);
        self.set_flag(self.bits.half_carry, false);
        self.set_flag(self.bits.subtract, false);
        self.set_flag(self.bits.parity, self.iff2);
      }
    }
  }

  pub(super) fn rrd(&mut self, bus: &mut dyn Bus, _: Opcode) {
    let hl = self.regs.hl.word;
    let memory = bus.rb(hl);
    let a = self.regs.a();
    bus.wb(hl, (a << 4) | (memory >> 4));
    self.digit_result((a & 0xf0) | (memory & 0x0f));
    self.regs.memptr.word = hl.wrapping_add(1);
  }

  pub(super) fn rld(&mut self, bus: &mut dyn Bus, _: Opcode) {
    let hl = self.regs.hl.word;
    let memory = bus.rb(hl);
    let a = self.regs.a();
    bus.wb(hl, (memory << 4) | (a & 0x0f));
    self.digit_result((a & 0xf0) | (memory >> 4));
    self.regs.memptr.word = hl.wrapping_add(1);
  }

  fn digit_result(&mut self, a: u8) {
    self.regs.set_a(a);
    self.adjust_szpxy(a);
    self.set_flag(self.bits.half_carry, false);
    self.set_flag(self.bits.subtract, false);
  }

  /// The ED block group. `y` picks direction (bit 0) and repetition (y >= 6),
  /// `z` picks load, compare, input or output.
  pub(super) fn block(&mut self, bus: &mut dyn Bus, op: Opcode) {
    let forward = op.y & 1 == 0;
    let repeat = op.y >= 6;
    let step = |word: u16| {
      if forward {
        word.wrapping_add(1)
      } else {
        word.wrapping_sub(1)
      }
    };

    let hl = self.regs.hl.word;
    let again = match op.z {
      0 => {
        let value = bus.rb(hl);
        let de = self.regs.de.word;
        bus.wb(de, value);
        self.regs.de.word = step(de);
        self.regs.hl.word = step(hl);
        let bc = self.regs.bc.word.wrapping_sub(1);
        self.regs.bc.word = bc;
        let n = value.wrapping_add(self.regs.a());
        self.set_flag(self.bits.y, n & 0x02 != 0);
        self.set_flag(self.bits.x, n & 0x08 != 0);
        self.set_flag(self.bits.half_carry, false);
        self.set_flag(self.bits.subtract, false);
        self.set_flag(self.bits.parity, bc != 0);
        bc != 0
      }
      1 => {
        let value = bus.rb(hl);
        let carry = self.flag(self.bits.carry);
        let result = self.compare(value);
        self.regs.hl.word = step(hl);
        let bc = self.regs.bc.word.wrapping_sub(1);
        self.regs.bc.word = bc;
        let n = result.wrapping_sub(u8::from(self.flag(self.bits.half_carry)));
        self.set_flag(self.bits.y, n & 0x02 != 0);
        self.set_flag(self.bits.x, n & 0x08 != 0);
        self.set_flag(self.bits.parity, bc != 0);
        self.set_flag(self.bits.carry, carry);
        self.regs.memptr.word = if forward {
          self.regs.memptr.word.wrapping_add(1)
        } else {
          self.regs.memptr.word.wrapping_sub(1)
        };
        bc != 0 && result != 0
      }
      2 => {
        let c = self.regs.c();
        let value = bus.port_in(c);
        bus.wb(hl, value);
        self.regs.hl.word = step(hl);
        let b = self.regs.b().wrapping_sub(1);
        self.regs.set_b(b);
        let c = if forward { c.wrapping_add(1) } else { c.wrapping_sub(1) };
        self.io_block_flags(value, c, b);
        b != 0
      }
      _ => {
        let value = bus.rb(hl);
        let b = self.regs.b().wrapping_sub(1);
        self.regs.set_b(b);
        bus.port_out(self.regs.c(), value);
        self.regs.hl.word = step(hl);
        let l = self.regs.l();
        self.io_block_flags(value, l, b);
        b != 0
      }
    };

    if repeat && again {
      self.regs.pc = self.regs.pc.wrapping_sub(2);
      self.regs.memptr.word = self.regs.pc.wrapping_add(1);
      self.take();
    }
  }

  /// INI/IND/OUTI/OUTD flags. `k` is the transferred byte plus the
  /// adjusted C (input) or the new L (output).
  fn io_block_flags(&mut self, value: u8, operand: u8, b: u8) {
    let k = u16::from(value) + u16::from(operand);
    self.adjust_szxy(b);
    self.set_flag(self.bits.subtract, value & 0x80 != 0);
    self.set_flag(self.bits.half_carry, k > 0xff);
    self.set_flag(self.bits.carry, k > 0xff);
    self.adjust_parity((k as u8 & 0x07) ^ b);
  }
}

