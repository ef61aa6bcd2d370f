use crate::cpu::{Cpu, Variant};

// Carry out of bit 3 (or 7), looked up from bit 3 (or 7) of the operand
// before, the other operand and the result, packed as `before:value:after`.
const HALF_CARRY_ADD: [bool; 8] = [false, false, true, false, true, false, true, true];
const HALF_CARRY_SUB: [bool; 8] = [false, true, true, true, false, false, false, true];
const OVERFLOW_ADD: [bool; 8] = [false, true, false, false, false, false, true, false];
const OVERFLOW_SUB: [bool; 8] = [false, false, false, true, true, false, false, false];

fn lookup(before: u8, value: u8, after: u8, bit: u8) -> usize {
  let mask = 1 << bit;
  (usize::from(before & mask != 0) << 2)
    | (usize::from(value & mask != 0) << 1)
    | usize::from(after & mask != 0)
}

fn even_parity(value: u8) -> bool {
  value.count_ones() % 2 == 0
}

impl Cpu {
  pub(super) fn adjust_sign(&mut self, value: u8) {
    self.set_flag(self.bits.sign, value & 0x80 != 0);
  }

  pub(super) fn adjust_zero(&mut self, value: u8) {
    self.set_flag(self.bits.zero, value == 0);
  }

  pub(super) fn adjust_parity(&mut self, value: u8) {
    self.set_flag(self.bits.parity, even_parity(value));
  }

  /// Undocumented bits 5 and 3 copied from `value`. No-op on the LR35902.
  pub(super) fn adjust_xy(&mut self, value: u8) {
    self.set_flag(self.bits.y, value & 0x20 != 0);
    self.set_flag(self.bits.x, value & 0x08 != 0);
  }

  pub(super) fn adjust_szxy(&mut self, value: u8) {
    self.adjust_sign(value);
    self.adjust_zero(value);
    self.adjust_xy(value);
  }

  pub(super) fn adjust_szpxy(&mut self, value: u8) {
    self.adjust_szxy(value);
    self.adjust_parity(value);
  }

  fn adjust_half_carry_add(&mut self, before: u8, value: u8, after: u8) {
    let carried = HALF_CARRY_ADD[lookup(before, value, after, 3)];
    self.set_flag(self.bits.half_carry, carried);
  }

  fn adjust_half_carry_sub(&mut self, before: u8, value: u8, after: u8) {
    let borrowed = HALF_CARRY_SUB[lookup(before, value, after, 3)];
    self.set_flag(self.bits.half_carry, borrowed);
  }

  fn adjust_overflow_add(&mut self, before: u8, value: u8, after: u8) {
    let overflow = OVERFLOW_ADD[lookup(before, value, after, 7)];
    self.set_flag(self.bits.parity, overflow);
  }

  fn adjust_overflow_sub(&mut self, before: u8, value: u8, after: u8) {
    let overflow = OVERFLOW_SUB[lookup(before, value, after, 7)];
    self.set_flag(self.bits.parity, overflow);
  }

  fn add(&mut self, operand: u8, carry: bool) {
    let a = self.regs.a();
    let sum = u16::from(a) + u16::from(operand) + u16::from(carry);
    let result = sum as u8;
    self.adjust_szxy(result);
    self.adjust_half_carry_add(a, operand, result);
    self.adjust_overflow_add(a, operand, result);
    self.set_flag(self.bits.subtract, false);
    self.set_flag(self.bits.carry, sum & 0x100 != 0);
    self.regs.set_a(result);
  }

  /// A - operand - borrow with flags. Returns the result without storing it.
  fn subtract(&mut self, operand: u8, borrow: bool) -> u8 {
    let a = self.regs.a();
    let difference = u16::from(a)
      .wrapping_sub(u16::from(operand))
      .wrapping_sub(u16::from(borrow));
    let result = difference as u8;
    self.adjust_szxy(result);
    self.adjust_half_carry_sub(a, operand, result);
    self.adjust_overflow_sub(a, operand, result);
    self.set_flag(self.bits.subtract, true);
    self.set_flag(self.bits.carry, difference & 0x100 != 0);
    result
  }

  fn logical(&mut self, result: u8, half_carry: bool) {
    self.adjust_szpxy(result);
    self.set_flag(self.bits.half_carry, half_carry);
    self.set_flag(self.bits.subtract, false);
    self.set_flag(self.bits.carry, false);
    self.regs.set_a(result);
  }

  /// The eight accumulator operations selected by bits 5-3 of the opcode:
  /// ADD ADC SUB SBC AND XOR OR CP.
  pub(super) fn alu(&mut self, operation: u8, value: u8) {
    let carry = self.flag(self.bits.carry);
    match operation {
      0 => self.add(value, false),
      1 => self.add(value, carry),
      2 => {
        let result = self.subtract(value, false);
        self.regs.set_a(result);
      }
      3 => {
        let result = self.subtract(value, carry);
        self.regs.set_a(result);
      }
      4 => {
        let result = self.regs.a() & value;
        self.logical(result, true)
      }
      5 => {
        let result = self.regs.a() ^ value;
        self.logical(result, false)
      }
      6 => {
        let result = self.regs.a() | value;
        self.logical(result, false)
      }
      _ => {
        self.compare(value);
        self.adjust_xy(value);
      }
    }
  }

  pub(super) fn increment(&mut self, value: u8) -> u8 {
    let result = value.wrapping_add(1);
    self.adjust_szxy(result);
    self.set_flag(self.bits.half_carry, result & 0x0f == 0);
    self.set_flag(self.bits.parity, result == 0x80);
    self.set_flag(self.bits.subtract, false);
    result
  }

  pub(super) fn decrement(&mut self, value: u8) -> u8 {
    let result = value.wrapping_sub(1);
    self.adjust_szxy(result);
    self.set_flag(self.bits.half_carry, result & 0x0f == 0x0f);
    self.set_flag(self.bits.parity, result == 0x7f);
    self.set_flag(self.bits.subtract, true);
    result
  }

  /// The CB rotate/shift group selected by bits 5-3. Slot 6 is SLL on the
  /// Z80 and SWAP on the LR35902.
  pub(super) fn rotate(&mut self, operation: u8, value: u8) -> u8 {
    let carry_in = self.flag(self.bits.carry);
    let (result, carry) = match operation {
      0 => (value.rotate_left(1), value & 0x80 != 0),
      1 => (value.rotate_right(1), value & 0x01 != 0),
      2 => ((value << 1) | u8::from(carry_in), value & 0x80 != 0),
      3 => ((value >> 1) | (u8::from(carry_in) << 7), value & 0x01 != 0),
      4 => (value << 1, value & 0x80 != 0),
      5 => ((value >> 1) | (value & 0x80), value & 0x01 != 0),
      6 if self.variant == Variant::Lr35902 => (value.rotate_left(4), false),
      6 => ((value << 1) | 1, value & 0x80 != 0),
      _ => (value >> 1, value & 0x01 != 0),
    };
    self.adjust_szpxy(result);
    self.set_flag(self.bits.half_carry, false);
    self.set_flag(self.bits.subtract, false);
    self.set_flag(self.bits.carry, carry);
    result
  }

  /// RLCA RRCA RLA RRA. Sign, zero and parity survive on the Z80; the
  /// LR35902 always clears zero.
  pub(super) fn rotate_accumulator(&mut self, operation: u8) {
    let kept = self.regs.f() & (self.bits.sign | self.bits.zero | self.bits.parity);
    let result = self.rotate(operation, self.regs.a());
    let f = self.regs.f() & !(self.bits.sign | self.bits.zero | self.bits.parity);
    self.regs.set_f(f);
    if self.variant == Variant::Z80 {
      self.regs.set_f(f | kept);
    }
    self.regs.set_a(result);
  }

  pub(super) fn daa(&mut self) {
    let a = self.regs.a();
    let subtract = self.flag(self.bits.subtract);
    let half_carry = self.flag(self.bits.half_carry);
    let mut carry = self.flag(self.bits.carry);

    let result = match self.variant {
      Variant::Lr35902 => {
        let mut result = a;
        if !subtract {
          if carry || result > 0x99 {
            result = result.wrapping_add(0x60);
            carry = true;
          }
          if half_carry || result & 0x0f > 0x09 {
            result = result.wrapping_add(0x06);
          }
        } else {
          if carry {
            result = result.wrapping_sub(0x60);
          }
          if half_carry {
            result = result.wrapping_sub(0x06);
          }
        }
        self.set_flag(self.bits.half_carry, false);
        result
      }
      Variant::Z80 => {
        let mut correction = 0;
        if half_carry || a & 0x0f > 0x09 {
          correction |= 0x06;
        }
        if carry || a > 0x99 {
          correction |= 0x60;
          carry = true;
        }
        let result = if subtract {
          a.wrapping_sub(correction)
        } else {
          a.wrapping_add(correction)
        };
        self.set_flag(self.bits.half_carry, (a ^ result) & 0x10 != 0);
        result
      }
    };

    self.adjust_szpxy(result);
    self.set_flag(self.bits.carry, carry);
    self.regs.set_a(result);
  }

  pub(super) fn cpl(&mut self) {
    let result = !self.regs.a();
    self.regs.set_a(result);
    self.adjust_xy(result);
    self.set_flag(self.bits.half_carry, true);
    self.set_flag(self.bits.subtract, true);
  }

  pub(super) fn scf(&mut self) {
    let a = self.regs.a();
    self.adjust_xy(a);
    self.set_flag(self.bits.half_carry, false);
    self.set_flag(self.bits.subtract, false);
    self.set_flag(self.bits.carry, true);
  }

  pub(super) fn ccf(&mut self) {
    let a = self.regs.a();
    let carry = self.flag(self.bits.carry);
    self.adjust_xy(a);
    self.set_flag(self.bits.half_carry, carry && self.variant == Variant::Z80);
    self.set_flag(self.bits.subtract, false);
    self.set_flag(self.bits.carry, !carry);
  }

  /// BIT n. `xy` supplies the undocumented bits: the operand for registers,
  /// the high byte of the address for memory forms.
  pub(super) fn bit(&mut self, n: u8, value: u8, xy: u8) {
    let set = value & (1 << n) != 0;
    self.set_flag(self.bits.zero, !set);
    self.set_flag(self.bits.parity, !set);
    self.set_flag(self.bits.sign, n == 7 && set);
    self.adjust_xy(xy);
    self.set_flag(self.bits.half_carry, true);
    self.set_flag(self.bits.subtract, false);
  }

  /// A - value for its flags only.
  pub(super) fn compare(&mut self, value: u8) -> u8 {
    self.subtract(value, false)
  }

  pub(super) fn negate(&mut self) {
    let a = self.regs.a();
    self.regs.set_a(0);
    let result = self.subtract(a, false);
    self.regs.set_a(result);
  }

  /// ADD HL,rp. Half carry and carry come from bits 11 and 15.
  pub(super) fn add16(&mut self, before: u16, value: u16) -> u16 {
    let sum = u32::from(before) + u32::from(value);
    let result = sum as u16;
    let (high_before, high_value, high_after) = ((before >> 8) as u8, (value >> 8) as u8, (result >> 8) as u8);
    self.adjust_half_carry_add(high_before, high_value, high_after);
    self.adjust_xy(high_after);
    self.set_flag(self.bits.subtract, false);
    self.set_flag(self.bits.carry, sum & 0x1_0000 != 0);
    self.regs.memptr.word = before.wrapping_add(1);
    result
  }

  pub(super) fn adc16(&mut self, before: u16, value: u16) -> u16 {
    let carry = u32::from(self.flag(self.bits.carry));
    let sum = u32::from(before) + u32::from(value) + carry;
    let result = sum as u16;
    let (high_before, high_value, high_after) = ((before >> 8) as u8, (value >> 8) as u8, (result >> 8) as u8);
    self.adjust_sign(high_after);
    self.set_flag(self.bits.zero, result == 0);
    self.adjust_xy(high_after);
    self.adjust_half_carry_add(high_before, high_value, high_after);
    self.adjust_overflow_add(high_before, high_value, high_after);
    self.set_flag(self.bits.subtract, false);
    self.set_flag(self.bits.carry, sum & 0x1_0000 != 0);
    self.regs.memptr.word = before.wrapping_add(1);
    result
  }

  pub(super) fn sbc16(&mut self, before: u16, value: u16) -> u16 {
    let borrow = u32::from(self.flag(self.bits.carry));
    let difference = u32::from(before)
      .wrapping_sub(u32::from(value))
      .wrapping_sub(borrow);
    let result = difference as u16;
    let (high_before, high_value, high_after) = ((before >> 8) as u8, (value >> 8) as u8, (result >> 8) as u8);
    self.adjust_sign(high_after);
    self.set_flag(self.bits.zero, result == 0);
    self.adjust_xy(high_after);
    self.adjust_half_carry_sub(high_before, high_value, high_after);
    self.adjust_overflow_sub(high_before, high_value, high_after);
    self.set_flag(self.bits.subtract, true);
    self.set_flag(self.bits.carry, difference & 0x1_0000 != 0);
    self.regs.memptr.word = before.wrapping_add(1);
    result
  }

  /// SP plus a signed byte, shared by ADD SP,d and LD HL,SP+d. Flags come
  /// from the unsigned low byte addition.
  pub(super) fn add_sp(&mut self, offset: u8) -> u16 {
    let sp = self.regs.sp;
    let value = offset as i8 as u16;
    let result = sp.wrapping_add(value);
    let carries = sp ^ value ^ result;
    self.set_flag(self.bits.zero, false);
    self.set_flag(self.bits.subtract, false);
    self.set_flag(self.bits.half_carry, carries & 0x10 != 0);
    self.set_flag(self.bits.carry, carries & 0x100 != 0);
    result
  }
}
