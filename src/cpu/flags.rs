use std::fmt;

/// Where each condition bit lives in F. A zero mask means the variant has
/// no such flag, and writes to it are ignored.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FlagBits {
  pub sign: u8,
  pub zero: u8,
  pub y: u8,
  pub half_carry: u8,
  pub x: u8,
  pub parity: u8,
  pub subtract: u8,
  pub carry: u8,
}

pub const Z80: FlagBits = FlagBits {
  sign: 0x80,
  zero: 0x40,
  y: 0x20,
  half_carry: 0x10,
  x: 0x08,
  parity: 0x04,
  subtract: 0x02,
  carry: 0x01,
};

pub const LR35902: FlagBits = FlagBits {
  sign: 0,
  zero: 0x80,
  y: 0,
  half_carry: 0x20,
  x: 0,
  parity: 0,
  subtract: 0x40,
  carry: 0x10,
};

impl FlagBits {
  /// Bits of F that hold state on this variant.
  pub fn used(&self) -> u8 {
    self.sign
      | self.zero
      | self.y
      | self.half_carry
      | self.x
      | self.parity
      | self.subtract
      | self.carry
  }
}

/// Unpacked condition codes. Flip fields directly, then convert back to a
/// byte to store them.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct StatusFlags {
  pub sign: bool,
  pub zero: bool,
  pub half_carry: bool,
  pub parity: bool,
  pub subtract: bool,
  pub carry: bool,
}

impl StatusFlags {
  pub fn unpack(value: u8, bits: &FlagBits) -> StatusFlags {
    let test = |mask: u8| mask != 0 && value & mask != 0;
    StatusFlags {
      sign: test(bits.sign),
      zero: test(bits.zero),
      half_carry: test(bits.half_carry),
      parity: test(bits.parity),
      subtract: test(bits.subtract),
      carry: test(bits.carry),
    }
  }

  /// Re-pack into `bits`' layout. Undocumented and reserved bits come back
  /// as zero.
  pub fn pack(&self, bits: &FlagBits) -> u8 {
    let mut value = 0;
    let mut put = |flag: bool, mask: u8| {
      if flag {
        value |= mask
      }
    };
    put(self.sign, bits.sign);
    put(self.zero, bits.zero);
    put(self.half_carry, bits.half_carry);
    put(self.parity, bits.parity);
    put(self.subtract, bits.subtract);
    put(self.carry, bits.carry);
    value
  }
}

impl From<u8> for StatusFlags {
  fn from(value: u8) -> StatusFlags {
    StatusFlags::unpack(value, &Z80)
  }
}

impl From<StatusFlags> for u8 {
  fn from(flags: StatusFlags) -> u8 {
    flags.pack(&Z80)
  }
}

impl fmt::Display for StatusFlags {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let show = |flag: bool, c: char| if flag { c } else { '-' };
    write!(
      f,
      "{}{}0{}0{}{}{}",
      show(self.sign, 'S'),
      show(self.zero, 'Z'),
      show(self.half_carry, 'A'),
      show(self.parity, 'P'),
      show(self.subtract, 'N'),
      show(self.carry, 'C'),
    )
  }
}
