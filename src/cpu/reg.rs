/// A 16-bit register pair. The word is the only storage, so the high and
/// low views can never disagree with it.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct Register16 {
  pub word: u16,
}

impl Register16 {
  pub fn new(word: u16) -> Register16 {
    Register16 { word: word }
  }

  pub fn from_bytes(high: u8, low: u8) -> Register16 {
    Register16::new((u16::from(high) << 8) | u16::from(low))
  }

  pub fn high(self) -> u8 {
    (self.word >> 8) as u8
  }

  pub fn low(self) -> u8 {
    self.word as u8
  }

  pub fn set_high(&mut self, value: u8) {
    self.word = (u16::from(value) << 8) | (self.word & 0x00ff);
  }

  pub fn set_low(&mut self, value: u8) {
    self.word = (self.word & 0xff00) | u16::from(value);
  }
}

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Registers {
  pub af: Register16,
  pub bc: Register16,
  pub de: Register16,
  pub hl: Register16,

  /// Index registers (Z80 only).
  pub ix: Register16,
  pub iy: Register16,

  /// Shadow set swapped in by `EX AF,AF'` and `EXX` (Z80 only).
  pub af_alt: Register16,
  pub bc_alt: Register16,
  pub de_alt: Register16,
  pub hl_alt: Register16,

  /// Program counter.
  pub pc: u16,

  /// Stack pointer.
  pub sp: u16,

  /// Interrupt vector base and memory refresh counter.
  pub i: u8,
  pub r: u8,

  /// Internal WZ register, visible through the undocumented X/Y flags.
  pub memptr: Register16,
}

impl Registers {
  pub fn new() -> Registers {
    Registers::default()
  }

  /// Register values left behind by the DMG boot ROM.
  pub fn post_boot() -> Registers {
    Registers {
      af: Register16::new(0x01b0),
      bc: Register16::new(0x0013),
      de: Register16::new(0x00d8),
      hl: Register16::new(0x014d),
      sp: 0xfffe,
      pc: 0x100,
      ..Registers::default()
    }
  }

  pub fn a(&self) -> u8 {
    self.af.high()
  }
  pub fn f(&self) -> u8 {
    self.af.low()
  }
  pub fn b(&self) -> u8 {
    self.bc.high()
  }
  pub fn c(&self) -> u8 {
    self.bc.low()
  }
  pub fn d(&self) -> u8 {
    self.de.high()
  }
  pub fn e(&self) -> u8 {
    self.de.low()
  }
  pub fn h(&self) -> u8 {
    self.hl.high()
  }
  pub fn l(&self) -> u8 {
    self.hl.low()
  }

  pub fn set_a(&mut self, value: u8) {
    self.af.set_high(value)
  }
  pub fn set_f(&mut self, value: u8) {
    self.af.set_low(value)
  }
  pub fn set_b(&mut self, value: u8) {
    self.bc.set_high(value)
  }
  pub fn set_c(&mut self, value: u8) {
    self.bc.set_low(value)
  }
  pub fn set_d(&mut self, value: u8) {
    self.de.set_high(value)
  }
  pub fn set_e(&mut self, value: u8) {
    self.de.set_low(value)
  }
  pub fn set_h(&mut self, value: u8) {
    self.hl.set_high(value)
  }
  pub fn set_l(&mut self, value: u8) {
    self.hl.set_low(value)
  }

  pub fn af(&self) -> u16 {
    self.af.word
  }
  pub fn bc(&self) -> u16 {
    self.bc.word
  }
  pub fn de(&self) -> u16 {
    self.de.word
  }
  pub fn hl(&self) -> u16 {
    self.hl.word
  }

  pub fn exx(&mut self) {
    std::mem::swap(&mut self.bc, &mut self.bc_alt);
    std::mem::swap(&mut self.de, &mut self.de_alt);
    std::mem::swap(&mut self.hl, &mut self.hl_alt);
  }

  pub fn ex_af(&mut self) {
    std::mem::swap(&mut self.af, &mut self.af_alt);
  }
}
