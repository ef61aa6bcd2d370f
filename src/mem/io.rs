//! The Game Boy address space: cartridge, boot ROM overlay, RAM and the
//! memory-mapped registers at FF00.

use std::path::Path;

use crate::error::Result;
use crate::mem::key::KeyData;
use crate::mem::mbc::{self, Cartridge, MBC};
use crate::mem::timer::Timer;
use crate::mem::{read_image, Bus, Key, Memory};

pub const BASE: u16 = 0xff00;

pub const P1: u16 = 0x00;
pub const SB: u16 = 0x01;
pub const SC: u16 = 0x02;
pub const DIV: u16 = 0x04;
pub const TIMA: u16 = 0x05;
pub const TMA: u16 = 0x06;
pub const TAC: u16 = 0x07;
pub const IF: u16 = 0x0f;

pub const NR10: u16 = 0x10;
pub const NR11: u16 = 0x11;
pub const NR12: u16 = 0x12;
pub const NR13: u16 = 0x13;
pub const NR14: u16 = 0x14;
pub const NR21: u16 = 0x16;
pub const NR22: u16 = 0x17;
pub const NR23: u16 = 0x18;
pub const NR24: u16 = 0x19;
pub const NR30: u16 = 0x1a;
pub const NR31: u16 = 0x1b;
pub const NR32: u16 = 0x1c;
pub const NR33: u16 = 0x1d;
pub const NR34: u16 = 0x1e;
pub const NR41: u16 = 0x20;
pub const NR42: u16 = 0x21;
pub const NR43: u16 = 0x22;
pub const NR44: u16 = 0x23;
pub const NR50: u16 = 0x24;
pub const NR51: u16 = 0x25;
pub const NR52: u16 = 0x26;

pub const LCDC: u16 = 0x40;
pub const STAT: u16 = 0x41;
pub const SCY: u16 = 0x42;
pub const SCX: u16 = 0x43;
pub const LY: u16 = 0x44;
pub const LYC: u16 = 0x45;
pub const DMA: u16 = 0x46;
pub const BGP: u16 = 0x47;
pub const OBP0: u16 = 0x48;
pub const OBP1: u16 = 0x49;
pub const WY: u16 = 0x4a;
pub const WX: u16 = 0x4b;
pub const BOOT: u16 = 0x50;

/// Interrupt enable lives outside the FF00 block.
pub const IE: u16 = 0xffff;

pub const OAM: u16 = 0xfe00;
const OAM_SIZE: u16 = 0xa0;

/// Interrupt sources in priority order.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Interrupt {
  VBlank,
  Stat,
  Timer,
  Serial,
  Joypad,
}

impl Interrupt {
  pub const ALL: [Interrupt; 5] = [
    Interrupt::VBlank,
    Interrupt::Stat,
    Interrupt::Timer,
    Interrupt::Serial,
    Interrupt::Joypad,
  ];

  /// Bit in IF and IE.
  pub fn bit(self) -> u8 {
    match self {
      Interrupt::VBlank => 0x01,
      Interrupt::Stat => 0x02,
      Interrupt::Timer => 0x04,
      Interrupt::Serial => 0x08,
      Interrupt::Joypad => 0x10,
    }
  }

  pub fn vector(self) -> u8 {
    match self {
      Interrupt::VBlank => 0x40,
      Interrupt::Stat => 0x48,
      Interrupt::Timer => 0x50,
      Interrupt::Serial => 0x58,
      Interrupt::Joypad => 0x60,
    }
  }
}

/// Observer invoked with `(address, value)` on every CPU write.
pub type WriteHook = Box<dyn FnMut(u16, u8)>;

pub struct Io {
  /// Flat backing store for everything not owned by a device below.
  pub memory: Memory,
  cartridge: Option<Box<dyn MBC>>,

  boot_rom: Vec<u8>,
  boot_mapped: bool,

  timer: Timer,
  keys: KeyData,

  /// Bytes shifted out over the link port.
  pub serial_output: Vec<u8>,
  write_hook: Option<WriteHook>,
}

impl Io {
  pub fn new() -> Io {
    let mut io = Io {
      memory: Memory::new(0xffff),
      cartridge: None,
      boot_rom: Vec::new(),
      boot_mapped: false,
      timer: Timer::new(),
      keys: KeyData::new(),
      serial_output: Vec::new(),
      write_hook: None,
    };
    io.reset();
    io
  }

  /// Clear memory and devices. The boot ROM and cartridge are dropped too.
  pub fn reset(&mut self) {
    self.memory.clear();
    self.cartridge = None;
    self.boot_rom.clear();
    self.boot_mapped = false;
    self.timer = Timer::new();
    self.keys = KeyData::new();
    self.serial_output.clear();
    self.set_reg(NR52, 0xf1);
    self.set_reg(LCDC, 0x91);
  }

  /// Register values the DMG boot ROM leaves behind.
  pub fn power_on(&mut self) {
    // See http://nocash.emubase.de/pandocs.htm#powerupsequence
    self.timer = Timer::new();
    let values = [
      (NR10, 0x80),
      (NR11, 0xbf),
      (NR12, 0xf3),
      (NR14, 0xbf),
      (NR21, 0x3f),
      (NR22, 0x00),
      (NR24, 0xbf),
      (NR30, 0x7f),
      (NR31, 0xff),
      (NR32, 0x9f),
      (NR34, 0xbf),
      (NR41, 0xff),
      (NR42, 0x00),
      (NR43, 0x00),
      (NR44, 0xbf),
      (NR50, 0x77),
      (NR51, 0xf3),
      (NR52, 0xf1),
      (LCDC, 0x91),
      (SCY, 0x00),
      (SCX, 0x00),
      (LYC, 0x00),
      (BGP, 0xfc),
      (OBP0, 0xff),
      (OBP1, 0xff),
      (WY, 0x00),
      (WX, 0x00),
      (IF, 0x01),
    ];
    for &(offset, value) in values.iter() {
      self.set_reg(offset, value);
    }
    self.memory.wb(IE, 0x00);
  }

  pub fn load_boot_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
    let image = read_image(path.as_ref())?;
    let size = image.len();
    self.load_boot_rom_bytes(image);
    info!("Loaded {} byte boot ROM", size);
    Ok(size)
  }

  pub fn load_boot_rom_bytes(&mut self, image: Vec<u8>) {
    self.boot_rom = image;
    self.boot_mapped = true;
  }

  pub fn boot_rom_disabled(&self) -> bool {
    !self.boot_mapped
  }

  pub fn load_game_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
    let image = read_image(path.as_ref())?;
    let size = image.len();
    self.load_game_rom_bytes(image)?;
    info!("Loaded {} byte game ROM from {}", size, path.as_ref().display());
    Ok(size)
  }

  pub fn load_game_rom_bytes(&mut self, image: Vec<u8>) -> Result<()> {
    match mbc::detect(image)? {
      Cartridge::Flat(rom) => self.memory.load_rom_bytes(&rom, 0),
      Cartridge::Banked(cartridge) => {
        self.cartridge = Some(cartridge);
        Ok(())
      }
    }
  }

  pub fn on_write(&mut self, hook: WriteHook) {
    self.write_hook = Some(hook);
  }

  /// Raw register read at `BASE + offset`.
  pub fn reg(&self, offset: u16) -> u8 {
    self.memory.peek(BASE + offset)
  }

  /// Raw register write, bypassing the CPU-side rules.
  pub fn set_reg(&mut self, offset: u16, value: u8) {
    self.memory.wb(BASE + offset, value)
  }

  pub fn request_interrupt(&mut self, source: Interrupt) {
    let flags = self.reg(IF) | source.bit();
    self.set_reg(IF, flags);
  }

  /// Requested and enabled sources.
  pub fn pending_interrupts(&self) -> u8 {
    self.reg(IF) & self.memory.peek(IE) & 0x1f
  }

  pub fn acknowledge(&mut self, source: Interrupt) {
    let flags = self.reg(IF) & !source.bit();
    self.set_reg(IF, flags);
  }

  /// Advance the timer; called by the board after every instruction.
  pub fn step_timer(&mut self, cycles: u32) {
    if self.timer.step(cycles) {
      self.request_interrupt(Interrupt::Timer);
    }
  }

  pub fn key_down(&mut self, key: Key) {
    if self.keys.key_down(key) {
      self.request_interrupt(Interrupt::Joypad);
    }
  }

  pub fn key_up(&mut self, key: Key) {
    self.keys.key_up(key);
  }

  fn read(&self, addr: u16) -> u8 {
    if self.boot_mapped && (addr as usize) < self.boot_rom.len().min(0x100) {
      return self.boot_rom[addr as usize];
    }
    match addr {
      0x0000..=0x7fff | 0xa000..=0xbfff if self.cartridge.is_some() => {
        self.cartridge.as_ref().map_or(0xff, |cart| cart.rb(addr))
      }
      0xe000..=0xfdff => self.memory.peek(addr - 0x2000),
      0xff00 => self.keys.rb(),
      0xff04..=0xff07 => self.timer.rb(addr),
      0xff0f => self.reg(IF) | 0xe0,
      0xff41 => self.reg(STAT) | 0x80,
      _ => self.memory.peek(addr),
    }
  }

  fn serial_transfer(&mut self) {
    let byte = self.reg(SB);
    self.serial_output.push(byte);
    self.set_reg(SB, 0xff);
    let sc = self.reg(SC) & 0x7f;
    self.set_reg(SC, sc);
    self.request_interrupt(Interrupt::Serial);
  }

  fn dma(&mut self, source: u8) {
    let start = u16::from(source) << 8;
    for i in 0..OAM_SIZE {
      let value = self.read(start + i);
      self.memory.wb(OAM + i, value);
    }
  }
}

impl Bus for Io {
  fn rb(&mut self, addr: u16) -> u8 {
    self.read(addr)
  }

  fn wb(&mut self, addr: u16, value: u8) {
    if let Some(hook) = self.write_hook.as_mut() {
      hook(addr, value);
    }
    match addr {
      0x0000..=0x7fff | 0xa000..=0xbfff if self.cartridge.is_some() => {
        if let Some(cart) = self.cartridge.as_mut() {
          cart.wb(addr, value);
        }
      }
      0xe000..=0xfdff => self.memory.wb(addr - 0x2000, value),
      0xff00 => self.keys.wb(value),
      0xff02 => {
        self.set_reg(SC, value);
        if value == 0x81 {
          self.serial_transfer();
        }
      }
      0xff04..=0xff07 => {
        if self.timer.wb(addr, value) {
          self.request_interrupt(Interrupt::Timer);
        }
      }
      0xff41 => {
        let stat = (self.reg(STAT) & 0x07) | (value & 0x78);
        self.set_reg(STAT, stat);
      }
      0xff44 => (),
      0xff46 => {
        self.set_reg(DMA, value);
        self.dma(value);
      }
      0xff50 => {
        if value != 0 && self.boot_mapped {
          info!("Boot ROM disabled");
          self.boot_mapped = false;
        }
        self.set_reg(BOOT, value);
      }
      _ => self.memory.wb(addr, value),
    }
  }

  fn peek(&self, addr: u16) -> u8 {
    self.read(addr)
  }
}
