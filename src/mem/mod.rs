use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

pub mod io;
pub mod key;
pub mod mbc;
pub mod ports;
pub mod timer;

pub use self::key::Key;
pub use self::ports::Ports;

/// Everything the CPU touches goes through a bus: memory reads and writes
/// plus the separate port space used by `IN`/`OUT`.
pub trait Bus {
  /// Read a byte at address `addr`. Implementations may have side effects.
  fn rb(&mut self, addr: u16) -> u8;

  /// Write `value` at address `addr`.
  fn wb(&mut self, addr: u16, value: u8);

  /// Read a byte without side effects, for tracing and disassembly.
  fn peek(&self, addr: u16) -> u8;

  /// Read a 2-byte little-endian word from `addr`.
  fn rw(&mut self, addr: u16) -> u16 {
    let low = u16::from(self.rb(addr));
    let high = u16::from(self.rb(addr.wrapping_add(1)));
    (high << 8) | low
  }

  /// Write a 2-byte little-endian word to `addr`.
  fn ww(&mut self, addr: u16, value: u16) {
    self.wb(addr, value as u8);
    self.wb(addr.wrapping_add(1), (value >> 8) as u8);
  }

  fn peek_word(&self, addr: u16) -> u16 {
    let low = u16::from(self.peek(addr));
    let high = u16::from(self.peek(addr.wrapping_add(1)));
    (high << 8) | low
  }

  fn port_in(&mut self, _port: u8) -> u8 {
    0xff
  }

  fn port_out(&mut self, _port: u8, _value: u8) {}
}

/// Flat byte-addressable memory with per-byte write protection.
///
/// Addresses are masked with `mask`, so a space smaller than 64K mirrors
/// itself across the whole 16-bit range.
pub struct Memory {
  bytes: Vec<u8>,
  locked: Vec<bool>,
  mask: u16,
}

impl Memory {
  pub fn new(mask: u16) -> Memory {
    let size = usize::from(mask) + 1;
    Memory {
      bytes: vec![0; size],
      locked: vec![false; size],
      mask: mask,
    }
  }

  pub fn size(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_locked(&self, addr: u16) -> bool {
    self.locked[usize::from(addr & self.mask)]
  }

  /// Zero every byte and lift all write protection.
  pub fn clear(&mut self) {
    for byte in self.bytes.iter_mut() {
      *byte = 0;
    }
    for lock in self.locked.iter_mut() {
      *lock = false;
    }
  }

  /// Load a file at `offset` and write-protect the range it occupies.
  pub fn load_rom<P: AsRef<Path>>(&mut self, path: P, offset: u16) -> Result<usize> {
    let image = read_image(path.as_ref())?;
    self.load_rom_bytes(&image, offset)?;
    Ok(image.len())
  }

  /// Load a file at `offset` without protecting it.
  pub fn load_ram<P: AsRef<Path>>(&mut self, path: P, offset: u16) -> Result<usize> {
    let image = read_image(path.as_ref())?;
    self.load_ram_bytes(&image, offset)?;
    Ok(image.len())
  }

  pub fn load_rom_bytes(&mut self, image: &[u8], offset: u16) -> Result<()> {
    self.place(image, offset, true)
  }

  pub fn load_ram_bytes(&mut self, image: &[u8], offset: u16) -> Result<()> {
    self.place(image, offset, false)
  }

  fn place(&mut self, image: &[u8], offset: u16, lock: bool) -> Result<()> {
    let start = usize::from(offset & self.mask);
    if start + image.len() > self.bytes.len() {
      return Err(Error::ImageTooLarge {
        offset: offset,
        size: image.len(),
        limit: self.bytes.len(),
      });
    }
    let end = start + image.len();
    self.bytes[start..end].copy_from_slice(image);
    for lock_bit in self.locked[start..end].iter_mut() {
      *lock_bit = lock;
    }
    Ok(())
  }
}

impl Bus for Memory {
  fn rb(&mut self, addr: u16) -> u8 {
    self.bytes[usize::from(addr & self.mask)]
  }

  fn wb(&mut self, addr: u16, value: u8) {
    let index = usize::from(addr & self.mask);
    if self.locked[index] {
      trace!("dropped write of {:#04x} to locked {:#06x}", value, addr);
      return;
    }
    self.bytes[index] = value;
  }

  fn peek(&self, addr: u16) -> u8 {
    self.bytes[usize::from(addr & self.mask)]
  }
}

pub(crate) fn read_image(path: &Path) -> Result<Vec<u8>> {
  fs::read(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source: source,
  })
}

/// Memory plus a port space: the whole world of a bare Z80 machine.
pub struct System {
  pub memory: Memory,
  pub ports: Ports,
}

impl System {
  pub fn new() -> System {
    System {
      memory: Memory::new(0xffff),
      ports: Ports::new(),
    }
  }
}

impl Bus for System {
  fn rb(&mut self, addr: u16) -> u8 {
    self.memory.rb(addr)
  }

  fn wb(&mut self, addr: u16, value: u8) {
    self.memory.wb(addr, value)
  }

  fn peek(&self, addr: u16) -> u8 {
    self.memory.peek(addr)
  }

  fn port_in(&mut self, port: u8) -> u8 {
    self.ports.read(port)
  }

  fn port_out(&mut self, port: u8, value: u8) {
    self.ports.write(port, value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn locked_writes_are_dropped() {
    let mut mem = Memory::new(0xffff);
    mem.load_rom_bytes(&[0x3e, 0x42], 0x100).unwrap();
    mem.wb(0x100, 0x00);
    mem.wb(0x102, 0x99);
    assert_eq!(mem.rb(0x100), 0x3e);
    assert_eq!(mem.rb(0x101), 0x42);
    assert_eq!(mem.rb(0x102), 0x99);
  }

  #[test]
  fn ram_images_stay_writable() {
    let mut mem = Memory::new(0xffff);
    mem.load_ram_bytes(&[1, 2, 3], 0x8000).unwrap();
    mem.wb(0x8001, 0x20);
    assert_eq!(mem.rb(0x8001), 0x20);
  }

  #[test]
  fn clear_unlocks() {
    let mut mem = Memory::new(0xffff);
    mem.load_rom_bytes(&[0xff; 4], 0).unwrap();
    mem.clear();
    assert!(!mem.is_locked(0));
    assert_eq!(mem.rb(0), 0);
    mem.wb(0, 7);
    assert_eq!(mem.rb(0), 7);
  }

  #[test]
  fn words_are_little_endian() {
    let mut mem = Memory::new(0xffff);
    mem.ww(0xc000, 0xbeef);
    assert_eq!(mem.rb(0xc000), 0xef);
    assert_eq!(mem.rb(0xc001), 0xbe);
    assert_eq!(mem.rw(0xc000), 0xbeef);
    assert_eq!(mem.peek_word(0xc000), 0xbeef);
  }

  #[test]
  fn addresses_are_masked() {
    let mut mem = Memory::new(0x3fff);
    assert_eq!(mem.size(), 0x4000);
    mem.wb(0x4010, 0x55);
    assert_eq!(mem.rb(0x0010), 0x55);
    assert_eq!(mem.peek(0xc010), 0x55);
  }

  #[test]
  fn oversized_images_fail() {
    let mut mem = Memory::new(0xffff);
    let image = vec![0; 0x200];
    match mem.load_rom_bytes(&image, 0xff00) {
      Err(Error::ImageTooLarge { size, .. }) => assert_eq!(size, 0x200),
      _ => panic!("expected an overflow error"),
    }
  }

  #[test]
  fn load_rom_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0xc3, 0x00, 0x01]).unwrap();
    let mut mem = Memory::new(0xffff);
    assert_eq!(mem.load_rom(file.path(), 0x10).unwrap(), 3);
    assert!(mem.is_locked(0x12));
    assert!(!mem.is_locked(0x13));
    assert_eq!(mem.rb(0x10), 0xc3);
  }

  #[test]
  fn missing_file_is_an_io_error() {
    let mut mem = Memory::new(0xffff);
    match mem.load_ram("/nonexistent/rom.bin", 0) {
      Err(Error::Io { .. }) => (),
      _ => panic!("expected an io error"),
    }
  }
}
