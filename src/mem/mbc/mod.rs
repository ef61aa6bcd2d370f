mod mbc1;

pub use self::mbc1::MBC1;

use crate::error::{Error, Result};

/// Header byte naming the cartridge hardware.
pub const CARTRIDGE_TYPE: usize = 0x147;
/// Header byte naming the external RAM size.
pub const RAM_SIZE: usize = 0x149;

/// Largest image that maps flat onto 0000-7FFF.
pub const FLAT_LIMIT: usize = 0x8000;

/// Bank controller sitting on the cartridge. It sees 0000-7FFF and A000-BFFF.
pub trait MBC {
  fn rb(&self, addr: u16) -> u8;
  fn wb(&mut self, addr: u16, value: u8);
}

/// How a cartridge image appears on the bus.
pub enum Cartridge {
  /// Mapped straight onto 0000-7FFF.
  Flat(Vec<u8>),
  Banked(Box<dyn MBC>),
}

/// Pick a controller for `rom` from its header.
pub fn detect(rom: Vec<u8>) -> Result<Cartridge> {
  let kind = rom.get(CARTRIDGE_TYPE).cloned().unwrap_or(0);
  match kind {
    0x00 if rom.len() <= FLAT_LIMIT => Ok(Cartridge::Flat(rom)),
    0x01..=0x03 => {
      let ram = vec![0; ram_size(rom.get(RAM_SIZE).cloned().unwrap_or(0))];
      info!(
        "MBC1 cartridge: {} KiB ROM, {} KiB RAM",
        rom.len() / 1024,
        ram.len() / 1024
      );
      Ok(Cartridge::Banked(Box::new(MBC1::new(rom, ram))))
    }
    kind => Err(Error::UnsupportedCartridge(kind)),
  }
}

fn ram_size(code: u8) -> usize {
  match code {
    0x01 => 0x800,
    0x02 => 0x2000,
    0x03 => 0x8000,
    0x04 => 0x20000,
    0x05 => 0x10000,
    _ => 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn image(kind: u8, size: usize) -> Vec<u8> {
    let mut rom = vec![0; size];
    rom[CARTRIDGE_TYPE] = kind;
    rom
  }

  #[test]
  fn small_rom_only_is_flat() {
    for rom in vec![image(0x00, 0x8000), vec![0; 0x100]] {
      match detect(rom) {
        Ok(Cartridge::Flat(_)) => (),
        _ => panic!("expected a flat mapping"),
      }
    }
  }

  #[test]
  fn mbc1_is_banked() {
    let mut rom = image(0x01, 0x10000);
    rom[0x4000 * 3] = 0x33;
    let mut mbc = match detect(rom) {
      Ok(Cartridge::Banked(mbc)) => mbc,
      _ => panic!("expected MBC1"),
    };
    mbc.wb(0x2000, 3);
    assert_eq!(mbc.rb(0x4000), 0x33);
  }

  #[test]
  fn other_hardware_is_refused() {
    match detect(image(0x13, 0x8000)) {
      Err(Error::UnsupportedCartridge(0x13)) => (),
      _ => panic!("MBC3 should be refused"),
    }
    match detect(image(0x00, 0x10000)) {
      Err(Error::UnsupportedCartridge(0x00)) => (),
      _ => panic!("oversized ROM-only image should be refused"),
    }
  }
}
