use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cpu::Prefix;

#[derive(Debug, Error)]
pub enum Error {
  /// No handler is bound to this opcode for the running variant.
  #[error("unhandled opcode {opcode:#04x} ({prefix}) at {pc:#06x}")]
  UnhandledOpcode { prefix: Prefix, opcode: u8, pc: u16 },

  #[error("unable to read {}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("image of {size} bytes at {offset:#06x} overflows a {limit} byte space")]
  ImageTooLarge { offset: u16, size: usize, limit: usize },

  #[error("unsupported cartridge type {0:#04x}")]
  UnsupportedCartridge(u8),
}

pub type Result<T> = std::result::Result<T, Error>;
