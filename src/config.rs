use std::path::{Path, PathBuf};

/// Settings the host front end runs with.
#[derive(Debug, Clone)]
pub struct Config {
  pub rom_directory: PathBuf,
  /// Trace every instruction through the disassembler.
  pub debug_mode: bool,
  /// Count opcodes and addresses, reported on exit.
  pub profile_mode: bool,
  /// Stop after this many frames. Runs until the window closes otherwise.
  pub frames: Option<u64>,
  pub draw_graphics: bool,
}

impl Default for Config {
  fn default() -> Config {
    Config {
      rom_directory: PathBuf::from("roms"),
      debug_mode: false,
      profile_mode: false,
      frames: None,
      draw_graphics: false,
    }
  }
}

impl Config {
  /// `name` as given if it exists, otherwise looked up in the ROM directory.
  pub fn resolve<P: AsRef<Path>>(&self, name: P) -> PathBuf {
    let name = name.as_ref();
    if name.exists() {
      name.to_path_buf()
    } else {
      self.rom_directory.join(name)
    }
  }
}
