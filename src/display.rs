use anyhow::{anyhow, Result};
use minifb::{Scale, Window, WindowOptions};

use crate::gameboy::GameBoy;
use crate::gpu::{HEIGHT, WIDTH};
use crate::mem::Key;

const KEYS: [minifb::Key; 8] = [
  minifb::Key::Z,
  minifb::Key::X,
  minifb::Key::Enter,
  minifb::Key::Space,
  minifb::Key::Left,
  minifb::Key::Right,
  minifb::Key::Up,
  minifb::Key::Down,
];

pub struct Display {
  window: Window,
}

impl Display {
  pub fn new() -> Result<Display> {
    let options = WindowOptions {
      scale: Scale::X4,
      ..WindowOptions::default()
    };
    let mut window = Window::new("eightbit", WIDTH, HEIGHT, options)
      .map_err(|e| anyhow!("failed to open window: {}", e))?;
    window.limit_update_rate(Some(std::time::Duration::from_micros(16_742)));
    Ok(Display { window: window })
  }

  pub fn is_open(&self) -> bool {
    self.window.is_open() && !self.window.is_key_down(minifb::Key::Escape)
  }

  /// Show the last frame and feed the keyboard into the joypad.
  pub fn redraw(&mut self, gb: &mut GameBoy) -> Result<()> {
    self
      .window
      .update_with_buffer(&gb.frame().pixels(), WIDTH, HEIGHT)
      .map_err(|e| anyhow!("failed to update window: {}", e))?;

    for &code in KEYS.iter() {
      if let Some(key) = Key::from_code(code) {
        if self.window.is_key_down(code) {
          gb.key_down(key);
        } else {
          gb.key_up(key);
        }
      }
    }
    Ok(())
  }
}
