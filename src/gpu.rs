use crate::mem::io::{BASE, BGP, LCDC, OAM, OBP0, OBP1, SCX, SCY, WX, WY};
use crate::mem::Bus;

pub const HEIGHT: usize = 144;
pub const WIDTH: usize = 160;

/// Shades 0 (lightest) to 3 as 0RGB.
pub const PALETTE: [u32; 4] = [0x00e0_f8d0, 0x0088_c070, 0x0034_6856, 0x0008_1820];

const SPRITES: u16 = 40;
const SPRITES_PER_LINE: usize = 10;

/// Renders whole scanlines from VRAM, OAM and the LCD registers.
pub struct GPU {
  /// One shade (0..3) per pixel.
  frame: Vec<u8>,
  /// Window row to draw next. Only advances on lines that show the window.
  window_line: u8,
}

struct Sprite {
  y: i16,
  x: i16,
  tile: u8,
  flags: u8,
}

impl GPU {
  pub fn new() -> GPU {
    GPU {
      frame: vec![0; WIDTH * HEIGHT],
      window_line: 0,
    }
  }

  pub fn frame(&self) -> &[u8] {
    &self.frame
  }

  /// The frame as 0RGB, ready for a window buffer.
  pub fn pixels(&self) -> Vec<u32> {
    self.frame.iter().map(|&shade| PALETTE[usize::from(shade)]).collect()
  }

  pub fn start_frame(&mut self) {
    self.window_line = 0;
  }

  pub fn render_line(&mut self, bus: &dyn Bus, line: u8) {
    if usize::from(line) >= HEIGHT {
      return;
    }
    let reg = |offset: u16| bus.peek(BASE + offset);
    let lcdc = reg(LCDC);
    let bgp = reg(BGP);

    // Raw colour numbers, kept for sprite priority.
    let mut colors = [0u8; WIDTH];

    if lcdc & 0x01 != 0 {
      let wy = reg(WY);
      let wx = i16::from(reg(WX)) - 7;
      let window = lcdc & 0x20 != 0 && line >= wy && wx < WIDTH as i16;
      let (scx, scy) = (reg(SCX), reg(SCY));

      for x in 0..WIDTH {
        colors[x] = if window && x as i16 >= wx {
          let map = if lcdc & 0x40 != 0 { 0x9c00 } else { 0x9800 };
          let wx = (x as i16 - wx) as u8;
          tile_pixel(bus, lcdc, map, wx, self.window_line)
        } else {
          let map = if lcdc & 0x08 != 0 { 0x9c00 } else { 0x9800 };
          tile_pixel(bus, lcdc, map, (x as u8).wrapping_add(scx), line.wrapping_add(scy))
        };
      }
      if window {
        self.window_line = self.window_line.wrapping_add(1);
      }
    }

    let row = usize::from(line) * WIDTH;
    for x in 0..WIDTH {
      self.frame[row + x] = shade(bgp, colors[x]);
    }

    if lcdc & 0x02 != 0 {
      self.render_sprites(bus, lcdc, line, &colors);
    }
  }

  fn render_sprites(&mut self, bus: &dyn Bus, lcdc: u8, line: u8, colors: &[u8; WIDTH]) {
    let height = if lcdc & 0x04 != 0 { 16 } else { 8 };
    let line = i16::from(line);

    let mut visible: Vec<Sprite> = (0..SPRITES)
      .map(|i| {
        let base = OAM + i * 4;
        Sprite {
          y: i16::from(bus.peek(base)) - 16,
          x: i16::from(bus.peek(base + 1)) - 8,
          tile: bus.peek(base + 2),
          flags: bus.peek(base + 3),
        }
      })
      .filter(|sprite| line >= sprite.y && line < sprite.y + height)
      .take(SPRITES_PER_LINE)
      .collect();
    // Lower X wins, then lower OAM index. Draw the winners last.
    visible.sort_by_key(|sprite| sprite.x);

    let row = usize::from(line as u8) * WIDTH;
    for sprite in visible.iter().rev() {
      let mut y = line - sprite.y;
      if sprite.flags & 0x40 != 0 {
        y = height - 1 - y;
      }
      let tile = if height == 16 {
        sprite.tile & 0xfe
      } else {
        sprite.tile
      };
      let address = 0x8000 + u16::from(tile) * 16 + (y as u16) * 2;
      let (low, high) = (bus.peek(address), bus.peek(address + 1));
      let palette = bus.peek(BASE + if sprite.flags & 0x10 != 0 { OBP1 } else { OBP0 });

      for px in 0..8 {
        let x = sprite.x + px;
        if x < 0 || x >= WIDTH as i16 {
          continue;
        }
        let bit = if sprite.flags & 0x20 != 0 { px } else { 7 - px };
        let color = pixel(low, high, bit as u8);
        if color == 0 {
          continue;
        }
        if sprite.flags & 0x80 != 0 && colors[x as usize] != 0 {
          continue;
        }
        self.frame[row + x as usize] = shade(palette, color);
      }
    }
  }
}

/// Colour number at (x, y) of a 256x256 tile map.
fn tile_pixel(bus: &dyn Bus, lcdc: u8, map: u16, x: u8, y: u8) -> u8 {
  let index = bus.peek(map + u16::from(y / 8) * 32 + u16::from(x / 8));
  let tile = if lcdc & 0x10 != 0 {
    0x8000 + u16::from(index) * 16
  } else {
    (0x9000 + i32::from(index as i8) * 16) as u16
  };
  let address = tile + u16::from(y % 8) * 2;
  pixel(bus.peek(address), bus.peek(address + 1), 7 - x % 8)
}

fn pixel(low: u8, high: u8, bit: u8) -> u8 {
  (((high >> bit) & 1) << 1) | ((low >> bit) & 1)
}

fn shade(palette: u8, color: u8) -> u8 {
  (palette >> (color * 2)) & 0x03
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mem::io::Io;

  fn init() -> Io {
    let mut io = Io::new();
    io.set_reg(BGP, 0xe4);
    io.set_reg(OBP0, 0xe4);
    // Tile 1: top row is colour 1.
    io.wb(0x8010, 0xff);
    // Tile 2: leftmost pixel of the top row is colour 3.
    io.wb(0x8020, 0x80);
    io.wb(0x8021, 0x80);
    io.wb(0x9800, 1);
    io
  }

  #[test]
  fn background_tiles() {
    let io = init();
    let mut gpu = GPU::new();
    gpu.render_line(&io, 0);
    assert_eq!(&gpu.frame()[0..9], &[1, 1, 1, 1, 1, 1, 1, 1, 0]);
    gpu.render_line(&io, 1);
    assert_eq!(gpu.frame()[WIDTH], 0);
  }

  #[test]
  fn scrolling_and_palette() {
    let mut io = init();
    io.set_reg(SCX, 4);
    io.set_reg(BGP, 0x0c);
    let mut gpu = GPU::new();
    gpu.render_line(&io, 0);
    assert_eq!(&gpu.frame()[0..5], &[3, 3, 3, 3, 0]);
    assert_eq!(gpu.pixels()[0], PALETTE[3]);
  }

  #[test]
  fn signed_tile_data() {
    let mut io = init();
    io.set_reg(LCDC, 0x81);
    io.wb(0x9010, 0xff);
    let mut gpu = GPU::new();
    gpu.render_line(&io, 0);
    assert_eq!(gpu.frame()[0], 1);
  }

  #[test]
  fn window_covers_background() {
    let mut io = init();
    io.set_reg(LCDC, 0x91 | 0x20 | 0x40);
    io.set_reg(WY, 0);
    io.set_reg(WX, 7 + 80);
    io.wb(0x9c00, 1);
    let mut gpu = GPU::new();
    gpu.render_line(&io, 0);
    assert_eq!(gpu.frame()[79], 0);
    assert_eq!(&gpu.frame()[80..88], &[1; 8]);
    assert_eq!(gpu.frame()[88], 0);
  }

  #[test]
  fn sprites_draw_over_background() {
    let mut io = init();
    io.set_reg(LCDC, 0x93);
    io.wb(OAM, 16);
    io.wb(OAM + 1, 8 + 10);
    io.wb(OAM + 2, 2);
    let mut gpu = GPU::new();
    gpu.render_line(&io, 0);
    assert_eq!(gpu.frame()[10], 3);
    // Transparent pixels leave the background alone.
    assert_eq!(gpu.frame()[11], 0);
    assert_eq!(gpu.frame()[2], 1);

    // Behind-background sprites only show on colour 0.
    io.wb(OAM + 1, 8 + 2);
    io.wb(OAM + 3, 0x80);
    gpu.render_line(&io, 0);
    assert_eq!(gpu.frame()[2], 1);
  }

  #[test]
  fn disabled_background_is_blank() {
    let mut io = init();
    io.set_reg(LCDC, 0x80);
    let mut gpu = GPU::new();
    gpu.render_line(&io, 0);
    assert!(gpu.frame()[0..WIDTH].iter().all(|&shade| shade == 0));
  }
}
