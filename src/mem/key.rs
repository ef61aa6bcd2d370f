#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Key {
  A,
  B,
  Start,
  Select,
  Left,
  Up,
  Down,
  Right,
}

impl Key {
  #[cfg(feature = "display")]
  pub fn from_code(code: minifb::Key) -> Option<Key> {
    match code {
      minifb::Key::Z => Some(Key::A),
      minifb::Key::X => Some(Key::B),
      minifb::Key::Enter => Some(Key::Start),
      minifb::Key::Space => Some(Key::Select),
      minifb::Key::Left => Some(Key::Left),
      minifb::Key::Right => Some(Key::Right),
      minifb::Key::Up => Some(Key::Up),
      minifb::Key::Down => Some(Key::Down),
      _ => None,
    }
  }

  /// Row bit and whether the key sits in the direction row.
  fn line(self) -> (u8, bool) {
    match self {
      Key::Right => (0x1, true),
      Key::Left => (0x2, true),
      Key::Up => (0x4, true),
      Key::Down => (0x8, true),
      Key::A => (0x1, false),
      Key::B => (0x2, false),
      Key::Select => (0x4, false),
      Key::Start => (0x8, false),
    }
  }
}

/// The P1 key matrix. All lines are active low.
#[derive(Debug)]
pub struct KeyData {
  /// (buttons, directions)
  rows: (u8, u8),
  /// P14/P15 as last written.
  select: u8,
}

impl KeyData {
  pub fn new() -> KeyData {
    KeyData {
      rows: (0x0f, 0x0f),
      select: 0x30,
    }
  }

  pub fn rb(&self) -> u8 {
    let mut lines = 0x0f;
    if self.select & 0x10 == 0 {
      lines &= self.rows.1;
    }
    if self.select & 0x20 == 0 {
      lines &= self.rows.0;
    }
    0xc0 | self.select | lines
  }

  pub fn wb(&mut self, value: u8) {
    self.select = value & 0x30;
  }

  /// Returns true on a fresh press, which requests the joypad interrupt.
  pub fn key_down(&mut self, key: Key) -> bool {
    let (bit, direction) = key.line();
    let row = if direction {
      &mut self.rows.1
    } else {
      &mut self.rows.0
    };
    let fresh = *row & bit != 0;
    *row &= !bit;
    if fresh {
      debug!("Pressed {:?}. Key = {:?}", key, &self);
    }
    fresh
  }

  pub fn key_up(&mut self, key: Key) {
    let (bit, direction) = key.line();
    let row = if direction {
      &mut self.rows.1
    } else {
      &mut self.rows.0
    };
    if *row & bit == 0 {
      *row |= bit;
      debug!("Released {:?}. Key = {:?}", key, &self);
    }
  }
}
