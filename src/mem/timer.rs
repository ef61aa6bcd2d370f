/// Divider bit whose falling edge clocks TIMA, by TAC input select.
const TAP: [u16; 4] = [9, 3, 5, 7];

#[derive(Debug)]
pub struct Timer {
  /// Internal divider counter. DIV is its upper byte.
  counter: u16,
  pub tima: u8,
  pub tma: u8,
  pub tac: u8,
}

impl Timer {
  pub fn new() -> Timer {
    Timer {
      counter: 0,
      tima: 0,
      tma: 0,
      tac: 0,
    }
  }

  pub fn div(&self) -> u8 {
    (self.counter >> 8) as u8
  }

  pub fn rb(&self, addr: u16) -> u8 {
    match addr {
      0xff04 => self.div(),
      0xff05 => self.tima,
      0xff06 => self.tma,
      0xff07 => self.tac | 0xf8,
      _ => 0xff,
    }
  }

  /// Returns true if the write clocked TIMA past 0xff.
  pub fn wb(&mut self, addr: u16, value: u8) -> bool {
    let before = self.signal();
    match addr {
      0xff04 => self.counter = 0,
      0xff05 => self.tima = value,
      0xff06 => self.tma = value,
      0xff07 => self.tac = value & 0x07,
      _ => (),
    }
    // Resetting DIV or switching the tap can drop the signal too.
    before && !self.signal() && self.tick()
  }

  /// Advances the divider by `cycles` T-states.
  /// Returns true if an interrupt was triggered.
  pub fn step(&mut self, cycles: u32) -> bool {
    let mut overflow = false;
    for _ in 0..cycles / 4 {
      let before = self.signal();
      self.counter = self.counter.wrapping_add(4);
      if before && !self.signal() {
        overflow |= self.tick();
      }
    }
    overflow
  }

  fn signal(&self) -> bool {
    self.tac & 0x04 != 0 && self.counter & (1 << TAP[usize::from(self.tac & 0x03)]) != 0
  }

  fn tick(&mut self) -> bool {
    if self.tima == 0xff {
      self.tima = self.tma;
      true
    } else {
      self.tima += 1;
      false
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn div_counts_every_256_cycles() {
    let mut timer = Timer::new();
    timer.step(252);
    assert_eq!(timer.rb(0xff04), 0);
    timer.step(4);
    assert_eq!(timer.rb(0xff04), 1);
    timer.wb(0xff04, 0x55);
    assert_eq!(timer.rb(0xff04), 0);
  }

  #[test]
  fn tima_follows_selected_rate() {
    let mut timer = Timer::new();
    timer.wb(0xff07, 0x05);
    assert!(!timer.step(16));
    assert_eq!(timer.tima, 1);
    timer.step(16 * 9);
    assert_eq!(timer.tima, 10);

    timer.wb(0xff07, 0x04);
    timer.step(1024 - (timer.counter & 0x3ff) as u32);
    assert_eq!(timer.tima, 11);
  }

  #[test]
  fn stopped_timer_holds() {
    let mut timer = Timer::new();
    timer.wb(0xff07, 0x01);
    timer.step(4096);
    assert_eq!(timer.tima, 0);
    assert_eq!(timer.rb(0xff07), 0xf9);
  }

  #[test]
  fn overflow_reloads_from_modulo() {
    let mut timer = Timer::new();
    timer.wb(0xff06, 0xf0);
    timer.wb(0xff05, 0xff);
    timer.wb(0xff07, 0x05);
    assert!(timer.step(16));
    assert_eq!(timer.tima, 0xf0);
  }
}
