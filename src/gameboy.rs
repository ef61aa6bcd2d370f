use std::path::Path;

use crate::cpu::{Cpu, Registers, Trace, Variant};
use crate::error::Result;
use crate::gpu::GPU;
use crate::mem::io::{Interrupt, Io, LCDC, LY, LYC, STAT};
use crate::mem::Key;

pub const CYCLES_PER_LINE: u32 = 456;
pub const VISIBLE_LINES: u8 = 144;
pub const TOTAL_LINES: u8 = 154;

/// Mode 2 and mode 3 lengths; HBlank takes the rest of the line.
const OAM_CYCLES: u32 = 80;
const TRANSFER_CYCLES: u32 = 172;

const MODE_HBLANK: u8 = 0;
const MODE_VBLANK: u8 = 1;
const MODE_OAM: u8 = 2;
const MODE_TRANSFER: u8 = 3;

pub struct GameBoy {
  pub cpu: Cpu,
  pub io: Io,
  gpu: GPU,
  tracers: Vec<Box<dyn Trace>>,

  /// Cycles into the current raster line.
  line_cycles: u32,
  /// Cycles left in the current run budget. Overshoot carries into the next.
  allowed: i64,
  frames: u64,
}

impl GameBoy {
  pub fn new() -> GameBoy {
    GameBoy {
      cpu: Cpu::new(Variant::Lr35902),
      io: Io::new(),
      gpu: GPU::new(),
      tracers: Vec::new(),
      line_cycles: 0,
      allowed: 0,
      frames: 0,
    }
  }

  pub fn load_boot_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
    self.io.load_boot_rom(path)
  }

  pub fn load_game_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
    self.io.load_game_rom(path)
  }

  /// Start as if the boot ROM had just handed over to the cartridge.
  pub fn skip_boot(&mut self) {
    self.cpu.regs = Registers::post_boot();
    self.io.power_on();
    self.compare_line();
  }

  pub fn attach(&mut self, tracer: Box<dyn Trace>) {
    self.tracers.push(tracer);
  }

  pub fn frame(&self) -> &GPU {
    &self.gpu
  }

  /// Frames completed, counted at the start of each vertical blank.
  pub fn frames(&self) -> u64 {
    self.frames
  }

  pub fn serial_output(&self) -> &[u8] {
    &self.io.serial_output
  }

  pub fn key_down(&mut self, key: Key) {
    self.io.key_down(key);
  }

  pub fn key_up(&mut self, key: Key) {
    self.io.key_up(key);
  }

  /// Run the 144 visible lines' worth of cycles.
  pub fn run_raster_lines(&mut self) -> Result<u32> {
    self.run_to_limit(CYCLES_PER_LINE * u32::from(VISIBLE_LINES))
  }

  /// Run the 10 vertical blank lines' worth of cycles.
  pub fn run_vertical_blank_lines(&mut self) -> Result<u32> {
    self.run_to_limit(CYCLES_PER_LINE * u32::from(TOTAL_LINES - VISIBLE_LINES))
  }

  pub fn run_frame(&mut self) -> Result<u32> {
    Ok(self.run_raster_lines()? + self.run_vertical_blank_lines()?)
  }

  /// Step until `limit` more cycles have elapsed. Returns the cycles
  /// actually run, which may overshoot by part of an instruction.
  pub fn run_to_limit(&mut self, limit: u32) -> Result<u32> {
    self.allowed += i64::from(limit);
    let mut spent = 0;
    while self.allowed > 0 {
      let cycles = self.step()?;
      self.allowed -= i64::from(cycles);
      spent += cycles;
    }
    Ok(spent)
  }

  /// Service a pending interrupt if any, then run one instruction and
  /// advance the devices by the cycles it took.
  pub fn step(&mut self) -> Result<u32> {
    let mut cycles = self.service_interrupts()?;

    for tracer in self.tracers.iter_mut() {
      tracer.executing(&self.cpu, &self.io);
    }
    let taken = self.cpu.step(&mut self.io)?;
    for tracer in self.tracers.iter_mut() {
      tracer.executed(&self.cpu, taken);
    }
    cycles += taken;

    self.io.step_timer(cycles);
    self.advance_lcd(cycles);

    // A pending request ends HALT even with IME clear.
    if self.cpu.is_halted() && self.io.pending_interrupts() != 0 {
      self.cpu.wake();
    }
    Ok(cycles)
  }

  /// Request `source` and service whatever is due. Returns the cycles spent
  /// entering a handler, or zero if none was taken.
  pub fn generate_interrupt(&mut self, source: Interrupt) -> Result<u32> {
    self.io.request_interrupt(source);
    self.service_interrupts()
  }

  fn service_interrupts(&mut self) -> Result<u32> {
    let pending = self.io.pending_interrupts();
    if pending == 0 || !self.cpu.iff1 {
      return Ok(0);
    }
    for &source in Interrupt::ALL.iter() {
      if pending & source.bit() == 0 {
        continue;
      }
      let cycles = self.cpu.interrupt(&mut self.io, true, source.vector())?;
      if cycles > 0 {
        info!("INTERRUPT! {:?} 0b{:05b}", source, pending);
        self.io.acknowledge(source);
      }
      return Ok(cycles);
    }
    Ok(0)
  }

  fn advance_lcd(&mut self, cycles: u32) {
    if self.io.reg(LCDC) & 0x80 == 0 {
      self.line_cycles = 0;
      self.io.set_reg(LY, 0);
      let stat = self.io.reg(STAT) & !0x03;
      self.io.set_reg(STAT, stat);
      self.compare_line();
      return;
    }
    self.line_cycles += cycles;
    while self.line_cycles >= CYCLES_PER_LINE {
      self.line_cycles -= CYCLES_PER_LINE;
      let ly = (self.io.reg(LY) + 1) % TOTAL_LINES;
      self.io.set_reg(LY, ly);
      self.compare_line();
    }
    // Also catches LYC writes made by the last instruction.
    self.compare_line();
    self.update_mode();
  }

  /// Track LY == LYC in STAT bit 2. The interrupt fires when it becomes true.
  fn compare_line(&mut self) {
    let stat = self.io.reg(STAT);
    if self.io.reg(LY) == self.io.reg(LYC) {
      if stat & 0x04 == 0 && stat & 0x40 != 0 {
        self.io.request_interrupt(Interrupt::Stat);
      }
      self.io.set_reg(STAT, stat | 0x04);
    } else {
      self.io.set_reg(STAT, stat & !0x04);
    }
  }

  fn update_mode(&mut self) {
    let ly = self.io.reg(LY);
    let mode = if ly >= VISIBLE_LINES {
      MODE_VBLANK
    } else if self.line_cycles < OAM_CYCLES {
      MODE_OAM
    } else if self.line_cycles < OAM_CYCLES + TRANSFER_CYCLES {
      MODE_TRANSFER
    } else {
      MODE_HBLANK
    };

    let stat = self.io.reg(STAT);
    if stat & 0x03 == mode {
      return;
    }
    self.io.set_reg(STAT, (stat & !0x03) | mode);

    let source = match mode {
      MODE_HBLANK => 0x08,
      MODE_VBLANK => 0x10,
      MODE_OAM => 0x20,
      _ => 0,
    };
    if stat & source != 0 {
      self.io.request_interrupt(Interrupt::Stat);
    }
    match mode {
      MODE_TRANSFER => self.gpu.render_line(&self.io, ly),
      MODE_VBLANK => {
        self.io.request_interrupt(Interrupt::VBlank);
        self.frames += 1;
        self.gpu.start_frame();
      }
      _ => (),
    }
  }

  /// Let every tracer report.
  pub fn finish(&mut self) {
    for tracer in self.tracers.iter_mut() {
      tracer.finish(&self.cpu, &self.io);
    }
  }
}
