#[macro_use]
extern crate log;

use std::io::Write;

use anyhow::{Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use eightbit::config::Config;
use eightbit::cpm::Cpm;
use eightbit::disassembler::Tracer;
use eightbit::gameboy::GameBoy;
use eightbit::profiler::Profiler;

fn main() -> Result<()> {
  env_logger::init();

  let matches = App::new("eightbit")
    .version(env!("CARGO_PKG_VERSION"))
    .about("Z80 and Game Boy emulator")
    .setting(AppSettings::SubcommandRequiredElseHelp)
    .arg(
      Arg::with_name("rom-dir")
        .long("rom-dir")
        .takes_value(true)
        .default_value("roms")
        .global(true)
        .help("Directory searched for ROMs that are not found as given"),
    )
    .subcommand(
      SubCommand::with_name("gb")
        .about("Run a Game Boy cartridge")
        .arg(
          Arg::with_name("boot")
            .long("boot")
            .takes_value(true)
            .help("Boot ROM to run before the cartridge, e.g. DMG_ROM.bin"),
        )
        .arg(
          Arg::with_name("frames")
            .long("frames")
            .takes_value(true)
            .help("Stop after this many frames"),
        )
        .arg(Arg::with_name("debug").long("debug").help("Trace every instruction"))
        .arg(Arg::with_name("profile").long("profile").help("Report instruction counts on exit"))
        .arg(Arg::with_name("display").long("display").help("Open a window"))
        .arg(Arg::with_name("ROM").required(true)),
    )
    .subcommand(
      SubCommand::with_name("cpm")
        .about("Run a CP/M-80 program")
        .arg(Arg::with_name("debug").long("debug").help("Trace every instruction"))
        .arg(Arg::with_name("profile").long("profile").help("Report instruction counts on exit"))
        .arg(Arg::with_name("BINARY").required(true)),
    )
    .get_matches();

  match matches.subcommand() {
    ("gb", Some(args)) => run_gameboy(&config(args)?, args),
    ("cpm", Some(args)) => run_cpm(&config(args)?, args),
    _ => unreachable!(),
  }
}

fn config(args: &ArgMatches) -> Result<Config> {
  let frames = match args.value_of("frames") {
    Some(frames) => Some(
      frames
        .parse::<u64>()
        .with_context(|| format!("invalid frame count {}", frames))?,
    ),
    None => None,
  };
  Ok(Config {
    rom_directory: args.value_of("rom-dir").unwrap_or("roms").into(),
    debug_mode: args.is_present("debug"),
    profile_mode: args.is_present("profile"),
    frames: frames,
    draw_graphics: args.is_present("display"),
  })
}

fn run_gameboy(config: &Config, args: &ArgMatches) -> Result<()> {
  let mut gb = GameBoy::new();

  match args.value_of("boot") {
    Some(boot) => {
      let path = config.resolve(boot);
      gb.load_boot_rom(&path)
        .with_context(|| format!("loading boot ROM {}", path.display()))?;
    }
    None => gb.skip_boot(),
  }
  let rom = config.resolve(args.value_of("ROM").unwrap_or_default());
  gb.load_game_rom(&rom)
    .with_context(|| format!("loading cartridge {}", rom.display()))?;

  if config.debug_mode {
    gb.attach(Box::new(Tracer));
  }
  if config.profile_mode {
    gb.attach(Box::new(Profiler::new()));
  }

  let result = run_frames(&mut gb, config);
  gb.finish();
  result
}

#[cfg(feature = "display")]
fn run_frames(gb: &mut GameBoy, config: &Config) -> Result<()> {
  if !config.draw_graphics {
    return run_headless(gb, config);
  }
  let mut display = eightbit::display::Display::new()?;
  let mut printed = 0;
  while display.is_open() && !done(gb, config) {
    gb.run_frame()?;
    display.redraw(gb)?;
    printed = echo_serial(gb, printed)?;
  }
  Ok(())
}

#[cfg(not(feature = "display"))]
fn run_frames(gb: &mut GameBoy, config: &Config) -> Result<()> {
  if config.draw_graphics {
    warn!("built without the display feature; running headless");
  }
  run_headless(gb, config)
}

fn run_headless(gb: &mut GameBoy, config: &Config) -> Result<()> {
  let mut printed = 0;
  while !done(gb, config) {
    gb.run_frame()?;
    printed = echo_serial(gb, printed)?;
  }
  Ok(())
}

fn done(gb: &GameBoy, config: &Config) -> bool {
  config.frames.map_or(false, |limit| gb.frames() >= limit)
}

/// Print serial bytes that arrived since the last call.
fn echo_serial(gb: &GameBoy, printed: usize) -> Result<usize> {
  let output = gb.serial_output();
  if output.len() > printed {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(&output[printed..])?;
    out.flush()?;
  }
  Ok(output.len())
}

fn run_cpm(config: &Config, args: &ArgMatches) -> Result<()> {
  let mut cpm = Cpm::new();
  let path = config.resolve(args.value_of("BINARY").unwrap_or_default());
  cpm.load(&path)
    .with_context(|| format!("loading CP/M program {}", path.display()))?;

  if config.debug_mode {
    cpm.attach(Box::new(Tracer));
  }
  if config.profile_mode {
    cpm.attach(Box::new(Profiler::new()));
  }

  let result = cpm.run();
  cpm.finish();
  let cycles = result?;

  println!("{}", cpm.output());
  info!("{} cycles, BDOS calls {:?}", cycles, cpm.calls());
  Ok(())
}
