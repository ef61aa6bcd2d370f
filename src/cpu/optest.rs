use crate::cpu::{flags, Cpu, Prefix, Variant};
use crate::error::Error;
use crate::mem::{Bus, System};

const START: u16 = 0xc000;

fn init(variant: Variant) -> (Cpu, System) {
  let mut cpu = Cpu::new(variant);
  // Run from RAM with a clean slate.
  cpu.regs.pc = START;
  cpu.regs.sp = 0xfff0;
  cpu.regs.set_f(0);
  (cpu, System::new())
}

/// Place `code` at PC, run one instruction, and check its length and cost.
fn run(cpu: &mut Cpu, sys: &mut System, code: &[u8], len: u16, time_expected: u32) {
  let start = cpu.regs.pc;
  for (i, &byte) in code.iter().enumerate() {
    sys.wb(start.wrapping_add(i as u16), byte);
  }
  let time_actual = cpu.step(sys).unwrap();
  assert_eq!(time_actual, time_expected, "cycles for {:02x?}", code);
  assert_eq!(cpu.regs.pc, start.wrapping_add(len), "pc after {:02x?}", code);
}

#[test]
fn nop() {
  for &variant in &[Variant::Z80, Variant::Lr35902] {
    let (mut cpu, mut sys) = init(variant);
    run(&mut cpu, &mut sys, &[0x00], 1, 4);
  }
}

#[test]
fn ld_r_n() {
  macro_rules! run_test {
    ($reg:ident, $opcode:expr) => {{
      let (mut cpu, mut sys) = init(Variant::Z80);
      let f = cpu.regs.f();
      run(&mut cpu, &mut sys, &[$opcode, 0x42], 2, 7);
      assert_eq!(cpu.regs.f(), f);
      assert_eq!(cpu.regs.$reg(), 0x42);

      let (mut cpu, mut sys) = init(Variant::Lr35902);
      run(&mut cpu, &mut sys, &[$opcode, 0x42], 2, 8);
      assert_eq!(cpu.regs.$reg(), 0x42);
    }};
  }
  run_test!(b, 0x06);
  run_test!(c, 0x0e);
  run_test!(d, 0x16);
  run_test!(e, 0x1e);
  run_test!(h, 0x26);
  run_test!(l, 0x2e);
  run_test!(a, 0x3e);
}

#[test]
fn ld_r1_r2() {
  macro_rules! reg_reg {
    ($r1:ident, $set2:ident, $opcode:expr) => {{
      let (mut cpu, mut sys) = init(Variant::Z80);
      cpu.regs.$set2(0x42);
      run(&mut cpu, &mut sys, &[$opcode], 1, 4);
      assert_eq!(cpu.regs.$r1(), 0x42);
    }};
  }
  reg_reg!(a, set_b, 0x78);
  reg_reg!(a, set_l, 0x7d);
  reg_reg!(b, set_c, 0x41);
  reg_reg!(d, set_e, 0x53);
  reg_reg!(h, set_a, 0x67);
  reg_reg!(l, set_d, 0x6a);
}

#[test]
fn ld_through_hl() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.regs.hl.word = 0xd000;
  cpu.regs.set_b(0x99);
  run(&mut cpu, &mut sys, &[0x70], 1, 7);
  assert_eq!(sys.rb(0xd000), 0x99);
  run(&mut cpu, &mut sys, &[0x7e], 1, 7);
  assert_eq!(cpu.regs.a(), 0x99);
  run(&mut cpu, &mut sys, &[0x36, 0x12], 2, 10);
  assert_eq!(sys.rb(0xd000), 0x12);
  run(&mut cpu, &mut sys, &[0x34], 1, 11);
  assert_eq!(sys.rb(0xd000), 0x13);
}

#[test]
fn pairs_stay_consistent() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  run(&mut cpu, &mut sys, &[0x01, 0x34, 0x12], 3, 10);
  assert_eq!((cpu.regs.b(), cpu.regs.c()), (0x12, 0x34));
  run(&mut cpu, &mut sys, &[0x0e, 0xff], 2, 7);
  assert_eq!(cpu.regs.bc(), 0x12ff);
  run(&mut cpu, &mut sys, &[0x03], 1, 6);
  assert_eq!(cpu.regs.bc(), 0x1300);
  assert_eq!((cpu.regs.b(), cpu.regs.c()), (0x13, 0x00));
}

#[test]
fn add_a_a() {
  let (mut cpu, mut sys) = init(Variant::Lr35902);
  cpu.regs.set_a(0x80);
  run(&mut cpu, &mut sys, &[0x87], 1, 4);
  assert_eq!(cpu.regs.a(), 0);
  assert_eq!(cpu.regs.f(), flags::LR35902.zero | flags::LR35902.carry);
}

#[test]
fn sub_a() {
  for &variant in &[Variant::Z80, Variant::Lr35902] {
    let (mut cpu, mut sys) = init(variant);
    cpu.regs.set_a(0x3c);
    cpu.regs.set_f(0xff);
    run(&mut cpu, &mut sys, &[0x97], 1, 4);
    let flags = cpu.flags();
    assert!(flags.zero && flags.subtract);
    assert!(!flags.carry && !flags.half_carry);
  }
}

#[test]
fn daa_instruction() {
  let (mut cpu, mut sys) = init(Variant::Lr35902);
  cpu.regs.set_a(0x45);
  run(&mut cpu, &mut sys, &[0xc6, 0x38], 2, 8);
  assert_eq!(cpu.regs.a(), 0x7d);
  run(&mut cpu, &mut sys, &[0x27], 1, 4);
  assert_eq!(cpu.regs.a(), 0x83);
  assert!(!cpu.flags().carry);
}

#[test]
fn jr_nz() {
  // (variant, taken cost, not taken cost)
  for &(variant, taken, skipped) in &[(Variant::Z80, 12, 7), (Variant::Lr35902, 12, 8)] {
    let (mut cpu, mut sys) = init(variant);
    run(&mut cpu, &mut sys, &[0x20, 0x05], 2 + 5, taken);

    let (mut cpu, mut sys) = init(variant);
    cpu.regs.pc = START + 0x10;
    run(&mut cpu, &mut sys, &[0x20, 0xfc], 2u16.wrapping_sub(4), taken);
    assert_eq!(cpu.regs.pc, START + 0x0e);

    let (mut cpu, mut sys) = init(variant);
    let zero = variant.flag_bits().zero;
    cpu.regs.set_f(zero);
    run(&mut cpu, &mut sys, &[0x20, 0x05], 2, skipped);
  }
}

#[test]
fn djnz() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.regs.set_b(2);
  run(&mut cpu, &mut sys, &[0x10, 0xfe], 0, 13);
  assert_eq!(cpu.regs.b(), 1);
  run(&mut cpu, &mut sys, &[0x10, 0xfe], 2, 8);
  assert_eq!(cpu.regs.b(), 0);
}

#[test]
fn call_and_return() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  sys.wb(0xd000, 0xc9);
  run(&mut cpu, &mut sys, &[0xcd, 0x00, 0xd0], 0xd000 - START, 17);
  assert_eq!(cpu.regs.sp, 0xffee);
  assert_eq!(sys.rw(0xffee), START + 3);
  assert_eq!(cpu.step(&mut sys).unwrap(), 10);
  assert_eq!(cpu.regs.pc, START + 3);
  assert_eq!(cpu.regs.sp, 0xfff0);

  // Conditional forms cost more when taken.
  let (mut cpu, mut sys) = init(Variant::Lr35902);
  run(&mut cpu, &mut sys, &[0xcc, 0x00, 0xd0], 3, 12);
  run(&mut cpu, &mut sys, &[0xc4, 0x00, 0xd0], 0xd000 - START - 3, 24);
  sys.wb(0xd000, 0xc0);
  assert_eq!(cpu.step(&mut sys).unwrap(), 20);
  assert_eq!(cpu.regs.pc, START + 6);
}

#[test]
fn push_pop_af_masks_gameboy_flags() {
  let (mut cpu, mut sys) = init(Variant::Lr35902);
  cpu.regs.bc.word = 0x12ff;
  run(&mut cpu, &mut sys, &[0xc5], 1, 16);
  run(&mut cpu, &mut sys, &[0xf1], 1, 12);
  assert_eq!(cpu.regs.af(), 0x12f0);

  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.regs.bc.word = 0x12ff;
  run(&mut cpu, &mut sys, &[0xc5], 1, 11);
  run(&mut cpu, &mut sys, &[0xf1], 1, 10);
  assert_eq!(cpu.regs.af(), 0x12ff);
}

#[test]
fn gameboy_high_page() {
  let (mut cpu, mut sys) = init(Variant::Lr35902);
  cpu.regs.set_a(0x5a);
  cpu.regs.set_c(0x80);
  run(&mut cpu, &mut sys, &[0xe2], 1, 8);
  assert_eq!(sys.rb(0xff80), 0x5a);
  run(&mut cpu, &mut sys, &[0xe0, 0x81], 2, 12);
  assert_eq!(sys.rb(0xff81), 0x5a);
  run(&mut cpu, &mut sys, &[0xea, 0x00, 0xd0], 3, 16);
  assert_eq!(sys.rb(0xd000), 0x5a);

  sys.wb(0xff82, 0x11);
  run(&mut cpu, &mut sys, &[0xf0, 0x82], 2, 12);
  assert_eq!(cpu.regs.a(), 0x11);
  sys.wb(0xff80, 0x22);
  run(&mut cpu, &mut sys, &[0xf2], 1, 8);
  assert_eq!(cpu.regs.a(), 0x22);
  sys.wb(0xd001, 0x33);
  run(&mut cpu, &mut sys, &[0xfa, 0x01, 0xd0], 3, 16);
  assert_eq!(cpu.regs.a(), 0x33);
}

#[test]
fn gameboy_stack_arithmetic() {
  let (mut cpu, mut sys) = init(Variant::Lr35902);
  cpu.regs.sp = 0xfff8;
  run(&mut cpu, &mut sys, &[0xf8, 0x02], 2, 12);
  assert_eq!(cpu.regs.hl(), 0xfffa);
  assert_eq!(cpu.regs.f(), 0);
  run(&mut cpu, &mut sys, &[0xe8, 0xfe], 2, 16);
  assert_eq!(cpu.regs.sp, 0xfff6);
  run(&mut cpu, &mut sys, &[0x08, 0x00, 0xd0], 3, 20);
  assert_eq!(sys.rw(0xd000), 0xfff6);
}

#[test]
fn gameboy_ldi_ldd() {
  let (mut cpu, mut sys) = init(Variant::Lr35902);
  cpu.regs.hl.word = 0xd000;
  cpu.regs.set_a(7);
  run(&mut cpu, &mut sys, &[0x22], 1, 8);
  assert_eq!(cpu.regs.hl(), 0xd001);
  run(&mut cpu, &mut sys, &[0x32], 1, 8);
  assert_eq!(cpu.regs.hl(), 0xd000);
  assert_eq!(sys.rb(0xd000), 7);
  assert_eq!(sys.rb(0xd001), 7);
  run(&mut cpu, &mut sys, &[0x2a], 1, 8);
  assert_eq!(cpu.regs.hl(), 0xd001);
}

#[test]
fn gameboy_swap_and_bit() {
  let (mut cpu, mut sys) = init(Variant::Lr35902);
  cpu.regs.set_a(0xa5);
  run(&mut cpu, &mut sys, &[0xcb, 0x37], 2, 8);
  assert_eq!(cpu.regs.a(), 0x5a);
  cpu.regs.hl.word = 0xd000;
  sys.wb(0xd000, 0x80);
  run(&mut cpu, &mut sys, &[0xcb, 0x7e], 2, 12);
  assert!(!cpu.flags().zero);
  run(&mut cpu, &mut sys, &[0xcb, 0x86], 2, 16);
  assert_eq!(sys.rb(0xd000), 0x80);
  run(&mut cpu, &mut sys, &[0xcb, 0xbe], 2, 16);
  assert_eq!(sys.rb(0xd000), 0x00);
}

#[test]
fn unhandled_opcodes_are_fatal() {
  let (mut cpu, mut sys) = init(Variant::Lr35902);
  sys.wb(START, 0xd3);
  match cpu.step(&mut sys) {
    Err(Error::UnhandledOpcode { prefix, opcode, pc }) => {
      assert_eq!((prefix, opcode, pc), (Prefix::None, 0xd3, START));
    }
    other => panic!("expected a decode error, got {:?}", other),
  }

  let (mut cpu, mut sys) = init(Variant::Z80);
  sys.wb(START, 0xed);
  sys.wb(START + 1, 0x00);
  match cpu.step(&mut sys) {
    Err(Error::UnhandledOpcode { prefix, opcode, .. }) => {
      assert_eq!((prefix, opcode), (Prefix::ED, 0x00));
    }
    other => panic!("expected a decode error, got {:?}", other),
  }
}

#[test]
fn exchanges() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.regs.af.word = 0x1111;
  cpu.regs.hl.word = 0x2222;
  cpu.regs.de.word = 0x3333;
  run(&mut cpu, &mut sys, &[0x08], 1, 4);
  run(&mut cpu, &mut sys, &[0xd9], 1, 4);
  assert_eq!(cpu.regs.af_alt.word, 0x1111);
  assert_eq!(cpu.regs.hl_alt.word, 0x2222);
  run(&mut cpu, &mut sys, &[0xd9], 1, 4);
  run(&mut cpu, &mut sys, &[0xeb], 1, 4);
  assert_eq!((cpu.regs.de(), cpu.regs.hl()), (0x2222, 0x3333));
}

#[test]
fn index_registers() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  run(&mut cpu, &mut sys, &[0xdd, 0x21, 0x00, 0xd0], 4, 14);
  assert_eq!(cpu.regs.ix.word, 0xd000);
  run(&mut cpu, &mut sys, &[0xdd, 0x36, 0x05, 0x42], 4, 19);
  assert_eq!(sys.rb(0xd005), 0x42);
  run(&mut cpu, &mut sys, &[0xdd, 0x7e, 0x05], 3, 19);
  assert_eq!(cpu.regs.a(), 0x42);
  run(&mut cpu, &mut sys, &[0xdd, 0x34, 0x05], 3, 23);
  assert_eq!(sys.rb(0xd005), 0x43);

  // Negative displacement, and H stays H next to (IX+d).
  sys.wb(0xcfff, 0x77);
  run(&mut cpu, &mut sys, &[0xdd, 0x66, 0xff], 3, 19);
  assert_eq!(cpu.regs.h(), 0x77);
  assert_eq!(cpu.regs.ix.word, 0xd000);

  // Undocumented halves.
  run(&mut cpu, &mut sys, &[0xfd, 0x26, 0x12], 3, 11);
  assert_eq!(cpu.regs.iy.high(), 0x12);
  run(&mut cpu, &mut sys, &[0xfd, 0x23], 2, 10);
  assert_eq!(cpu.regs.iy.word, 0x1201);
}

#[test]
fn indexed_bit_operations() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.regs.iy.word = 0xd010;
  run(&mut cpu, &mut sys, &[0xfd, 0xcb, 0xfe, 0xc6], 4, 23);
  assert_eq!(sys.rb(0xd00e), 0x01);
  run(&mut cpu, &mut sys, &[0xfd, 0xcb, 0xfe, 0x46], 4, 20);
  assert!(!cpu.flags().zero);
  // The undocumented form also copies into B.
  run(&mut cpu, &mut sys, &[0xfd, 0xcb, 0xfe, 0x00], 4, 23);
  assert_eq!(sys.rb(0xd00e), 0x02);
  assert_eq!(cpu.regs.b(), 0x02);
}

#[test]
fn block_copy() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  for i in 0..4 {
    sys.wb(0xd000 + i, i as u8 + 1);
  }
  cpu.regs.hl.word = 0xd000;
  cpu.regs.de.word = 0xe000;
  cpu.regs.bc.word = 4;
  run(&mut cpu, &mut sys, &[0xed, 0xb0], 0, 21);
  let mut total = 21;
  while cpu.regs.pc == START {
    total += cpu.step(&mut sys).unwrap();
  }
  assert_eq!(cpu.regs.pc, START + 2);
  assert_eq!(total, 21 * 3 + 16);
  assert_eq!(cpu.regs.bc(), 0);
  assert!(!cpu.flags().parity);
  for i in 0..4 {
    assert_eq!(sys.rb(0xe000 + i), i as u8 + 1);
  }
}

#[test]
fn block_search() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  sys.wb(0xd000, 0x10);
  sys.wb(0xd001, 0x20);
  sys.wb(0xd002, 0x30);
  cpu.regs.hl.word = 0xd000;
  cpu.regs.bc.word = 8;
  cpu.regs.set_a(0x20);
  run(&mut cpu, &mut sys, &[0xed, 0xb1], 0, 21);
  assert_eq!(cpu.step(&mut sys).unwrap(), 16);
  assert_eq!(cpu.regs.pc, START + 2);
  assert_eq!(cpu.regs.hl(), 0xd002);
  assert_eq!(cpu.regs.bc(), 6);
  assert!(cpu.flags().zero && cpu.flags().parity);
}

#[test]
fn ports() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.regs.set_a(0x5a);
  run(&mut cpu, &mut sys, &[0xd3, 0x10], 2, 11);
  sys.ports.poke(0x20, 0x80);
  run(&mut cpu, &mut sys, &[0xdb, 0x20], 2, 11);
  assert_eq!(cpu.regs.a(), 0x80);
  assert_eq!(sys.ports.read(0x10), 0x5a);

  cpu.regs.bc.word = 0x0020;
  run(&mut cpu, &mut sys, &[0xed, 0x50], 2, 12);
  assert_eq!(cpu.regs.d(), 0x80);
  assert!(cpu.flags().sign && !cpu.flags().zero && !cpu.flags().parity);
  run(&mut cpu, &mut sys, &[0xed, 0x59], 2, 12);
  assert_eq!(sys.ports.read(0x20), cpu.regs.e());
}

#[test]
fn block_io_flags() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  sys.ports.poke(0x10, 0xf8);
  cpu.regs.bc.word = 0x0210;
  cpu.regs.hl.word = 0xd000;
  run(&mut cpu, &mut sys, &[0xed, 0xa2], 2, 16);
  assert_eq!(sys.rb(0xd000), 0xf8);
  assert_eq!((cpu.regs.b(), cpu.regs.hl()), (0x01, 0xd001));
  // 0xf8 + (C + 1) carries out; (0x09 & 7) ^ B has even parity.
  let flags = cpu.flags();
  assert!(flags.subtract && flags.half_carry && flags.carry && flags.parity);
  assert!(!flags.zero && !flags.sign);

  sys.wb(0xd001, 0x01);
  cpu.regs.bc.word = 0x0130;
  run(&mut cpu, &mut sys, &[0xed, 0xa3], 2, 16);
  assert_eq!(sys.ports.read(0x30), 0x01);
  let flags = cpu.flags();
  assert!(flags.zero && !flags.subtract);
  // 0x01 + new L (0x02) = 0x03, even parity with B = 0.
  assert!(!flags.carry && !flags.half_carry && flags.parity);
}

#[test]
fn status_flags_write_back() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.regs.set_f(0x28);
  let mut flags = cpu.flags();
  flags.carry = true;
  cpu.set_flags(flags);
  // Undocumented bits survive the write-back.
  assert_eq!(cpu.regs.f(), 0x29);

  cpu.regs.set_a(0x10);
  run(&mut cpu, &mut sys, &[0xce, 0x00], 2, 7);
  assert_eq!(cpu.regs.a(), 0x11);
  assert!(!cpu.flags().carry);
}

#[test]
fn extended_arithmetic() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.regs.set_a(0x01);
  run(&mut cpu, &mut sys, &[0xed, 0x44], 2, 8);
  assert_eq!(cpu.regs.a(), 0xff);
  assert!(cpu.flags().carry && cpu.flags().subtract);

  cpu.regs.hl.word = 0x1000;
  cpu.regs.de.word = 0x0001;
  cpu.regs.set_f(0);
  run(&mut cpu, &mut sys, &[0xed, 0x52], 2, 15);
  assert_eq!(cpu.regs.hl(), 0x0fff);

  run(&mut cpu, &mut sys, &[0xed, 0x43, 0x00, 0xd0], 4, 20);
  assert_eq!(sys.rw(0xd000), cpu.regs.bc());
  run(&mut cpu, &mut sys, &[0xed, 0x7b, 0x00, 0xd0], 4, 20);
  assert_eq!(cpu.regs.sp, cpu.regs.bc());
}

#[test]
fn digit_rotation() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.regs.hl.word = 0xd000;
  sys.wb(0xd000, 0x34);
  cpu.regs.set_a(0x12);
  run(&mut cpu, &mut sys, &[0xed, 0x6f], 2, 18);
  assert_eq!((cpu.regs.a(), sys.rb(0xd000)), (0x13, 0x42));
  run(&mut cpu, &mut sys, &[0xed, 0x67], 2, 18);
  assert_eq!((cpu.regs.a(), sys.rb(0xd000)), (0x12, 0x34));
}

#[test]
fn refresh_counter() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.regs.r = 0xff;
  run(&mut cpu, &mut sys, &[0x00], 1, 4);
  assert_eq!(cpu.regs.r, 0x80);
  run(&mut cpu, &mut sys, &[0xcb, 0x00], 2, 8);
  assert_eq!(cpu.regs.r, 0x82);
}

#[test]
fn interrupt_gating() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.im = 1;
  run(&mut cpu, &mut sys, &[0xf3], 1, 4);
  assert_eq!(cpu.interrupt(&mut sys, true, 0xff).unwrap(), 0);
  assert_eq!((cpu.regs.pc, cpu.regs.sp), (START + 1, 0xfff0));

  // EI holds off the interrupt for one more instruction.
  run(&mut cpu, &mut sys, &[0xfb], 1, 4);
  assert_eq!(cpu.interrupt(&mut sys, true, 0xff).unwrap(), 0);
  run(&mut cpu, &mut sys, &[0x00], 1, 4);
  assert_eq!(cpu.interrupt(&mut sys, true, 0xff).unwrap(), 13);
  assert_eq!(cpu.regs.pc, 0x38);
  assert_eq!(cpu.regs.sp, 0xffee);
  assert_eq!(sys.rw(0xffee), START + 3);
  assert!(!cpu.iff1 && !cpu.iff2);
}

#[test]
fn non_maskable_interrupt() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.iff1 = true;
  cpu.iff2 = true;
  assert_eq!(cpu.interrupt(&mut sys, false, 0).unwrap(), 11);
  assert_eq!(cpu.regs.pc, 0x66);
  assert!(!cpu.iff1 && cpu.iff2);
  sys.wb(0x66, 0xed);
  sys.wb(0x67, 0x45);
  cpu.step(&mut sys).unwrap();
  assert_eq!(cpu.regs.pc, START);
  assert!(cpu.iff1);
}

#[test]
fn interrupt_modes() {
  let (mut cpu, mut sys) = init(Variant::Z80);
  cpu.iff1 = true;
  assert_eq!(cpu.interrupt(&mut sys, true, 0xef).unwrap(), 13);
  assert_eq!(cpu.regs.pc, 0x28);

  let (mut cpu, mut sys) = init(Variant::Z80);
  run(&mut cpu, &mut sys, &[0xed, 0x5e], 2, 8);
  assert_eq!(cpu.im, 2);
  cpu.iff1 = true;
  cpu.regs.i = 0xd0;
  sys.ww(0xd010, 0x1234);
  assert_eq!(cpu.interrupt(&mut sys, true, 0x10).unwrap(), 19);
  assert_eq!(cpu.regs.pc, 0x1234);
  assert_eq!(sys.rw(cpu.regs.sp), START + 2);
}

#[test]
fn halt_waits_for_interrupt() {
  let (mut cpu, mut sys) = init(Variant::Lr35902);
  cpu.iff1 = true;
  run(&mut cpu, &mut sys, &[0x76], 1, 4);
  assert!(cpu.is_halted());
  assert_eq!(cpu.step(&mut sys).unwrap(), 4);
  assert_eq!(cpu.regs.pc, START + 1);
  assert_eq!(cpu.interrupt(&mut sys, true, 0x50).unwrap(), 20);
  assert!(!cpu.is_halted());
  assert_eq!(cpu.regs.pc, 0x50);
  assert_eq!(sys.rw(cpu.regs.sp), START + 1);
}

#[test]
fn gameboy_reti_enables_interrupts() {
  let (mut cpu, mut sys) = init(Variant::Lr35902);
  sys.ww(0xffee, 0x1234);
  cpu.regs.sp = 0xffee;
  run(&mut cpu, &mut sys, &[0xd9], 0x1234u16.wrapping_sub(START), 16);
  assert!(cpu.iff1);
  // No delay after RETI.
  assert_eq!(cpu.interrupt(&mut sys, true, 0x40).unwrap(), 20);
}
