use super::{CPUBusTrait, CpuError, CPU6502};
use crate::common::save_state::{Savable, SaveError};

struct DummyBus {
    data: [u8; 0x10000],
}

impl DummyBus {
    fn new(data: [u8; 0x10000]) -> Self {
        Self { data }
    }

    fn with_program(program: &[u8]) -> Self {
        let mut data = [0; 0x10000];
        data[..program.len()].copy_from_slice(program);

        Self::new(data)
    }
}

impl Savable for DummyBus {
    fn save<W: std::io::Write>(&self, _: &mut W) -> Result<(), SaveError> {
        unreachable!()
    }

    fn load<R: std::io::Read>(&mut self, _: &mut R) -> Result<(), SaveError> {
        unreachable!()
    }
}

impl CPUBusTrait for DummyBus {
    fn read(&self, address: u16) -> u8 {
        self.data[address as usize]
    }

    fn write(&mut self, address: u16, data: u8) {
        self.data[address as usize] = data;
    }

    fn reset(&mut self) {
        unreachable!()
    }
}

fn cpu_with_program(program: &[u8]) -> CPU6502<DummyBus> {
    let mut cpu = CPU6502::new(DummyBus::with_program(program));
    cpu.reset();

    cpu
}

fn run_one(cpu: &mut CPU6502<DummyBus>) -> u8 {
    cpu.execute_next().expect("no unsupported instruction")
}

#[test]
fn load_store_roundtrip() {
    // LDA #$42; STA $10
    let mut cpu = cpu_with_program(&[0xA9, 0x42, 0x85, 0x10]);

    assert_eq!(run_one(&mut cpu), 2);
    assert_eq!(run_one(&mut cpu), 3);
    assert_eq!(cpu.bus().read(0x10), 0x42);
}

#[test]
fn documented_base_cycle_costs() {
    // one instruction per program, all starting from a reset CPU
    let cases: &[(&[u8], u8)] = &[
        (&[0xA9, 0x00], 2),       // LDA #nn
        (&[0xA5, 0x10], 3),       // LDA nn
        (&[0xB5, 0x10], 4),       // LDA nn,X
        (&[0xAD, 0x00, 0x20], 4), // LDA nnnn
        (&[0xA1, 0x10], 6),       // LDA (nn,X)
        (&[0xB1, 0x10], 5),       // LDA (nn),Y
        (&[0x06, 0x10], 5),       // ASL nn
        (&[0x0E, 0x00, 0x20], 6), // ASL nnnn
        (&[0x1E, 0x00, 0x20], 7), // ASL nnnn,X
        (&[0xE6, 0x10], 5),       // INC nn
        (&[0x20, 0x00, 0x20], 6), // JSR
        (&[0x48], 3),             // PHA
        (&[0x68], 4),             // PLA
        (&[0x08], 3),             // PHP
        (&[0x28], 4),             // PLP
        (&[0x4C, 0x00, 0x20], 3), // JMP nnnn
        (&[0x6C, 0x00, 0x20], 5), // JMP (nnnn)
        (&[0xEA], 2),             // NOP
        (&[0x00], 7),             // BRK
    ];

    for (program, expected_cycles) in cases {
        let mut cpu = cpu_with_program(program);
        assert_eq!(
            run_one(&mut cpu),
            *expected_cycles,
            "wrong cycle cost for opcode {:02X}",
            program[0]
        );
    }
}

#[test]
fn absolute_indexed_read_pays_one_cycle_on_page_cross() {
    // LDX #$20; LDA $20F0,X -> effective address 0x2110 crosses a page
    let mut cpu = cpu_with_program(&[0xA2, 0x20, 0xBD, 0xF0, 0x20]);
    run_one(&mut cpu);
    assert_eq!(run_one(&mut cpu), 5);

    // LDX #$01; LDA $20F0,X -> stays on the same page
    let mut cpu = cpu_with_program(&[0xA2, 0x01, 0xBD, 0xF0, 0x20]);
    run_one(&mut cpu);
    assert_eq!(run_one(&mut cpu), 4);
}

#[test]
fn indirect_indexed_read_pays_one_cycle_on_page_cross() {
    // LDY #$20; LDA ($10),Y with ($10) -> 0x20F0
    let mut program = [0; 0x10000];
    program[0] = 0xA0; // LDY #$20
    program[1] = 0x20;
    program[2] = 0xB1; // LDA ($10),Y
    program[3] = 0x10;
    program[0x10] = 0xF0;
    program[0x11] = 0x20;

    let mut cpu = CPU6502::new(DummyBus::new(program));
    cpu.reset();
    run_one(&mut cpu);
    assert_eq!(run_one(&mut cpu), 6);

    // same but with Y = 1, no crossing
    program[1] = 0x01;
    let mut cpu = CPU6502::new(DummyBus::new(program));
    cpu.reset();
    run_one(&mut cpu);
    assert_eq!(run_one(&mut cpu), 5);
}

#[test]
fn store_cost_is_fixed_regardless_of_page_cross() {
    for x in [0x01, 0x20] {
        // LDX #x; STA $20F0,X
        let mut cpu = cpu_with_program(&[0xA2, x, 0x9D, 0xF0, 0x20]);
        run_one(&mut cpu);
        assert_eq!(run_one(&mut cpu), 5);
    }
}

#[test]
fn branch_cycle_costs() {
    // LDA #$01 (clears zero); BNE +2 taken, same page
    let mut cpu = cpu_with_program(&[0xA9, 0x01, 0xD0, 0x02]);
    run_one(&mut cpu);
    assert_eq!(run_one(&mut cpu), 3);

    // LDA #$01; BEQ +2 not taken
    let mut cpu = cpu_with_program(&[0xA9, 0x01, 0xF0, 0x02]);
    run_one(&mut cpu);
    assert_eq!(run_one(&mut cpu), 2);

    // branch taken into the next page
    let mut data = [0; 0x10000];
    data[0xF0] = 0xA9; // LDA #$01
    data[0xF1] = 0x01;
    data[0xF2] = 0xD0; // BNE +$20 -> 0x0114
    data[0xF3] = 0x20;

    let mut cpu = CPU6502::new(DummyBus::new(data));
    cpu.reset();
    cpu.set_pc(0xF0);
    run_one(&mut cpu);
    assert_eq!(run_one(&mut cpu), 4);
}

#[test]
fn adc_overflow_uses_the_literal_formula() {
    // the overflow flag is set when operand and result share bit 7, not by
    // the textbook 6502 formula

    // 0x50 + 0x10 = 0x60, operand and result both positive -> V set
    let mut cpu = cpu_with_program(&[0xA9, 0x50, 0x69, 0x10]);
    run_one(&mut cpu);
    run_one(&mut cpu);
    assert_eq!(cpu.register_a(), 0x60);
    assert!(cpu.status() & 0x40 != 0);

    // 0x50 + 0x60 = 0xB0, operand positive but result negative -> V clear
    let mut cpu = cpu_with_program(&[0xA9, 0x50, 0x69, 0x60]);
    run_one(&mut cpu);
    run_one(&mut cpu);
    assert_eq!(cpu.register_a(), 0xB0);
    assert!(cpu.status() & 0x40 == 0);
}

#[test]
fn sbc_subtracts_with_borrow() {
    // SEC; LDA #$10; SBC #$08
    let mut cpu = cpu_with_program(&[0x38, 0xA9, 0x10, 0xE9, 0x08]);
    run_one(&mut cpu);
    run_one(&mut cpu);
    run_one(&mut cpu);

    assert_eq!(cpu.register_a(), 0x08);
    // no borrow happened, carry stays set
    assert!(cpu.status() & 0x01 != 0);
}

#[test]
fn unsupported_opcode_is_surfaced() {
    let mut cpu = cpu_with_program(&[0x02]);

    let result = cpu.execute_next();
    assert!(matches!(
        result,
        Err(CpuError::UnsupportedInstruction { opcode: 0x02, pc: 0 })
    ));
}

#[test]
fn rts_into_driver_stub_parks_the_processor() {
    let mut data = [0; 0x10000];
    data[0x3803] = 0x20; // JSR $0010
    data[0x3804] = 0x10;
    data[0x3805] = 0x00;
    data[0x0010] = 0x60; // RTS

    let mut cpu = CPU6502::new(DummyBus::new(data));
    cpu.reset();
    cpu.set_pc(0x3803);

    run_one(&mut cpu); // JSR
    assert!(!cpu.is_halted());

    run_one(&mut cpu); // RTS back to 0x3806
    assert!(cpu.is_halted());

    // a halted processor only burns a fixed 2 cycles
    assert_eq!(run_one(&mut cpu), 2);
}

#[test]
fn rts_elsewhere_does_not_halt() {
    // JSR $0010 at 0; RTS comes back to 0x0003
    let mut data = [0; 0x10000];
    data[0x0000] = 0x20;
    data[0x0001] = 0x10;
    data[0x0002] = 0x00;
    data[0x0010] = 0x60;

    let mut cpu = CPU6502::new(DummyBus::new(data));
    cpu.reset();

    run_one(&mut cpu);
    run_one(&mut cpu);
    assert!(!cpu.is_halted());
}
