use super::instruction::{AddressingMode, Instruction, Opcode};
use super::{CPUBusTrait, CpuError};
use crate::common::save_state::{Savable, SaveError};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const IRQ_VECTOR_ADDRESS: u16 = 0xFFFE;

/// Returning from a subroutine into one of these addresses means execution
/// fell back into the music driver's call stubs, i.e. the track's init/play
/// routine finished and there is nothing left to run this frame.
const ROUTINE_DONE_ADDRESSES: [u16; 2] = [0x3803, 0x3806];

/// Clock cost reported while the processor idles in do-nothing mode.
const HALTED_CYCLE_TIME: u8 = 2;

// helper function
fn is_on_same_page(address1: u16, address2: u16) -> bool {
    address1 & 0xff00 == address2 & 0xff00
}

// flags: [N, V, _, B, D, I, Z, C]
enum StatusFlag {
    Carry = 1 << 0,
    Zero = 1 << 1,
    InterruptDisable = 1 << 2,
    DecimalMode = 1 << 3,
    BreakCommand = 1 << 4,
    Overflow = 1 << 6,
    Negative = 1 << 7,
}

// This CPU does not support BCD mode, NSF drivers do not use it
pub struct CPU6502<T: CPUBusTrait> {
    reg_pc: u16,
    reg_sp: u8,
    reg_a: u8,
    reg_x: u8,
    reg_y: u8,
    reg_status: u8,

    halted: bool,

    bus: T,
}

// public
impl<T> CPU6502<T>
where
    T: CPUBusTrait,
{
    pub fn new(bus: T) -> Self {
        CPU6502 {
            reg_pc: 0,
            reg_sp: 0,
            reg_a: 0,
            reg_x: 0,
            reg_y: 0,
            reg_status: 0,

            halted: false,

            bus,
        }
    }

    pub fn reset(&mut self) {
        self.reg_pc = 0;
        self.reg_a = 0;
        self.reg_x = 0;
        self.reg_y = 0;

        // unused flag always set, interrupts disabled, decimal cleared
        self.reg_status = 0x24;
        self.reg_sp = 0xFF;

        self.halted = false;
    }

    pub fn reset_bus(&mut self) {
        self.bus.reset()
    }

    pub fn bus(&self) -> &T {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut T {
        &mut self.bus
    }

    pub(crate) fn set_pc(&mut self, address: u16) {
        self.reg_pc = address;
    }

    pub(crate) fn set_register_a(&mut self, data: u8) {
        self.reg_a = data;
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.halted
    }

    #[cfg(test)]
    pub(crate) fn register_a(&self) -> u8 {
        self.reg_a
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> u8 {
        self.reg_status
    }

    pub(crate) fn clear_halted(&mut self) {
        self.halted = false;
    }

    /// Fetch, decode and execute one instruction, returning its clock cost.
    pub fn execute_next(&mut self) -> Result<u8, CpuError> {
        if self.halted {
            return Ok(HALTED_CYCLE_TIME);
        }

        let instruction = self.fetch_next_instruction()?;

        Ok(self.run_instruction(&instruction))
    }
}

// private
impl<T> CPU6502<T>
where
    T: CPUBusTrait,
{
    fn set_flag(&mut self, flag: StatusFlag) {
        self.reg_status |= flag as u8;
    }

    fn unset_flag(&mut self, flag: StatusFlag) {
        self.reg_status &= !(flag as u8);
    }

    fn set_flag_status(&mut self, flag: StatusFlag, status: bool) {
        if status {
            self.set_flag(flag)
        } else {
            self.unset_flag(flag)
        }
    }

    fn flag_set(&self, flag: StatusFlag) -> bool {
        self.reg_status & (flag as u8) != 0
    }

    fn read_bus(&self, address: u16) -> u8 {
        self.bus.read(address)
    }

    fn write_bus(&mut self, address: u16, data: u8) {
        self.bus.write(address, data);
    }

    fn read_bus_u16(&self, address: u16) -> u16 {
        let low = self.read_bus(address) as u16;
        let high = self.read_bus(address.wrapping_add(1)) as u16;

        high << 8 | low
    }

    /// Decodes the operand of an instruction and returns
    /// (the decoded operand, has crossed a page)
    ///
    /// This is the single place where addressing modes are resolved and
    /// page-boundary crossing is detected.
    fn decode_operand(&self, instruction: &Instruction) -> (u16, bool) {
        match instruction.addressing_mode {
            AddressingMode::ZeroPage => (instruction.operand & 0xff, false),
            AddressingMode::ZeroPageIndexX => (
                instruction.operand.wrapping_add(self.reg_x as u16) & 0xff,
                false,
            ),
            AddressingMode::ZeroPageIndexY => (
                instruction.operand.wrapping_add(self.reg_y as u16) & 0xff,
                false,
            ),
            AddressingMode::Indirect => {
                let low = self.read_bus(instruction.operand) as u16;
                // if the indirect vector is at the end of the page (0xff) then
                // wrap around on the same page
                let high = self.read_bus(if instruction.operand & 0xff == 0xff {
                    instruction.operand & 0xff00
                } else {
                    instruction.operand + 1
                }) as u16;

                (high << 8 | low, false)
            }
            AddressingMode::XIndirect => {
                let location_indirect = instruction.operand.wrapping_add(self.reg_x as u16) & 0xff;
                let low = self.read_bus(location_indirect) as u16;
                let high = self.read_bus((location_indirect + 1) & 0xff) as u16;

                (high << 8 | low, false)
            }
            AddressingMode::IndirectY => {
                let location_indirect = instruction.operand & 0xff;
                let low = self.read_bus(location_indirect) as u16;
                let high = self.read_bus((location_indirect + 1) & 0xff) as u16;

                let unindexed_address = high << 8 | low;
                let result = unindexed_address.wrapping_add(self.reg_y as u16);

                (result, !is_on_same_page(unindexed_address, result))
            }
            AddressingMode::Absolute => (instruction.operand, false),
            AddressingMode::AbsoluteX => {
                let result = instruction.operand.wrapping_add(self.reg_x as u16);

                (result, !is_on_same_page(instruction.operand, result))
            }
            AddressingMode::AbsoluteY => {
                let result = instruction.operand.wrapping_add(self.reg_y as u16);

                (result, !is_on_same_page(instruction.operand, result))
            }
            AddressingMode::Relative => {
                let sign_extended_operand = instruction.operand
                    | if instruction.operand & 0x80 != 0 {
                        0xFF00
                    } else {
                        0x0000
                    };

                (self.reg_pc.wrapping_add(sign_extended_operand), false)
            }
            AddressingMode::Immediate | AddressingMode::Accumulator | AddressingMode::Implied => {
                (instruction.operand, false)
            }
        }
    }

    fn read_operand(&self, decoded_operand: u16, is_operand_address: bool) -> u8 {
        if is_operand_address {
            self.read_bus(decoded_operand)
        } else {
            decoded_operand as u8
        }
    }

    fn update_zero_negative_flags(&mut self, result: u8) {
        self.set_flag_status(StatusFlag::Zero, result == 0);
        self.set_flag_status(StatusFlag::Negative, result & 0x80 != 0);
    }

    fn run_bitwise_operation<F>(&mut self, decoded_operand: u16, is_operand_address: bool, f: F)
    where
        F: Fn(u8, u8) -> u8,
    {
        let operand = self.read_operand(decoded_operand, is_operand_address);

        let result = f(operand, self.reg_a);

        self.update_zero_negative_flags(result);

        self.reg_a = result;
    }

    fn run_cmp_operation(&mut self, decoded_operand: u16, is_operand_address: bool, register: u8) {
        let operand = self.read_operand(decoded_operand, is_operand_address);

        let result = (register as u16).wrapping_sub(operand as u16);

        self.update_zero_negative_flags(result as u8);
        self.set_flag_status(StatusFlag::Carry, result & 0xff00 == 0);
    }

    /// Shared body of ASL/LSR/ROL/ROR, `f` maps (value, carry_in) to
    /// (result, carry_out).
    fn run_shift_operation<F>(&mut self, decoded_operand: u16, is_operand_address: bool, f: F)
    where
        F: Fn(u8, u8) -> (u8, bool),
    {
        let operand = if is_operand_address {
            self.read_bus(decoded_operand)
        } else {
            // if its not an address, then its the accumulator
            self.reg_a
        };

        let carry_in = self.flag_set(StatusFlag::Carry) as u8;
        let (result, carry_out) = f(operand, carry_in);

        self.set_flag_status(StatusFlag::Carry, carry_out);
        self.update_zero_negative_flags(result);

        if is_operand_address {
            // save back
            self.write_bus(decoded_operand, result);
        } else {
            self.reg_a = result;
        }
    }

    fn run_load_instruction(&mut self, decoded_operand: u16, is_operand_address: bool) -> u8 {
        let operand = self.read_operand(decoded_operand, is_operand_address);

        self.update_zero_negative_flags(operand);

        operand
    }

    /// Returns the extra cycles the branch consumed.
    fn run_branch_condition(&mut self, decoded_operand: u16, condition: bool) -> u8 {
        if condition {
            let cycle_time = if is_on_same_page(self.reg_pc, decoded_operand) {
                1
            } else {
                2
            };

            self.reg_pc = decoded_operand;

            cycle_time
        } else {
            0
        }
    }

    fn push_stack(&mut self, data: u8) {
        self.write_bus(0x0100 | self.reg_sp as u16, data);
        self.reg_sp = self.reg_sp.wrapping_sub(1);
    }

    fn pull_stack(&mut self) -> u8 {
        self.reg_sp = self.reg_sp.wrapping_add(1);
        self.read_bus(0x0100 | self.reg_sp as u16)
    }

    fn fetch_next_instruction(&mut self) -> Result<Instruction, CpuError> {
        let pc = self.reg_pc;
        let opcode = self.read_bus(pc);

        let mut instruction =
            Instruction::from_byte(opcode).ok_or(CpuError::UnsupportedInstruction { opcode, pc })?;

        let len = instruction.instruction_len();

        let mut operand = 0;
        match len {
            2 => {
                operand |= self.read_bus(pc.wrapping_add(1)) as u16;
            }
            3 => {
                operand |= self.read_bus(pc.wrapping_add(1)) as u16;
                operand |= (self.read_bus(pc.wrapping_add(2)) as u16) << 8;
            }
            _ => {}
        }

        self.reg_pc = pc.wrapping_add(len);

        instruction.operand = operand;

        Ok(instruction)
    }

    fn run_instruction(&mut self, instruction: &Instruction) -> u8 {
        let (decoded_operand, did_page_cross) = self.decode_operand(instruction);

        let mut cycle_time = instruction.base_cycle_time();
        if did_page_cross && instruction.has_page_cross_penalty() {
            cycle_time += 1;
        }

        let is_operand_address = instruction.is_operand_address();

        match instruction.opcode {
            Opcode::Adc => {
                let operand = self.read_operand(decoded_operand, is_operand_address);
                let carry = self.flag_set(StatusFlag::Carry) as u16;

                let result = (self.reg_a as u16)
                    .wrapping_add(operand as u16)
                    .wrapping_add(carry);

                // not the textbook formula: V tracks whether the operand and
                // the raw sum share bit 7, which is what drivers rely on here
                self.set_flag_status(
                    StatusFlag::Overflow,
                    operand & 0x80 == (result as u8) & 0x80,
                );
                self.set_flag_status(StatusFlag::Carry, result & 0xff00 != 0);
                self.update_zero_negative_flags(result as u8);

                self.reg_a = result as u8;
            }
            Opcode::Sbc => {
                let operand = self.read_operand(decoded_operand, is_operand_address);
                let carry = self.flag_set(StatusFlag::Carry) as u16;

                let result = (self.reg_a as u16)
                    .wrapping_add(carry)
                    .wrapping_sub(1)
                    .wrapping_sub(operand as u16);

                // same literal formula as ADC
                self.set_flag_status(
                    StatusFlag::Overflow,
                    operand & 0x80 == (result as u8) & 0x80,
                );
                self.set_flag_status(StatusFlag::Carry, result & 0xff00 == 0);
                self.update_zero_negative_flags(result as u8);

                self.reg_a = result as u8;
            }
            Opcode::Asl => {
                self.run_shift_operation(decoded_operand, is_operand_address, |value, _| {
                    (value << 1, value & 0x80 != 0)
                });
            }
            Opcode::Lsr => {
                self.run_shift_operation(decoded_operand, is_operand_address, |value, _| {
                    (value >> 1, value & 0x01 != 0)
                });
            }
            Opcode::Rol => {
                self.run_shift_operation(decoded_operand, is_operand_address, |value, carry| {
                    (value << 1 | carry, value & 0x80 != 0)
                });
            }
            Opcode::Ror => {
                self.run_shift_operation(decoded_operand, is_operand_address, |value, carry| {
                    (value >> 1 | carry << 7, value & 0x01 != 0)
                });
            }
            Opcode::And => {
                self.run_bitwise_operation(decoded_operand, is_operand_address, |a, b| a & b);
            }
            Opcode::Eor => {
                self.run_bitwise_operation(decoded_operand, is_operand_address, |a, b| a ^ b);
            }
            Opcode::Ora => {
                self.run_bitwise_operation(decoded_operand, is_operand_address, |a, b| a | b);
            }
            Opcode::Bit => {
                let operand = self.read_bus(decoded_operand);

                // move the negative and overflow bits of the operand into the
                // status register
                self.set_flag_status(
                    StatusFlag::Negative,
                    operand & StatusFlag::Negative as u8 != 0,
                );
                self.set_flag_status(
                    StatusFlag::Overflow,
                    operand & StatusFlag::Overflow as u8 != 0,
                );

                self.set_flag_status(StatusFlag::Zero, operand & self.reg_a == 0);
            }
            Opcode::Cmp => {
                self.run_cmp_operation(decoded_operand, is_operand_address, self.reg_a);
            }
            Opcode::Cpx => {
                self.run_cmp_operation(decoded_operand, is_operand_address, self.reg_x);
            }
            Opcode::Cpy => {
                self.run_cmp_operation(decoded_operand, is_operand_address, self.reg_y);
            }
            Opcode::Brk => {
                // the byte after the BRK opcode is padding
                let pc = self.reg_pc.wrapping_add(1);

                self.push_stack((pc >> 8) as u8);
                self.push_stack(pc as u8);

                self.set_flag(StatusFlag::BreakCommand);
                self.push_stack(self.reg_status | 0x30);
                self.set_flag(StatusFlag::InterruptDisable);

                self.reg_pc = self.read_bus_u16(IRQ_VECTOR_ADDRESS);
            }
            Opcode::Bcc => {
                cycle_time += self
                    .run_branch_condition(decoded_operand, !self.flag_set(StatusFlag::Carry));
            }
            Opcode::Bcs => {
                cycle_time +=
                    self.run_branch_condition(decoded_operand, self.flag_set(StatusFlag::Carry));
            }
            Opcode::Beq => {
                cycle_time +=
                    self.run_branch_condition(decoded_operand, self.flag_set(StatusFlag::Zero));
            }
            Opcode::Bne => {
                cycle_time +=
                    self.run_branch_condition(decoded_operand, !self.flag_set(StatusFlag::Zero));
            }
            Opcode::Bmi => {
                cycle_time +=
                    self.run_branch_condition(decoded_operand, self.flag_set(StatusFlag::Negative));
            }
            Opcode::Bpl => {
                cycle_time += self
                    .run_branch_condition(decoded_operand, !self.flag_set(StatusFlag::Negative));
            }
            Opcode::Bvc => {
                cycle_time += self
                    .run_branch_condition(decoded_operand, !self.flag_set(StatusFlag::Overflow));
            }
            Opcode::Bvs => {
                cycle_time +=
                    self.run_branch_condition(decoded_operand, self.flag_set(StatusFlag::Overflow));
            }
            Opcode::Dec => {
                let result = self.read_bus(decoded_operand).wrapping_sub(1);

                self.update_zero_negative_flags(result);

                self.write_bus(decoded_operand, result);
            }
            Opcode::Inc => {
                let result = self.read_bus(decoded_operand).wrapping_add(1);

                self.update_zero_negative_flags(result);

                self.write_bus(decoded_operand, result);
            }
            Opcode::Clc => {
                self.unset_flag(StatusFlag::Carry);
            }
            Opcode::Cld => {
                self.unset_flag(StatusFlag::DecimalMode);
            }
            Opcode::Cli => {
                self.unset_flag(StatusFlag::InterruptDisable);
            }
            Opcode::Clv => {
                self.unset_flag(StatusFlag::Overflow);
            }
            Opcode::Sec => {
                self.set_flag(StatusFlag::Carry);
            }
            Opcode::Sed => {
                self.set_flag(StatusFlag::DecimalMode);
            }
            Opcode::Sei => {
                self.set_flag(StatusFlag::InterruptDisable);
            }
            Opcode::Jmp => {
                self.reg_pc = decoded_operand;
            }
            Opcode::Jsr => {
                let pc = self.reg_pc.wrapping_sub(1);

                self.push_stack((pc >> 8) as u8);
                self.push_stack(pc as u8);

                self.reg_pc = decoded_operand;
            }
            Opcode::Rti => {
                // bits 4 and 5 are not touched by a status pull
                let old_status = self.reg_status & 0x30;
                self.reg_status = self.pull_stack() & !0x30 | old_status;

                let low = self.pull_stack() as u16;
                let high = self.pull_stack() as u16;

                self.reg_pc = high << 8 | low;
            }
            Opcode::Rts => {
                let low = self.pull_stack() as u16;
                let high = self.pull_stack() as u16;

                self.reg_pc = (high << 8 | low).wrapping_add(1);

                // falling back into a driver call stub means the per-frame
                // routine is done, idle until the next frame
                if ROUTINE_DONE_ADDRESSES.contains(&self.reg_pc) {
                    self.halted = true;
                }
            }
            Opcode::Lda => {
                self.reg_a = self.run_load_instruction(decoded_operand, is_operand_address);
            }
            Opcode::Ldx => {
                self.reg_x = self.run_load_instruction(decoded_operand, is_operand_address);
            }
            Opcode::Ldy => {
                self.reg_y = self.run_load_instruction(decoded_operand, is_operand_address);
            }
            Opcode::Nop => {
                // NOTHING
            }
            Opcode::Dex => {
                let result = self.reg_x.wrapping_sub(1);

                self.update_zero_negative_flags(result);

                self.reg_x = result;
            }
            Opcode::Dey => {
                let result = self.reg_y.wrapping_sub(1);

                self.update_zero_negative_flags(result);

                self.reg_y = result;
            }
            Opcode::Inx => {
                let result = self.reg_x.wrapping_add(1);

                self.update_zero_negative_flags(result);

                self.reg_x = result;
            }
            Opcode::Iny => {
                let result = self.reg_y.wrapping_add(1);

                self.update_zero_negative_flags(result);

                self.reg_y = result;
            }
            Opcode::Tax => {
                let result = self.reg_a;

                self.update_zero_negative_flags(result);

                self.reg_x = result;
            }
            Opcode::Tay => {
                let result = self.reg_a;

                self.update_zero_negative_flags(result);

                self.reg_y = result;
            }
            Opcode::Txa => {
                let result = self.reg_x;

                self.update_zero_negative_flags(result);

                self.reg_a = result;
            }
            Opcode::Tya => {
                let result = self.reg_y;

                self.update_zero_negative_flags(result);

                self.reg_a = result;
            }
            Opcode::Pha => {
                self.push_stack(self.reg_a);
            }
            Opcode::Php => {
                // bits 4 and 5 must be set in the pushed copy
                self.push_stack(self.reg_status | 0x30);
            }
            Opcode::Pla => {
                let result = self.pull_stack();

                self.update_zero_negative_flags(result);

                self.reg_a = result;
            }
            Opcode::Plp => {
                // bits 4 and 5 should not be edited
                let old_status = self.reg_status & 0x30;
                self.reg_status = self.pull_stack() & !0x30 | old_status;
            }
            Opcode::Sta => {
                self.write_bus(decoded_operand, self.reg_a);
            }
            Opcode::Stx => {
                self.write_bus(decoded_operand, self.reg_x);
            }
            Opcode::Sty => {
                self.write_bus(decoded_operand, self.reg_y);
            }
            Opcode::Tsx => {
                let result = self.reg_sp;

                self.update_zero_negative_flags(result);

                self.reg_x = result;
            }
            Opcode::Txs => {
                // no need to set flags
                self.reg_sp = self.reg_x;
            }
        };

        cycle_time
    }

    fn load_serialized_state(&mut self, state: SavableCPUState) {
        self.reg_pc = state.reg_pc;
        self.reg_sp = state.reg_sp;
        self.reg_a = state.reg_a;
        self.reg_x = state.reg_x;
        self.reg_y = state.reg_y;
        self.reg_status = state.reg_status;
        self.halted = state.halted;
    }
}

#[derive(Serialize, Deserialize)]
struct SavableCPUState {
    reg_pc: u16,
    reg_sp: u8,
    reg_a: u8,
    reg_x: u8,
    reg_y: u8,
    reg_status: u8,

    halted: bool,
}

impl SavableCPUState {
    fn from_cpu<T: CPUBusTrait>(cpu: &CPU6502<T>) -> Self {
        Self {
            reg_pc: cpu.reg_pc,
            reg_sp: cpu.reg_sp,
            reg_a: cpu.reg_a,
            reg_x: cpu.reg_x,
            reg_y: cpu.reg_y,
            reg_status: cpu.reg_status,
            halted: cpu.halted,
        }
    }
}

impl<T> Savable for CPU6502<T>
where
    T: CPUBusTrait,
{
    fn save<W: Write>(&self, writer: &mut W) -> Result<(), SaveError> {
        let state = SavableCPUState::from_cpu(self);

        bincode::serialize_into(&mut *writer, &state)
            .map_err(|_| SaveError::SerializationError)?;

        self.bus.save(writer)?;

        Ok(())
    }

    fn load<R: Read>(&mut self, reader: &mut R) -> Result<(), SaveError> {
        let state: SavableCPUState =
            bincode::deserialize_from(&mut *reader).map_err(|err| match *err {
                bincode::ErrorKind::Io(err) => SaveError::IoError(err),
                _ => SaveError::SerializationError,
            })?;

        self.load_serialized_state(state);

        self.bus.load(reader)?;

        Ok(())
    }
}
