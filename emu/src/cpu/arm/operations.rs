use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::{
    rotated_immediate, shift, AluInstruction, AluInstructionKind, AluSecondOperandInfo,
    ArithmeticOpResult, ShiftOperator,
};
use crate::cpu::arm::instructions::SingleDataTransferOffsetInfo;
use crate::cpu::arm3::{Arm3, Exception};
use crate::cpu::flags::{Indexing, LoadStoreKind, Offsetting, ReadWriteKind};
use crate::cpu::registers::{REG_LR, REG_PC};

/// ARM `AddWithCarry`: the sum plus the unsigned carry-out and the signed
/// overflow. Subtraction goes through here as `a + NOT b + 1` (or `+ C` for
/// SBC), which is how the hardware produces the inverted-borrow carry.
pub(crate) fn add_with_carry(op1: u32, op2: u32, carry_in: u32) -> ArithmeticOpResult {
    let wide = u64::from(op1) + u64::from(op2) + u64::from(carry_in);
    let result = wide as u32;

    ArithmeticOpResult {
        result,
        carry: wide > u64::from(u32::MAX),
        overflow: (!(op1 ^ op2) & (op1 ^ result)).get_bit(31),
        sign: result.get_bit(31),
        zero: result == 0,
    }
}

impl Arm3 {
    pub(crate) fn data_processing(
        &mut self,
        alu_instruction: AluInstruction,
        set_conditions: bool,
        rn: u32,
        destination: u32,
        op2: AluSecondOperandInfo,
    ) {
        // The flags-only opcodes behave as if S were set.
        let s = set_conditions || alu_instruction.is_test();

        let op1 = self.reg_operand(rn);
        let update_shifter_carry = s && alu_instruction.kind() == AluInstructionKind::Logical;
        let op2 = self.operand_value(op2, update_shifter_carry);
        let carry_in = u32::from(self.cpsr.carry_flag());

        use AluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match alu_instruction {
            And => self.write_logical(destination, op1 & op2, s),
            Eor => self.write_logical(destination, op1 ^ op2, s),
            Sub => self.write_arithmetic(destination, add_with_carry(op1, !op2, 1), s),
            Rsb => self.write_arithmetic(destination, add_with_carry(op2, !op1, 1), s),
            Add => self.write_arithmetic(destination, add_with_carry(op1, op2, 0), s),
            Adc => self.write_arithmetic(destination, add_with_carry(op1, op2, carry_in), s),
            Sbc => self.write_arithmetic(destination, add_with_carry(op1, !op2, carry_in), s),
            Rsc => self.write_arithmetic(destination, add_with_carry(op2, !op1, carry_in), s),
            Tst => self.test_logical(op1 & op2),
            Teq => self.test_logical(op1 ^ op2),
            Cmp => self.cpsr.set_flags(&add_with_carry(op1, !op2, 1)),
            Cmn => self.cpsr.set_flags(&add_with_carry(op1, op2, 0)),
            Orr => self.write_logical(destination, op1 | op2, s),
            Mov => self.write_logical(destination, op2, s),
            Bic => self.write_logical(destination, op1 & !op2, s),
            Mvn => self.write_logical(destination, !op2, s),
        }

        // The S-form writing the PC is the exception-return idiom: the saved
        // PSR comes back with it.
        if set_conditions && !alu_instruction.is_test() && destination == REG_PC {
            self.restore_cpsr();
        }
    }

    fn write_logical(&mut self, rd: u32, result: u32, s: bool) {
        self.registers.set_register_at(rd as usize, result);

        if s {
            self.cpsr.set_zero_flag(result == 0);
            self.cpsr.set_sign_flag(result.get_bit(31));
        }
    }

    fn test_logical(&mut self, result: u32) {
        self.cpsr.set_zero_flag(result == 0);
        self.cpsr.set_sign_flag(result.get_bit(31));
    }

    fn write_arithmetic(&mut self, rd: u32, op: ArithmeticOpResult, s: bool) {
        self.registers.set_register_at(rd as usize, op.result);

        if s {
            self.cpsr.set_flags(&op);
        }
    }

    /// Resolves Operand2 through the barrel shifter. For logical opcodes
    /// with S set the shifter's carry-out becomes the C flag.
    pub(crate) fn operand_value(&mut self, info: AluSecondOperandInfo, update_carry: bool) -> u32 {
        let carry_in = self.cpsr.carry_flag();

        let shifted = match info {
            AluSecondOperandInfo::Immediate { base, rotate } => {
                rotated_immediate(base, rotate, carry_in)
            }
            AluSecondOperandInfo::Register {
                shift_op,
                shift_kind,
                register,
            } => {
                let rm = self.reg_operand(register);
                match shift_op {
                    ShiftOperator::Immediate(amount) => shift(shift_kind, amount, rm, carry_in),
                    ShiftOperator::Register(rs) => {
                        let amount = self.registers.register_at(rs as usize) & 0xFF;
                        // A zero count from the register leaves value and
                        // carry alone.
                        if amount == 0 {
                            ArithmeticOpResult {
                                result: rm,
                                carry: carry_in,
                                ..Default::default()
                            }
                        } else {
                            shift(shift_kind, amount, rm, carry_in)
                        }
                    }
                }
            }
        };

        if update_carry {
            self.cpsr.set_carry_flag(shifted.carry);
        }

        shifted.result
    }

    pub(crate) fn multiply(
        &mut self,
        accumulate: bool,
        set_conditions: bool,
        rd: u32,
        rn: u32,
        rs: u32,
        rm: u32,
    ) {
        let mut result = self
            .reg_operand(rm)
            .wrapping_mul(self.reg_operand(rs));
        if accumulate {
            result = result.wrapping_add(self.reg_operand(rn));
        }
        self.registers.set_register_at(rd as usize, result);

        if set_conditions {
            // N and Z only; C and V are left alone.
            self.cpsr.set_zero_flag(result == 0);
            self.cpsr.set_sign_flag(result.get_bit(31));
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn single_data_transfer(
        &mut self,
        kind: LoadStoreKind,
        quantity: ReadWriteKind,
        write_back: bool,
        indexing: Indexing,
        offsetting: Offsetting,
        rd: u32,
        base_register: u32,
        offset_info: SingleDataTransferOffsetInfo,
    ) {
        let base = self.reg_operand(base_register);

        let amount = match offset_info {
            SingleDataTransferOffsetInfo::Immediate { offset } => offset,
            SingleDataTransferOffsetInfo::RegisterImmediate {
                shift_amount,
                shift_kind,
                reg_offset,
            } => {
                let rm = self.reg_operand(reg_offset);
                shift(shift_kind, shift_amount, rm, self.cpsr.carry_flag()).result
            }
        };

        let stepped = match offsetting {
            Offsetting::Down => base.wrapping_sub(amount),
            Offsetting::Up => base.wrapping_add(amount),
        };

        let address = match indexing {
            Indexing::Pre => stepped,
            Indexing::Post => base,
        };

        match kind {
            LoadStoreKind::Load => {
                let value = match quantity {
                    ReadWriteKind::Word => self.memory.lock().unwrap().read_word(address),
                    ReadWriteKind::Byte => self.memory.lock().unwrap().read_byte(address).into(),
                };
                self.registers.set_register_at(rd as usize, value);
            }
            LoadStoreKind::Store => {
                let value = self.reg_operand(rd);
                match quantity {
                    ReadWriteKind::Word => self.memory.lock().unwrap().write_word(address, value),
                    ReadWriteKind::Byte => self
                        .memory
                        .lock()
                        .unwrap()
                        .write_byte(address, value as u8),
                }
            }
        }

        // Post-indexing always writes the stepped address back; pre-indexing
        // only with the W bit. A load into the base register wins over the
        // writeback.
        if (indexing == Indexing::Post || write_back)
            && !(kind == LoadStoreKind::Load && rd == base_register)
        {
            self.registers
                .set_register_at(base_register as usize, stepped);
        }
    }

    pub(crate) fn block_data_transfer(
        &mut self,
        indexing: Indexing,
        offsetting: Offsetting,
        load_psr: bool,
        write_back: bool,
        load_store: LoadStoreKind,
        rn: u32,
        register_list: u32,
    ) {
        let base = self.registers.register_at(rn as usize);
        let count = register_list.count_ones();
        let up = offsetting == Offsetting::Up;
        let pre = indexing == Indexing::Pre;

        // The lowest register always lands at the lowest address.
        let mut address = if up { base } else { base.wrapping_sub(count * 4) };
        if up == pre {
            address = address.wrapping_add(4);
        }

        // S without R15 in the list addresses the user bank from a
        // privileged mode.
        let user_bank = load_psr && !register_list.get_bit(15);

        for r in 0..16_usize {
            if !register_list.get_bit(r as u8) {
                continue;
            }

            match load_store {
                LoadStoreKind::Load => {
                    let value = self.memory.lock().unwrap().read_word(address);
                    if user_bank {
                        self.set_user_register_at(r, value);
                    } else {
                        self.registers.set_register_at(r, value);
                    }
                }
                LoadStoreKind::Store => {
                    let value = if r == 15 {
                        self.reg_operand(REG_PC)
                    } else if user_bank {
                        self.user_register_at(r)
                    } else {
                        self.registers.register_at(r)
                    };
                    self.memory.lock().unwrap().write_word(address, value);
                }
            }

            address = address.wrapping_add(4);
        }

        if write_back {
            let new_base = if up {
                base.wrapping_add(count * 4)
            } else {
                base.wrapping_sub(count * 4)
            };
            // A load that included the base keeps the loaded value.
            if !(load_store == LoadStoreKind::Load && register_list.get_bit(rn as u8)) {
                self.registers.set_register_at(rn as usize, new_base);
            }
        }

        // LDM with S and R15 in the list is the other exception-return
        // idiom.
        if load_psr && load_store == LoadStoreKind::Load && register_list.get_bit(15) {
            self.restore_cpsr();
        }
    }

    pub(crate) fn branch(&mut self, link: bool, offset: u32) {
        // 24-bit two's-complement word offset relative to fetch + 8.
        let offset = ((offset << 8) as i32) >> 6;
        let target = self.reg_operand(REG_PC).wrapping_add(offset as u32);

        if link {
            // R15 currently holds the next instruction's address.
            self.registers
                .set_register_at(REG_LR, self.registers.program_counter());
        }

        self.registers.set_program_counter(target);
    }

    pub(crate) fn software_interrupt(&mut self, comment: u32) {
        logger::debug(format!("SWI 0x{comment:06X}"));
        self.enter_exception(Exception::SoftwareInterrupt);
    }
}
