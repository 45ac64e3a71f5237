use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::{
    AluInstruction, AluSecondOperandInfo, ShiftOperator,
};
use crate::cpu::flags::{Indexing, LoadStoreKind, Offsetting, ReadWriteKind, ShiftKind};

/// Offset field of a single data transfer. Register offsets are always
/// shifted by an immediate amount; a register-specified shift does not
/// exist for LDR/STR.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SingleDataTransferOffsetInfo {
    Immediate {
        offset: u32,
    },
    RegisterImmediate {
        shift_amount: u32,
        shift_kind: ShiftKind,
        reg_offset: u32,
    },
}

/// One decoded instruction. The condition field is evaluated before decode
/// and is not part of the variants.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ArmInstruction {
    DataProcessing {
        alu_instruction: AluInstruction,
        set_conditions: bool,
        rn: u32,
        destination: u32,
        op2: AluSecondOperandInfo,
    },
    Multiply {
        accumulate: bool,
        set_conditions: bool,
        rd: u32,
        rn: u32,
        rs: u32,
        rm: u32,
    },
    SingleDataTransfer {
        kind: LoadStoreKind,
        quantity: ReadWriteKind,
        write_back: bool,
        indexing: Indexing,
        offsetting: Offsetting,
        rd: u32,
        base_register: u32,
        offset_info: SingleDataTransferOffsetInfo,
    },
    BlockDataTransfer {
        indexing: Indexing,
        offsetting: Offsetting,
        load_psr: bool,
        write_back: bool,
        load_store: LoadStoreKind,
        rn: u32,
        register_list: u32,
    },
    Branch {
        link: bool,
        /// Raw 24-bit word offset, sign-extended and scaled at execute time.
        offset: u32,
    },
    SoftwareInterrupt {
        comment: u32,
    },
}

impl TryFrom<u32> for ArmInstruction {
    type Error = String;

    fn try_from(op_code: u32) -> Result<Self, Self::Error> {
        // The multiply pattern sits inside the data processing space, so it
        // has to be checked first.
        if op_code.get_bits(22..=27) == 0b000000 && op_code.get_bits(4..=7) == 0b1001 {
            Ok(Self::Multiply {
                accumulate: op_code.get_bit(21),
                set_conditions: op_code.get_bit(20),
                rd: op_code.get_bits(16..=19),
                rn: op_code.get_bits(12..=15),
                rs: op_code.get_bits(8..=11),
                rm: op_code.get_bits(0..=3),
            })
        } else if op_code.get_bits(26..=27) == 0b00 {
            let op2 = if op_code.get_bit(25) {
                AluSecondOperandInfo::Immediate {
                    base: op_code.get_bits(0..=7),
                    rotate: op_code.get_bits(8..=11),
                }
            } else {
                let shift_op = if op_code.get_bit(4) {
                    ShiftOperator::Register(op_code.get_bits(8..=11))
                } else {
                    ShiftOperator::Immediate(op_code.get_bits(7..=11))
                };
                AluSecondOperandInfo::Register {
                    shift_op,
                    shift_kind: op_code.get_bits(5..=6).into(),
                    register: op_code.get_bits(0..=3),
                }
            };

            Ok(Self::DataProcessing {
                alu_instruction: op_code.get_bits(21..=24).into(),
                set_conditions: op_code.get_bit(20),
                rn: op_code.get_bits(16..=19),
                destination: op_code.get_bits(12..=15),
                op2,
            })
        } else if op_code.get_bits(26..=27) == 0b01 {
            let offset_info = if op_code.get_bit(25) {
                SingleDataTransferOffsetInfo::RegisterImmediate {
                    shift_amount: op_code.get_bits(7..=11),
                    shift_kind: op_code.get_bits(5..=6).into(),
                    reg_offset: op_code.get_bits(0..=3),
                }
            } else {
                SingleDataTransferOffsetInfo::Immediate {
                    offset: op_code.get_bits(0..=11),
                }
            };

            Ok(Self::SingleDataTransfer {
                kind: op_code.get_bit(20).into(),
                quantity: op_code.get_bit(22).into(),
                write_back: op_code.get_bit(21),
                indexing: op_code.get_bit(24).into(),
                offsetting: op_code.get_bit(23).into(),
                rd: op_code.get_bits(12..=15),
                base_register: op_code.get_bits(16..=19),
                offset_info,
            })
        } else if op_code.get_bits(25..=27) == 0b100 {
            Ok(Self::BlockDataTransfer {
                indexing: op_code.get_bit(24).into(),
                offsetting: op_code.get_bit(23).into(),
                load_psr: op_code.get_bit(22),
                write_back: op_code.get_bit(21),
                load_store: op_code.get_bit(20).into(),
                rn: op_code.get_bits(16..=19),
                register_list: op_code.get_bits(0..=15),
            })
        } else if op_code.get_bits(25..=27) == 0b101 {
            Ok(Self::Branch {
                link: op_code.get_bit(24),
                offset: op_code.get_bits(0..=23),
            })
        } else if op_code.get_bits(24..=27) == 0b1111 {
            Ok(Self::SoftwareInterrupt {
                comment: op_code.get_bits(0..=23),
            })
        } else {
            Err(String::from("coprocessor or undefined instruction class"))
        }
    }
}
