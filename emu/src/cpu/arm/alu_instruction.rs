//! # ALU opcodes and the barrel shifter
//!
//! Data processing instruction format:
//!
//! ```text
//! 31-28  27-26  25   24-21   20   19-16  15-12  11-0
//! [Cond] [ 00 ] [I] [OpCode] [S] [ Rn ] [ Rd ] [Operand2]
//! ```
//!
//! With I=0 Operand2 is a register passed through the barrel shifter, with
//! I=1 it is an 8-bit immediate rotated right by twice a 4-bit field. The
//! shifter runs for free alongside the ALU; its carry-out becomes the C
//! flag for the logical opcodes (the arithmetic opcodes produce their own
//! carry).

use crate::bitwise::Bits;
use crate::cpu::flags::ShiftKind;

/// The 16 data processing operations, bits 24-21 of the instruction.
///
/// Logical operations (AND, EOR, TST, TEQ, ORR, MOV, BIC, MVN) take their
/// carry from the barrel shifter; arithmetic operations (SUB, RSB, ADD,
/// ADC, SBC, RSC, CMP, CMN) take it from the ALU.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AluInstruction {
    /// Logical AND: `Rd = Rn AND Op2`
    And = 0x0,
    /// Exclusive OR: `Rd = Rn XOR Op2`
    Eor = 0x1,
    /// Subtract: `Rd = Rn - Op2`
    Sub = 0x2,
    /// Reverse Subtract: `Rd = Op2 - Rn`
    Rsb = 0x3,
    /// Add: `Rd = Rn + Op2`
    Add = 0x4,
    /// Add with Carry: `Rd = Rn + Op2 + C`
    Adc = 0x5,
    /// Subtract with Carry: `Rd = Rn - Op2 - !C`
    Sbc = 0x6,
    /// Reverse Subtract with Carry: `Rd = Op2 - Rn - !C`
    Rsc = 0x7,
    /// Test bits (AND, flags only, no result written)
    Tst = 0x8,
    /// Test Equivalence (XOR, flags only, no result written)
    Teq = 0x9,
    /// Compare (SUB, flags only, no result written)
    Cmp = 0xA,
    /// Compare Negative (ADD, flags only, no result written)
    Cmn = 0xB,
    /// Logical OR: `Rd = Rn OR Op2`
    Orr = 0xC,
    /// Move: `Rd = Op2` (Rn is ignored)
    Mov = 0xD,
    /// Bit Clear: `Rd = Rn AND NOT Op2`
    Bic = 0xE,
    /// Move Not: `Rd = NOT Op2` (Rn is ignored)
    Mvn = 0xF,
}

/// Classification that decides where the carry flag comes from.
#[derive(Eq, PartialEq, Debug)]
pub enum AluInstructionKind {
    Logical,
    Arithmetic,
}

impl AluInstruction {
    #[must_use]
    pub const fn kind(self) -> AluInstructionKind {
        match self {
            Self::And
            | Self::Eor
            | Self::Tst
            | Self::Teq
            | Self::Orr
            | Self::Mov
            | Self::Bic
            | Self::Mvn => AluInstructionKind::Logical,
            Self::Sub
            | Self::Rsb
            | Self::Add
            | Self::Adc
            | Self::Sbc
            | Self::Rsc
            | Self::Cmp
            | Self::Cmn => AluInstructionKind::Arithmetic,
        }
    }

    /// The flags-only opcodes update the flags even without the S bit and
    /// never write Rd.
    #[must_use]
    pub const fn is_test(self) -> bool {
        matches!(self, Self::Tst | Self::Teq | Self::Cmp | Self::Cmn)
    }
}

impl From<u32> for AluInstruction {
    fn from(alu_op_code: u32) -> Self {
        match alu_op_code {
            0x0 => Self::And,
            0x1 => Self::Eor,
            0x2 => Self::Sub,
            0x3 => Self::Rsb,
            0x4 => Self::Add,
            0x5 => Self::Adc,
            0x6 => Self::Sbc,
            0x7 => Self::Rsc,
            0x8 => Self::Tst,
            0x9 => Self::Teq,
            0xA => Self::Cmp,
            0xB => Self::Cmn,
            0xC => Self::Orr,
            0xD => Self::Mov,
            0xE => Self::Bic,
            0xF => Self::Mvn,
            _ => unreachable!(),
        }
    }
}

/// Result of an ALU or shifter operation together with the flags it
/// produces. A shift only fills `result` and `carry`.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Default)]
pub struct ArithmeticOpResult {
    pub result: u32,
    /// Carry flag (C): last bit shifted out, or unsigned carry-out.
    pub carry: bool,
    /// Overflow flag (V): signed arithmetic overflow.
    pub overflow: bool,
    /// Sign flag (N): bit 31 of the result.
    pub sign: bool,
    /// Zero flag (Z): result is exactly zero.
    pub zero: bool,
}

/// Performs one barrel shifter operation.
///
/// Immediate shift amounts use the encoding's special cases: `LSL #0`
/// leaves value and carry alone, `LSR #0` and `ASR #0` mean a shift by 32,
/// and `ROR #0` is RRX (rotate right by one through carry). Register
/// amounts arrive here verbatim; a zero register amount never reaches this
/// function (the caller short-circuits it).
pub fn shift(kind: ShiftKind, shift_amount: u32, rm: u32, carry: bool) -> ArithmeticOpResult {
    match kind {
        ShiftKind::Lsl => match shift_amount {
            // LSL#0: no shift performed, the C flag is NOT affected
            0 => ArithmeticOpResult {
                result: rm,
                carry,
                ..Default::default()
            },
            1..=31 => ArithmeticOpResult {
                result: rm << shift_amount,
                carry: rm.get_bit((32 - shift_amount) as u8),
                ..Default::default()
            },
            32 => ArithmeticOpResult {
                result: 0,
                carry: rm.get_bit(0),
                ..Default::default()
            },
            _ => ArithmeticOpResult {
                result: 0,
                carry: false,
                ..Default::default()
            },
        },
        ShiftKind::Lsr => match shift_amount {
            // LSR#0 encodes LSR#32: zero result, carry = bit 31 of Rm
            0 | 32 => ArithmeticOpResult {
                result: 0,
                carry: rm.get_bit(31),
                ..Default::default()
            },
            1..=31 => ArithmeticOpResult {
                result: rm >> shift_amount,
                carry: rm.get_bit((shift_amount - 1) as u8),
                ..Default::default()
            },
            _ => ArithmeticOpResult {
                result: 0,
                carry: false,
                ..Default::default()
            },
        },
        ShiftKind::Asr => match shift_amount {
            1..=31 => ArithmeticOpResult {
                result: ((rm as i32) >> shift_amount) as u32,
                carry: rm.get_bit((shift_amount - 1) as u8),
                ..Default::default()
            },
            // ASR#0 encodes ASR#32; every amount past 31 saturates to the
            // sign bit
            _ => ArithmeticOpResult {
                result: ((rm as i32) >> 31) as u32,
                carry: rm.get_bit(31),
                ..Default::default()
            },
        },
        ShiftKind::Ror => {
            // ROR by n > 32 behaves as ROR by n - 32, repeatedly
            let amount = if shift_amount > 32 {
                let m = shift_amount % 32;
                if m == 0 {
                    32
                } else {
                    m
                }
            } else {
                shift_amount
            };

            match amount {
                // ROR#0 encodes RRX: carry goes in at bit 31, bit 0 goes out
                0 => ArithmeticOpResult {
                    result: (rm >> 1) | (u32::from(carry) << 31),
                    carry: rm.get_bit(0),
                    ..Default::default()
                },
                32 => ArithmeticOpResult {
                    result: rm,
                    carry: rm.get_bit(31),
                    ..Default::default()
                },
                _ => ArithmeticOpResult {
                    result: rm.rotate_right(amount),
                    carry: rm.get_bit((amount - 1) as u8),
                    ..Default::default()
                },
            }
        }
    }
}

/// Operand2 immediate form: an 8-bit value rotated right by twice the 4-bit
/// rotate field. A non-zero rotation replaces the shifter carry with bit 31
/// of the rotated value.
pub fn rotated_immediate(base: u32, rotate: u32, carry: bool) -> ArithmeticOpResult {
    let result = base.rotate_right(rotate * 2);
    ArithmeticOpResult {
        result,
        carry: if rotate == 0 {
            carry
        } else {
            result.get_bit(31)
        },
        ..Default::default()
    }
}

/// How the shift amount of a register operand is specified.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ShiftOperator {
    /// Amount is a 5-bit immediate (0-31, with the 0 special cases).
    Immediate(u32),
    /// Amount is the bottom byte of a register.
    Register(u32),
}

/// The second operand of a data processing instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AluSecondOperandInfo {
    /// Register operand with optional shift.
    Register {
        shift_op: ShiftOperator,
        shift_kind: ShiftKind,
        register: u32,
    },
    /// 8-bit immediate with a 4-bit rotate field.
    Immediate { base: u32, rotate: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classify_instructions() {
        assert_eq!(AluInstruction::Teq.kind(), AluInstructionKind::Logical);
        assert_eq!(AluInstruction::Sub.kind(), AluInstructionKind::Arithmetic);
        assert!(AluInstruction::Cmp.is_test());
        assert!(!AluInstruction::Mov.is_test());
    }

    #[test]
    fn lsl_zero_keeps_value_and_carry() {
        let r = shift(ShiftKind::Lsl, 0, 0xF000_000F, true);
        assert_eq!(r.result, 0xF000_000F);
        assert!(r.carry);
    }

    #[test]
    fn lsl_carries_out_the_last_bit() {
        let r = shift(ShiftKind::Lsl, 1, 0x8000_0001, false);
        assert_eq!(r.result, 2);
        assert!(r.carry);

        let r = shift(ShiftKind::Lsl, 32, 0x0000_0001, false);
        assert_eq!(r.result, 0);
        assert!(r.carry);

        let r = shift(ShiftKind::Lsl, 33, 0xFFFF_FFFF, true);
        assert_eq!(r.result, 0);
        assert!(!r.carry);
    }

    #[test]
    fn lsr_zero_means_thirty_two() {
        let r = shift(ShiftKind::Lsr, 0, 0x8000_0000, false);
        assert_eq!(r.result, 0);
        assert!(r.carry);

        let r = shift(ShiftKind::Lsr, 0, 0x7FFF_FFFF, true);
        assert_eq!(r.result, 0);
        assert!(!r.carry);
    }

    #[test]
    fn asr_sign_extends() {
        let r = shift(ShiftKind::Asr, 4, 0x8000_0000, false);
        assert_eq!(r.result, 0xF800_0000);
        assert!(!r.carry);

        // ASR#0 encodes ASR#32
        let r = shift(ShiftKind::Asr, 0, 0x8000_0000, false);
        assert_eq!(r.result, 0xFFFF_FFFF);
        assert!(r.carry);

        let r = shift(ShiftKind::Asr, 40, 0x7FFF_FFFF, true);
        assert_eq!(r.result, 0);
        assert!(!r.carry);
    }

    #[test]
    fn ror_zero_is_rrx() {
        let r = shift(ShiftKind::Ror, 0, 0b11, true);
        assert_eq!(r.result, 0x8000_0001);
        assert!(r.carry);

        let r = shift(ShiftKind::Ror, 0, 0b10, false);
        assert_eq!(r.result, 0b1);
        assert!(!r.carry);
    }

    #[test]
    fn ror_thirty_two_and_beyond() {
        let r = shift(ShiftKind::Ror, 32, 0x8000_0001, false);
        assert_eq!(r.result, 0x8000_0001);
        assert!(r.carry);

        // ROR#36 behaves as ROR#4
        let r = shift(ShiftKind::Ror, 36, 0x0000_00F0, false);
        assert_eq!(r.result, 0x0000_000F);
        assert!(!r.carry);
    }

    #[test]
    fn rotated_immediate_carry() {
        // no rotation: carry-in survives
        let r = rotated_immediate(0xFF, 0, true);
        assert_eq!(r.result, 0xFF);
        assert!(r.carry);

        // rotation by 4 puts 0xF0000000 in front, bit 31 becomes the carry
        let r = rotated_immediate(0xFF, 2, false);
        assert_eq!(r.result, 0xF000_000F);
        assert!(r.carry);
    }
}
