//! # Banked registers
//!
//! Each mode owns a private R13/R14 and (except User) an SPSR; FIQ
//! additionally owns R8-R12. The storage is a set of tables indexed by
//! [`Mode::bank_index`], so a mode switch is a pair of table exchanges
//! rather than a branch per mode.

use crate::cpu::cpu_modes::Mode;
use crate::cpu::psr::Psr;
use crate::cpu::registers::Registers;

/// One bank per mode.
const BANKS: usize = 4;

/// Storage for the registers that are swapped on a mode change.
#[derive(Default)]
pub struct RegisterBank {
    r13: [u32; BANKS],
    r14: [u32; BANKS],
    spsr: [Psr; BANKS],

    /// R8-R12 as seen by every mode except FIQ.
    r8_r12_common: [u32; 5],
    /// R8-R12 as seen by FIQ.
    r8_r12_fiq: [u32; 5],
}

impl RegisterBank {
    /// Parks the visible R13/R14, R8-R12 and SPSR of `mode`.
    pub fn store(&mut self, mode: Mode, registers: &Registers, spsr: Psr) {
        let idx = mode.bank_index();
        self.r13[idx] = registers.register_at(13);
        self.r14[idx] = registers.register_at(14);
        self.spsr[idx] = spsr;

        let shadow = if mode == Mode::Fiq {
            &mut self.r8_r12_fiq
        } else {
            &mut self.r8_r12_common
        };
        for (i, slot) in shadow.iter_mut().enumerate() {
            *slot = registers.register_at(8 + i);
        }
    }

    /// Makes `mode`'s bank visible. Returns the mode's SPSR, or `None` for
    /// User, which has none.
    pub fn load(&self, mode: Mode, registers: &mut Registers) -> Option<Psr> {
        let idx = mode.bank_index();
        registers.set_register_at(13, self.r13[idx]);
        registers.set_register_at(14, self.r14[idx]);

        let shadow = if mode == Mode::Fiq {
            &self.r8_r12_fiq
        } else {
            &self.r8_r12_common
        };
        for (i, value) in shadow.iter().enumerate() {
            registers.set_register_at(8 + i, *value);
        }

        (mode != Mode::User).then(|| self.spsr[idx])
    }

    /// The User bank's R13 or R14, read while another mode is active
    /// (LDM/STM with the S bit).
    #[must_use]
    pub const fn user_r13_r14(&self, reg: usize) -> u32 {
        match reg {
            13 => self.r13[0],
            14 => self.r14[0],
            _ => panic!("only R13/R14 live in the user bank"),
        }
    }

    pub fn set_user_r13_r14(&mut self, reg: usize, value: u32) {
        match reg {
            13 => self.r13[0] = value,
            14 => self.r14[0] = value,
            _ => panic!("only R13/R14 live in the user bank"),
        }
    }

    /// The non-FIQ view of R8-R12, read while FIQ is active.
    #[must_use]
    pub const fn common_r8_r12(&self, reg: usize) -> u32 {
        self.r8_r12_common[reg - 8]
    }

    pub fn set_common_r8_r12(&mut self, reg: usize, value: u32) {
        self.r8_r12_common[reg - 8] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn store_load_round_trip() {
        let mut bank = RegisterBank::default();
        let mut registers = Registers::default();

        registers.set_register_at(13, 0x1000);
        registers.set_register_at(14, 0x2000);
        let mut spsr = Psr::from(Mode::Irq);
        spsr.set_carry_flag(true);

        bank.store(Mode::Irq, &registers, spsr);

        registers.set_register_at(13, 0);
        registers.set_register_at(14, 0);

        let restored = bank.load(Mode::Irq, &mut registers).unwrap();
        assert_eq!(registers.register_at(13), 0x1000);
        assert_eq!(registers.register_at(14), 0x2000);
        assert!(restored.carry_flag());
    }

    #[test]
    fn user_has_no_spsr() {
        let bank = RegisterBank::default();
        let mut registers = Registers::default();

        assert!(bank.load(Mode::User, &mut registers).is_none());
        assert!(bank.load(Mode::Supervisor, &mut registers).is_some());
    }

    #[test]
    fn fiq_bank_is_separate() {
        let mut bank = RegisterBank::default();
        let mut registers = Registers::default();

        for r in 8..=12 {
            registers.set_register_at(r, r as u32 * 10);
        }
        bank.store(Mode::Supervisor, &registers, Psr::default());

        for r in 8..=12 {
            registers.set_register_at(r, 0xDEAD);
        }
        bank.store(Mode::Fiq, &registers, Psr::default());

        bank.load(Mode::Supervisor, &mut registers);
        for r in 8..=12 {
            assert_eq!(registers.register_at(r), r as u32 * 10);
            assert_eq!(bank.common_r8_r12(r), r as u32 * 10);
        }
    }

    #[test]
    fn user_r13_r14_accessors() {
        let mut bank = RegisterBank::default();
        bank.set_user_r13_r14(13, 7);
        bank.set_user_r13_r14(14, 8);
        assert_eq!(bank.user_r13_r14(13), 7);
        assert_eq!(bank.user_r13_r14(14), 8);
    }
}
