//! # IOC: timers and interrupt aggregation
//!
//! The IOC carries two 16-bit countdown timers and three interrupt banks
//! (IRQ-A, IRQ-B, FIQ). Each bank is a request/mask pair; the status the
//! CPU reads is always `request & mask` and is never stored. The aggregated
//! [`Ioc::irq_line`]/[`Ioc::fiq_line`] outputs drive the CPU's interrupt
//! inputs once per frame.

use crate::bitwise::Bits;

/// IRQ-A bit asserted once per video frame (vertical flyback).
pub const IRQ_A_VFLYBACK: u8 = 1 << 3;
/// IRQ-A bit for timer 0 reaching zero.
pub const IRQ_A_TIMER0: u8 = 1 << 5;
/// IRQ-A bit for timer 1 reaching zero.
pub const IRQ_A_TIMER1: u8 = 1 << 6;

/// One 16-bit countdown timer. The counter runs from `latch` down to zero
/// and reloads from `latch + 1` ticks worth of period.
pub struct Timer {
    /// Reload value.
    pub latch: u16,
    /// Current countdown value, always within `[0, latch]`.
    pub counter: u16,
    /// Snapshot taken by the latch command, read through the count
    /// registers.
    pub latched_read: u16,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            latch: 0xFFFF,
            counter: 0xFFFF,
            latched_read: 0,
        }
    }
}

impl Timer {
    /// Advances the countdown by `cycles` ticks. Returns true when the
    /// counter reached or crossed zero (and reloaded).
    fn update(&mut self, cycles: u32) -> bool {
        let remaining = u32::from(self.counter);
        if cycles < remaining {
            self.counter = (remaining - cycles) as u16;
            return false;
        }

        let period = u32::from(self.latch) + 1;
        let overshoot = (cycles - remaining) % period;
        self.counter = (period - 1 - overshoot) as u16;
        true
    }

    fn set_latch_byte(&mut self, byte_nth: u8, value: u8) {
        self.latch.set_byte(byte_nth, value);
        // keep the countdown inside the new period
        if self.counter > self.latch {
            self.counter = self.latch;
        }
    }

    /// The latch command: snapshot the running counter for reading and
    /// restart the countdown from the reload value.
    fn latch_command(&mut self) {
        self.latched_read = self.counter;
        self.counter = self.latch;
    }
}

/// One request/mask pair. Requests are set by hardware events and cleared
/// by writing ones; the mask replaces on write.
#[derive(Default)]
pub struct InterruptBank {
    pub request: u8,
    pub mask: u8,
}

impl InterruptBank {
    /// `status = request & mask`, computed on every read.
    #[must_use]
    pub const fn status(&self) -> u8 {
        self.request & self.mask
    }

    const fn active(&self) -> bool {
        self.status() != 0
    }
}

/// The IOC register file, exposed as word offsets within the IOC window.
pub struct Ioc {
    pub control: u8,
    pub timer0: Timer,
    pub timer1: Timer,
    pub irq_a: InterruptBank,
    pub irq_b: InterruptBank,
    pub fiq: InterruptBank,
}

impl Default for Ioc {
    fn default() -> Self {
        Self {
            control: 0,
            timer0: Timer::default(),
            timer1: Timer::default(),
            // the timer interrupts come up enabled
            irq_a: InterruptBank {
                request: 0,
                mask: IRQ_A_TIMER0 | IRQ_A_TIMER1,
            },
            irq_b: InterruptBank::default(),
            fiq: InterruptBank::default(),
        }
    }
}

impl Ioc {
    /// Advances both timers by one frame's worth of cycles and raises the
    /// corresponding IRQ-A requests.
    pub fn update_timers(&mut self, cycles: u32) {
        if self.timer0.update(cycles) {
            self.irq_a.request |= IRQ_A_TIMER0;
        }
        if self.timer1.update(cycles) {
            self.irq_a.request |= IRQ_A_TIMER1;
        }
    }

    /// End-of-frame vertical flyback request.
    pub fn assert_vertical_flyback(&mut self) {
        self.irq_a.request |= IRQ_A_VFLYBACK;
    }

    #[must_use]
    pub const fn irq_line(&self) -> bool {
        self.irq_a.active() || self.irq_b.active()
    }

    #[must_use]
    pub const fn fiq_line(&self) -> bool {
        self.fiq.active()
    }

    /// Word read of the register at word offset `offset` within the IOC
    /// window. Narrow registers read back zero-extended.
    pub fn read_register(&self, offset: u32) -> u32 {
        match offset {
            0 => self.control.into(),
            1 => self.timer0.latched_read.get_byte(0).into(),
            2 => self.timer0.latched_read.get_byte(1).into(),
            3 => self.timer1.latched_read.get_byte(0).into(),
            4 => self.timer1.latched_read.get_byte(1).into(),
            // the latch commands are write-only
            5 | 6 => 0,
            7 => self.irq_a.status().into(),
            8 => self.irq_a.request.into(),
            9 => self.irq_a.mask.into(),
            10 => self.irq_b.status().into(),
            11 => self.irq_b.request.into(),
            12 => self.irq_b.mask.into(),
            13 => self.fiq.status().into(),
            14 => self.fiq.request.into(),
            15 => self.fiq.mask.into(),
            _ => {
                logger::warn(format!("IOC read at unimplemented offset {offset}"));
                0
            }
        }
    }

    pub fn write_register(&mut self, offset: u32, value: u32) {
        match offset {
            0 => self.control = value as u8,
            1 => self.timer0.set_latch_byte(0, value as u8),
            2 => self.timer0.set_latch_byte(1, value as u8),
            3 => self.timer1.set_latch_byte(0, value as u8),
            4 => self.timer1.set_latch_byte(1, value as u8),
            5 => self.timer0.latch_command(),
            6 => self.timer1.latch_command(),
            // acknowledged interrupts are cleared by writing ones
            8 => self.irq_a.request &= !(value as u8),
            11 => self.irq_b.request &= !(value as u8),
            14 => self.fiq.request &= !(value as u8),
            9 => self.irq_a.mask = value as u8,
            12 => self.irq_b.mask = value as u8,
            15 => self.fiq.mask = value as u8,
            // the status registers are read-only views of request & mask
            7 | 10 | 13 => {}
            _ => logger::warn(format!(
                "IOC write at unimplemented offset {offset} (value 0x{value:08X})"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn timer_counts_down_and_fires() {
        let mut ioc = Ioc::default();
        // latch = 1000 via the byte registers, then go
        ioc.write_register(1, 1000 & 0xFF);
        ioc.write_register(2, 1000 >> 8);
        ioc.write_register(5, 0);
        assert_eq!(ioc.timer0.counter, 1000);

        ioc.update_timers(20_000);

        assert_ne!(ioc.irq_a.request & IRQ_A_TIMER0, 0);
        assert!(ioc.irq_line());
        assert!(ioc.timer0.counter <= ioc.timer0.latch);
    }

    #[test]
    fn timer_does_not_fire_before_zero() {
        let mut ioc = Ioc::default();
        ioc.update_timers(100);

        assert_eq!(ioc.irq_a.request, 0);
        assert_eq!(ioc.timer0.counter, 0xFFFF - 100);
        assert!(!ioc.irq_line());
    }

    #[test]
    fn timer_counter_stays_in_range() {
        let mut ioc = Ioc::default();
        ioc.write_register(1, 9);
        ioc.write_register(2, 0);
        ioc.write_register(5, 0);

        for _ in 0..50 {
            ioc.update_timers(7);
            assert!(ioc.timer0.counter <= ioc.timer0.latch);
        }
    }

    #[test]
    fn latch_command_snapshots_the_counter() {
        let mut ioc = Ioc::default();
        ioc.update_timers(0x10);

        ioc.write_register(5, 0);
        assert_eq!(ioc.timer0.latched_read, 0xFFEF);
        assert_eq!(ioc.read_register(1), 0xEF);
        assert_eq!(ioc.read_register(2), 0xFF);
        // the countdown restarted from the reload value
        assert_eq!(ioc.timer0.counter, 0xFFFF);
    }

    #[test]
    fn request_bits_clear_by_writing_ones() {
        let mut ioc = Ioc::default();
        ioc.irq_a.request = IRQ_A_TIMER0 | IRQ_A_VFLYBACK;

        ioc.write_register(8, IRQ_A_TIMER0.into());

        assert_eq!(ioc.irq_a.request, IRQ_A_VFLYBACK);
    }

    #[test]
    fn status_is_request_and_mask() {
        let mut ioc = Ioc::default();
        ioc.assert_vertical_flyback();

        // flyback is requested but masked off by default
        assert_eq!(ioc.read_register(8) as u8 & IRQ_A_VFLYBACK, IRQ_A_VFLYBACK);
        assert_eq!(ioc.read_register(7) as u8 & IRQ_A_VFLYBACK, 0);
        assert!(!ioc.irq_line());

        ioc.write_register(9, IRQ_A_VFLYBACK.into());
        assert_eq!(ioc.read_register(7) as u8 & IRQ_A_VFLYBACK, IRQ_A_VFLYBACK);
        assert!(ioc.irq_line());
    }

    #[test]
    fn fiq_line_follows_its_bank() {
        let mut ioc = Ioc::default();
        assert!(!ioc.fiq_line());

        ioc.fiq.request = 0b1;
        assert!(!ioc.fiq_line());

        ioc.write_register(15, 0b1);
        assert!(ioc.fiq_line());

        ioc.write_register(14, 0b1);
        assert!(!ioc.fiq_line());
    }

    #[test]
    fn control_register_round_trips() {
        let mut ioc = Ioc::default();
        ioc.write_register(0, 0x5A);
        assert_eq!(ioc.read_register(0), 0x5A);
    }
}
