//! # The physical memory map
//!
//! Every address is masked to 26 bits and decoded in order:
//!
//! 1. the ROM mirrors (the boot-time one at zero and the permanent one at
//!    0x02000000),
//! 2. RAM at the bottom of the map,
//! 3. the IOC and VIDC register windows,
//! 4. the ROM itself,
//! 5. everything else: reads return the all-ones sentinel, writes are
//!    dropped, both with a diagnostic.
//!
//! The boot-time mirror makes the reset-vector fetch land in ROM; the
//! first word write to the MEMC boot latch removes it. Misaligned word
//! reads rotate the addressed byte into the low lane the way the bus does;
//! word writes land on the containing aligned word.

use crate::config::EmuConfig;
use crate::io::ioc::Ioc;
use crate::io::vidc::Vidc;
use crate::render::Frame;

use crate::bitwise::Bits;

/// 26-bit physical address space.
pub const ADDR_MASK: u32 = 0x03FF_FFFF;

/// IOC register window.
pub const IOC_BASE: u32 = 0x0320_0000;
/// VIDC register window; also the end of the IOC window.
pub const VIDC_BASE: u32 = 0x0340_0000;
/// End of the VIDC window.
pub const VIDC_END: u32 = 0x0360_0000;

/// The MEMC control address whose first word write ends boot mode.
pub const MEMC_BOOT_LATCH: u32 = 0x0360_0000;

/// Permanent ROM mirror.
const ROM_MIRROR_BASE: u32 = 0x0200_0000;
const ROM_MIRROR_END: u32 = 0x0220_0000;
/// Boot-time ROM mirror window at address zero.
const BOOT_MIRROR_END: u32 = 0x0020_0000;

/// Returned by reads that decode to nothing; also the fatal-fetch marker.
pub const INVALID_READ: u32 = 0xFFFF_FFFF;

/// The physical memory map: RAM, ROM and the two peripheral register
/// windows. Owns the peripherals so that every side effect of an access is
/// observable through `read_*`/`write_*` alone.
pub struct MemoryMap {
    ram: Vec<u8>,
    rom: Vec<u8>,
    rom_base: u32,
    is_boot_mode: bool,

    pub ioc: Ioc,
    pub vidc: Vidc,
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new(Vec::new(), &EmuConfig::default())
    }
}

impl MemoryMap {
    #[must_use]
    pub fn new(rom: Vec<u8>, config: &EmuConfig) -> Self {
        Self {
            ram: vec![0; config.ram_size],
            rom,
            rom_base: config.rom_base,
            is_boot_mode: true,
            ioc: Ioc::default(),
            vidc: Vidc::default(),
        }
    }

    /// While true, ROM is mirrored at address zero so the reset vector
    /// fetch lands in ROM.
    #[must_use]
    pub const fn is_boot_mode(&self) -> bool {
        self.is_boot_mode
    }

    pub fn read_word(&self, address: u32) -> u32 {
        let address = address & ADDR_MASK;
        let word = self.read_word_aligned(address & !3);

        // a misaligned load rotates the addressed byte into the low lane
        word.rotate_right((address & 3) * 8)
    }

    fn read_word_aligned(&self, address: u32) -> u32 {
        if self.in_rom_mirror(address) {
            return self.mirror_word(address);
        }

        if (address as usize) < self.ram.len() {
            let i = address as usize;
            return u32::from_le_bytes([
                self.ram[i],
                self.ram[i + 1],
                self.ram[i + 2],
                self.ram[i + 3],
            ]);
        }

        if (IOC_BASE..VIDC_BASE).contains(&address) {
            return self.ioc.read_register((address - IOC_BASE) >> 2);
        }
        if (VIDC_BASE..VIDC_END).contains(&address) {
            return self.vidc.read_register((address - VIDC_BASE) >> 2);
        }

        if let Some(offset) = self.rom_offset(address) {
            if offset + 4 <= self.rom.len() {
                return u32::from_le_bytes([
                    self.rom[offset],
                    self.rom[offset + 1],
                    self.rom[offset + 2],
                    self.rom[offset + 3],
                ]);
            }
            logger::warn(format!("ROM read beyond image at 0x{address:08X}"));
            return INVALID_READ;
        }

        logger::warn(format!("invalid read at 0x{address:08X}"));
        INVALID_READ
    }

    pub fn write_word(&mut self, address: u32, value: u32) {
        let address = address & ADDR_MASK & !3;

        if self.in_rom_mirror(address) || self.rom_offset(address).is_some() {
            logger::warn(format!(
                "write to ROM at 0x{address:08X} ignored (boot mode: {})",
                self.is_boot_mode
            ));
            return;
        }

        if (address as usize) < self.ram.len() {
            let i = address as usize;
            self.ram[i..i + 4].copy_from_slice(&value.to_le_bytes());
            return;
        }

        if (IOC_BASE..VIDC_BASE).contains(&address) {
            self.ioc.write_register((address - IOC_BASE) >> 2, value);
            return;
        }
        if (VIDC_BASE..VIDC_END).contains(&address) {
            self.vidc.write_register((address - VIDC_BASE) >> 2, value);
            return;
        }

        if address == MEMC_BOOT_LATCH {
            if self.is_boot_mode {
                logger::info("MEMC write ends boot mode, ROM mirror at zero removed");
            }
            self.is_boot_mode = false;
            return;
        }

        logger::warn(format!(
            "invalid write at 0x{address:08X} = 0x{value:08X}"
        ));
    }

    pub fn read_byte(&self, address: u32) -> u8 {
        let address = address & ADDR_MASK;

        if self.in_rom_mirror(address) {
            return self.mirror_byte(address);
        }

        if (address as usize) < self.ram.len() {
            return self.ram[address as usize];
        }

        if (IOC_BASE..VIDC_END).contains(&address) {
            // IO registers are word-shaped; pick the addressed byte
            let word = self.read_word_aligned(address & !3);
            return word.get_byte((address & 3) as u8);
        }

        if let Some(offset) = self.rom_offset(address) {
            return self.rom[offset];
        }

        logger::warn(format!("invalid byte read at 0x{address:08X}"));
        0xFF
    }

    pub fn write_byte(&mut self, address: u32, value: u8) {
        let address = address & ADDR_MASK;

        if self.in_rom_mirror(address) || self.rom_offset(address).is_some() {
            logger::warn(format!(
                "byte write to ROM at 0x{address:08X} ignored (boot mode: {})",
                self.is_boot_mode
            ));
            return;
        }

        if (address as usize) < self.ram.len() {
            self.ram[address as usize] = value;
            return;
        }

        if (IOC_BASE..VIDC_END).contains(&address) {
            // read-modify-write the containing word register
            let aligned = address & !3;
            let mut word = self.read_word_aligned(aligned);
            word.set_byte((address & 3) as u8, value);
            self.write_word(aligned, word);
            return;
        }

        logger::warn(format!(
            "invalid byte write at 0x{address:08X} = 0x{value:02X}"
        ));
    }

    /// End-of-frame scanout: the VIDC reads the framebuffer straight out
    /// of RAM.
    #[must_use]
    pub fn render_frame(&self) -> Frame {
        self.vidc.render(&self.ram)
    }

    fn in_rom_mirror(&self, address: u32) -> bool {
        (ROM_MIRROR_BASE..ROM_MIRROR_END).contains(&address)
            || (self.is_boot_mode && address < BOOT_MIRROR_END)
    }

    /// Offset into the ROM image for the directly mapped window.
    fn rom_offset(&self, address: u32) -> Option<usize> {
        let len = self.rom.len() as u32;
        (len > 0 && (self.rom_base..self.rom_base + len).contains(&address))
            .then(|| (address - self.rom_base) as usize)
    }

    /// Mirror reads wrap around the image length.
    fn mirror_word(&self, address: u32) -> u32 {
        if self.rom.is_empty() {
            logger::warn(format!("ROM mirror read at 0x{address:08X} with no image"));
            return INVALID_READ;
        }

        let offset = ((address & 0x001F_FFFF) as usize) % self.rom.len();
        if offset + 4 <= self.rom.len() {
            u32::from_le_bytes([
                self.rom[offset],
                self.rom[offset + 1],
                self.rom[offset + 2],
                self.rom[offset + 3],
            ])
        } else {
            logger::warn(format!("ROM mirror read beyond image at 0x{address:08X}"));
            INVALID_READ
        }
    }

    fn mirror_byte(&self, address: u32) -> u8 {
        if self.rom.is_empty() {
            logger::warn(format!("ROM mirror read at 0x{address:08X} with no image"));
            return 0xFF;
        }

        let offset = ((address & 0x001F_FFFF) as usize) % self.rom.len();
        self.rom[offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn map_with_rom(rom: Vec<u8>) -> MemoryMap {
        MemoryMap::new(rom, &EmuConfig::default())
    }

    #[test]
    fn ram_word_round_trip() {
        let mut memory = map_with_rom(Vec::new());
        memory.write_word(MEMC_BOOT_LATCH, 0);

        memory.write_word(0x1000, 0xCAFE_BABE);
        assert_eq!(memory.read_word(0x1000), 0xCAFE_BABE);
    }

    #[test]
    fn word_and_byte_views_agree() {
        let mut memory = map_with_rom(Vec::new());
        memory.write_word(MEMC_BOOT_LATCH, 0);

        memory.write_word(0x1000, 0x0403_0201);

        assert_eq!(memory.read_byte(0x1000), 0x01);
        assert_eq!(memory.read_byte(0x1001), 0x02);
        assert_eq!(memory.read_byte(0x1002), 0x03);
        assert_eq!(memory.read_byte(0x1003), 0x04);
    }

    #[test]
    fn byte_writes_do_not_disturb_neighbours() {
        let mut memory = map_with_rom(Vec::new());
        memory.write_word(MEMC_BOOT_LATCH, 0);

        memory.write_word(0x1000, 0xFFFF_FFFF);
        memory.write_byte(0x1001, 0x00);

        assert_eq!(memory.read_word(0x1000), 0xFFFF_00FF);
    }

    #[test]
    fn misaligned_reads_rotate() {
        let mut memory = map_with_rom(Vec::new());
        memory.write_word(MEMC_BOOT_LATCH, 0);

        memory.write_word(0x1000, 0x0403_0201);

        assert_eq!(memory.read_word(0x1001), 0x0104_0302);
        assert_eq!(memory.read_word(0x1002), 0x0201_0403);
        assert_eq!(memory.read_word(0x1003), 0x0302_0104);
    }

    #[test]
    fn misaligned_writes_land_on_the_aligned_word() {
        let mut memory = map_with_rom(Vec::new());
        memory.write_word(MEMC_BOOT_LATCH, 0);

        memory.write_word(0x1002, 0x1234_5678);
        assert_eq!(memory.read_word(0x1000), 0x1234_5678);
    }

    #[test]
    fn addresses_wrap_at_26_bits() {
        let mut memory = map_with_rom(Vec::new());
        memory.write_word(MEMC_BOOT_LATCH, 0);

        memory.write_word(0xFC00_1000, 7);
        assert_eq!(memory.read_word(0x0000_1000), 7);
    }

    #[test]
    fn boot_mirror_serves_rom_at_zero() {
        let memory = map_with_rom(vec![0x18, 0x00, 0x00, 0xEA, 0xAA, 0xBB, 0xCC, 0xDD]);

        assert!(memory.is_boot_mode());
        assert_eq!(memory.read_word(0), 0xEA00_0018);
        assert_eq!(memory.read_word(4), 0xDDCC_BBAA);
        // mirror reads wrap around the image length
        assert_eq!(memory.read_word(8), 0xEA00_0018);
        assert_eq!(memory.read_byte(4), 0xAA);
    }

    #[test]
    fn permanent_mirror_survives_boot_mode() {
        let mut memory = map_with_rom(vec![0x01, 0x02, 0x03, 0x04]);
        memory.write_word(MEMC_BOOT_LATCH, 0);

        assert_eq!(memory.read_word(ROM_MIRROR_BASE), 0x0403_0201);
        assert_eq!(memory.read_byte(ROM_MIRROR_BASE + 2), 0x03);
    }

    #[test]
    fn memc_write_clears_boot_mode() {
        let mut memory = map_with_rom(vec![0x01, 0x02, 0x03, 0x04]);
        assert!(memory.is_boot_mode());

        // writes into the mirror are dropped while boot mode holds
        memory.write_word(0x0000_0000, 0xFFFF_FFFF);
        assert_eq!(memory.read_word(0), 0x0403_0201);

        memory.write_word(MEMC_BOOT_LATCH, 0);
        assert!(!memory.is_boot_mode());

        // low addresses are plain RAM now
        memory.write_word(0x0000_0000, 0x1111_2222);
        assert_eq!(memory.read_word(0), 0x1111_2222);
    }

    #[test]
    fn rom_window_reads_and_rejects_writes() {
        let config = EmuConfig::default();
        let mut memory = MemoryMap::new(vec![0xEF, 0xBE, 0xAD, 0xDE], &config);

        assert_eq!(memory.read_word(config.rom_base), 0xDEAD_BEEF);
        assert_eq!(memory.read_byte(config.rom_base + 3), 0xDE);

        memory.write_word(config.rom_base, 0);
        memory.write_byte(config.rom_base, 0);
        assert_eq!(memory.read_word(config.rom_base), 0xDEAD_BEEF);
    }

    #[test]
    fn unmapped_reads_return_the_sentinel() {
        let memory = map_with_rom(Vec::new());

        assert_eq!(memory.read_word(0x03F0_0000), INVALID_READ);
        assert_eq!(memory.read_byte(0x03F0_0000), 0xFF);
    }

    #[test]
    fn unmapped_writes_are_dropped() {
        let mut memory = map_with_rom(Vec::new());
        memory.write_word(0x03F0_0000, 42);
        memory.write_byte(0x03F0_0004, 42);

        assert_eq!(memory.read_word(0x03F0_0000), INVALID_READ);
    }

    #[test]
    fn io_windows_route_to_the_peripherals() {
        let mut memory = map_with_rom(Vec::new());

        // IOC control register
        memory.write_word(IOC_BASE, 0x42);
        assert_eq!(memory.read_word(IOC_BASE), 0x42);

        // VIDC palette entry 1 (word offset 2), masked to 13 bits
        memory.write_word(VIDC_BASE + 2 * 4, 0xFFFF_FFFF);
        assert_eq!(memory.read_word(VIDC_BASE + 2 * 4), 0x1FFF);
    }

    #[test]
    fn io_byte_access_works_on_word_registers() {
        let mut memory = map_with_rom(Vec::new());

        // set timer0 latch low byte, then read it back through the latch
        // command and the byte view of the count register
        memory.write_word(IOC_BASE + 4, 0x34);
        memory.write_word(IOC_BASE + 2 * 4, 0x12);
        memory.write_word(IOC_BASE + 5 * 4, 0);

        assert_eq!(memory.read_byte(IOC_BASE + 4), 0x34);
        assert_eq!(memory.read_byte(IOC_BASE + 2 * 4), 0x12);

        // byte write goes through a read-modify-write of the word register
        memory.write_byte(IOC_BASE, 0x7E);
        assert_eq!(memory.read_word(IOC_BASE), 0x7E);
    }
}
