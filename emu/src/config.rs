use serde::{Deserialize, Serialize};

/// Host-tunable core options. The defaults describe a stock 8 MHz PAL
/// machine: 4 MiB of RAM, ROM at 0x03800000, 160 000 instruction steps per
/// 50 Hz frame.
///
/// Display geometry is driven by the VIDC registers and is deliberately not
/// a configuration option.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmuConfig {
    /// RAM size in bytes (4-16 MiB).
    pub ram_size: usize,
    /// Physical address where the ROM image is mapped.
    pub rom_base: u32,
    /// Instruction budget executed per host frame.
    pub cpu_cycles_per_frame: u32,
    /// Host frame rate the budget is calibrated against.
    pub frame_rate_hz: u32,
}

impl Default for EmuConfig {
    fn default() -> Self {
        Self {
            ram_size: 4 * 1024 * 1024,
            rom_base: 0x0380_0000,
            cpu_cycles_per_frame: 160_000,
            frame_rate_hz: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_describe_a_stock_machine() {
        let config = EmuConfig::default();
        assert_eq!(config.ram_size, 4 * 1024 * 1024);
        assert_eq!(config.rom_base, 0x0380_0000);
        assert_eq!(config.cpu_cycles_per_frame, 160_000);
        assert_eq!(config.frame_rate_hz, 50);
    }
}
