//! # The machine
//!
//! [`Archimedes`] is the single owner of everything mutable: the CPU, the
//! memory map (which owns RAM, ROM, IOC and VIDC) and the host interfaces.
//! One [`Archimedes::run_frame`] is one host frame:
//!
//! 1. poll input (Escape halts the run loop),
//! 2. advance the IOC timers by a frame's worth of cycles and latch the
//!    interrupt lines into the CPU,
//! 3. execute the instruction budget,
//! 4. scan the framebuffer out through the frame sink and assert vertical
//!    flyback for the next frame to observe.

use std::sync::{Arc, Mutex};

use crate::config::EmuConfig;
use crate::cpu::arm3::Arm3;
use crate::input::{InputSource, Key};
use crate::memory::memory_map::MemoryMap;
use crate::render::FrameSink;

/// Largest ROM image the map accepts.
pub const MAX_ROM_SIZE: usize = 2 * 1024 * 1024;

const MIN_RAM_SIZE: usize = 4 * 1024 * 1024;
const MAX_RAM_SIZE: usize = 16 * 1024 * 1024;

/// Errors surfaced by the core.
#[derive(Debug, PartialEq, Eq)]
pub enum CoreError {
    /// The instruction fetch decoded to nothing; execution cannot
    /// continue.
    InvalidPc(u32),
    /// The ROM image exceeds the 2 MiB window.
    RomTooLarge { size: usize },
    /// RAM size outside the supported 4-16 MiB range, or not word-sized.
    BadRamSize { size: usize },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::InvalidPc(address) => {
                write!(fmt, "instruction fetch from invalid address 0x{address:08X}")
            }
            Self::RomTooLarge { size } => {
                write!(fmt, "ROM image of {size} bytes exceeds the 2 MiB window")
            }
            Self::BadRamSize { size } => {
                write!(fmt, "unsupported RAM size of {size} bytes")
            }
        }
    }
}

impl std::error::Error for CoreError {}

/// Whether the machine still runs after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Running,
    Halted,
}

/// The whole machine. Generic over the host's frame sink and input source
/// so tests and headless hosts can plug in null implementations.
pub struct Archimedes<S: FrameSink, I: InputSource> {
    pub cpu: Arm3,
    pub memory: Arc<Mutex<MemoryMap>>,

    config: EmuConfig,
    sink: S,
    input: I,
    running: bool,
}

impl<S: FrameSink, I: InputSource> Archimedes<S, I> {
    /// Builds the machine around a ROM image. Fails on an oversized image
    /// or an unsupported RAM size before any state is built, so no
    /// partially-initialised machine ever exists.
    pub fn new(rom: Vec<u8>, config: EmuConfig, sink: S, input: I) -> Result<Self, CoreError> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(CoreError::RomTooLarge { size: rom.len() });
        }
        if !(MIN_RAM_SIZE..=MAX_RAM_SIZE).contains(&config.ram_size) || config.ram_size % 4 != 0 {
            return Err(CoreError::BadRamSize {
                size: config.ram_size,
            });
        }

        let memory = Arc::new(Mutex::new(MemoryMap::new(rom, &config)));
        let cpu = Arm3::new(Arc::clone(&memory));

        Ok(Self {
            cpu,
            memory,
            config,
            sink,
            input,
            running: true,
        })
    }

    /// Host-requested reset: the CPU restarts at the reset vector; memory
    /// and peripherals persist.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.running = true;
    }

    /// Host stop flag, honoured between frames.
    pub fn stop(&mut self) {
        self.running = false;
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Host pacing information.
    #[must_use]
    pub const fn frame_rate_hz(&self) -> u32 {
        self.config.frame_rate_hz
    }

    /// Runs one host frame. A fatal error stops the machine and is
    /// returned; Escape (or a previous stop) reports `Halted`.
    pub fn run_frame(&mut self) -> Result<FrameStatus, CoreError> {
        if !self.running {
            return Ok(FrameStatus::Halted);
        }

        let keys = self.input.poll();
        if keys.is_pressed(Key::Escape) {
            logger::info("escape pressed, halting");
            self.running = false;
            return Ok(FrameStatus::Halted);
        }

        {
            let mut memory = self.memory.lock().unwrap();
            memory.ioc.update_timers(self.config.cpu_cycles_per_frame);
            if memory.ioc.irq_line() {
                self.cpu.raise_irq();
            }
            if memory.ioc.fiq_line() {
                self.cpu.raise_fiq();
            }
        }

        for _ in 0..self.config.cpu_cycles_per_frame {
            if let Err(error) = self.cpu.step() {
                logger::error(format!("emulation stopped: {error}"));
                self.running = false;
                return Err(error);
            }
        }

        let frame = self.memory.lock().unwrap().render_frame();
        self.sink
            .deliver_frame(&frame.pixels, frame.width, frame.height, frame.stride_bytes());

        // observed by step (2) of the next frame
        self.memory.lock().unwrap().ioc.assert_vertical_flyback();

        Ok(FrameStatus::Running)
    }
}
