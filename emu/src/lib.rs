//! # Archimedes Emulation Core
//!
//! This crate contains the Acorn Archimedes hardware emulation - no host
//! frontend code.
//!
//! ## Module Overview
//!
//! | Module         | Description                                         |
//! |----------------|-----------------------------------------------------|
//! | [`archimedes`] | Top-level machine and frame loop (start here)       |
//! | [`cpu`]        | ARM3 processor: decode, execute, exceptions         |
//! | [`memory`]     | 26-bit physical memory map with ROM/RAM/IO decode   |
//! | [`io`]         | IOC (timers, interrupts) and VIDC (palette, video)  |
//! | [`render`]     | Frame and frame-sink abstractions                   |
//! | [`input`]      | Key enumeration and input-source abstraction        |
//! | [`config`]     | Host-tunable options                                |
//!
//! ## Quick Start
//!
//! ```ignore
//! use emu::{archimedes::Archimedes, config::EmuConfig};
//! use emu::{input::NullInput, render::NullSink};
//!
//! let rom = std::fs::read("riscos.rom")?;
//! let mut machine = Archimedes::new(rom, EmuConfig::default(), NullSink, NullInput)?;
//! while machine.is_running() {
//!     machine.run_frame()?;
//! }
//! ```

#[allow(clippy::cast_possible_truncation)]
mod bitwise;

pub mod archimedes;
pub mod config;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub mod cpu;

pub mod input;

#[allow(clippy::cast_possible_truncation)]
pub mod io;

#[allow(clippy::cast_possible_truncation)]
pub mod memory;

pub mod render;
