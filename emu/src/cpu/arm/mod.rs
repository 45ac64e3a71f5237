//! The ARM instruction set: decode ([`instructions`]), the barrel shifter
//! and ALU opcode tables ([`alu_instruction`]), and execution
//! (`operations`, implemented on [`Arm3`](super::arm3::Arm3)).

pub mod alu_instruction;
pub mod instructions;
mod operations;
