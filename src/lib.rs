//! Snitch RISC-V target machine.
//!
//! This crate is the configuration layer between a target-independent IR and
//! the machine-level code generator of a RISC-V backend extended with stream
//! semantic registers (SSR), the cluster DMA engine (SDMA) and hardware loops
//! (`frep`, PULP hwloops). It resolves the subtarget each function is compiled
//! for and lays out the ordered pipeline of lowering stages.
//!
//! # Primary Usage
//!
//! ```
//! use snitch_target::core::OptLevel;
//! use snitch_target::ir::{Function, Module};
//! use snitch_target::riscv::{SelectorStrategy, TargetMachine, TargetMachineConfig};
//!
//! # fn main() -> Result<(), snitch_target::TargetError> {
//! let config = TargetMachineConfig::new("riscv32-unknown-elf".parse()?)
//!     .cpu("snitch")
//!     .opt_level(OptLevel::Default);
//! let tm = TargetMachine::new(config)?;
//!
//! let module = Module::new("kernel").with_target_abi("ilp32d");
//! let subtarget = tm.subtarget_for(&Function::new("axpy"), &module)?;
//! assert!(subtarget.has_ssr());
//!
//! let pipeline = tm.pipeline(SelectorStrategy::Pattern);
//! assert_eq!(pipeline.stages().last().map(|s| s.name()), Some("riscv-expand-atomic-pseudo"));
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Target-independent configuration (triple, options, ABI, features, errors)
//! - [`riscv`] - Target machine, subtarget cache, pipeline, cost model
//! - [`ir`] - Module and function descriptors read during resolution

pub mod core;
pub mod ir;
pub mod riscv;

pub use crate::core::{
    CodeModel, CodegenOverrides, OptLevel, RelocModel, RiscvAbi, TargetError, TargetOptions,
    TargetResult, TargetTriple,
};
pub use crate::riscv::{
    Pipeline, SelectorStrategy, Stage, Subtarget, TargetMachine, TargetMachineConfig,
    TransformInfo,
};
