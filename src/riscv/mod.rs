//! RISC-V specific components.
//!
//! This module contains the RISC-V target machine and everything it hands out:
//! - Subtarget resolution and the per-machine subtarget cache
//! - Code generation pipeline construction and ordering checks
//! - The per-function cost model

pub mod pipeline;
pub mod subtarget;
pub mod target_machine;
pub mod transform_info;

pub use pipeline::{
    pass_registry, verify_stages, OrderingViolation, Phase, Pipeline, SelectorStrategy, Stage,
    StageExecutor,
};
pub use subtarget::{ConfigurationKey, Subtarget, SubtargetCache};
pub use target_machine::{
    registered_targets, TargetInfo, TargetMachine, TargetMachineConfig,
};
pub use transform_info::{RegisterClass, TransformInfo};
