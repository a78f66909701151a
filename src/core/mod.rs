// This module collects the target-independent building blocks of the target machine layer:
// error types, the target triple, code generation options with their default-taking resolvers,
// the data layout table, RISC-V ABI names with the module-flag consistency check, and feature
// string parsing with the CPU table. Nothing here holds state; the stateful pieces (the
// subtarget cache and the target machine) live in the riscv module and build on these.

//! Core target configuration infrastructure.
//!
//! # Key Components
//!
//! - [`error`] - `TargetError`, the fatal configuration errors
//! - [`triple`] - `TargetTriple` with architecture width and vendor
//! - [`options`] - relocation/code model resolution, `TargetOptions` and overlays
//! - [`data_layout`] - layout strings per width and vendor
//! - [`abi`] - ABI names, module flag reconciliation, default ABI
//! - [`features`] - feature strings and the CPU table

pub mod abi;
pub mod data_layout;
pub mod error;
pub mod features;
pub mod options;
pub mod triple;

pub use abi::{check_module_abi, check_subtarget_abi, compute_target_abi, RiscvAbi};
pub use data_layout::compute_data_layout;
pub use error::{TargetError, TargetResult};
pub use features::{default_cpu, lookup_cpu, CpuInfo, FeatureSet};
pub use options::{
    effective_code_model, effective_reloc_model, CodeModel, CodegenOverrides, OptLevel,
    RelocModel, TargetOptions,
};
pub use triple::{Arch, TargetTriple, Vendor};
