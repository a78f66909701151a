// This module implements the RISC-V target machine: the object a compilation driver constructs
// once per invocation. Construction resolves the data layout (failing for triples that are not
// RV32/RV64), the effective relocation and code models, and records the default cpu, tune cpu,
// feature string and TargetOptions. The immutable part of that state is kept in TargetInfo and
// shared with every Subtarget through an Arc. subtarget_for resolves a function's configuration
// key from its attributes, and on a cache miss merges the function's codegen overlay into an
// effective option set, reconciles the requested ABI with the module's target-abi flag, and
// builds the Subtarget. The overlay is not part of the key, so consumers read a function's
// options through effective_options rather than from the shared Subtarget. Module metadata can
// also be applied eagerly through set_target_options_with_module_metadata, which adopts the
// module ABI when none was requested and rejects any other differing name.

//! RISC-V target machine.

use std::sync::Arc;

use crate::core::abi::{check_module_abi, check_subtarget_abi};
use crate::core::data_layout::compute_data_layout;
use crate::core::error::TargetResult;
use crate::core::features::default_cpu;
use crate::core::options::{
    effective_code_model, effective_reloc_model, CodeModel, OptLevel, RelocModel, TargetOptions,
};
use crate::core::triple::TargetTriple;
use crate::ir::{Function, Module};

use super::pipeline::{Pipeline, SelectorStrategy};
use super::subtarget::{ConfigurationKey, Subtarget, SubtargetCache};
use super::transform_info::TransformInfo;

/// Targets this backend registers.
pub fn registered_targets() -> &'static [(&'static str, &'static str)] {
    &[
        ("riscv32", "32-bit RISC-V"),
        ("riscv64", "64-bit RISC-V"),
    ]
}

/// Inputs for constructing a [`TargetMachine`].
#[derive(Debug, Clone)]
pub struct TargetMachineConfig {
    pub triple: TargetTriple,
    pub cpu: Option<String>,
    pub tune_cpu: Option<String>,
    pub features: Option<String>,
    pub options: TargetOptions,
    pub reloc_model: Option<RelocModel>,
    pub code_model: Option<CodeModel>,
    pub opt_level: OptLevel,
    pub jit: bool,
}

impl TargetMachineConfig {
    pub fn new(triple: TargetTriple) -> Self {
        Self {
            triple,
            cpu: None,
            tune_cpu: None,
            features: None,
            options: TargetOptions::default(),
            reloc_model: None,
            code_model: None,
            opt_level: OptLevel::Default,
            jit: false,
        }
    }

    pub fn cpu(mut self, cpu: impl Into<String>) -> Self {
        self.cpu = Some(cpu.into());
        self
    }

    pub fn tune_cpu(mut self, tune_cpu: impl Into<String>) -> Self {
        self.tune_cpu = Some(tune_cpu.into());
        self
    }

    pub fn features(mut self, features: impl Into<String>) -> Self {
        self.features = Some(features.into());
        self
    }

    pub fn abi(mut self, abi: impl Into<String>) -> Self {
        self.options.abi_name = Some(abi.into());
        self
    }

    pub fn options(mut self, options: TargetOptions) -> Self {
        self.options = options;
        self
    }

    pub fn reloc_model(mut self, model: RelocModel) -> Self {
        self.reloc_model = Some(model);
        self
    }

    pub fn code_model(mut self, model: CodeModel) -> Self {
        self.code_model = Some(model);
        self
    }

    pub fn opt_level(mut self, level: OptLevel) -> Self {
        self.opt_level = level;
        self
    }

    pub fn jit(mut self, jit: bool) -> Self {
        self.jit = jit;
        self
    }
}

/// Construction-time target description shared by all subtargets.
#[derive(Debug)]
pub struct TargetInfo {
    triple: TargetTriple,
    data_layout: &'static str,
    reloc_model: RelocModel,
    code_model: CodeModel,
    opt_level: OptLevel,
    jit: bool,
}

impl TargetInfo {
    pub fn triple(&self) -> &TargetTriple {
        &self.triple
    }

    pub fn data_layout(&self) -> &'static str {
        self.data_layout
    }

    pub fn reloc_model(&self) -> RelocModel {
        self.reloc_model
    }

    pub fn code_model(&self) -> CodeModel {
        self.code_model
    }

    pub fn opt_level(&self) -> OptLevel {
        self.opt_level
    }

    pub fn is_jit(&self) -> bool {
        self.jit
    }

    #[cfg(test)]
    pub(crate) fn for_tests(triple: &str) -> Self {
        let triple: TargetTriple = triple.parse().unwrap();
        Self {
            data_layout: compute_data_layout(&triple).unwrap(),
            triple,
            reloc_model: RelocModel::Static,
            code_model: CodeModel::Small,
            opt_level: OptLevel::Default,
            jit: false,
        }
    }
}

/// Target machine for RV32/RV64 with the Snitch and PULP extensions.
#[derive(Debug)]
pub struct TargetMachine {
    info: Arc<TargetInfo>,
    cpu: String,
    tune_cpu: Option<String>,
    features: String,
    options: TargetOptions,
    subtargets: SubtargetCache,
}

impl TargetMachine {
    /// Construct a target machine. Fails if the triple has no data layout.
    pub fn new(config: TargetMachineConfig) -> TargetResult<Self> {
        let data_layout = compute_data_layout(&config.triple)?;
        let cpu = config
            .cpu
            .filter(|cpu| !cpu.is_empty())
            .unwrap_or_else(|| default_cpu(config.triple.is_arch_64bit()).to_string());

        let info = TargetInfo {
            data_layout,
            reloc_model: effective_reloc_model(config.reloc_model),
            code_model: effective_code_model(config.code_model),
            opt_level: config.opt_level,
            jit: config.jit,
            triple: config.triple,
        };

        log::debug!(
            "created target machine for {} (cpu {}, {}, reloc {}, code model {})",
            info.triple,
            cpu,
            info.opt_level,
            info.reloc_model.name(),
            info.code_model.name()
        );

        Ok(Self {
            info: Arc::new(info),
            cpu,
            tune_cpu: config.tune_cpu.filter(|tune| !tune.is_empty()),
            features: config.features.unwrap_or_default(),
            options: config.options,
            subtargets: SubtargetCache::new(),
        })
    }

    /// Construct a target machine and apply `module`'s metadata right away.
    pub fn with_module(config: TargetMachineConfig, module: &Module) -> TargetResult<Self> {
        let mut tm = Self::new(config)?;
        tm.set_target_options_with_module_metadata(module)?;
        Ok(tm)
    }

    /// Reconcile the requested ABI with `module`'s target-abi flag.
    ///
    /// If only the module names an ABI it becomes the requested ABI for all
    /// subtargets resolved afterwards. Two different non-empty names are an error,
    /// whether or not the requested one is a known ABI.
    pub fn set_target_options_with_module_metadata(
        &mut self,
        module: &Module,
    ) -> TargetResult<()> {
        let requested = self.options.requested_abi();
        let abi = check_module_abi(requested, module.target_abi.as_deref())?;
        self.options.abi_name = abi;
        Ok(())
    }

    /// Resolve the subtarget for `func`, a function of `module`.
    ///
    /// Functions with the same cpu, tune cpu and feature string get the same
    /// `Arc`. The ABI check against `module` only runs when a new subtarget is
    /// created. The subtarget does not carry `func`'s codegen overlay; use
    /// [`TargetMachine::effective_options`] for that.
    pub fn subtarget_for(
        &self,
        func: &Function,
        module: &Module,
    ) -> TargetResult<Arc<Subtarget>> {
        let key = self.configuration_key(func);
        self.subtargets.get_or_try_insert_with(key, |key| {
            let options = self.effective_options(func);
            let module_abi = module.target_abi.as_deref();
            let abi_name = check_subtarget_abi(options.requested_abi(), module_abi)?;
            log::debug!(
                "new subtarget for '{}': cpu {}, tune {}, features '{}', abi {}",
                func.name,
                key.cpu,
                key.tune_cpu,
                key.features,
                abi_name.as_deref().unwrap_or("<default>")
            );
            Ok(Subtarget::new(Arc::clone(&self.info), key.clone(), abi_name))
        })
    }

    /// Cache key for `func`: attribute values, falling back to the machine defaults.
    pub fn configuration_key(&self, func: &Function) -> ConfigurationKey {
        let attrs = &func.attrs;
        let cpu = attrs.cpu.clone().unwrap_or_else(|| self.cpu.clone());
        let tune_cpu = attrs
            .tune_cpu
            .clone()
            .or_else(|| self.tune_cpu.clone())
            .unwrap_or_else(|| cpu.clone());
        let features = attrs.features.clone().unwrap_or_else(|| self.features.clone());
        ConfigurationKey::new(cpu, tune_cpu, features)
    }

    /// Options `func` is compiled with: the machine options with its overlay applied.
    pub fn effective_options(&self, func: &Function) -> TargetOptions {
        self.options.with_overrides(&func.attrs.codegen)
    }

    /// Cost model for `func`.
    pub fn transform_info(&self, func: &Function, module: &Module) -> TargetResult<TransformInfo> {
        Ok(TransformInfo::new(self.subtarget_for(func, module)?))
    }

    /// Code generation pipeline for this machine's optimization level.
    pub fn pipeline(&self, selector: SelectorStrategy) -> Pipeline {
        Pipeline::build(self.info.opt_level(), selector)
    }

    pub fn info(&self) -> &TargetInfo {
        &self.info
    }

    pub fn triple(&self) -> &TargetTriple {
        self.info.triple()
    }

    pub fn data_layout(&self) -> &'static str {
        self.info.data_layout()
    }

    pub fn reloc_model(&self) -> RelocModel {
        self.info.reloc_model()
    }

    pub fn code_model(&self) -> CodeModel {
        self.info.code_model()
    }

    pub fn opt_level(&self) -> OptLevel {
        self.info.opt_level()
    }

    pub fn is_jit(&self) -> bool {
        self.info.is_jit()
    }

    pub fn cpu(&self) -> &str {
        &self.cpu
    }

    pub fn features(&self) -> &str {
        &self.features
    }

    pub fn options(&self) -> &TargetOptions {
        &self.options
    }

    pub fn supports_machine_outliner(&self) -> bool {
        true
    }

    /// A hart has a single byte-addressable address space, so every cast is a no-op.
    pub fn is_noop_addr_space_cast(&self, _src_as: u32, _dst_as: u32) -> bool {
        true
    }

    pub fn cached_subtarget_count(&self) -> usize {
        self.subtargets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_layout::{RV32_DATA_LAYOUT, RV64_DATA_LAYOUT};
    use crate::core::error::TargetError;

    fn config(triple: &str) -> TargetMachineConfig {
        TargetMachineConfig::new(triple.parse().unwrap())
    }

    #[test]
    fn test_construction_resolves_defaults() {
        let tm = TargetMachine::new(config("riscv64-unknown-elf")).unwrap();
        assert_eq!(tm.data_layout(), RV64_DATA_LAYOUT);
        assert_eq!(tm.reloc_model(), RelocModel::Static);
        assert_eq!(tm.code_model(), CodeModel::Small);
        assert_eq!(tm.cpu(), "generic-rv64");
        assert_eq!(tm.features(), "");
        assert!(!tm.is_jit());
        assert!(tm.supports_machine_outliner());
        assert!(tm.is_noop_addr_space_cast(0, 1));
    }

    #[test]
    fn test_construction_fails_for_unsupported_width() {
        let err = TargetMachine::new(config("x86_16-unknown-none")).unwrap_err();
        assert!(matches!(err, TargetError::UnsupportedTriple { .. }));
    }

    #[test]
    fn test_requested_models_are_kept() {
        let tm = TargetMachine::new(
            config("riscv32-unknown-elf")
                .reloc_model(RelocModel::Pic)
                .code_model(CodeModel::Medium)
                .opt_level(OptLevel::None)
                .jit(true),
        )
        .unwrap();
        assert_eq!(tm.data_layout(), RV32_DATA_LAYOUT);
        assert_eq!(tm.reloc_model(), RelocModel::Pic);
        assert_eq!(tm.code_model(), CodeModel::Medium);
        assert_eq!(tm.opt_level(), OptLevel::None);
        assert!(tm.is_jit());
    }

    #[test]
    fn test_tune_cpu_fallback_chain() {
        let tm = TargetMachine::new(config("riscv32-unknown-elf").cpu("snitch")).unwrap();
        let key = tm.configuration_key(&Function::new("f"));
        assert_eq!(key, ConfigurationKey::new("snitch", "snitch", ""));

        let key = tm.configuration_key(&Function::new("g").with_cpu("rocket-rv32"));
        assert_eq!(key.tune_cpu, "rocket-rv32");

        let config = config("riscv32-unknown-elf").cpu("snitch").tune_cpu("sifive-e31");
        let tm = TargetMachine::new(config).unwrap();
        let key = tm.configuration_key(&Function::new("h").with_cpu("rocket-rv32"));
        assert_eq!(key.tune_cpu, "sifive-e31");
    }

    #[test]
    fn test_module_abi_adopted_at_construction() {
        let module = Module::new("m").with_target_abi("ilp32d");
        let tm = TargetMachine::with_module(config("riscv32-unknown-elf"), &module).unwrap();
        assert_eq!(tm.options().abi_name.as_deref(), Some("ilp32d"));
    }

    #[test]
    fn test_module_abi_conflict_at_construction() {
        let module = Module::new("m").with_target_abi("ilp32d");
        let config = config("riscv32-unknown-elf").abi("ilp32");
        let err = TargetMachine::with_module(config, &module).unwrap_err();
        assert!(matches!(err, TargetError::AbiConflict { .. }));
    }

    #[test]
    fn test_unrecognized_abi_conflicts_at_construction() {
        let module = Module::new("m").with_target_abi("ilp32d");
        let config = config("riscv32-unknown-elf").abi("ilp32x");
        let err = TargetMachine::with_module(config, &module).unwrap_err();
        assert_eq!(
            err,
            TargetError::AbiConflict {
                requested: "ilp32x".to_string(),
                module: "ilp32d".to_string(),
            }
        );
    }

    #[test]
    fn test_codegen_overlay_stays_per_function() {
        use crate::core::options::CodegenOverrides;

        let tm = TargetMachine::new(config("riscv32-unknown-elf")).unwrap();
        let module = Module::new("m");
        let fast = Function::new("fast").with_features("+f").with_codegen(CodegenOverrides {
            unsafe_fp_math: Some(true),
            ..Default::default()
        });

        tm.subtarget_for(&fast, &module).unwrap();
        assert!(tm.effective_options(&fast).unsafe_fp_math);
        assert!(!tm.options().unsafe_fp_math);
    }
}
