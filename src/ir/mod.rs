// This module defines the minimal view of the compilation unit that the target machine consumes.
// A Module carries its name and the optional target-abi flag from module metadata. A Function
// carries its name and FunctionAttributes: optional cpu / tune-cpu / feature overrides plus an
// overlay of code generation flags, all attached by the frontend. An absent field always means
// "inherit the target machine default". The real IR lives in the frontend; these types only hold
// what subtarget resolution reads.

//! Module and function descriptors consumed by subtarget resolution.

use crate::core::options::CodegenOverrides;

/// Per-function target overrides. `None` inherits the target machine default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionAttributes {
    /// `target-cpu`
    pub cpu: Option<String>,
    /// `tune-cpu`
    pub tune_cpu: Option<String>,
    /// `target-features`
    pub features: Option<String>,
    /// Floating-point code generation flags.
    pub codegen: CodegenOverrides,
}

/// A function as seen by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub attrs: FunctionAttributes,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: FunctionAttributes::default(),
        }
    }

    pub fn with_cpu(mut self, cpu: impl Into<String>) -> Self {
        self.attrs.cpu = Some(cpu.into());
        self
    }

    pub fn with_tune_cpu(mut self, tune_cpu: impl Into<String>) -> Self {
        self.attrs.tune_cpu = Some(tune_cpu.into());
        self
    }

    pub fn with_features(mut self, features: impl Into<String>) -> Self {
        self.attrs.features = Some(features.into());
        self
    }

    pub fn with_codegen(mut self, codegen: CodegenOverrides) -> Self {
        self.attrs.codegen = codegen;
        self
    }
}

/// A compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    /// `target-abi` module flag.
    pub target_abi: Option<String>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_abi: None,
        }
    }

    pub fn with_target_abi(mut self, abi: impl Into<String>) -> Self {
        self.target_abi = Some(abi.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_builder() {
        let f = Function::new("kernel").with_cpu("snitch").with_features("+xssr");
        assert_eq!(f.attrs.cpu.as_deref(), Some("snitch"));
        assert_eq!(f.attrs.tune_cpu, None);
        assert_eq!(f.attrs.features.as_deref(), Some("+xssr"));
        assert!(f.attrs.codegen.is_empty());
    }

    #[test]
    fn test_module_target_abi() {
        assert_eq!(Module::new("m").target_abi, None);
        let module = Module::new("m").with_target_abi("ilp32d");
        assert_eq!(module.target_abi.as_deref(), Some("ilp32d"));
    }
}
