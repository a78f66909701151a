// This module holds the configuration inputs of a target machine: relocation model, code model,
// optimization level, and the TargetOptions bag of code generation flags. It also provides the
// two pure resolvers that turn optional user requests into effective models (Static relocation
// and Small code model by default). CodegenOverrides is the per-function overlay: functions may
// override individual floating-point flags, and TargetOptions::with_overrides merges such an
// overlay into a fresh effective option set without touching the target machine's own options.

//! Target options and model resolution.

use std::fmt;
use std::str::FromStr;

use super::error::TargetError;

/// Relocation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelocModel {
    Static,
    Pic,
    DynamicNoPic,
    Ropi,
    Rwpi,
    RopiRwpi,
}

impl RelocModel {
    pub const ALL: [RelocModel; 6] = [
        RelocModel::Static,
        RelocModel::Pic,
        RelocModel::DynamicNoPic,
        RelocModel::Ropi,
        RelocModel::Rwpi,
        RelocModel::RopiRwpi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RelocModel::Static => "static",
            RelocModel::Pic => "pic",
            RelocModel::DynamicNoPic => "dynamic-no-pic",
            RelocModel::Ropi => "ropi",
            RelocModel::Rwpi => "rwpi",
            RelocModel::RopiRwpi => "ropi-rwpi",
        }
    }
}

impl FromStr for RelocModel {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|model| model.name() == s)
            .ok_or_else(|| TargetError::UnknownOption {
                kind: "relocation model",
                value: s.to_string(),
            })
    }
}

/// Code model. On RISC-V `Small` is medlow and `Medium` is medany.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeModel {
    Tiny,
    Small,
    Kernel,
    Medium,
    Large,
}

impl CodeModel {
    pub const ALL: [CodeModel; 5] = [
        CodeModel::Tiny,
        CodeModel::Small,
        CodeModel::Kernel,
        CodeModel::Medium,
        CodeModel::Large,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CodeModel::Tiny => "tiny",
            CodeModel::Small => "small",
            CodeModel::Kernel => "kernel",
            CodeModel::Medium => "medium",
            CodeModel::Large => "large",
        }
    }
}

impl FromStr for CodeModel {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "medlow" => return Ok(CodeModel::Small),
            "medany" => return Ok(CodeModel::Medium),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|model| model.name() == s)
            .ok_or_else(|| TargetError::UnknownOption {
                kind: "code model",
                value: s.to_string(),
            })
    }
}

/// Code generation optimization level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptLevel {
    None,
    Less,
    Default,
    Aggressive,
}

impl OptLevel {
    pub const ALL: [OptLevel; 4] = [
        OptLevel::None,
        OptLevel::Less,
        OptLevel::Default,
        OptLevel::Aggressive,
    ];
}

impl FromStr for OptLevel {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('O') {
            "0" => Ok(OptLevel::None),
            "1" => Ok(OptLevel::Less),
            "2" => Ok(OptLevel::Default),
            "3" => Ok(OptLevel::Aggressive),
            _ => Err(TargetError::UnknownOption {
                kind: "optimization level",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            OptLevel::None => 0,
            OptLevel::Less => 1,
            OptLevel::Default => 2,
            OptLevel::Aggressive => 3,
        };
        write!(f, "O{}", level)
    }
}

/// Relocation model actually used: the requested one, or static.
pub fn effective_reloc_model(requested: Option<RelocModel>) -> RelocModel {
    requested.unwrap_or(RelocModel::Static)
}

/// Code model actually used: the requested one, or small (medlow).
pub fn effective_code_model(requested: Option<CodeModel>) -> CodeModel {
    requested.unwrap_or(CodeModel::Small)
}

/// Code generation flags shared by every function of a target machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetOptions {
    /// ABI requested externally (`-target-abi`). `None` or empty means not requested.
    pub abi_name: Option<String>,
    pub unsafe_fp_math: bool,
    pub no_infs_fp_math: bool,
    pub no_nans_fp_math: bool,
    pub no_signed_zeros_fp_math: bool,
    pub emulated_tls: bool,
    pub function_sections: bool,
    pub data_sections: bool,
}

impl TargetOptions {
    /// The requested ABI name, treating an empty string as absent.
    pub fn requested_abi(&self) -> Option<&str> {
        self.abi_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Merge a per-function overlay into a copy of these options.
    pub fn with_overrides(&self, overrides: &CodegenOverrides) -> TargetOptions {
        TargetOptions {
            unsafe_fp_math: overrides.unsafe_fp_math.unwrap_or(self.unsafe_fp_math),
            no_infs_fp_math: overrides.no_infs_fp_math.unwrap_or(self.no_infs_fp_math),
            no_nans_fp_math: overrides.no_nans_fp_math.unwrap_or(self.no_nans_fp_math),
            no_signed_zeros_fp_math: overrides
                .no_signed_zeros_fp_math
                .unwrap_or(self.no_signed_zeros_fp_math),
            ..self.clone()
        }
    }
}

/// Per-function overrides of code generation flags. `None` inherits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodegenOverrides {
    pub unsafe_fp_math: Option<bool>,
    pub no_infs_fp_math: Option<bool>,
    pub no_nans_fp_math: Option<bool>,
    pub no_signed_zeros_fp_math: Option<bool>,
}

impl CodegenOverrides {
    pub fn is_empty(&self) -> bool {
        *self == CodegenOverrides::default()
    }
}
