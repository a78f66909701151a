// This module names the RISC-V calling convention ABIs and implements the two ABI decisions of
// the target machine. check_module_abi reconciles an externally requested ABI with the
// target-abi flag recorded in module metadata: agreement or a single declaration resolves to
// that ABI, while two different names are a fatal configuration mismatch. check_subtarget_abi is
// the variant run when a subtarget is created, where a requested name that is not a known ABI
// yields to the module flag instead.
// compute_target_abi then turns the reconciled name into the ABI a subtarget actually uses,
// falling back to the architecture default (ilp32 / lp64) when nothing was requested or when the
// requested ABI cannot be used with the target width or enabled floating-point extensions.

//! RISC-V ABI names and consistency checks.

use std::fmt;

use super::error::{TargetError, TargetResult};
use super::features::FeatureSet;
use super::triple::TargetTriple;

/// Integer/floating-point calling convention ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiscvAbi {
    Ilp32,
    Ilp32f,
    Ilp32d,
    Ilp32e,
    Lp64,
    Lp64f,
    Lp64d,
    Unknown,
}

impl RiscvAbi {
    pub fn from_name(name: &str) -> RiscvAbi {
        match name {
            "ilp32" => RiscvAbi::Ilp32,
            "ilp32f" => RiscvAbi::Ilp32f,
            "ilp32d" => RiscvAbi::Ilp32d,
            "ilp32e" => RiscvAbi::Ilp32e,
            "lp64" => RiscvAbi::Lp64,
            "lp64f" => RiscvAbi::Lp64f,
            "lp64d" => RiscvAbi::Lp64d,
            _ => RiscvAbi::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RiscvAbi::Ilp32 => "ilp32",
            RiscvAbi::Ilp32f => "ilp32f",
            RiscvAbi::Ilp32d => "ilp32d",
            RiscvAbi::Ilp32e => "ilp32e",
            RiscvAbi::Lp64 => "lp64",
            RiscvAbi::Lp64f => "lp64f",
            RiscvAbi::Lp64d => "lp64d",
            RiscvAbi::Unknown => "unknown",
        }
    }

    pub fn is_64bit(self) -> bool {
        matches!(self, RiscvAbi::Lp64 | RiscvAbi::Lp64f | RiscvAbi::Lp64d)
    }

    pub fn is_recognized(self) -> bool {
        self != RiscvAbi::Unknown
    }

    /// Default ABI for a target width.
    pub fn default_for(triple: &TargetTriple) -> RiscvAbi {
        if triple.is_arch_64bit() {
            RiscvAbi::Lp64
        } else {
            RiscvAbi::Ilp32
        }
    }
}

impl fmt::Display for RiscvAbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reconcile the requested ABI with the module's `target-abi` flag at construction.
///
/// Returns the ABI name to use from here on, or `None` if neither side names one.
/// Empty strings count as absent. Any two different names conflict.
pub fn check_module_abi(
    requested: Option<&str>,
    module: Option<&str>,
) -> TargetResult<Option<String>> {
    reconcile_abi(requested, module, false)
}

/// Reconcile the requested ABI with the module's `target-abi` flag for a new subtarget.
///
/// Same as [`check_module_abi`], except that a requested name that is not a known
/// ABI yields to the module flag.
pub fn check_subtarget_abi(
    requested: Option<&str>,
    module: Option<&str>,
) -> TargetResult<Option<String>> {
    reconcile_abi(requested, module, true)
}

fn reconcile_abi(
    requested: Option<&str>,
    module: Option<&str>,
    allow_unrecognized: bool,
) -> TargetResult<Option<String>> {
    let requested = requested.filter(|name| !name.is_empty());
    let module = match module.filter(|name| !name.is_empty()) {
        Some(module) => module,
        None => return Ok(requested.map(str::to_string)),
    };

    match requested {
        Some(requested) if requested == module => Ok(Some(module.to_string())),
        Some(requested)
            if allow_unrecognized && !RiscvAbi::from_name(requested).is_recognized() =>
        {
            log::warn!(
                "ignoring unrecognized -target-abi '{}', using module flag '{}'",
                requested,
                module
            );
            Ok(Some(module.to_string()))
        }
        Some(requested) => Err(TargetError::AbiConflict {
            requested: requested.to_string(),
            module: module.to_string(),
        }),
        None => {
            log::debug!("adopting target-abi '{}' from module metadata", module);
            Ok(Some(module.to_string()))
        }
    }
}

/// Resolve the ABI a subtarget uses from the reconciled name.
pub fn compute_target_abi(
    triple: &TargetTriple,
    features: &FeatureSet,
    name: Option<&str>,
) -> RiscvAbi {
    let default = RiscvAbi::default_for(triple);
    let Some(name) = name.filter(|name| !name.is_empty()) else {
        return default;
    };

    let abi = RiscvAbi::from_name(name);
    let is_64bit = triple.is_arch_64bit();

    let rejection = match abi {
        RiscvAbi::Unknown => Some("unrecognized ABI name"),
        _ if abi.is_64bit() && !is_64bit => {
            Some("64-bit ABIs are not supported for 32-bit targets")
        }
        _ if !abi.is_64bit() && is_64bit => {
            Some("32-bit ABIs are not supported for 64-bit targets")
        }
        RiscvAbi::Ilp32f | RiscvAbi::Lp64f if !features.has("f") => {
            Some("hard-float 'f' ABI can't be used without the F extension")
        }
        RiscvAbi::Ilp32d | RiscvAbi::Lp64d if !features.has("d") => {
            Some("hard-float 'd' ABI can't be used without the D extension")
        }
        _ => None,
    };

    match rejection {
        Some(reason) => {
            log::warn!("{} (ignoring target-abi '{}', using '{}')", reason, name, default);
            default
        }
        None => abi,
    }
}
