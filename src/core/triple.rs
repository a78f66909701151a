// This module provides the TargetTriple type consumed by the data layout resolver and the
// subtarget resolver. A triple records the architecture (riscv32, riscv64, or anything else
// kept verbatim), the vendor (unknown, the HERO heterogeneous platform, or any other name), and
// the remaining OS/environment components as plain text. Only the architecture and vendor
// influence target configuration. The FromStr implementation is deliberately shallow: it splits
// on '-' and recognizes the components this backend cares about; full triple normalization is
// the job of the driver in front of it.

//! Target triple descriptor.

use std::fmt;
use std::str::FromStr;

use super::error::TargetError;

/// Architecture component of a triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    Riscv32,
    Riscv64,
    /// Architecture this backend has no layout for.
    Unknown(String),
}

impl Arch {
    /// Pointer width in bits, if the architecture is one of the supported widths.
    pub fn pointer_width(&self) -> Option<u32> {
        match self {
            Arch::Riscv32 => Some(32),
            Arch::Riscv64 => Some(64),
            Arch::Unknown(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Arch::Riscv32 => "riscv32",
            Arch::Riscv64 => "riscv64",
            Arch::Unknown(name) => name.as_str(),
        }
    }
}

/// Vendor component of a triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Vendor {
    Unknown,
    /// HERO host/accelerator platform: 32-bit cores that address 64-bit host memory.
    Hero,
    Other(String),
}

impl Vendor {
    pub fn name(&self) -> &str {
        match self {
            Vendor::Unknown => "unknown",
            Vendor::Hero => "hero",
            Vendor::Other(name) => name.as_str(),
        }
    }
}

/// Immutable target triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetTriple {
    arch: Arch,
    vendor: Vendor,
    /// OS and environment components, joined with '-'.
    rest: String,
}

impl TargetTriple {
    pub fn new(arch: Arch, vendor: Vendor, rest: impl Into<String>) -> Self {
        Self {
            arch,
            vendor,
            rest: rest.into(),
        }
    }

    pub fn arch(&self) -> &Arch {
        &self.arch
    }

    pub fn vendor(&self) -> &Vendor {
        &self.vendor
    }

    pub fn is_arch_64bit(&self) -> bool {
        self.arch.pointer_width() == Some(64)
    }

    pub fn is_arch_32bit(&self) -> bool {
        self.arch.pointer_width() == Some(32)
    }
}

impl FromStr for TargetTriple {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '-');
        let arch = match parts.next() {
            Some("") | None => {
                return Err(TargetError::InvalidTriple {
                    triple: s.to_string(),
                    reason: "missing architecture".to_string(),
                })
            }
            Some("riscv32") => Arch::Riscv32,
            Some("riscv64") => Arch::Riscv64,
            Some(other) => Arch::Unknown(other.to_string()),
        };
        let vendor = match parts.next() {
            None | Some("") | Some("unknown") => Vendor::Unknown,
            Some("hero") => Vendor::Hero,
            Some(other) => Vendor::Other(other.to_string()),
        };
        let rest = parts.next().unwrap_or("").to_string();

        Ok(Self { arch, vendor, rest })
    }
}

/// Always prints the vendor, so `riscv32` displays as `riscv32-unknown`.
impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.arch.name(), self.vendor.name())?;
        if !self.rest.is_empty() {
            write!(f, "-{}", self.rest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_riscv_triples() {
        let rv32: TargetTriple = "riscv32-unknown-elf".parse().unwrap();
        assert_eq!(rv32.arch(), &Arch::Riscv32);
        assert_eq!(rv32.vendor(), &Vendor::Unknown);
        assert!(rv32.is_arch_32bit());

        let rv64: TargetTriple = "riscv64-unknown-linux-gnu".parse().unwrap();
        assert!(rv64.is_arch_64bit());
        assert_eq!(rv64.to_string(), "riscv64-unknown-linux-gnu");
    }

    #[test]
    fn test_parse_hero_vendor() {
        let triple: TargetTriple = "riscv32-hero-unknown-elf".parse().unwrap();
        assert_eq!(triple.vendor(), &Vendor::Hero);
    }

    #[test]
    fn test_unknown_arch_has_no_width() {
        let triple: TargetTriple = "msp430-unknown-elf".parse().unwrap();
        assert!(!triple.is_arch_32bit());
        assert!(!triple.is_arch_64bit());
        assert_eq!(triple.arch().pointer_width(), None);
    }

    #[test]
    fn test_display_fills_in_missing_vendor() {
        let triple: TargetTriple = "riscv32".parse().unwrap();
        assert_eq!(triple.to_string(), "riscv32-unknown");
        assert_eq!(triple.to_string().parse::<TargetTriple>().unwrap(), triple);
    }

    #[test]
    fn test_empty_triple_rejected() {
        assert!(matches!(
            "".parse::<TargetTriple>(),
            Err(TargetError::InvalidTriple { .. })
        ));
    }
}
