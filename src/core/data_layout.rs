//! Data layout strings for RV32 and RV64.

use super::error::{TargetError, TargetResult};
use super::triple::{TargetTriple, Vendor};

pub const RV64_DATA_LAYOUT: &str = "e-m:e-p:64:64-i64:64-i128:128-n64-S128";
pub const RV32_DATA_LAYOUT: &str = "e-m:e-p:32:32-i64:64-n32-S128";
/// HERO devices keep 32-bit pointers in address space 0 but reach host memory
/// through 64-bit pointers in address space 1.
pub const RV32_HERO_DATA_LAYOUT: &str = "e-m:e-p:32:32-p1:64:32-i64:64-n32-S128-P0-A0";

/// Compute the data layout for a triple.
///
/// Triples that are neither 32- nor 64-bit have no layout; this is a
/// configuration error and target machine construction must not proceed.
pub fn compute_data_layout(triple: &TargetTriple) -> TargetResult<&'static str> {
    if triple.is_arch_64bit() {
        return Ok(RV64_DATA_LAYOUT);
    }
    if !triple.is_arch_32bit() {
        return Err(TargetError::UnsupportedTriple {
            triple: triple.to_string(),
        });
    }
    if *triple.vendor() == Vendor::Hero {
        return Ok(RV32_HERO_DATA_LAYOUT);
    }
    Ok(RV32_DATA_LAYOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(triple: &str) -> TargetResult<&'static str> {
        compute_data_layout(&triple.parse().unwrap())
    }

    #[test]
    fn test_rv64_layout_ignores_vendor() {
        assert_eq!(layout("riscv64-unknown-elf"), Ok(RV64_DATA_LAYOUT));
        assert_eq!(layout("riscv64-hero-elf"), Ok(RV64_DATA_LAYOUT));
        assert_eq!(layout("riscv64-pulp-linux-gnu"), Ok(RV64_DATA_LAYOUT));
    }

    #[test]
    fn test_rv32_layouts() {
        assert_eq!(layout("riscv32-unknown-elf"), Ok(RV32_DATA_LAYOUT));
        assert_eq!(layout("riscv32-pulp-elf"), Ok(RV32_DATA_LAYOUT));
        assert_eq!(layout("riscv32-hero-unknown-elf"), Ok(RV32_HERO_DATA_LAYOUT));
    }

    #[test]
    fn test_unknown_width_is_fatal() {
        let err = layout("avr-unknown-unknown").unwrap_err();
        assert!(matches!(err, TargetError::UnsupportedTriple { .. }));
    }
}
