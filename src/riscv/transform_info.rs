//! Cost model hooks for upstream optimizers.
//!
//! `TransformInfo` is bound to one function's subtarget. It only answers the
//! questions the loop and vectorization passes ask of this backend; detailed
//! cost tables are out of scope.

use std::sync::Arc;

use super::subtarget::Subtarget;

/// Register class as seen by the cost model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterClass {
    Scalar,
    Float,
    Vector,
}

/// Per-function cost model.
#[derive(Debug, Clone)]
pub struct TransformInfo {
    subtarget: Arc<Subtarget>,
}

impl TransformInfo {
    pub fn new(subtarget: Arc<Subtarget>) -> Self {
        Self { subtarget }
    }

    pub fn subtarget(&self) -> &Subtarget {
        &self.subtarget
    }

    /// Number of instructions needed to materialize `imm`.
    ///
    /// 12-bit signed immediates fold into the using instruction. 32-bit values
    /// take `lui` + `addi`. Wider values on RV64 are built 12 bits at a time with
    /// `slli` + `addi` pairs on top of a 32-bit prefix.
    pub fn int_imm_cost(&self, imm: i64) -> u32 {
        if (-2048..2048).contains(&imm) {
            return 0;
        }
        if i32::try_from(imm).is_ok() || !self.subtarget.is_64bit() {
            return if imm & 0xfff == 0 { 1 } else { 2 };
        }

        let mut cost = 2;
        let mut remaining = imm >> 32;
        while remaining != 0 && remaining != -1 {
            cost += 2;
            remaining >>= 12;
        }
        cost + 2
    }

    pub fn number_of_registers(&self, class: RegisterClass) -> u32 {
        match class {
            RegisterClass::Scalar if self.subtarget.is_rv32e() => 16,
            RegisterClass::Scalar => 32,
            RegisterClass::Float if self.subtarget.has_std_ext_f() => 32,
            RegisterClass::Vector if self.subtarget.has_std_ext_v() => 32,
            RegisterClass::Float | RegisterClass::Vector => 0,
        }
    }

    /// Register width in bits.
    pub fn register_bit_width(&self, class: RegisterClass) -> u32 {
        match class {
            RegisterClass::Scalar => self.subtarget.xlen(),
            RegisterClass::Float if self.subtarget.has_std_ext_d() => 64,
            RegisterClass::Float if self.subtarget.has_std_ext_f() => 32,
            RegisterClass::Vector if self.subtarget.has_std_ext_v() => 128,
            RegisterClass::Float | RegisterClass::Vector => 0,
        }
    }

    /// Whether loops may be turned into hardware loops (`frep` or PULP hwloops).
    pub fn supports_hardware_loops(&self) -> bool {
        self.subtarget.has_frep() || self.subtarget.has_pulp_hwloops()
    }

    /// Whether the cost model should prefer streaming loads through SSRs.
    pub fn prefers_stream_registers(&self) -> bool {
        self.subtarget.has_ssr()
    }

    pub fn is_noop_addr_space_cast(&self, _src_as: u32, _dst_as: u32) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riscv::subtarget::ConfigurationKey;
    use crate::riscv::target_machine::TargetInfo;

    fn tti(triple: &str, cpu: &str, features: &str) -> TransformInfo {
        let info = Arc::new(TargetInfo::for_tests(triple));
        let key = ConfigurationKey::new(cpu, cpu, features);
        TransformInfo::new(Arc::new(Subtarget::new(info, key, None)))
    }

    #[test]
    fn test_int_imm_cost() {
        let rv64 = tti("riscv64-unknown-elf", "generic-rv64", "");
        assert_eq!(rv64.int_imm_cost(0), 0);
        assert_eq!(rv64.int_imm_cost(2047), 0);
        assert_eq!(rv64.int_imm_cost(-2048), 0);
        assert_eq!(rv64.int_imm_cost(4096), 1);
        assert_eq!(rv64.int_imm_cost(4097), 2);
        assert!(rv64.int_imm_cost(0x1234_5678_9abc) > 2);

        let rv32 = tti("riscv32-unknown-elf", "generic-rv32", "");
        assert_eq!(rv32.int_imm_cost(0x12345), 2);
    }

    #[test]
    fn test_register_queries() {
        let snitch = tti("riscv32-unknown-elf", "snitch", "");
        assert_eq!(snitch.number_of_registers(RegisterClass::Scalar), 32);
        assert_eq!(snitch.number_of_registers(RegisterClass::Float), 32);
        assert_eq!(snitch.number_of_registers(RegisterClass::Vector), 0);
        assert_eq!(snitch.register_bit_width(RegisterClass::Scalar), 32);
        assert_eq!(snitch.register_bit_width(RegisterClass::Float), 64);
        assert!(snitch.supports_hardware_loops());
        assert!(snitch.prefers_stream_registers());

        let embedded = tti("riscv32-unknown-elf", "generic-rv32", "+e");
        assert_eq!(embedded.number_of_registers(RegisterClass::Scalar), 16);
        assert_eq!(embedded.register_bit_width(RegisterClass::Float), 0);
        assert!(!embedded.supports_hardware_loops());
    }
}
