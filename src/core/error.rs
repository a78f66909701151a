// This module defines the error type for the target machine layer using the thiserror crate.
// TargetError covers the two fatal configuration errors of the backend (an architecture width
// without a data layout, and an ABI requested on the command line that disagrees with the
// module's target-abi flag), plus the input errors raised while turning user text into typed
// configuration (malformed triples, unknown option names) and the failure reported by an
// external stage executor while a pipeline runs. TargetResult<T> is the matching alias.

//! Error types for target configuration.
//!
//! Every error here is fatal for the compilation that raised it. Library code
//! returns them; the driver reports and exits.

use thiserror::Error;

/// Main error type for target machine construction and subtarget resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("unsupported target '{triple}': only RV32 and RV64 are currently supported")]
    UnsupportedTriple {
        triple: String,
    },

    #[error("-target-abi option ({requested}) != target-abi module flag ({module})")]
    AbiConflict {
        requested: String,
        module: String,
    },

    #[error("invalid target triple '{triple}': {reason}")]
    InvalidTriple {
        triple: String,
        reason: String,
    },

    #[error("unknown {kind} '{value}'")]
    UnknownOption {
        kind: &'static str,
        value: String,
    },

    #[error("stage {stage} failed: {reason}")]
    StageFailed {
        stage: &'static str,
        reason: String,
    },
}

/// Result type alias for target operations.
pub type TargetResult<T> = Result<T, TargetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abi_conflict_message_names_both_sides() {
        let err = TargetError::AbiConflict {
            requested: "ilp32".to_string(),
            module: "ilp32d".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ilp32"));
        assert!(msg.contains("ilp32d"));
        assert!(msg.contains("target-abi module flag"));
    }

    #[test]
    fn test_unsupported_triple_message() {
        let err = TargetError::UnsupportedTriple {
            triple: "msp430-unknown-elf".to_string(),
        };
        assert!(err.to_string().contains("msp430-unknown-elf"));
    }
}
