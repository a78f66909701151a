// This module implements the resolved per-function target configuration (Subtarget) and the
// cache that owns every Subtarget a target machine creates. A ConfigurationKey is the triple of
// resolved cpu, tune cpu and feature string; functions with equal keys share one Subtarget,
// handed out as an Arc so callers can compare configurations by pointer. SubtargetCache wraps a
// hashbrown map in a single Mutex: the whole miss path (lookup, construction through the
// caller's closure, insertion) runs under that lock, so each key is constructed exactly once even
// when several threads resolve functions against the same target machine. Entries are never
// removed; the cache lives exactly as long as its target machine. A Subtarget carries no
// codegen options: the function overlay is not part of the key, so per-function options come from
// TargetMachine::effective_options instead.

//! Resolved subtarget configuration and its cache.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use hashbrown::HashMap;

use crate::core::abi::{compute_target_abi, RiscvAbi};
use crate::core::error::TargetResult;
use crate::core::features::{lookup_cpu, FeatureSet};

use super::target_machine::TargetInfo;

/// Cache key: resolved cpu, tune cpu and feature string of a function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigurationKey {
    pub cpu: String,
    pub tune_cpu: String,
    pub features: String,
}

impl ConfigurationKey {
    pub fn new(
        cpu: impl Into<String>,
        tune_cpu: impl Into<String>,
        features: impl Into<String>,
    ) -> Self {
        Self {
            cpu: cpu.into(),
            tune_cpu: tune_cpu.into(),
            features: features.into(),
        }
    }
}

impl fmt::Display for ConfigurationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.cpu, self.tune_cpu, self.features)
    }
}

/// Immutable per-function target configuration.
#[derive(Debug)]
pub struct Subtarget {
    key: ConfigurationKey,
    features: FeatureSet,
    /// ABI name after reconciling the request with module metadata.
    abi_name: Option<String>,
    abi: RiscvAbi,
    target: Arc<TargetInfo>,
}

impl Subtarget {
    pub(crate) fn new(
        target: Arc<TargetInfo>,
        key: ConfigurationKey,
        abi_name: Option<String>,
    ) -> Self {
        if let Some(cpu) = lookup_cpu(&key.cpu) {
            if cpu.is_64bit != target.triple().is_arch_64bit() {
                log::warn!("cpu '{}' does not match target {}", key.cpu, target.triple());
            }
        }

        let features = FeatureSet::for_cpu(&key.cpu, &key.features);
        let abi = compute_target_abi(target.triple(), &features, abi_name.as_deref());

        Self {
            key,
            features,
            abi_name,
            abi,
            target,
        }
    }

    pub fn key(&self) -> &ConfigurationKey {
        &self.key
    }

    pub fn cpu(&self) -> &str {
        &self.key.cpu
    }

    pub fn tune_cpu(&self) -> &str {
        &self.key.tune_cpu
    }

    pub fn feature_string(&self) -> &str {
        &self.key.features
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// ABI name recorded for this subtarget (requested or from module metadata).
    pub fn abi_name(&self) -> Option<&str> {
        self.abi_name.as_deref()
    }

    /// ABI in effect, after validation against the target width and features.
    pub fn target_abi(&self) -> RiscvAbi {
        self.abi
    }

    /// Target machine description this subtarget was created for.
    pub fn target(&self) -> &TargetInfo {
        &self.target
    }

    pub fn is_64bit(&self) -> bool {
        self.target.triple().is_arch_64bit()
    }

    pub fn xlen(&self) -> u32 {
        if self.is_64bit() {
            64
        } else {
            32
        }
    }

    pub fn has_std_ext_m(&self) -> bool {
        self.features.has("m")
    }

    pub fn has_std_ext_a(&self) -> bool {
        self.features.has("a")
    }

    pub fn has_std_ext_f(&self) -> bool {
        self.features.has("f")
    }

    pub fn has_std_ext_d(&self) -> bool {
        self.features.has("d")
    }

    pub fn has_std_ext_c(&self) -> bool {
        self.features.has("c")
    }

    pub fn has_std_ext_v(&self) -> bool {
        self.features.has("v")
    }

    pub fn is_rv32e(&self) -> bool {
        self.features.has("e")
    }

    /// Stream semantic registers.
    pub fn has_ssr(&self) -> bool {
        self.features.has("xssr")
    }

    /// FP repetition (`frep`) hardware loops.
    pub fn has_frep(&self) -> bool {
        self.features.has("xfrep")
    }

    /// Cluster DMA engine.
    pub fn has_dma(&self) -> bool {
        self.features.has("xdma")
    }

    pub fn has_pulp_hwloops(&self) -> bool {
        self.features.has("xpulphwloop")
    }

    pub fn enable_linker_relax(&self) -> bool {
        self.features.has("relax")
    }
}

/// Insertion-only map from configuration key to subtarget.
#[derive(Debug, Default)]
pub struct SubtargetCache {
    entries: Mutex<HashMap<ConfigurationKey, Arc<Subtarget>>>,
}

impl SubtargetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the subtarget for `key`, constructing it with `create` on a miss.
    ///
    /// `create` runs with the cache locked and is called at most once per key.
    /// If it fails nothing is inserted and the error is returned.
    pub fn get_or_try_insert_with<F>(
        &self,
        key: ConfigurationKey,
        create: F,
    ) -> TargetResult<Arc<Subtarget>>
    where
        F: FnOnce(&ConfigurationKey) -> TargetResult<Subtarget>,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(&key) {
            log::trace!("subtarget cache hit for '{}'", key);
            return Ok(Arc::clone(existing));
        }

        log::debug!("subtarget cache miss for '{}'", key);
        let subtarget = Arc::new(create(&key)?);
        entries.insert(key, Arc::clone(&subtarget));
        Ok(subtarget)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
