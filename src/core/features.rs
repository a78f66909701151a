// This module parses target feature strings ("+m,+a,-c,+xssr") into an ordered FeatureSet and
// carries the table of CPUs this backend knows about together with the features each one implies.
// Features are applied left to right so later entries override earlier ones, and CPU-implied
// features are applied before the explicit string. Enabling the D extension also enables F, as
// the ISA requires. Unknown feature names are kept (an external feature table may understand
// them) but logged, since they usually indicate a typo in a build configuration.

//! Target feature strings and the CPU table.

use std::collections::BTreeMap;
use std::fmt;

/// Feature names this backend acts on.
pub const KNOWN_FEATURES: &[&str] = &[
    "m", "a", "f", "d", "c", "v", "e", "relax",
    // Snitch stream semantic registers, FP repetition and the cluster DMA.
    "xssr", "xfrep", "xdma",
    // PULP hardware loops.
    "xpulphwloop",
];

/// Description of a known CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuInfo {
    pub name: &'static str,
    pub is_64bit: bool,
    pub features: &'static [&'static str],
}

const CPUS: &[CpuInfo] = &[
    CpuInfo { name: "generic-rv32", is_64bit: false, features: &[] },
    CpuInfo { name: "generic-rv64", is_64bit: true, features: &[] },
    CpuInfo { name: "rocket-rv32", is_64bit: false, features: &[] },
    CpuInfo { name: "rocket-rv64", is_64bit: true, features: &[] },
    CpuInfo { name: "sifive-e31", is_64bit: false, features: &["m", "a", "c"] },
    CpuInfo { name: "sifive-u54", is_64bit: true, features: &["m", "a", "f", "d", "c"] },
    CpuInfo {
        name: "snitch",
        is_64bit: false,
        features: &["m", "a", "f", "d", "xssr", "xfrep", "xdma"],
    },
];

/// Look up a CPU by name.
pub fn lookup_cpu(name: &str) -> Option<&'static CpuInfo> {
    CPUS.iter().find(|cpu| cpu.name == name)
}

/// Default CPU name for a target width.
pub fn default_cpu(is_64bit: bool) -> &'static str {
    if is_64bit {
        "generic-rv64"
    } else {
        "generic-rv32"
    }
}

/// Ordered set of enabled/disabled features.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    features: BTreeMap<String, bool>,
}

impl FeatureSet {
    /// Parse a comma separated feature string. Entries without a sign enable the feature.
    pub fn parse(features: &str) -> Self {
        let mut set = FeatureSet::default();
        set.apply(features);
        set
    }

    /// Features implied by `cpu`, then the explicit feature string on top.
    pub fn for_cpu(cpu: &str, features: &str) -> Self {
        let mut set = FeatureSet::default();
        match lookup_cpu(cpu) {
            Some(info) => {
                for name in info.features {
                    set.set(name, true);
                }
            }
            None => log::debug!("cpu '{}' is not in the cpu table, no implied features", cpu),
        }
        set.apply(features);
        set
    }

    /// Apply a feature string on top of the current set.
    pub fn apply(&mut self, features: &str) {
        for entry in features.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (enabled, name) = match entry.as_bytes()[0] {
                b'+' => (true, &entry[1..]),
                b'-' => (false, &entry[1..]),
                _ => (true, entry),
            };
            if name.is_empty() {
                continue;
            }
            if enabled && !KNOWN_FEATURES.contains(&name) {
                log::warn!("enabling unknown target feature '{}'", name);
            }
            self.set(name, enabled);
        }
    }

    fn set(&mut self, name: &str, enabled: bool) {
        self.features.insert(name.to_string(), enabled);
        match (name, enabled) {
            ("d", true) => {
                self.features.insert("f".to_string(), true);
            }
            ("f", false) => {
                self.features.insert("d".to_string(), false);
            }
            _ => {}
        }
    }

    /// Is the feature enabled?
    pub fn has(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }

    /// Enabled feature names in sorted order.
    pub fn enabled(&self) -> impl Iterator<Item = &str> + '_ {
        self.features
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, enabled) in &self.features {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{}{}", if *enabled { '+' } else { '-' }, name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_string() {
        let set = FeatureSet::parse("+m,+a,-c,xssr");
        assert!(set.has("m"));
        assert!(set.has("a"));
        assert!(!set.has("c"));
        assert!(set.has("xssr"));
        assert!(!set.has("v"));
    }

    #[test]
    fn test_later_entries_win() {
        let set = FeatureSet::parse("+c,-c");
        assert!(!set.has("c"));
        let set = FeatureSet::parse("-m,+m");
        assert!(set.has("m"));
    }

    #[test]
    fn test_d_implies_f() {
        let set = FeatureSet::parse("+d");
        assert!(set.has("f"));
        let set = FeatureSet::parse("+d,-f");
        assert!(!set.has("d"));
    }

    #[test]
    fn test_cpu_features_then_explicit() {
        let set = FeatureSet::for_cpu("snitch", "-xdma");
        assert!(set.has("xssr"));
        assert!(set.has("xfrep"));
        assert!(!set.has("xdma"));

        let set = FeatureSet::for_cpu("no-such-cpu", "+m");
        assert_eq!(set.enabled().collect::<Vec<_>>(), vec!["m"]);
    }

    #[test]
    fn test_display_is_sorted() {
        let set = FeatureSet::parse("+m,-c,+a");
        assert_eq!(set.to_string(), "+a,-c,+m");
    }

    #[test]
    fn test_cpu_table() {
        assert!(lookup_cpu("sifive-u54").unwrap().is_64bit);
        assert!(!lookup_cpu("snitch").unwrap().is_64bit);
        assert_eq!(default_cpu(true), "generic-rv64");
        assert_eq!(default_cpu(false), "generic-rv32");
    }
}
