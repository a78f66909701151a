//! Subtarget resolution and caching through the target machine.

use std::sync::Arc;

use snitch_target::core::{CodegenOverrides, RiscvAbi, TargetError};
use snitch_target::ir::{Function, Module};
use snitch_target::riscv::{TargetMachine, TargetMachineConfig};

fn rv32_machine() -> TargetMachine {
    let config = TargetMachineConfig::new("riscv32-unknown-elf".parse().unwrap()).cpu("snitch");
    TargetMachine::new(config).unwrap()
}

#[test]
fn test_same_function_twice_returns_same_object() {
    let tm = rv32_machine();
    let module = Module::new("m");
    let f = Function::new("f").with_features("+xssr");

    let first = tm.subtarget_for(&f, &module).unwrap();
    let second = tm.subtarget_for(&f, &module).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(tm.cached_subtarget_count(), 1);
}

#[test]
fn test_functions_with_equal_configuration_share_subtarget() {
    let tm = rv32_machine();
    let module = Module::new("m");

    let a = tm.subtarget_for(&Function::new("a"), &module).unwrap();
    let b = tm.subtarget_for(&Function::new("b").with_cpu("snitch"), &module).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_cache_hit_skips_abi_check() {
    let config = TargetMachineConfig::new("riscv32-unknown-elf".parse().unwrap())
        .features("+d")
        .abi("ilp32d");
    let tm = TargetMachine::new(config).unwrap();
    let f = Function::new("f");

    let agreeing = Module::new("a").with_target_abi("ilp32d");
    let conflicting = Module::new("b").with_target_abi("ilp32");

    let first = tm.subtarget_for(&f, &agreeing).unwrap();
    // Same key: served from the cache, the conflicting module flag is not consulted.
    let second = tm.subtarget_for(&f, &conflicting).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // A new key forces a fresh check and fails.
    let err = tm
        .subtarget_for(&Function::new("g").with_features("+d,+c"), &conflicting)
        .unwrap_err();
    assert!(matches!(err, TargetError::AbiConflict { .. }));
    assert_eq!(tm.cached_subtarget_count(), 1);
}

#[test]
fn test_distinct_configurations_resolve_independently() {
    let tm = rv32_machine();
    let module = Module::new("m").with_target_abi("ilp32d");

    let snitch = tm.subtarget_for(&Function::new("kernel"), &module).unwrap();
    let plain = tm
        .subtarget_for(
            &Function::new("host").with_cpu("generic-rv32").with_features("+m,+a"),
            &module,
        )
        .unwrap();

    assert!(!Arc::ptr_eq(&snitch, &plain));
    assert_eq!(tm.cached_subtarget_count(), 2);

    // Same module ABI, but only the snitch configuration has the D extension.
    assert_eq!(snitch.target_abi(), RiscvAbi::Ilp32d);
    assert_eq!(plain.target_abi(), RiscvAbi::Ilp32);
    assert!(snitch.has_ssr());
    assert!(!plain.has_ssr());
}

#[test]
fn test_tune_cpu_is_part_of_the_key() {
    let tm = rv32_machine();
    let module = Module::new("m");

    let a = tm.subtarget_for(&Function::new("a"), &module).unwrap();
    let b = tm.subtarget_for(&Function::new("b").with_tune_cpu("sifive-e31"), &module).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(b.cpu(), "snitch");
    assert_eq!(b.tune_cpu(), "sifive-e31");
}

#[test]
fn test_module_abi_adopted_lazily() {
    let tm = rv32_machine();
    let module = Module::new("late").with_target_abi("ilp32f");

    let st = tm.subtarget_for(&Function::new("f"), &module).unwrap();
    assert_eq!(st.abi_name(), Some("ilp32f"));
    assert_eq!(st.target_abi(), RiscvAbi::Ilp32f);
    // The machine-wide options are not rewritten by lazy resolution.
    assert_eq!(tm.options().abi_name, None);
}

#[test]
fn test_requested_abi_conflicts_with_late_module_flag() {
    let config = TargetMachineConfig::new("riscv32-unknown-elf".parse().unwrap()).abi("ilp32");
    let tm = TargetMachine::new(config).unwrap();

    let err = tm
        .subtarget_for(&Function::new("f"), &Module::new("m").with_target_abi("ilp32d"))
        .unwrap_err();
    assert_eq!(
        err,
        TargetError::AbiConflict {
            requested: "ilp32".to_string(),
            module: "ilp32d".to_string(),
        }
    );
    assert_eq!(tm.cached_subtarget_count(), 0);
}

#[test]
fn test_each_function_keeps_its_own_overlay() {
    let tm = rv32_machine();
    let module = Module::new("m");
    let fast = Function::new("fast").with_codegen(CodegenOverrides {
        unsafe_fp_math: Some(true),
        ..Default::default()
    });
    let strict = Function::new("strict").with_codegen(CodegenOverrides {
        unsafe_fp_math: Some(false),
        ..Default::default()
    });

    let a = tm.subtarget_for(&fast, &module).unwrap();
    let b = tm.subtarget_for(&strict, &module).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    // Resolution order does not leak one function's flags into another.
    assert!(tm.effective_options(&fast).unsafe_fp_math);
    assert!(!tm.effective_options(&strict).unsafe_fp_math);
    assert!(!tm.effective_options(&Function::new("plain")).unsafe_fp_math);
}

#[test]
fn test_concurrent_resolution_constructs_once() {
    let tm = rv32_machine();
    let module = Module::new("m");

    let resolved: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tm = &tm;
                let module = &module;
                scope.spawn(move || {
                    let features = if i % 2 == 0 { "+xssr" } else { "+xfrep" };
                    let function = Function::new(format!("f{}", i)).with_features(features);
                    tm.subtarget_for(&function, module).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(tm.cached_subtarget_count(), 2);
    for (i, st) in resolved.iter().enumerate() {
        assert!(Arc::ptr_eq(st, &resolved[i % 2]));
    }
}
