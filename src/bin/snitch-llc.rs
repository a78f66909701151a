//! Target configuration driver.
//!
//! Builds a target machine from command line options and prints its data
//! layout, the subtarget a function with the given overrides resolves to, and
//! the code generation pipeline. Configuration errors terminate with status 1.

use clap::Parser;
use snitch_target::core::{
    CodeModel, CodegenOverrides, OptLevel, RelocModel, TargetError, TargetTriple,
};
use snitch_target::ir::{Function, Module};
use snitch_target::riscv::{
    pass_registry, registered_targets, SelectorStrategy, TargetMachine, TargetMachineConfig,
};

#[derive(Parser, Debug)]
#[command(name = "snitch-llc", about = "Inspect Snitch RISC-V target configuration")]
struct Args {
    /// Target triple
    #[arg(long = "mtriple", default_value = "riscv32-unknown-elf")]
    triple: String,

    /// Target CPU
    #[arg(long = "mcpu")]
    cpu: Option<String>,

    /// CPU to tune for
    #[arg(long = "mtune")]
    tune_cpu: Option<String>,

    /// Target features, e.g. +m,+a,+xssr
    #[arg(long = "mattr")]
    features: Option<String>,

    /// ABI requested on the command line
    #[arg(long = "target-abi")]
    target_abi: Option<String>,

    /// target-abi flag of the module being compiled
    #[arg(long = "module-abi")]
    module_abi: Option<String>,

    /// Relocation model (static, pic, dynamic-no-pic, ropi, rwpi, ropi-rwpi)
    #[arg(long = "relocation-model", value_parser = parse_reloc)]
    reloc_model: Option<RelocModel>,

    /// Code model (small/medlow, medium/medany, ...)
    #[arg(long = "code-model", value_parser = parse_code_model)]
    code_model: Option<CodeModel>,

    /// Optimization level (0-3)
    #[arg(short = 'O', default_value = "2", value_parser = parse_opt_level)]
    opt_level: OptLevel,

    /// Use the generic (four stage) instruction selector
    #[arg(long = "global-isel")]
    global_isel: bool,

    /// JIT compilation mode
    #[arg(long)]
    jit: bool,

    /// Function level target-cpu override
    #[arg(long = "fn-cpu")]
    fn_cpu: Option<String>,

    /// Function level target-features override
    #[arg(long = "fn-features")]
    fn_features: Option<String>,

    /// Function level unsafe-fp-math override
    #[arg(long = "fn-unsafe-fp-math")]
    fn_unsafe_fp_math: Option<bool>,

    /// List registered targets and stages, then exit
    #[arg(long = "list-passes")]
    list_passes: bool,
}

fn parse_reloc(s: &str) -> Result<RelocModel, TargetError> {
    s.parse()
}

fn parse_code_model(s: &str) -> Result<CodeModel, TargetError> {
    s.parse()
}

fn parse_opt_level(s: &str) -> Result<OptLevel, TargetError> {
    s.parse()
}

fn list_passes() {
    println!("Registered targets:");
    for (name, description) in registered_targets() {
        println!("  {:<10} - {}", name, description);
    }
    println!("Stages:");
    for stage in pass_registry() {
        println!(
            "  {:<32} [{}] {}",
            stage.name(),
            stage.phase().name(),
            stage.description()
        );
    }
}

fn run(args: Args) -> Result<(), TargetError> {
    let triple: TargetTriple = args.triple.parse()?;

    let mut config = TargetMachineConfig::new(triple)
        .opt_level(args.opt_level)
        .jit(args.jit);
    config.cpu = args.cpu;
    config.tune_cpu = args.tune_cpu;
    config.features = args.features;
    config.options.abi_name = args.target_abi;
    config.reloc_model = args.reloc_model;
    config.code_model = args.code_model;

    let mut module = Module::new("main");
    module.target_abi = args.module_abi;

    let tm = TargetMachine::with_module(config, &module)?;

    let mut function = Function::new("main").with_codegen(CodegenOverrides {
        unsafe_fp_math: args.fn_unsafe_fp_math,
        ..Default::default()
    });
    function.attrs.cpu = args.fn_cpu;
    function.attrs.features = args.fn_features;

    let subtarget = tm.subtarget_for(&function, &module)?;

    println!("Target:        {}", tm.triple());
    println!("Data layout:   {}", tm.data_layout());
    println!("Reloc model:   {}", tm.reloc_model().name());
    println!("Code model:    {}", tm.code_model().name());
    println!("CPU:           {}", subtarget.cpu());
    println!("Tune CPU:      {}", subtarget.tune_cpu());
    println!("Features:      {}", subtarget.features());
    println!("ABI:           {}", subtarget.target_abi());
    println!("Unsafe FP:     {}", tm.effective_options(&function).unsafe_fp_math);
    println!();

    let selector = if args.global_isel {
        SelectorStrategy::Generic
    } else {
        SelectorStrategy::Pattern
    };
    print!("{}", tm.pipeline(selector));
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.list_passes {
        list_passes();
        return;
    }

    if let Err(err) = run(args) {
        log::error!("{}", err);
        eprintln!("snitch-llc: fatal error: {}", err);
        std::process::exit(1);
    }
}
