// This module builds the ordered code generation pipeline of the backend. A Pipeline is a pure
// function of the optimization level and the instruction selection strategy: the builder appends
// stages phase by phase (IR, instruction selection, pre-RA, pre-sched2, pre-emit, pre-emit 2) and
// the result is immutable. The order inside each phase is a correctness requirement. SSR regions
// and DMA descriptors are expanded before register allocation and before the loop transforms
// that must see their final shape; pre-sched2 is kept empty because a post-RA scheduler running
// after SSR expansion could move stream register accesses across the region enable/disable
// boundary or reorder a stream; the atomic pseudo expansion runs last so no later stage can move
// code into or out of an LR/SC sequence. verify re-checks these invariants on any pipeline, and
// run hands the stages in order to an external executor.

//! Code generation pipeline construction.
//!
//! ```text
//! IR             atomic-expand
//! ISel           riscv-isel | irtranslator, legalizer, regbankselect, instruction-select
//! PreRegAlloc    riscv-expand-sdma, riscv-expand-ssr, snitch-freploops,
//!                [>O0] riscv-merge-base-offset, riscv-cleanup-vsetvli, pulp-hardware-loops
//! PreSched2      (empty)
//! PreEmit        branch-relaxation
//! PreEmit2       riscv-expand-pseudo, pulp-fixup-hwloops,
//!                riscv-expand-ssr-post-regalloc, riscv-expand-atomic-pseudo
//! ```

use std::fmt;

use thiserror::Error;

use crate::core::error::TargetResult;
use crate::core::options::OptLevel;

use super::subtarget::Subtarget;

/// Extension point a stage is scheduled at, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Ir,
    InstructionSelection,
    PreRegAlloc,
    PreSched2,
    PreEmit,
    PreEmit2,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Ir,
        Phase::InstructionSelection,
        Phase::PreRegAlloc,
        Phase::PreSched2,
        Phase::PreEmit,
        Phase::PreEmit2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Ir => "ir",
            Phase::InstructionSelection => "isel",
            Phase::PreRegAlloc => "pre-regalloc",
            Phase::PreSched2 => "pre-sched2",
            Phase::PreEmit => "pre-emit",
            Phase::PreEmit2 => "pre-emit2",
        }
    }
}

/// Instruction selection strategy. Exactly one is used per pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorStrategy {
    /// DAG pattern matching in a single stage.
    Pattern,
    /// IR translation, legalization, register bank selection, instruction selection.
    Generic,
}

/// A transformation the pipeline can schedule. The bodies live elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    AtomicExpand,
    RiscvIselDag,
    IrTranslator,
    Legalizer,
    RegBankSelect,
    InstructionSelect,
    ExpandSdma,
    ExpandSsr,
    FrepLoops,
    MergeBaseOffset,
    CleanupVsetvli,
    PulpHardwareLoops,
    BranchRelaxation,
    ExpandPseudo,
    PulpFixupHwLoops,
    ExpandSsrPostRegAlloc,
    ExpandAtomicPseudo,
}

impl Stage {
    pub const ALL: [Stage; 17] = [
        Stage::AtomicExpand,
        Stage::RiscvIselDag,
        Stage::IrTranslator,
        Stage::Legalizer,
        Stage::RegBankSelect,
        Stage::InstructionSelect,
        Stage::ExpandSdma,
        Stage::ExpandSsr,
        Stage::FrepLoops,
        Stage::MergeBaseOffset,
        Stage::CleanupVsetvli,
        Stage::PulpHardwareLoops,
        Stage::BranchRelaxation,
        Stage::ExpandPseudo,
        Stage::PulpFixupHwLoops,
        Stage::ExpandSsrPostRegAlloc,
        Stage::ExpandAtomicPseudo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::AtomicExpand => "atomic-expand",
            Stage::RiscvIselDag => "riscv-isel",
            Stage::IrTranslator => "irtranslator",
            Stage::Legalizer => "legalizer",
            Stage::RegBankSelect => "regbankselect",
            Stage::InstructionSelect => "instruction-select",
            Stage::ExpandSdma => "riscv-expand-sdma",
            Stage::ExpandSsr => "riscv-expand-ssr",
            Stage::FrepLoops => "snitch-freploops",
            Stage::MergeBaseOffset => "riscv-merge-base-offset",
            Stage::CleanupVsetvli => "riscv-cleanup-vsetvli",
            Stage::PulpHardwareLoops => "pulp-hardware-loops",
            Stage::BranchRelaxation => "branch-relaxation",
            Stage::ExpandPseudo => "riscv-expand-pseudo",
            Stage::PulpFixupHwLoops => "pulp-fixup-hwloops",
            Stage::ExpandSsrPostRegAlloc => "riscv-expand-ssr-post-regalloc",
            Stage::ExpandAtomicPseudo => "riscv-expand-atomic-pseudo",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Stage::AtomicExpand => {
                "Expand atomic operations without a native encoding into LR/SC loops"
            }
            Stage::RiscvIselDag => "RISC-V DAG->DAG pattern instruction selection",
            Stage::IrTranslator => "Translate IR to generic machine instructions",
            Stage::Legalizer => "Legalize generic machine instructions",
            Stage::RegBankSelect => "Assign register banks to generic virtual registers",
            Stage::InstructionSelect => {
                "Select target instructions for generic machine instructions"
            }
            Stage::ExpandSdma => "Expand SDMA descriptor pseudo instructions",
            Stage::ExpandSsr => "Expand SSR region pseudo instructions",
            Stage::FrepLoops => "Form Snitch frep loops",
            Stage::MergeBaseOffset => "Merge base + offset address computations",
            Stage::CleanupVsetvli => "Remove redundant vsetvli instructions",
            Stage::PulpHardwareLoops => "Form PULP hardware loops",
            Stage::BranchRelaxation => "Relax out-of-range branches",
            Stage::ExpandPseudo => "Expand remaining pseudo instructions",
            Stage::PulpFixupHwLoops => "Fix up PULP hardware loop bodies",
            Stage::ExpandSsrPostRegAlloc => {
                "Expand SSR pseudo instructions after register allocation"
            }
            Stage::ExpandAtomicPseudo => "Expand atomic pseudo instructions",
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            Stage::AtomicExpand => Phase::Ir,
            Stage::RiscvIselDag
            | Stage::IrTranslator
            | Stage::Legalizer
            | Stage::RegBankSelect
            | Stage::InstructionSelect => Phase::InstructionSelection,
            Stage::ExpandSdma
            | Stage::ExpandSsr
            | Stage::FrepLoops
            | Stage::MergeBaseOffset
            | Stage::CleanupVsetvli
            | Stage::PulpHardwareLoops => Phase::PreRegAlloc,
            Stage::BranchRelaxation => Phase::PreEmit,
            Stage::ExpandPseudo
            | Stage::PulpFixupHwLoops
            | Stage::ExpandSsrPostRegAlloc
            | Stage::ExpandAtomicPseudo => Phase::PreEmit2,
        }
    }

    /// Selection strategy this stage belongs to, for selector stages.
    pub fn selector(self) -> Option<SelectorStrategy> {
        match self {
            Stage::RiscvIselDag => Some(SelectorStrategy::Pattern),
            Stage::IrTranslator
            | Stage::Legalizer
            | Stage::RegBankSelect
            | Stage::InstructionSelect => Some(SelectorStrategy::Generic),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Stage> {
        Stage::ALL.into_iter().find(|stage| stage.name() == name)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every stage the backend can schedule.
pub fn pass_registry() -> &'static [Stage] {
    &Stage::ALL
}

/// Ordering rule broken by a pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderingViolation {
    #[error("{0} is scheduled after the atomic pseudo expansion")]
    AfterAtomicExpansion(Stage),

    #[error("atomic pseudo expansion is missing")]
    MissingAtomicExpansion,

    #[error("pipeline mixes pattern and generic instruction selection")]
    MixedSelectors,

    #[error("pipeline has no instruction selection")]
    MissingInstructionSelection,

    #[error("{0:?} instruction selection stages are incomplete or repeated")]
    IncompleteInstructionSelection(SelectorStrategy),

    #[error("{0} runs in phase {1} after a later phase")]
    PhaseOutOfOrder(Stage, &'static str),

    #[error("{0} is out of order within its phase")]
    StageOutOfOrder(Stage),
}

/// Executes stages on behalf of [`Pipeline::run`].
pub trait StageExecutor {
    fn run_stage(&mut self, stage: Stage, subtarget: &Subtarget) -> TargetResult<()>;
}

/// Immutable ordered list of stages for one (optimization level, selector) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    opt_level: OptLevel,
    selector: SelectorStrategy,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Build the pipeline for `opt_level` using `selector` for instruction selection.
    pub fn build(opt_level: OptLevel, selector: SelectorStrategy) -> Pipeline {
        let mut builder = PipelineBuilder {
            opt_level,
            stages: Vec::new(),
        };

        builder.add_ir_passes();
        match selector {
            SelectorStrategy::Pattern => builder.add_inst_selector(),
            SelectorStrategy::Generic => {
                builder.add_ir_translator();
                builder.add_legalize_machine_ir();
                builder.add_reg_bank_select();
                builder.add_global_instruction_select();
            }
        }
        builder.add_pre_reg_alloc();
        builder.add_pre_sched2();
        builder.add_pre_emit_pass();
        builder.add_pre_emit_pass2();

        log::debug!(
            "built {} pipeline with {:?} selection: {} stages",
            opt_level,
            selector,
            builder.stages.len()
        );

        Pipeline {
            opt_level,
            selector,
            stages: builder.stages,
        }
    }

    pub fn opt_level(&self) -> OptLevel {
        self.opt_level
    }

    pub fn selector(&self) -> SelectorStrategy {
        self.selector
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn position(&self, stage: Stage) -> Option<usize> {
        self.stages.iter().position(|s| *s == stage)
    }

    /// Stages scheduled in `phase`, in order.
    pub fn stages_in(&self, phase: Phase) -> impl Iterator<Item = Stage> + '_ {
        self.stages.iter().copied().filter(move |stage| stage.phase() == phase)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Check the ordering rules every pipeline of this backend must satisfy.
    pub fn verify(&self) -> Result<(), OrderingViolation> {
        verify_stages(&self.stages)
    }

    /// Run every stage in order on `executor`, stopping at the first failure.
    pub fn run<E: StageExecutor + ?Sized>(
        &self,
        subtarget: &Subtarget,
        executor: &mut E,
    ) -> TargetResult<()> {
        for &stage in &self.stages {
            log::trace!("running {} ({})", stage, stage.phase().name());
            if let Err(err) = executor.run_stage(stage, subtarget) {
                log::error!("{}", err);
                return Err(err);
            }
        }
        Ok(())
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline ({}, {:?} selection):", self.opt_level, self.selector)?;
        for phase in Phase::ALL {
            writeln!(f, "  {}:", phase.name())?;
            let mut any = false;
            for stage in self.stages_in(phase) {
                writeln!(f, "    {}", stage)?;
                any = true;
            }
            if !any {
                writeln!(f, "    (none)")?;
            }
        }
        Ok(())
    }
}

/// Ordering checks shared by [`Pipeline::verify`] and its tests.
pub fn verify_stages(stages: &[Stage]) -> Result<(), OrderingViolation> {
    match stages.last() {
        Some(Stage::ExpandAtomicPseudo) => {}
        _ => {
            return Err(match stages.iter().position(|s| *s == Stage::ExpandAtomicPseudo) {
                Some(pos) => OrderingViolation::AfterAtomicExpansion(stages[pos + 1]),
                None => OrderingViolation::MissingAtomicExpansion,
            })
        }
    }

    let selector_stages: Vec<Stage> =
        stages.iter().copied().filter(|s| s.selector().is_some()).collect();
    let strategy = match selector_stages.first().and_then(|s| s.selector()) {
        Some(strategy) => strategy,
        None => return Err(OrderingViolation::MissingInstructionSelection),
    };
    if selector_stages.iter().any(|s| s.selector() != Some(strategy)) {
        return Err(OrderingViolation::MixedSelectors);
    }
    if selector_stages != selector_stages_for(strategy) {
        return Err(OrderingViolation::IncompleteInstructionSelection(strategy));
    }

    for pair in stages.windows(2) {
        if pair[1].phase() < pair[0].phase() {
            return Err(OrderingViolation::PhaseOutOfOrder(pair[1], pair[1].phase().name()));
        }
    }

    // Within a phase, stages keep their relative order in the canonical list.
    let canonical = |stage: &Stage| Stage::ALL.iter().position(|s| s == stage);
    for pair in stages.windows(2) {
        if pair[0].phase() == pair[1].phase() && canonical(&pair[1]) <= canonical(&pair[0]) {
            return Err(OrderingViolation::StageOutOfOrder(pair[1]));
        }
    }

    Ok(())
}

/// The complete, ordered stage set of a selection strategy.
fn selector_stages_for(strategy: SelectorStrategy) -> &'static [Stage] {
    match strategy {
        SelectorStrategy::Pattern => &[Stage::RiscvIselDag],
        SelectorStrategy::Generic => &[
            Stage::IrTranslator,
            Stage::Legalizer,
            Stage::RegBankSelect,
            Stage::InstructionSelect,
        ],
    }
}

struct PipelineBuilder {
    opt_level: OptLevel,
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    fn add_pass(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    fn add_ir_passes(&mut self) {
        self.add_pass(Stage::AtomicExpand);
    }

    fn add_inst_selector(&mut self) {
        self.add_pass(Stage::RiscvIselDag);
    }

    fn add_ir_translator(&mut self) {
        self.add_pass(Stage::IrTranslator);
    }

    fn add_legalize_machine_ir(&mut self) {
        self.add_pass(Stage::Legalizer);
    }

    fn add_reg_bank_select(&mut self) {
        self.add_pass(Stage::RegBankSelect);
    }

    fn add_global_instruction_select(&mut self) {
        self.add_pass(Stage::InstructionSelect);
    }

    fn add_pre_reg_alloc(&mut self) {
        self.add_pass(Stage::ExpandSdma);
        self.add_pass(Stage::ExpandSsr);
        self.add_pass(Stage::FrepLoops);
        if self.opt_level != OptLevel::None {
            self.add_pass(Stage::MergeBaseOffset);
            self.add_pass(Stage::CleanupVsetvli);
            self.add_pass(Stage::PulpHardwareLoops);
        }
    }

    /// Stays empty. A post-RA scheduler here would see expanded SSR regions and
    /// could move stream register accesses across ssr enable/disable or reorder
    /// them within a stream.
    fn add_pre_sched2(&mut self) {}

    fn add_pre_emit_pass(&mut self) {
        self.add_pass(Stage::BranchRelaxation);
    }

    fn add_pre_emit_pass2(&mut self) {
        self.add_pass(Stage::ExpandPseudo);
        self.add_pass(Stage::PulpFixupHwLoops);
        self.add_pass(Stage::ExpandSsrPostRegAlloc);
        // Last, so nothing can break forward progress of the LR/SC sequences.
        self.add_pass(Stage::ExpandAtomicPseudo);
    }
}
