//! Implementaciones de `StageExecutor` para los tres `StageKind`.

use log::debug;
use std::sync::Arc;

use hypo_core::stage::names;
use hypo_core::{RngPort, StageContext, StageError, StageExecutor, StageKind, StageOutput};

use crate::referee::RefereeConfig;
use crate::stages::{AuditStage, BatteryStage, PairwiseStage, ProfileStage, SweepStage};

/// Stages `Stats`, despachados por nombre: `profile`, `pairwise`, `sweep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsExecutor {
    profile: ProfileStage,
    pairwise: PairwiseStage,
    sweep: SweepStage,
}

impl StatsExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StageExecutor for StatsExecutor {
    fn kind(&self) -> StageKind {
        StageKind::Stats
    }

    fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        debug!("stats:dispatch stage={}", ctx.stage_name());
        match ctx.stage_name() {
            names::PROFILE => self.profile.execute(ctx),
            names::PAIRWISE => self.pairwise.execute(ctx),
            names::SWEEP => self.sweep.execute(ctx),
            other => Err(StageError::UnknownStage(other.to_string())),
        }
    }
}

/// Stages `Battery`: todos pasan por el referee de permutaciones.
#[derive(Debug)]
pub struct BatteryExecutor {
    stage: BatteryStage,
}

impl BatteryExecutor {
    pub fn new(rng: Arc<dyn RngPort>, defaults: RefereeConfig) -> Self {
        Self { stage: BatteryStage::new(rng, defaults) }
    }
}

impl StageExecutor for BatteryExecutor {
    fn kind(&self) -> StageKind {
        StageKind::Battery
    }

    fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        self.stage.execute(ctx)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuditExecutor {
    stage: AuditStage,
}

impl AuditExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StageExecutor for AuditExecutor {
    fn kind(&self) -> StageKind {
        StageKind::Audit
    }

    fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        self.stage.execute(ctx)
    }
}

/// Executors de los tres kinds, listos para `OrchestratorBuilder::executors`.
pub fn standard_executors(rng: Arc<dyn RngPort>, referee: RefereeConfig) -> Vec<Box<dyn StageExecutor>> {
    vec![Box::new(StatsExecutor::new()),
         Box::new(BatteryExecutor::new(rng, referee)),
         Box::new(AuditExecutor::new())]
}
