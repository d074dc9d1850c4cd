//! Stages concretos del pipeline.
//!
//! Cada stage es puro respecto a `(bundle, spec, manifest)`: devuelve
//! artifacts sin persistirlos. Los executors de `crate::executors` los
//! despachan por `StageKind` y nombre.

pub mod audit;
pub mod battery;
pub mod pairwise;
pub mod profile;
pub mod sweep;

pub use audit::{AuditStage, HealthThresholds};
pub use battery::BatteryStage;
pub use pairwise::{PairwiseReport, PairwiseStage, MAX_PAIRS, MAX_VARIABLES};
pub use profile::ProfileStage;
pub use sweep::SweepStage;

use hypo_core::model::{FamilyKey, TestType};
use hypo_core::{StageContext, StageError};

/// Familia FDR de un stage: mismos datos, mismo test, mismo plan.
pub(crate) fn family_key(ctx: &StageContext<'_>, test: TestType) -> FamilyKey {
    FamilyKey { snapshot_id: ctx.bundle.snapshot_id.clone(),
                cohort_hash: ctx.bundle.cohort_hash.clone(),
                stage_name: ctx.stage_name().to_string(),
                test_type: test,
                registry_hash: ctx.manifest.registry_hash.clone(),
                stage_plan_hash: ctx.manifest.stage_plan_hash.clone() }
}

/// Lee `config.test`; ausente → Pearson.
pub(crate) fn configured_test(ctx: &StageContext<'_>) -> Result<TestType, StageError> {
    match ctx.spec.config_str("test") {
        None => Ok(TestType::Pearson),
        Some(raw) => TestType::parse(raw).ok_or_else(|| StageError::InvalidConfig(format!("unsupported test: {raw}"))),
    }
}

pub(crate) fn ensure_bundle(ctx: &StageContext<'_>) -> Result<(), StageError> {
    ctx.bundle
       .validate()
       .map_err(|e| StageError::Execution(format!("invalid matrix bundle: {e}")))
}
