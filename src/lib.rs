//! hypoflow: pipeline reproducible de hipótesis.
//!
//! Une `hypo-core` (ledger, manifest, orquestador) con los stages de
//! `hypo-stats` y la configuración leída del entorno. Puede usarse desde
//! `main.rs` o por otros clientes.

pub mod config;
pub mod errors;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use hypo_core::stage::names;
use hypo_core::{CohortHash, DeterministicRng, InMemoryLedger, Lag, Orchestrator, RegistryHash, RunId, RunManifest,
                SnapshotId, StageKind, StagePlan, StageSpec};
use hypo_stats::standard_executors;

pub use config::{HypoConfig, CONFIG};
pub use errors::AppError;

/// Orquestador en memoria con los executors estándar y los defaults del
/// referee tomados de `config`.
pub fn standard_orchestrator(config: &HypoConfig) -> Orchestrator<Arc<InMemoryLedger>> {
    info!("hypoflow:orchestrator shuffles={} significance={} early_stop={}",
          config.num_shuffles,
          config.significance,
          config.early_stop);
    Orchestrator::builder(Arc::new(InMemoryLedger::new()))
        .executors(standard_executors(Arc::new(DeterministicRng::new()), config.referee()))
        .build()
}

/// Plan completo: profile → pairwise → sweep → battery → audit.
pub fn standard_plan() -> StagePlan {
    StagePlan::new(vec![StageSpec::new(names::PROFILE, StageKind::Stats),
                        StageSpec::new(names::PAIRWISE, StageKind::Stats),
                        StageSpec::new(names::SWEEP, StageKind::Stats),
                        StageSpec::new("battery", StageKind::Battery),
                        StageSpec::new("audit", StageKind::Audit)])
}

/// Manifest de una corrida con la seed y versión de `config`. El corte se
/// deriva del snapshot: `cutoff_at = snapshot_at - lag`.
#[allow(clippy::too_many_arguments)]
pub fn manifest_for(config: &HypoConfig,
                    run_id: RunId,
                    snapshot_id: SnapshotId,
                    snapshot_at: DateTime<Utc>,
                    lag: Lag,
                    registry_hash: RegistryHash,
                    cohort_hash: CohortHash,
                    plan: &StagePlan)
                    -> RunManifest {
    RunManifest::new(run_id,
                     snapshot_id,
                     snapshot_at,
                     lag,
                     lag.apply(snapshot_at),
                     registry_hash,
                     cohort_hash,
                     plan,
                     config.base_seed,
                     config.code_version.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_plan_is_valid() {
        let plan = standard_plan();
        assert!(plan.validate().is_ok());
        assert_eq!(plan.len(), 5);
        let stats: Vec<&str> = plan.stages_by_kind(StageKind::Stats).iter().map(|s| s.name.as_str()).collect();
        assert_eq!(stats, vec![names::PROFILE, names::PAIRWISE, names::SWEEP]);
    }

    #[test]
    fn manifest_uses_config_seed_and_version() {
        let cfg = HypoConfig { base_seed: 9,
                               code_version: "3.0.0".into(),
                               ..HypoConfig::default() };
        let now = Utc::now();
        let m = manifest_for(&cfg,
                             "r".into(),
                             "s".into(),
                             now,
                             Lag::from_secs(3_600),
                             "reg".into(),
                             "coh".into(),
                             &standard_plan());
        assert_eq!(m.seed, 9);
        assert_eq!(m.code_version, "3.0.0");
        assert!(m.verify_fingerprint());
        assert_eq!(m.snapshot_at, now);
        assert_eq!(m.cutoff_at, now - chrono::Duration::seconds(3_600));
    }
}
