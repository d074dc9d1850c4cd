//! Fingerprint de una corrida.
//!
//! Es una función pura de seis entradas: snapshot, registry, cohort, plan,
//! seed y versión de código. Cualquier cambio en una de ellas produce un
//! fingerprint distinto; con las mismas entradas el resultado es idéntico
//! byte a byte, lo que permite verificar un replay.

use serde::{Deserialize, Serialize};

use crate::hashing::hash_str;
use crate::ids::{CohortHash, RegistryHash, SnapshotId, StagePlanHash};

/// Entradas de determinismo junto al hash resultante.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub snapshot_id: SnapshotId,
    pub registry_hash: RegistryHash,
    pub cohort_hash: CohortHash,
    pub stage_plan_hash: StagePlanHash,
    pub seed: i64,
    pub code_version: String,
    pub fingerprint: String,
}

impl RunFingerprint {
    pub fn new(snapshot_id: SnapshotId,
               registry_hash: RegistryHash,
               cohort_hash: CohortHash,
               stage_plan_hash: StagePlanHash,
               seed: i64,
               code_version: impl Into<String>)
               -> Self {
        let code_version = code_version.into();
        let fingerprint = compute_run_fingerprint(&snapshot_id,
                                                  &registry_hash,
                                                  &cohort_hash,
                                                  &stage_plan_hash,
                                                  seed,
                                                  &code_version);
        Self { snapshot_id,
               registry_hash,
               cohort_hash,
               stage_plan_hash,
               seed,
               code_version,
               fingerprint }
    }
}

/// SHA-256 (hex minúsculas) de
/// `snapshot:{}|registry:{}|cohort:{}|stage_plan:{}|seed:{}|code:{}`.
pub fn compute_run_fingerprint(snapshot_id: &SnapshotId,
                               registry_hash: &RegistryHash,
                               cohort_hash: &CohortHash,
                               stage_plan_hash: &StagePlanHash,
                               seed: i64,
                               code_version: &str)
                               -> String {
    let data = format!("snapshot:{snapshot_id}|registry:{registry_hash}|cohort:{cohort_hash}|stage_plan:{stage_plan_hash}|seed:{seed}|code:{code_version}");
    hash_str(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hash_str;

    #[test]
    fn matches_documented_layout() {
        let fp = compute_run_fingerprint(&"snap".into(), &"reg".into(), &"coh".into(), &"plan".into(), -7, "1.0.0");
        let expected = hash_str("snapshot:snap|registry:reg|cohort:coh|stage_plan:plan|seed:-7|code:1.0.0");
        assert_eq!(fp, expected);
    }
}
