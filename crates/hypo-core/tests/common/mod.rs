#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use hypo_core::model::{ArtifactPayload, CanonicalMetrics, DataQuality, RelationshipKey, RelationshipPayload,
                       SkippedRelationshipPayload, TestType, VariableProfilePayload, WarningCode};
use hypo_core::{Artifact, Lag, MatrixBundle, RunManifest, StagePlan, StatisticalType};

pub fn bundle() -> MatrixBundle {
    let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut b = MatrixBundle::new("snap-1".into(), "cohort-1".into(), cutoff, Lag::from_secs(86_400));
    b.add_column("age", vec![21.0, 34.0, 45.0, 52.0, 60.0], StatisticalType::Numeric).unwrap();
    b.add_column("income", vec![20.0, 35.0, 41.0, 58.0, 66.0], StatisticalType::Numeric).unwrap();
    b
}

pub fn manifest(run_id: &str, plan: &StagePlan, seed: i64) -> RunManifest {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    RunManifest::new(run_id.into(),
                     "snap-1".into(),
                     at,
                     Lag::from_secs(86_400),
                     at,
                     "registry-1".into(),
                     "cohort-1".into(),
                     plan,
                     seed,
                     "1.0.0")
}

pub fn rel_key(x: &str, y: &str) -> RelationshipKey {
    RelationshipKey { variable_x: x.into(),
                      variable_y: y.into(),
                      test_type: TestType::Pearson,
                      family_id: "family-1".into() }
}

pub fn relationship(x: &str, y: &str) -> Artifact {
    Artifact::new(ArtifactPayload::Relationship(RelationshipPayload { key: rel_key(x, y),
                                                                       metrics: CanonicalMetrics { effect_size: 0.4,
                                                                                                   p_value: 0.01,
                                                                                                   sample_size: 50,
                                                                                                   total_comparisons: 1,
                                                                                                   ..CanonicalMetrics::default() },
                                                                       data_quality: DataQuality::default(),
                                                                       warnings: Vec::new(),
                                                                       fingerprint: "fp".into(),
                                                                       discovered_at: Utc::now() }))
}

pub fn skipped(x: &str, y: &str, reason: WarningCode) -> Artifact {
    Artifact::new(ArtifactPayload::SkippedRelationship(SkippedRelationshipPayload { key: rel_key(x, y),
                                                                                     reason_code: reason,
                                                                                     counts: Default::default(),
                                                                                     data_quality: DataQuality::default(),
                                                                                     first_seen_at: Utc::now() }))
}

pub fn profile(key: &str) -> Artifact {
    Artifact::new(ArtifactPayload::VariableProfile(VariableProfilePayload { variable_key: key.into(),
                                                                             sample_size: 5,
                                                                             missing_rate: 0.0,
                                                                             variance: 1.0,
                                                                             cardinality: 5,
                                                                             zero_variance: false,
                                                                             high_cardinality: true,
                                                                             profiled_at: Utc::now() }))
}
