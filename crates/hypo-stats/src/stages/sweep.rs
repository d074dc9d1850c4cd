//! Stage `sweep`: barrido de pares para uno o más tests y resumen en un
//! único `SweepManifest` con los metadatos de determinismo de la corrida.

use chrono::Utc;
use log::info;
use std::collections::BTreeMap;
use std::time::Instant;

use hypo_core::hashing::hash_str;
use hypo_core::model::{Artifact, ArtifactKind, ArtifactPayload, SweepManifestPayload, TestType, WarningCode};
use hypo_core::stage::{elapsed_ms, StageMetrics};
use hypo_core::{StageContext, StageError, StageOutput};

use crate::stages::pairwise::PairwiseStage;
use crate::stages::{ensure_bundle, family_key};

#[derive(Debug, Clone, Copy, Default)]
pub struct SweepStage {
    pairwise: PairwiseStage,
}

impl SweepStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// `config.tests`: lista de tests; ausente → `["pearson"]`.
    fn tests(ctx: &StageContext<'_>) -> Result<Vec<TestType>, StageError> {
        let Some(raw) = ctx.spec.config.get("tests") else {
            return Ok(vec![TestType::Pearson]);
        };
        let names = raw.as_array()
                       .ok_or_else(|| StageError::InvalidConfig("tests must be an array".to_string()))?;
        let mut tests = Vec::with_capacity(names.len());
        for name in names {
            let test = name.as_str()
                           .and_then(TestType::parse)
                           .ok_or_else(|| StageError::InvalidConfig(format!("unsupported test: {name}")))?;
            if !tests.contains(&test) {
                tests.push(test);
            }
        }
        if tests.is_empty() {
            return Err(StageError::InvalidConfig("tests cannot be empty".to_string()));
        }
        Ok(tests)
    }

    pub fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        ensure_bundle(ctx)?;
        let tests = Self::tests(ctx)?;
        let started = Instant::now();

        let mut total_comparisons = 0;
        let mut successful_tests = 0;
        let mut skipped_tests = 0;
        let mut rejection_counts: BTreeMap<WarningCode, usize> =
            [WarningCode::LowVariance, WarningCode::LowN, WarningCode::HighMissing].into_iter()
                                                                                   .map(|c| (c, 0))
                                                                                   .collect();
        for test in &tests {
            let family_id = family_key(ctx, *test).family_id();
            let report = self.pairwise.analyze(ctx.bundle, *test, &family_id, &|| ctx.is_cancelled())?;
            total_comparisons += report.total_comparisons();
            successful_tests += report.relationships.len();
            skipped_tests += report.skipped.len();
            for (code, n) in report.skips_by_reason() {
                *rejection_counts.entry(code).or_insert(0) += n;
            }
        }

        let artifact_counts = BTreeMap::from([(ArtifactKind::Relationship.to_string(), successful_tests),
                                              (ArtifactKind::SkippedRelationship.to_string(), skipped_tests)]);
        let test_names: Vec<&str> = tests.iter().map(TestType::as_str).collect();
        let fingerprint = hash_str(&format!("run:{}|tests:{}|comparisons:{}",
                                            ctx.manifest.fingerprint,
                                            test_names.join(","),
                                            total_comparisons));

        let sweep = SweepManifestPayload { sweep_id: format!("{}:{}", ctx.run_id, ctx.stage_name()),
                                           run_id: ctx.run_id.clone(),
                                           snapshot_id: ctx.bundle.snapshot_id.clone(),
                                           registry_hash: ctx.manifest.registry_hash.clone(),
                                           cohort_hash: ctx.bundle.cohort_hash.clone(),
                                           stage_plan_hash: ctx.manifest.stage_plan_hash.clone(),
                                           seed: ctx.seed(),
                                           tests_executed: tests,
                                           runtime_ms: elapsed_ms(started),
                                           total_comparisons,
                                           successful_tests,
                                           skipped_tests,
                                           rejection_counts,
                                           artifact_counts,
                                           fingerprint,
                                           created_at: Utc::now() };

        info!("sweep:done stage={} comparisons={} successful={} skipped={}",
              ctx.stage_name(),
              total_comparisons,
              successful_tests,
              skipped_tests);

        let metrics = StageMetrics { processed_count: total_comparisons,
                                     success_count: successful_tests,
                                     failure_count: skipped_tests,
                                     ..StageMetrics::default() };
        Ok(StageOutput::new(vec![Artifact::new(ArtifactPayload::SweepManifest(sweep))], metrics))
    }
}
