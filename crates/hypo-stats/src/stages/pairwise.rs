//! Stage `pairwise`: correlación de cada par de variables (triángulo
//! superior) con corrección BH sobre la familia.
//!
//! Un par se salta, con artifact `SkippedRelationship`, cuando:
//! - alguna variable tiene más de 30% de faltantes (`HIGH_MISSING`),
//! - quedan menos de 3 pares válidos (`LOW_N`),
//! - alguna variable es constante sobre los pares válidos (`LOW_VARIANCE`).

use chrono::Utc;
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};

use hypo_core::hashing::hash_value;
use hypo_core::model::{Artifact, ArtifactPayload, CanonicalMetrics, DataQuality, FdrFamilyPayload, RelationshipKey,
                       RelationshipPayload, SkippedRelationshipPayload, TestType, WarningCode};
use hypo_core::stage::StageMetrics;
use hypo_core::{MatrixBundle, StageContext, StageError, StageOutput};

use crate::correlation::{correlation, correlation_p_value, is_constant, paired_finite, sample_variance,
                         ZERO_VARIANCE_EPS};
use crate::fdr::{benjamini_hochberg, BH_METHOD};
use crate::stages::{configured_test, ensure_bundle, family_key};

pub const MAX_VARIABLES: usize = 2_000;
pub const MAX_PAIRS: usize = 500_000;
pub const MAX_MISSING_RATE: f64 = 0.30;
pub const MIN_VALID_PAIRS: usize = 3;

/// Salida del análisis de pares, antes de empaquetar en artifacts.
#[derive(Debug, Clone, Default)]
pub struct PairwiseReport {
    pub relationships: Vec<RelationshipPayload>,
    pub skipped: Vec<SkippedRelationshipPayload>,
}

impl PairwiseReport {
    pub fn total_comparisons(&self) -> usize {
        self.relationships.len() + self.skipped.len()
    }

    pub fn skips_by_reason(&self) -> BTreeMap<WarningCode, usize> {
        self.skipped.iter().fold(BTreeMap::new(), |mut acc, s| {
                               *acc.entry(s.reason_code).or_insert(0) += 1;
                               acc
                           })
    }
}

enum PairOutcome {
    Tested(RelationshipPayload),
    Skipped(SkippedRelationshipPayload),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseStage;

impl PairwiseStage {
    pub fn new() -> Self {
        Self
    }

    /// Analiza todos los pares y aplica BH a los testeados. Falla si se
    /// superan los límites de variables o pares.
    pub fn analyze(&self,
                   bundle: &MatrixBundle,
                   test: TestType,
                   family_id: &str,
                   is_cancelled: &dyn Fn() -> bool)
                   -> Result<PairwiseReport, StageError> {
        let variables = bundle.variable_keys();
        let num_vars = variables.len();
        if num_vars > MAX_VARIABLES {
            return Err(StageError::Execution(format!("too many variables: {num_vars} > {MAX_VARIABLES}")));
        }
        let total_pairs = num_vars * num_vars.saturating_sub(1) / 2;
        if total_pairs > MAX_PAIRS {
            return Err(StageError::Execution(format!("too many variable pairs: {total_pairs} > {MAX_PAIRS}")));
        }

        let columns: Vec<Vec<f64>> = variables.iter()
                                              .map(|k| bundle.column_data(k).unwrap_or_default())
                                              .collect();
        let mut report = PairwiseReport::default();
        for i in 0..num_vars {
            if is_cancelled() {
                return Err(StageError::Cancelled);
            }
            for j in i + 1..num_vars {
                let key = RelationshipKey { variable_x: variables[i].clone(),
                                            variable_y: variables[j].clone(),
                                            test_type: test,
                                            family_id: family_id.to_string() };
                match analyze_pair(key, &columns[i], &columns[j]) {
                    PairOutcome::Tested(rel) => report.relationships.push(rel),
                    PairOutcome::Skipped(skip) => report.skipped.push(skip),
                }
            }
        }

        apply_fdr(&mut report.relationships);
        Ok(report)
    }

    pub fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        ensure_bundle(ctx)?;
        let test = configured_test(ctx)?;
        let family = family_key(ctx, test);
        let family_id = family.family_id();
        let report = self.analyze(ctx.bundle, test, &family_id, &|| ctx.is_cancelled())?;

        info!("pairwise:done stage={} tested={} skipped={} family={}",
              ctx.stage_name(),
              report.relationships.len(),
              report.skipped.len(),
              family_id);

        let mut metrics = StageMetrics { processed_count: report.total_comparisons(),
                                         success_count: report.relationships.len(),
                                         failure_count: report.skipped.len(),
                                         ..StageMetrics::default() };
        metrics.custom.insert("family_id".to_string(), family_id.clone().into());
        metrics.custom.insert("test".to_string(), test.as_str().into());

        let num_tests = report.relationships.len();
        let mut artifacts: Vec<Artifact> =
            report.relationships
                  .into_iter()
                  .map(|r| Artifact::new(ArtifactPayload::Relationship(r)))
                  .chain(report.skipped
                               .into_iter()
                               .map(|s| Artifact::new(ArtifactPayload::SkippedRelationship(s))))
                  .collect();
        artifacts.push(Artifact::new(ArtifactPayload::FdrFamily(FdrFamilyPayload::new(family, num_tests, BH_METHOD))));

        Ok(StageOutput::new(artifacts, metrics))
    }
}

fn data_quality(x: &[f64], y: &[f64]) -> DataQuality {
    let side = |col: &[f64]| {
        let valid: Vec<f64> = col.iter().copied().filter(|v| v.is_finite()).collect();
        let missing_rate = if col.is_empty() {
            1.0
        } else {
            1.0 - valid.len() as f64 / col.len() as f64
        };
        let unique = valid.iter().map(|v| v.to_bits()).collect::<HashSet<_>>().len();
        (missing_rate, unique, sample_variance(&valid))
    };
    let (missing_rate_x, unique_count_x, variance_x) = side(x);
    let (missing_rate_y, unique_count_y, variance_y) = side(y);
    DataQuality { missing_rate_x,
                  missing_rate_y,
                  unique_count_x,
                  unique_count_y,
                  variance_x,
                  variance_y }
}

fn analyze_pair(key: RelationshipKey, x: &[f64], y: &[f64]) -> PairOutcome {
    let dq = data_quality(x, y);
    let (px, py) = paired_finite(x, y);
    let n = px.len();

    let skip_reason = if x.is_empty() || x.len() != y.len() {
        Some(WarningCode::LowN)
    } else if dq.missing_rate_x > MAX_MISSING_RATE || dq.missing_rate_y > MAX_MISSING_RATE {
        Some(WarningCode::HighMissing)
    } else if n < MIN_VALID_PAIRS {
        Some(WarningCode::LowN)
    } else if is_constant(&px, ZERO_VARIANCE_EPS) || is_constant(&py, ZERO_VARIANCE_EPS) {
        Some(WarningCode::LowVariance)
    } else {
        None
    };

    if let Some(reason_code) = skip_reason {
        debug!("pairwise:skip x={} y={} reason={reason_code} n={n}", key.variable_x, key.variable_y);
        let counts = BTreeMap::from([("sample_size".to_string(), n), ("total_rows".to_string(), x.len())]);
        return PairOutcome::Skipped(SkippedRelationshipPayload { key,
                                                                 reason_code,
                                                                 counts,
                                                                 data_quality: dq,
                                                                 first_seen_at: Utc::now() });
    }

    let r = correlation(key.test_type, &px, &py);
    let mut warnings = Vec::new();
    if r.abs() >= 1.0 - 1e-12 {
        warnings.push(WarningCode::PerfectCorrelation);
    }
    let effect_unit = match key.test_type {
        TestType::Pearson => "r",
        TestType::Spearman => "rho",
    };
    PairOutcome::Tested(RelationshipPayload { key,
                                              metrics: CanonicalMetrics { effect_size: r,
                                                                          effect_unit: Some(effect_unit.to_string()),
                                                                          p_value: correlation_p_value(r, n),
                                                                          q_value: None,
                                                                          sample_size: n,
                                                                          total_comparisons: 1,
                                                                          fdr_method: None },
                                              data_quality: dq,
                                              warnings,
                                              fingerprint: String::new(),
                                              discovered_at: Utc::now() })
}

/// BH sobre la familia; el fingerprint se calcula con las métricas finales.
fn apply_fdr(relationships: &mut [RelationshipPayload]) {
    let p_values: Vec<f64> = relationships.iter().map(|r| r.metrics.p_value).collect();
    let q_values = benjamini_hochberg(&p_values);
    let m = relationships.len();
    for (rel, q) in relationships.iter_mut().zip(q_values) {
        rel.metrics.q_value = Some(q);
        rel.metrics.total_comparisons = m;
        rel.metrics.fdr_method = Some(BH_METHOD.to_string());
        rel.fingerprint = hash_value(&(&rel.key, &rel.metrics)).unwrap_or_default();
    }
}
