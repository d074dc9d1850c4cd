//! Test de permutaciones sobre una hipótesis causa → efecto.
//!
//! Flujo de `validate_hypothesis`:
//! 1. Resolver ambas columnas en el bundle (ausente → `Inadmissible`).
//! 2. Parear filas finitas; con menos de 2 pares el resultado es trivial.
//! 3. Estadístico observado (Pearson, o Spearman vía rangos).
//! 4. Distribución nula: `N` permutaciones de `y` por bloques paralelos.
//!    La permutación `i` usa el stream ChaCha `i` derivado del seed de la
//!    relación, de modo que el resultado no depende del scheduling.
//! 5. p bilateral = fracción de `|nulo| >= |observado|`.
//!
//! El corte temprano se evalúa al cerrar cada bloque y sólo se dispara
//! cuando la decisión con `N` completo ya no puede cambiar.

use chrono::Utc;
use log::debug;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use hypo_core::dataset::StatisticalType;
use hypo_core::model::{FalsificationLog, NullDistributionSummary, RejectionReason, TestType, ValidationResult,
                       VerdictStatus};
use hypo_core::{CancellationFlag, HypothesisId, MatrixBundle, RngPort, VariableKey};

use crate::correlation::{correlation, correlation_p_value, paired_finite, pearson, rank_average, summarize};
use crate::errors::RefereeError;
use crate::referee::config::{RefereeConfig, LIKELY_RANDOM_THRESHOLD};

/// Hipótesis a validar: `cause_key` explica `effect_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HypothesisSpec {
    pub id: HypothesisId,
    pub cause_key: VariableKey,
    pub effect_key: VariableKey,
}

impl HypothesisSpec {
    pub fn new(id: impl Into<HypothesisId>, cause_key: impl Into<VariableKey>, effect_key: impl Into<VariableKey>) -> Self {
        Self { id: id.into(),
               cause_key: cause_key.into(),
               effect_key: effect_key.into() }
    }

    /// Componente `relationship` de la derivación de seed.
    pub fn relationship_key(&self) -> String {
        format!("{}:{}", self.cause_key, self.effect_key)
    }
}

/// Coordenadas de la corrida para derivar el stream de RNG.
#[derive(Debug, Clone, Copy)]
pub struct RefereeContext<'a> {
    pub run_id: &'a str,
    pub stage_name: &'a str,
    pub base_seed: i64,
    pub cancel: Option<&'a CancellationFlag>,
}

impl<'a> RefereeContext<'a> {
    pub fn new(run_id: &'a str, stage_name: &'a str, base_seed: i64) -> Self {
        Self { run_id,
               stage_name,
               base_seed,
               cancel: None }
    }

    pub fn with_cancellation(mut self, cancel: &'a CancellationFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancellationFlag::is_cancelled)
    }
}

/// Par más fuerte encontrado por `find_primary_relationship`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryRelationship {
    pub variable_x: VariableKey,
    pub variable_y: VariableKey,
    pub test: TestType,
    pub effect_size: f64,
}

struct NullDraw {
    values: Vec<f64>,
    extreme: usize,
}

pub struct PermutationReferee {
    rng: Arc<dyn RngPort>,
    config: RefereeConfig,
}

impl std::fmt::Debug for PermutationReferee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermutationReferee").field("config", &self.config).finish()
    }
}

impl PermutationReferee {
    pub fn new(rng: Arc<dyn RngPort>) -> Self {
        Self::with_config(rng, RefereeConfig::default())
    }

    pub fn with_config(rng: Arc<dyn RngPort>, config: RefereeConfig) -> Self {
        Self { rng, config }
    }

    pub fn config(&self) -> &RefereeConfig {
        &self.config
    }

    /// Acota a [1000, 100000].
    pub fn set_num_shuffles(&mut self, n: usize) {
        self.config.set_num_shuffles(n);
    }

    /// Test según el tipo estadístico de ambas columnas.
    pub fn select_test(&self, bundle: &MatrixBundle, x: &VariableKey, y: &VariableKey) -> TestType {
        let numeric = |k: &VariableKey| {
            bundle.column_meta(k)
                  .is_some_and(|m| m.statistical_type == StatisticalType::Numeric)
        };
        if numeric(x) && numeric(y) {
            self.config.test.unwrap_or(TestType::Pearson)
        } else {
            TestType::Pearson
        }
    }

    /// Par numérico con mayor |efecto| del triángulo superior.
    pub fn find_primary_relationship(&self, bundle: &MatrixBundle) -> Option<PrimaryRelationship> {
        let numeric: Vec<&VariableKey> =
            bundle.column_meta
                  .iter()
                  .filter(|m| m.statistical_type == StatisticalType::Numeric)
                  .map(|m| &m.variable_key)
                  .collect();

        let mut best: Option<PrimaryRelationship> = None;
        for (i, x) in numeric.iter().enumerate() {
            let Some(col_x) = bundle.column_data(x) else { continue };
            for y in &numeric[i + 1..] {
                let Some(col_y) = bundle.column_data(y) else { continue };
                let (px, py) = paired_finite(&col_x, &col_y);
                if px.len() < 2 {
                    continue;
                }
                let test = self.select_test(bundle, x, y);
                let effect = correlation(test, &px, &py).abs();
                if best.as_ref().map_or(true, |b| effect > b.effect_size) {
                    best = Some(PrimaryRelationship { variable_x: (*x).clone(),
                                                      variable_y: (*y).clone(),
                                                      test,
                                                      effect_size: effect });
                }
            }
        }
        best
    }

    pub fn validate_hypothesis(&self,
                               ctx: &RefereeContext<'_>,
                               hypothesis: &HypothesisSpec,
                               bundle: &MatrixBundle)
                               -> Result<ValidationResult, RefereeError> {
        let (Some(col_x), Some(col_y)) =
            (bundle.column_data(&hypothesis.cause_key), bundle.column_data(&hypothesis.effect_key))
        else {
            debug!("referee:inadmissible hypothesis={} cause={} effect={}",
                   hypothesis.id, hypothesis.cause_key, hypothesis.effect_key);
            return Ok(inadmissible(hypothesis));
        };

        let test = self.select_test(bundle, &hypothesis.cause_key, &hypothesis.effect_key);
        let (x, y) = paired_finite(&col_x, &col_y);
        let n = x.len();
        if n < 2 {
            debug!("referee:no_data hypothesis={} n={n}", hypothesis.id);
            return Ok(no_data(hypothesis, test, n));
        }

        let (tx, ty) = match test {
            TestType::Pearson => (x, y),
            TestType::Spearman => (rank_average(&x), rank_average(&y)),
        };
        let observed = pearson(&tx, &ty);
        let draw = self.null_distribution(ctx, hypothesis, &tx, &ty, observed.abs())?;

        let drawn = draw.values.len();
        let p_value = draw.extreme as f64 / drawn as f64;
        let at_or_below = draw.values.iter().filter(|v| v.abs() <= observed.abs()).count();
        let null_percentile = at_or_below as f64 / drawn as f64;

        let mut metadata = BTreeMap::new();
        metadata.insert("test_used".to_string(), json!(test.as_str()));
        metadata.insert("variable_x".to_string(), json!(hypothesis.cause_key.as_str()));
        metadata.insert("variable_y".to_string(), json!(hypothesis.effect_key.as_str()));
        metadata.insert("original_effect_size".to_string(), json!(observed));
        metadata.insert("original_p_value".to_string(), json!(correlation_p_value(observed, n)));
        metadata.insert("sample_size".to_string(), json!(n));
        metadata.insert("early_stopped".to_string(), Value::Bool(drawn < self.config.num_shuffles()));

        let now = Utc::now();
        let (status, reason, falsification_log) = if p_value < self.config.significance {
            (VerdictStatus::Validated, RejectionReason::StatisticallySignificant, None)
        } else {
            let reason = if p_value > LIKELY_RANDOM_THRESHOLD {
                RejectionReason::LikelyRandom
            } else {
                RejectionReason::MarginallySignificant
            };
            let log = FalsificationLog { hypothesis_id: hypothesis.id.clone(),
                                         observed_statistic: observed,
                                         observed_effect: observed.abs(),
                                         null_distribution: summarize(&draw.values),
                                         p_value,
                                         sample_size: n,
                                         test_used: test,
                                         variable_x: hypothesis.cause_key.clone(),
                                         variable_y: hypothesis.effect_key.clone(),
                                         rejection_reason: reason,
                                         rejected_at: now };
            (VerdictStatus::Rejected, reason, Some(log))
        };

        debug!("referee:verdict hypothesis={} test={test} n={n} observed={observed:.4} p={p_value:.4} \
                permutations={drawn} status={status:?}",
               hypothesis.id);

        Ok(ValidationResult { hypothesis_id: hypothesis.id.clone(),
                              status,
                              reason,
                              p_value,
                              confidence: 1.0 - p_value,
                              effect_size: observed.abs(),
                              observed_statistic: observed,
                              null_percentile,
                              num_permutations: drawn,
                              test_used: test,
                              falsification_log,
                              metadata,
                              validated_at: now })
    }

    fn null_distribution(&self,
                         ctx: &RefereeContext<'_>,
                         hypothesis: &HypothesisSpec,
                         x: &[f64],
                         y: &[f64],
                         observed_abs: f64)
                         -> Result<NullDraw, RefereeError> {
        let total = self.config.num_shuffles();
        let block = self.config.block_size.max(1);
        let threshold = self.config.significance * total as f64;
        let base: ChaCha8Rng =
            self.rng.stream(ctx.run_id, ctx.stage_name, &hypothesis.relationship_key(), ctx.base_seed)?;

        let mut values = Vec::with_capacity(total);
        let mut extreme = 0usize;
        let mut start = 0usize;
        while start < total {
            if ctx.is_cancelled() {
                return Err(RefereeError::Cancelled { completed: start });
            }
            let end = (start + block).min(total);
            let chunk: Vec<f64> = (start..end).into_par_iter()
                                              .map(|i| {
                                                  let mut rng = base.clone();
                                                  rng.set_stream(i as u64);
                                                  let mut shuffled = y.to_vec();
                                                  shuffled.shuffle(&mut rng);
                                                  pearson(x, &shuffled)
                                              })
                                              .collect();
            // nula con signo; sólo la comparación es bilateral
            extreme += chunk.iter().filter(|v| v.abs() >= observed_abs).count();
            values.extend(chunk);
            start = end;

            if self.config.early_stop && start < total {
                let remaining = total - start;
                let rejection_locked = extreme as f64 >= threshold.ceil();
                let validation_locked = ((extreme + remaining) as f64) < threshold;
                if rejection_locked || validation_locked {
                    debug!("referee:early_stop hypothesis={} drawn={start} extreme={extreme}", hypothesis.id);
                    break;
                }
            }
        }
        Ok(NullDraw { values, extreme })
    }
}

fn inadmissible(hypothesis: &HypothesisSpec) -> ValidationResult {
    ValidationResult { hypothesis_id: hypothesis.id.clone(),
                       status: VerdictStatus::Inadmissible,
                       reason: RejectionReason::InvalidData,
                       p_value: 1.0,
                       confidence: 0.0,
                       effect_size: 0.0,
                       observed_statistic: 0.0,
                       null_percentile: 0.0,
                       num_permutations: 0,
                       test_used: TestType::Pearson,
                       falsification_log: None,
                       metadata: BTreeMap::new(),
                       validated_at: Utc::now() }
}

fn no_data(hypothesis: &HypothesisSpec, test: TestType, n: usize) -> ValidationResult {
    let now = Utc::now();
    let log = FalsificationLog { hypothesis_id: hypothesis.id.clone(),
                                 observed_statistic: 0.0,
                                 observed_effect: 0.0,
                                 null_distribution: NullDistributionSummary::default(),
                                 p_value: 1.0,
                                 sample_size: n,
                                 test_used: test,
                                 variable_x: hypothesis.cause_key.clone(),
                                 variable_y: hypothesis.effect_key.clone(),
                                 rejection_reason: RejectionReason::NoData,
                                 rejected_at: now };
    ValidationResult { hypothesis_id: hypothesis.id.clone(),
                       status: VerdictStatus::Rejected,
                       reason: RejectionReason::NoData,
                       p_value: 1.0,
                       confidence: 0.0,
                       effect_size: 0.0,
                       observed_statistic: 0.0,
                       null_percentile: 0.0,
                       num_permutations: 0,
                       test_used: test,
                       falsification_log: Some(log),
                       metadata: BTreeMap::new(),
                       validated_at: now }
}
