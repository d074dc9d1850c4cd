//! Stage `profile`: perfil univariado de cada columna.

use chrono::Utc;
use log::debug;
use std::collections::HashSet;

use hypo_core::model::{Artifact, ArtifactPayload, VariableProfilePayload};
use hypo_core::stage::StageMetrics;
use hypo_core::{StageContext, StageError, StageOutput, VariableKey};

use crate::correlation::{sample_variance, ZERO_VARIANCE_EPS};
use crate::stages::ensure_bundle;

/// Fracción de valores únicos sobre válidos a partir de la cual una
/// columna se marca como de alta cardinalidad.
pub const HIGH_CARDINALITY_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileStage;

impl ProfileStage {
    pub fn new() -> Self {
        Self
    }

    /// Los valores no finitos cuentan como faltantes.
    pub fn profile_column(variable_key: VariableKey, values: &[f64]) -> VariableProfilePayload {
        let valid: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let sample_size = values.len();
        let missing_rate = if sample_size == 0 {
            1.0
        } else {
            1.0 - valid.len() as f64 / sample_size as f64
        };
        let variance = sample_variance(&valid);
        let cardinality = valid.iter().map(|v| v.to_bits()).collect::<HashSet<_>>().len();
        let high_cardinality = !valid.is_empty() && cardinality as f64 / valid.len() as f64 > HIGH_CARDINALITY_RATIO;

        VariableProfilePayload { variable_key,
                                 sample_size,
                                 missing_rate,
                                 variance,
                                 cardinality,
                                 zero_variance: variance < ZERO_VARIANCE_EPS,
                                 high_cardinality,
                                 profiled_at: Utc::now() }
    }

    pub fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        ensure_bundle(ctx)?;
        let mut artifacts = Vec::with_capacity(ctx.bundle.column_count());
        for key in ctx.bundle.variable_keys() {
            let Some(values) = ctx.bundle.column_data(key) else { continue };
            let profile = Self::profile_column(key.clone(), &values);
            debug!("profile:column key={} missing_rate={:.3} variance={:.4} cardinality={}",
                   key, profile.missing_rate, profile.variance, profile.cardinality);
            artifacts.push(Artifact::new(ArtifactPayload::VariableProfile(profile)));
        }

        let metrics = StageMetrics { processed_count: ctx.bundle.column_count(),
                                     success_count: artifacts.len(),
                                     ..StageMetrics::default() };
        Ok(StageOutput::new(artifacts, metrics))
    }
}
