//! Stage `audit`: evaluación de salud de cada variable a partir de su
//! perfil univariado.

use chrono::Utc;
use log::{debug, info};

use hypo_core::model::{Artifact, ArtifactPayload, HealthStatus, VariableHealthPayload, VariableProfilePayload,
                       WarningCode};
use hypo_core::stage::StageMetrics;
use hypo_core::{StageContext, StageError, StageOutput};

use crate::stages::ensure_bundle;
use crate::stages::pairwise::{MAX_MISSING_RATE, MIN_VALID_PAIRS};
use crate::stages::profile::ProfileStage;

/// Fracción mínima de valores distintos de cero para no marcar `SPARSE_DATA`.
pub const MIN_NONZERO_RATE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthThresholds {
    pub max_missing_rate: f64,
    pub min_valid: usize,
    pub min_nonzero_rate: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self { max_missing_rate: MAX_MISSING_RATE,
               min_valid: MIN_VALID_PAIRS,
               min_nonzero_rate: MIN_NONZERO_RATE }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuditStage {
    thresholds: HealthThresholds,
}

impl AuditStage {
    pub fn new(thresholds: HealthThresholds) -> Self {
        Self { thresholds }
    }

    /// `LOW_N` o `LOW_VARIANCE` vuelven inutilizable la variable; el resto de
    /// los issues la degradan.
    pub fn assess(&self, profile: &VariableProfilePayload, values: &[f64]) -> VariableHealthPayload {
        let valid: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let mut issues = Vec::new();
        if valid.len() < self.thresholds.min_valid {
            issues.push(WarningCode::LowN);
        }
        if profile.zero_variance {
            issues.push(WarningCode::LowVariance);
        }
        if profile.missing_rate > self.thresholds.max_missing_rate {
            issues.push(WarningCode::HighMissing);
        }
        if !valid.is_empty() {
            let nonzero = valid.iter().filter(|v| **v != 0.0).count();
            if (nonzero as f64 / valid.len() as f64) < self.thresholds.min_nonzero_rate {
                issues.push(WarningCode::SparseData);
            }
        }

        let status = if issues.iter().any(|i| matches!(i, WarningCode::LowN | WarningCode::LowVariance)) {
            HealthStatus::Unusable
        } else if issues.is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        VariableHealthPayload { variable_key: profile.variable_key.clone(),
                                status,
                                missing_rate: profile.missing_rate,
                                issues,
                                assessed_at: Utc::now() }
    }

    pub fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        ensure_bundle(ctx)?;
        let thresholds = match ctx.spec.config_f64("max_missing_rate") {
            Some(rate) if (0.0..=1.0).contains(&rate) => HealthThresholds { max_missing_rate: rate,
                                                                            ..self.thresholds },
            Some(rate) => return Err(StageError::InvalidConfig(format!("max_missing_rate out of range: {rate}"))),
            None => self.thresholds,
        };
        let auditor = Self::new(thresholds);

        let mut artifacts = Vec::with_capacity(ctx.bundle.column_count());
        let (mut healthy, mut degraded, mut unusable) = (0usize, 0usize, 0usize);
        for key in ctx.bundle.variable_keys() {
            let Some(values) = ctx.bundle.column_data(key) else { continue };
            let profile = ProfileStage::profile_column(key.clone(), &values);
            let health = auditor.assess(&profile, &values);
            match health.status {
                HealthStatus::Healthy => healthy += 1,
                HealthStatus::Degraded => degraded += 1,
                HealthStatus::Unusable => unusable += 1,
            }
            debug!("audit:variable key={} status={:?} issues={:?}", key, health.status, health.issues);
            artifacts.push(Artifact::new(ArtifactPayload::VariableHealth(health)));
        }

        info!("audit:done stage={} healthy={healthy} degraded={degraded} unusable={unusable}",
              ctx.stage_name());

        let mut metrics = StageMetrics { processed_count: artifacts.len(),
                                         success_count: healthy + degraded,
                                         failure_count: unusable,
                                         ..StageMetrics::default() };
        metrics.custom.insert("healthy".to_string(), healthy.into());
        metrics.custom.insert("degraded".to_string(), degraded.into());
        metrics.custom.insert("unusable".to_string(), unusable.into());

        let mut output = StageOutput::new(artifacts, metrics);
        if unusable > 0 {
            output = output.with_warning(format!("{unusable} variables are unusable"));
        }
        Ok(output)
    }
}
