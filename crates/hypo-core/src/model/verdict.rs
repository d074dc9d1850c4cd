//! Veredicto del referee de permutaciones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::ids::{HypothesisId, VariableKey};
use crate::model::payloads::TestType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Validated,
    Rejected,
    /// Reservado para reglas de decisión con zona gris; el test de
    /// permutaciones nunca lo emite.
    Marginal,
    Inadmissible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    StatisticallySignificant,
    StatisticallyInsignificant,
    LikelyRandom,
    MarginallySignificant,
    NoData,
    InvalidData,
}

/// Resumen de la distribución nula (valores absolutos del estadístico).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NullDistributionSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Registro de por qué una hipótesis fue rechazada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalsificationLog {
    pub hypothesis_id: HypothesisId,
    pub observed_statistic: f64,
    pub observed_effect: f64,
    pub null_distribution: NullDistributionSummary,
    pub p_value: f64,
    pub sample_size: usize,
    pub test_used: TestType,
    pub variable_x: VariableKey,
    pub variable_y: VariableKey,
    pub rejection_reason: RejectionReason,
    pub rejected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub hypothesis_id: HypothesisId,
    pub status: VerdictStatus,
    pub reason: RejectionReason,
    pub p_value: f64,
    pub confidence: f64,
    pub effect_size: f64,
    pub observed_statistic: f64,
    pub null_percentile: f64,
    pub num_permutations: usize,
    pub test_used: TestType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub falsification_log: Option<FalsificationLog>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    pub validated_at: DateTime<Utc>,
}

impl ValidationResult {
    pub fn is_validated(&self) -> bool {
        self.status == VerdictStatus::Validated
    }

    /// La presencia del log de falsificación debe coincidir con el rechazo.
    pub fn is_consistent(&self) -> bool {
        (self.status == VerdictStatus::Rejected) == self.falsification_log.is_some()
    }
}
