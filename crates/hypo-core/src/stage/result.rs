//! Resultados de stage y del pipeline completo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::ids::{RunId, SnapshotId};
use crate::model::Artifact;
use crate::stage::plan::StagePlan;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageMetrics {
    pub processed_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, Value>,
}

/// Rastro de auditoría de la ejecución de un stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageExecutionAudit {
    pub stage_name: String,
    pub run_id: RunId,
    pub snapshot_id: SnapshotId,
    pub seed: i64,
    pub artifacts_written: usize,
    pub skips_by_reason: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage_name: String,
    pub success: bool,
    pub metrics: StageMetrics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    pub audit: StageExecutionAudit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub total_stages: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
    pub artifacts_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub plan: StagePlan,
    pub results: Vec<StageResult>,
    pub overall: PipelineSummary,
}

impl PipelineResult {
    pub fn new(plan: StagePlan) -> Self {
        Self { plan,
               results: Vec::new(),
               overall: PipelineSummary::default() }
    }

    /// Agrega un resultado y actualiza el resumen.
    pub fn add_result(&mut self, result: StageResult) {
        self.overall.total_stages += 1;
        if result.success {
            self.overall.successful += 1;
        } else {
            self.overall.failed += 1;
        }
        self.overall.total_duration_ms += result.duration_ms;
        self.overall.artifacts_count += result.artifacts.len();
        self.results.push(result);
    }

    /// `true` si ningún stage falló.
    pub fn success(&self) -> bool {
        self.overall.failed == 0
    }

    pub fn result(&self, stage_name: &str) -> Option<&StageResult> {
        self.results.iter().find(|r| r.stage_name == stage_name)
    }
}

/// Milisegundos transcurridos, saturando en `u64::MAX`.
pub fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
