//! `StagePlan`: lista ordenada de stages a ejecutar.
//!
//! El hash del plan ordena una copia por nombre antes de serializar, así que
//! dos planes con los mismos stages en distinto orden comparten hash. La
//! ejecución en cambio respeta el orden enviado.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::errors::ValidationError;
use crate::hashing::{hash_str, to_canonical_json};
use crate::ids::StagePlanHash;

/// Nombres de los stages `Stats` que despacha el executor estadístico.
pub mod names {
    pub const PROFILE: &str = "profile";
    pub const PAIRWISE: &str = "pairwise";
    pub const SWEEP: &str = "sweep";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Cómputo estadístico (profile, pairwise, sweep).
    Stats,
    /// Tests de validación (referee).
    Battery,
    Audit,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        StageKind::Stats => "stats",
                        StageKind::Battery => "battery",
                        StageKind::Audit => "audit",
                    })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,
    pub kind: StageKind,
    #[serde(default = "empty_config")]
    pub config: Value,
}

fn empty_config() -> Value {
    Value::Object(Map::new())
}

impl StageSpec {
    pub fn new(name: impl Into<String>, kind: StageKind) -> Self {
        Self { name: name.into(),
               kind,
               config: empty_config() }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    pub fn config_f64(&self, key: &str) -> Option<f64> {
        self.config.get(key).and_then(Value::as_f64)
    }

    pub fn config_u64(&self, key: &str) -> Option<u64> {
        self.config.get(key).and_then(Value::as_u64)
    }

    pub fn config_bool(&self, key: &str) -> Option<bool> {
        self.config.get(key).and_then(Value::as_bool)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StagePlan {
    pub stages: Vec<StageSpec>,
}

impl StagePlan {
    pub fn new(stages: Vec<StageSpec>) -> Self {
        Self { stages }
    }

    /// SHA-256 del JSON canónico de los stages ordenados por nombre.
    pub fn hash(&self) -> StagePlanHash {
        let mut sorted = self.stages.clone();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        let encoded = serde_json::to_value(&sorted).map(|v| to_canonical_json(&v))
                                                   .unwrap_or_default();
        StagePlanHash::new(hash_str(&encoded))
    }

    /// Al menos un stage, nombres no vacíos y únicos.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stages.is_empty() {
            return Err(ValidationError::new("stage_plan", "must contain at least one stage"));
        }
        let mut seen = HashSet::new();
        for stage in &self.stages {
            if stage.name.trim().is_empty() {
                return Err(ValidationError::new("stage", "name cannot be empty"));
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(ValidationError::new("stage", format!("duplicate stage name: {}", stage.name)));
            }
        }
        Ok(())
    }

    pub fn stages_by_kind(&self, kind: StageKind) -> Vec<&StageSpec> {
        self.stages.iter().filter(|s| s.kind == kind).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
