//! `MatrixBundle`: entrada canónica de todo cómputo estadístico.
//!
//! Matriz densa filas = entidades, columnas = variables. Los valores
//! faltantes se representan como `NaN`. El bundle es de sólo lectura para
//! el core; se construye aguas arriba.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::ids::{CohortHash, Lag, SnapshotId, VariableKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticalType {
    #[default]
    Numeric,
    Categorical,
    Binary,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub variable_key: VariableKey,
    pub statistical_type: StatisticalType,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Matrix {
    pub data: Vec<Vec<f64>>,
    pub entity_ids: Vec<String>,
    pub variable_keys: Vec<VariableKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixBundle {
    pub matrix: Matrix,
    pub column_meta: Vec<ColumnMeta>,
    pub snapshot_id: SnapshotId,
    pub cohort_hash: CohortHash,
    pub cutoff_at: DateTime<Utc>,
    pub lag: Lag,
    pub fingerprint: String,
}

impl MatrixBundle {
    pub fn new(snapshot_id: SnapshotId, cohort_hash: CohortHash, cutoff_at: DateTime<Utc>, lag: Lag) -> Self {
        Self { matrix: Matrix::default(),
               column_meta: Vec::new(),
               snapshot_id,
               cohort_hash,
               cutoff_at,
               lag,
               fingerprint: String::new() }
    }

    /// Agrega una columna. La primera columna fija el número de filas; si
    /// aún no hay entity ids se generan a partir del índice de fila.
    pub fn add_column(&mut self,
                      variable_key: impl Into<VariableKey>,
                      values: Vec<f64>,
                      statistical_type: StatisticalType)
                      -> Result<(), ValidationError> {
        let variable_key = variable_key.into();
        if self.column_index(&variable_key).is_some() {
            return Err(ValidationError::new("variable_keys", format!("duplicate column {variable_key}")));
        }
        if self.matrix.variable_keys.is_empty() && self.matrix.data.is_empty() {
            self.matrix.data = vec![Vec::new(); values.len()];
            if self.matrix.entity_ids.is_empty() {
                self.matrix.entity_ids = (0..values.len()).map(|i| i.to_string()).collect();
            }
        }
        if values.len() != self.matrix.data.len() {
            return Err(ValidationError::new("matrix_data",
                                            format!("column {variable_key} has {} rows, expected {}",
                                                    values.len(),
                                                    self.matrix.data.len())));
        }
        for (row, value) in self.matrix.data.iter_mut().zip(values) {
            row.push(value);
        }
        self.column_meta.push(ColumnMeta { variable_key: variable_key.clone(),
                                           statistical_type });
        self.matrix.variable_keys.push(variable_key);
        Ok(())
    }

    pub fn with_entity_ids(mut self, entity_ids: Vec<String>) -> Self {
        self.matrix.entity_ids = entity_ids;
        self
    }

    /// Consistencia interna: filas no vacías y dimensiones coherentes.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.matrix.data.is_empty() {
            return Err(ValidationError::new("matrix_data", "insufficient data: matrix has no rows"));
        }
        let rows = self.matrix.data.len();
        if self.matrix.entity_ids.len() != rows {
            return Err(ValidationError::new("entity_ids", "length mismatch with data rows"));
        }
        let cols = self.matrix.variable_keys.len();
        if self.column_meta.len() != cols {
            return Err(ValidationError::new("column_meta", "length mismatch with variable keys"));
        }
        if let Some((i, row)) = self.matrix.data.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(ValidationError::new("matrix_data",
                                            format!("row {i} has {} columns, expected {cols}", row.len())));
        }
        Ok(())
    }

    pub fn column_index(&self, key: &VariableKey) -> Option<usize> {
        self.matrix.variable_keys.iter().position(|k| k == key)
    }

    /// Copia de la columna; filas cortas aportan `NaN`.
    pub fn column_data(&self, key: &VariableKey) -> Option<Vec<f64>> {
        let idx = self.column_index(key)?;
        Some(self.matrix.data.iter().map(|row| row.get(idx).copied().unwrap_or(f64::NAN)).collect())
    }

    pub fn column_meta(&self, key: &VariableKey) -> Option<&ColumnMeta> {
        self.column_meta.iter().find(|m| &m.variable_key == key)
    }

    pub fn row_count(&self) -> usize {
        self.matrix.data.len()
    }

    pub fn column_count(&self) -> usize {
        self.matrix.variable_keys.len()
    }

    pub fn variable_keys(&self) -> &[VariableKey] {
        &self.matrix.variable_keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> MatrixBundle {
        MatrixBundle::new("snap".into(), "coh".into(), Utc::now(), Lag::default())
    }

    #[test]
    fn add_column_builds_rows() {
        let mut b = bundle();
        b.add_column("x", vec![1.0, 2.0, 3.0], StatisticalType::Numeric).unwrap();
        b.add_column("y", vec![4.0, 5.0, 6.0], StatisticalType::Numeric).unwrap();
        assert_eq!(b.row_count(), 3);
        assert_eq!(b.column_count(), 2);
        assert_eq!(b.column_data(&"y".into()), Some(vec![4.0, 5.0, 6.0]));
        assert!(b.validate().is_ok());
    }

    #[test]
    fn add_column_rejects_length_mismatch() {
        let mut b = bundle();
        b.add_column("x", vec![1.0, 2.0], StatisticalType::Numeric).unwrap();
        assert!(b.add_column("y", vec![1.0], StatisticalType::Numeric).is_err());
        assert!(b.add_column("x", vec![1.0, 2.0], StatisticalType::Numeric).is_err());
    }

    #[test]
    fn empty_bundle_is_invalid() {
        assert!(bundle().validate().is_err());
        assert_eq!(bundle().column_data(&"x".into()), None);
    }
}
