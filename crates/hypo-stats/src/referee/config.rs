//! Configuración del referee de permutaciones.

use serde::Serialize;

use hypo_core::model::TestType;

pub const MIN_SHUFFLES: usize = 1_000;
pub const MAX_SHUFFLES: usize = 100_000;
pub const DEFAULT_SHUFFLES: usize = MIN_SHUFFLES;
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;
/// p-values por encima de este umbral se rechazan como ruido.
pub const LIKELY_RANDOM_THRESHOLD: f64 = 0.10;
/// Shuffles por bloque paralelo; la cancelación y el corte temprano se
/// evalúan entre bloques.
pub const BLOCK_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefereeConfig {
    num_shuffles: usize,
    pub significance: f64,
    /// Test forzado para pares numérico × numérico. `None` → Pearson.
    pub test: Option<TestType>,
    pub early_stop: bool,
    pub block_size: usize,
}

impl Default for RefereeConfig {
    fn default() -> Self {
        Self { num_shuffles: DEFAULT_SHUFFLES,
               significance: DEFAULT_SIGNIFICANCE,
               test: None,
               early_stop: true,
               block_size: BLOCK_SIZE }
    }
}

impl RefereeConfig {
    pub fn num_shuffles(&self) -> usize {
        self.num_shuffles
    }

    /// Acota a `[MIN_SHUFFLES, MAX_SHUFFLES]`.
    pub fn set_num_shuffles(&mut self, n: usize) {
        self.num_shuffles = n.clamp(MIN_SHUFFLES, MAX_SHUFFLES);
    }

    pub fn with_num_shuffles(mut self, n: usize) -> Self {
        self.set_num_shuffles(n);
        self
    }

    /// Significancia fuera de (0, 1) se ignora.
    pub fn with_significance(mut self, alpha: f64) -> Self {
        if alpha > 0.0 && alpha < 1.0 {
            self.significance = alpha;
        }
        self
    }

    pub fn with_test(mut self, test: TestType) -> Self {
        self.test = Some(test);
        self
    }

    pub fn with_early_stop(mut self, early_stop: bool) -> Self {
        self.early_stop = early_stop;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffles_are_clamped() {
        let mut c = RefereeConfig::default();
        assert_eq!(c.num_shuffles(), 1_000);
        c.set_num_shuffles(500);
        assert_eq!(c.num_shuffles(), 1_000);
        c.set_num_shuffles(200_000);
        assert_eq!(c.num_shuffles(), 100_000);
        c.set_num_shuffles(5_000);
        assert_eq!(c.num_shuffles(), 5_000);
    }

    #[test]
    fn invalid_significance_is_ignored() {
        assert_eq!(RefereeConfig::default().with_significance(1.5).significance, 0.05);
        assert_eq!(RefereeConfig::default().with_significance(0.01).significance, 0.01);
    }
}
