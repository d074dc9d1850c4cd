//! Configuración de la aplicación.
//! Carga variables de entorno (.env) una sola vez y expone `CONFIG`, una
//! instancia inmutable con los defaults del referee y la versión de código
//! que se estampa en cada `RunManifest`.
use once_cell::sync::Lazy;
use std::env;

use hypo_stats::referee::config::{DEFAULT_SHUFFLES, DEFAULT_SIGNIFICANCE};
use hypo_stats::RefereeConfig;

pub const DEFAULT_BASE_SEED: i64 = 42;

// Carga perezosa del archivo .env; si no existe se ignora.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

/// Instancia global perezosa, evaluada una sola vez.
pub static CONFIG: Lazy<HypoConfig> = Lazy::new(HypoConfig::from_env);

#[derive(Debug, Clone, PartialEq)]
pub struct HypoConfig {
    /// Versión estampada en el manifest (`HYPO_CODE_VERSION`).
    pub code_version: String,
    pub num_shuffles: usize,
    pub significance: f64,
    pub early_stop: bool,
    /// Seed por defecto de las corridas (`HYPO_BASE_SEED`).
    pub base_seed: i64,
}

impl Default for HypoConfig {
    fn default() -> Self {
        Self { code_version: env!("CARGO_PKG_VERSION").to_string(),
               num_shuffles: DEFAULT_SHUFFLES,
               significance: DEFAULT_SIGNIFICANCE,
               early_stop: true,
               base_seed: DEFAULT_BASE_SEED }
    }
}

impl HypoConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración desde una función de lookup. Valores que no
    /// parsean caen al default.
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        let code_version = lookup("HYPO_CODE_VERSION").map(|v| v.trim().to_string())
                                                      .filter(|v| !v.is_empty())
                                                      .unwrap_or(defaults.code_version);
        let num_shuffles = lookup("HYPO_NUM_SHUFFLES").and_then(|v| v.trim().parse().ok())
                                                      .unwrap_or(defaults.num_shuffles);
        let significance = lookup("HYPO_SIGNIFICANCE").and_then(|v| v.trim().parse::<f64>().ok())
                                                      .filter(|a| *a > 0.0 && *a < 1.0)
                                                      .unwrap_or(defaults.significance);
        let early_stop = lookup("HYPO_EARLY_STOP").and_then(|v| parse_bool(&v))
                                                  .unwrap_or(defaults.early_stop);
        let base_seed = lookup("HYPO_BASE_SEED").and_then(|v| v.trim().parse().ok())
                                                .unwrap_or(defaults.base_seed);
        Self { code_version,
               num_shuffles,
               significance,
               early_stop,
               base_seed }
    }

    /// Defaults del referee. `num_shuffles` se acota al rango permitido.
    pub fn referee(&self) -> RefereeConfig {
        RefereeConfig::default().with_num_shuffles(self.num_shuffles)
                                .with_significance(self.significance)
                                .with_early_stop(self.early_stop)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
