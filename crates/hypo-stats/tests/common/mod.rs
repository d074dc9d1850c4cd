#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use hypo_core::{CancellationFlag, Lag, MatrixBundle, RunManifest, StageContext, StagePlan, StageSpec,
                StatisticalType};

pub const ROWS: usize = 50;

/// Columnas:
/// - `dose`: -24.5..=24.5, simétrica alrededor de 0.
/// - `response`: 2·dose + ruido acotado (señal fuerte).
/// - `noise`: permutación fija de 0..50.
/// - `squared`: dose² (Pearson exactamente 0 contra `dose`).
/// - `cubed`: dose³ (monótona en `dose`).
/// - `sparse`: 40% faltantes; residuos cuadráticos, sin relación lineal con
///   `noise` ni con `dose`.
/// - `category`: copia de `dose` marcada como categórica.
pub fn bundle() -> MatrixBundle {
    let dose: Vec<f64> = (0..ROWS).map(|i| i as f64 - 24.5).collect();
    let response: Vec<f64> = (0..ROWS).map(|i| 2.0 * dose[i] + ((i % 5) as f64 - 2.0) * 0.5).collect();
    let noise: Vec<f64> = (0..ROWS).map(|i| ((i * 37) % ROWS) as f64).collect();
    let squared: Vec<f64> = dose.iter().map(|d| d * d).collect();
    let cubed: Vec<f64> = dose.iter().map(|d| d * d * d).collect();
    let sparse: Vec<f64> = (0..ROWS).map(|i| if i % 5 < 2 { f64::NAN } else { ((i * i * 7) % 23) as f64 }).collect();

    let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut b = MatrixBundle::new("snap-1".into(), "cohort-1".into(), cutoff, Lag::from_secs(86_400));
    b.add_column("dose", dose.clone(), StatisticalType::Numeric).unwrap();
    b.add_column("response", response, StatisticalType::Numeric).unwrap();
    b.add_column("noise", noise, StatisticalType::Numeric).unwrap();
    b.add_column("squared", squared, StatisticalType::Numeric).unwrap();
    b.add_column("cubed", cubed, StatisticalType::Numeric).unwrap();
    b.add_column("sparse", sparse, StatisticalType::Numeric).unwrap();
    b.add_column("category", dose, StatisticalType::Categorical).unwrap();
    b
}

pub fn manifest(run_id: &str, plan: &StagePlan, seed: i64) -> RunManifest {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    RunManifest::new(run_id.into(),
                     "snap-1".into(),
                     at,
                     Lag::from_secs(86_400),
                     at,
                     "registry-1".into(),
                     "cohort-1".into(),
                     plan,
                     seed,
                     "1.0.0")
}

/// Entradas de un `StageContext` para ejecutar un stage fuera del orquestador.
pub struct Harness {
    pub run_id: hypo_core::RunId,
    pub manifest: RunManifest,
    pub bundle: MatrixBundle,
    pub spec: StageSpec,
    pub cancel: CancellationFlag,
}

impl Harness {
    pub fn new(spec: StageSpec) -> Self {
        let plan = StagePlan::new(vec![spec.clone()]);
        Self { run_id: "run-stats".into(),
               manifest: manifest("run-stats", &plan, 42),
               bundle: bundle(),
               spec,
               cancel: CancellationFlag::new() }
    }

    pub fn ctx(&self) -> StageContext<'_> {
        StageContext { run_id: &self.run_id,
                       manifest: &self.manifest,
                       bundle: &self.bundle,
                       spec: &self.spec,
                       cancel: &self.cancel }
    }
}
