//! Demo: corre el plan estándar sobre una cohorte sintética y muestra el
//! resultado de cada stage y los veredictos del referee.
use chrono::{DateTime, TimeZone, Utc};

use hypo_core::ledger::LedgerReader;
use hypo_core::model::ArtifactPayload;
use hypo_core::{ArtifactFilters, ArtifactKind, Lag, MatrixBundle, PipelineRequest, RunId, StatisticalType};
use hypoflow_rust::{manifest_for, standard_orchestrator, standard_plan, AppError, CONFIG};

const ROWS: usize = 120;

fn demo_bundle(snapshot_at: DateTime<Utc>, lag: Lag) -> Result<MatrixBundle, AppError> {
    let mut bundle = MatrixBundle::new("demo-snapshot".into(), "demo-cohort".into(), lag.apply(snapshot_at), lag);
    let sleep: Vec<f64> = (0..ROWS).map(|i| 5.0 + ((i * 7) % 40) as f64 / 10.0).collect();
    let focus: Vec<f64> = sleep.iter().enumerate().map(|(i, s)| 1.5 * s + ((i % 9) as f64 - 4.0) * 0.3).collect();
    let coffee: Vec<f64> = (0..ROWS).map(|i| ((i * 53) % 11) as f64).collect();
    let steps: Vec<f64> = (0..ROWS).map(|i| if i % 3 == 0 { f64::NAN } else { ((i * 31) % 97) as f64 * 100.0 })
                                   .collect();
    bundle.add_column("sleep_hours", sleep, StatisticalType::Numeric)?;
    bundle.add_column("focus_score", focus, StatisticalType::Numeric)?;
    bundle.add_column("coffee_cups", coffee, StatisticalType::Numeric)?;
    bundle.add_column("daily_steps", steps, StatisticalType::Numeric)?;
    Ok(bundle)
}

fn run() -> Result<(), AppError> {
    let config = &*CONFIG;
    println!("hypoflow {} (seed={}, shuffles={}, alpha={})",
             config.code_version, config.base_seed, config.num_shuffles, config.significance);

    let snapshot_at = Utc.timestamp_opt(1_704_067_200, 0).single().unwrap_or_else(Utc::now);
    let bundle = demo_bundle(snapshot_at, Lag::from_secs(86_400))?;
    let plan = standard_plan();
    let run_id = RunId::generate();
    let manifest = manifest_for(config,
                                run_id.clone(),
                                bundle.snapshot_id.clone(),
                                snapshot_at,
                                bundle.lag,
                                "demo-registry".into(),
                                bundle.cohort_hash.clone(),
                                &plan);
    println!("run_id={} fingerprint={}", run_id, manifest.fingerprint);

    let orchestrator = standard_orchestrator(config);
    let request = PipelineRequest::new(run_id.clone(), bundle, plan);
    let result = orchestrator.execute_pipeline(&request, &manifest)?;

    for stage in &result.results {
        let status = if stage.success { "ok" } else { "FAILED" };
        println!("  [{status}] {:<9} artifacts={:<3} {}ms {}",
                 stage.stage_name,
                 stage.artifacts.len(),
                 stage.duration_ms,
                 stage.error.as_deref().unwrap_or(""));
    }
    println!("stages={} ok={} failed={} artifacts={}",
             result.overall.total_stages,
             result.overall.successful,
             result.overall.failed,
             result.overall.artifacts_count);

    let filters = ArtifactFilters::for_run(run_id).with_kind(ArtifactKind::Hypothesis);
    let hypotheses = orchestrator.ledger().list_artifacts(&filters)?;
    for artifact in hypotheses {
        if let ArtifactPayload::Hypothesis(h) = artifact.payload {
            println!("  {} -> {:?} (p={:.4}, effect={:.3}, permutations={})",
                     h.hypothesis_id,
                     h.validation.status,
                     h.validation.p_value,
                     h.validation.effect_size,
                     h.validation.num_permutations);
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
