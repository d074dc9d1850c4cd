mod common;

use hypo_core::ledger::LedgerReader;
use hypo_core::model::{ArtifactPayload, VerdictStatus};
use hypo_core::{ArtifactFilters, ArtifactKind, DeterministicRng, InMemoryLedger, Orchestrator, PipelineRequest,
                RunId, StageKind, StagePlan, StageSpec};
use hypo_stats::referee::RefereeConfig;
use hypo_stats::standard_executors;
use serde_json::json;
use std::sync::Arc;

fn plan() -> StagePlan {
    StagePlan::new(vec![StageSpec::new("profile", StageKind::Stats),
                        StageSpec::new("pairwise", StageKind::Stats),
                        StageSpec::new("sweep", StageKind::Stats),
                        StageSpec::new("battery", StageKind::Battery).with_config(json!({
                                                                         "hypotheses": [
                                                                             {"id": "h-signal", "cause_key": "dose", "effect_key": "response"},
                                                                             {"id": "h-noise", "cause_key": "dose", "effect_key": "squared"}
                                                                         ]
                                                                     })),
                        StageSpec::new("audit", StageKind::Audit)])
}

fn orchestrator() -> Orchestrator<Arc<InMemoryLedger>> {
    Orchestrator::builder(Arc::new(InMemoryLedger::new()))
        .executors(standard_executors(Arc::new(DeterministicRng::new()), RefereeConfig::default()))
        .build()
}

fn hypothesis_p_values(orch: &Orchestrator<Arc<InMemoryLedger>>, run_id: &RunId) -> Vec<(String, f64)> {
    let filters = ArtifactFilters::for_run(run_id.clone()).with_kind(ArtifactKind::Hypothesis);
    orch.ledger()
        .list_artifacts(&filters)
        .unwrap()
        .into_iter()
        .filter_map(|a| match a.payload {
            ArtifactPayload::Hypothesis(p) => Some((p.hypothesis_id.to_string(), p.validation.p_value)),
            _ => None,
        })
        .collect()
}

#[test]
fn full_pipeline_persists_every_stage() {
    let orch = orchestrator();
    let plan = plan();
    let run_id: RunId = "run-e2e".into();
    let manifest = common::manifest(run_id.as_str(), &plan, 42);
    let request = PipelineRequest::new(run_id.clone(), common::bundle(), plan);

    let result = orch.execute_pipeline(&request, &manifest).unwrap();
    assert!(result.success(), "{:?}", result.results.iter().map(|r| &r.error).collect::<Vec<_>>());
    assert_eq!(result.overall.total_stages, 5);
    let names: Vec<&str> = result.results.iter().map(|r| r.stage_name.as_str()).collect();
    assert_eq!(names, vec!["profile", "pairwise", "sweep", "battery", "audit"]);

    let stored = orch.ledger().artifacts_by_run(&run_id).unwrap();
    assert_eq!(stored[0].kind, ArtifactKind::Run);
    assert_eq!(stored.len(), result.overall.artifacts_count + 1);
    assert_eq!(orch.ledger().run_manifest(&run_id).unwrap().fingerprint, manifest.fingerprint);

    let pairwise = result.result("pairwise").unwrap();
    assert_eq!(pairwise.audit.skips_by_reason.get("HIGH_MISSING"), Some(&6));
    assert_eq!(pairwise.audit.artifacts_written, pairwise.artifacts.len());

    let battery = result.result("battery").unwrap();
    let verdicts: Vec<VerdictStatus> = battery.artifacts
                                              .iter()
                                              .filter_map(|a| match &a.payload {
                                                  ArtifactPayload::Hypothesis(p) => Some(p.validation.status),
                                                  _ => None,
                                              })
                                              .collect();
    assert_eq!(verdicts, vec![VerdictStatus::Validated, VerdictStatus::Rejected]);
}

#[test]
fn replaying_a_run_reproduces_the_verdicts() {
    let plan = plan();
    let run_id: RunId = "run-replay".into();
    let manifest = common::manifest(run_id.as_str(), &plan, 7);
    let request = PipelineRequest::new(run_id.clone(), common::bundle(), plan);

    let first = orchestrator();
    first.execute_pipeline(&request, &manifest).unwrap();
    let second = orchestrator();
    second.execute_pipeline(&request, &manifest).unwrap();

    let a = hypothesis_p_values(&first, &run_id);
    let b = hypothesis_p_values(&second, &run_id);
    assert_eq!(a.len(), 2);
    assert_eq!(a, b);
    assert!(second.ledger().run_manifest(&run_id).unwrap().verify_fingerprint());
}

#[test]
fn bad_stage_config_is_a_soft_failure() {
    let orch = orchestrator();
    let plan = StagePlan::new(vec![StageSpec::new("pairwise", StageKind::Stats).with_config(json!({"test": "kendall"})),
                                   StageSpec::new("profile", StageKind::Stats)]);
    let manifest = common::manifest("run-soft", &plan, 1);
    let request = PipelineRequest::new("run-soft".into(), common::bundle(), plan);

    let result = orch.execute_pipeline(&request, &manifest).unwrap();
    assert!(!result.success());
    assert_eq!(result.overall.failed, 1);
    assert!(result.results[0].error.as_deref().is_some_and(|e| e.contains("kendall")));
    assert!(result.results[1].success);
    assert_eq!(result.overall.artifacts_count, 7);
}
