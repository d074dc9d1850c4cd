mod common;

use hypo_core::{ArtifactFilters, ArtifactKind, InMemoryLedger, LedgerError, RunId, StageKind, StagePlan, StageSpec};
use hypo_core::ledger::{LedgerReader, LedgerWriter};
use hypo_core::model::WarningCode;
use std::sync::Arc;
use std::thread;

fn plan() -> StagePlan {
    StagePlan::new(vec![StageSpec::new("profile", StageKind::Stats)])
}

#[test]
fn stage_artifact_before_manifest_is_rejected() {
    let ledger = InMemoryLedger::new();
    let run: RunId = "run-1".into();
    let err = ledger.store_artifact(&run, common::profile("age")).unwrap_err();
    assert_eq!(err, LedgerError::ManifestMissing(run.clone()));
    assert!(ledger.is_empty());

    ledger.store_artifact(&run, common::manifest("run-1", &plan(), 1).to_artifact()).unwrap();
    ledger.store_artifact(&run, common::profile("age")).unwrap();
    assert_eq!(ledger.artifacts_by_run(&run).unwrap().len(), 2);
}

#[test]
fn second_manifest_is_rejected() {
    let ledger = InMemoryLedger::new();
    let run: RunId = "run-1".into();
    ledger.store_artifact(&run, common::manifest("run-1", &plan(), 1).to_artifact()).unwrap();
    let err = ledger.store_artifact(&run, common::manifest("run-1", &plan(), 2).to_artifact())
                    .unwrap_err();
    assert_eq!(err, LedgerError::ManifestAlreadyStored(run.clone()));
    assert_eq!(ledger.run_manifest(&run).unwrap().seed, 1);
}

#[test]
fn manifest_must_match_run() {
    let ledger = InMemoryLedger::new();
    let err = ledger.store_artifact(&"run-a".into(), common::manifest("run-b", &plan(), 1).to_artifact())
                    .unwrap_err();
    assert!(matches!(err, LedgerError::RunMismatch { .. }));
}

#[test]
fn duplicate_ids_are_rejected() {
    let ledger = InMemoryLedger::new();
    let run: RunId = "run-1".into();
    ledger.store_artifact(&run, common::manifest("run-1", &plan(), 1).to_artifact()).unwrap();
    let a = common::profile("age");
    ledger.store_artifact(&run, a.clone()).unwrap();
    assert!(matches!(ledger.store_artifact(&run, a), Err(LedgerError::DuplicateArtifact(_))));
}

#[test]
fn lookup_and_filters() {
    let ledger = InMemoryLedger::new();
    let run: RunId = "run-1".into();
    ledger.store_artifact(&run, common::manifest("run-1", &plan(), 1).to_artifact()).unwrap();
    let profile = common::profile("age");
    ledger.store_artifact(&run, profile.clone()).unwrap();
    ledger.store_artifact(&run, common::relationship("age", "income")).unwrap();
    ledger.store_artifact(&run, common::skipped("x", "y", WarningCode::LowN)).unwrap();

    assert_eq!(ledger.get_artifact(&profile.id).unwrap(), profile);
    assert!(matches!(ledger.get_artifact(&"missing".into()), Err(LedgerError::NotFound(_))));

    let by_kind = ledger.list_artifacts(&ArtifactFilters::for_run(run.clone()).with_kind(ArtifactKind::Relationship))
                        .unwrap();
    assert_eq!(by_kind.len(), 1);

    let by_var = ledger.list_artifacts(&ArtifactFilters::default().with_var_key("age")).unwrap();
    assert_eq!(by_var.len(), 2);

    let page = ledger.list_artifacts(&ArtifactFilters::for_run(run.clone()).with_page(2, 1)).unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, profile.id);

    assert_eq!(ledger.artifacts_by_kind(ArtifactKind::Run, 0).unwrap().len(), 1);
    assert!(ledger.artifacts_by_run(&"other".into()).unwrap().is_empty());
    assert!(matches!(ledger.run_manifest(&"other".into()), Err(LedgerError::NotFound(_))));
}

#[test]
fn concurrent_runs_share_ledger() {
    let ledger = Arc::new(InMemoryLedger::new());
    let handles: Vec<_> = (0..4).map(|i| {
                                    let ledger = Arc::clone(&ledger);
                                    thread::spawn(move || {
                                        let run_name = format!("run-{i}");
                                        let run: RunId = run_name.as_str().into();
                                        ledger.store_artifact(&run, common::manifest(&run_name, &plan(), i).to_artifact())
                                              .unwrap();
                                        for v in 0..10 {
                                            ledger.store_artifact(&run, common::profile(&format!("v{v}"))).unwrap();
                                        }
                                    })
                                })
                                .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(ledger.len(), 44);
    for i in 0..4 {
        let run: RunId = format!("run-{i}").into();
        let artifacts = ledger.artifacts_by_run(&run).unwrap();
        assert_eq!(artifacts[0].kind, ArtifactKind::Run);
        assert_eq!(artifacts.len(), 11);
    }
}
