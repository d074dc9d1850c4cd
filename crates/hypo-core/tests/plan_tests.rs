use hypo_core::{StageKind, StagePlan, StageSpec};
use serde_json::json;

fn stage(name: &str) -> StageSpec {
    StageSpec::new(name, StageKind::Stats).with_config(json!({"alpha": 0.05}))
}

#[test]
fn hash_ignores_submission_order() {
    let a = StagePlan::new(vec![stage("profile"), stage("pairwise"), stage("audit")]);
    let b = StagePlan::new(vec![stage("audit"), stage("profile"), stage("pairwise")]);
    assert_eq!(a.hash(), b.hash());
    // El orden enviado se conserva para la ejecución.
    let names: Vec<&str> = b.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["audit", "profile", "pairwise"]);
}

#[test]
fn hash_is_stable_hex() {
    let plan = StagePlan::new(vec![stage("profile")]);
    let h = plan.hash();
    assert_eq!(h, plan.clone().hash());
    assert_eq!(h.as_str().len(), 64);
}

#[test]
fn kind_is_part_of_hash() {
    let a = StagePlan::new(vec![StageSpec::new("x", StageKind::Stats)]);
    let b = StagePlan::new(vec![StageSpec::new("x", StageKind::Audit)]);
    assert_ne!(a.hash(), b.hash());
}

#[test]
fn blank_name_is_invalid() {
    let plan = StagePlan::new(vec![StageSpec::new("  ", StageKind::Stats)]);
    let err = plan.validate().unwrap_err();
    assert_eq!(err.field, "stage");
}
