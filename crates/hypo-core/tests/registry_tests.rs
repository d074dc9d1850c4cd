mod common;

use hypo_core::model::{ArtifactPayload, FamilyKey, FdrFamilyPayload, TestType, WarningCode};
use hypo_core::{artifact_key, get_schema, validate_artifact, Artifact, ArtifactKind, ArtifactRegistry, RegistryError,
                StageKind, StagePlan, StageSpec};

#[test]
fn relationship_key_is_symmetric() {
    let ab = common::relationship("A", "B");
    let ba = common::relationship("B", "A");
    assert_eq!(artifact_key(&ab).unwrap(), artifact_key(&ba).unwrap());
    assert_eq!(artifact_key(&ab).unwrap(), "relationship:pearson:family-1:A:B");
}

#[test]
fn skipped_key_is_symmetric_and_prefixed() {
    let a = common::skipped("zeta", "alpha", WarningCode::LowN);
    let b = common::skipped("alpha", "zeta", WarningCode::HighMissing);
    assert_eq!(artifact_key(&a).unwrap(), "skipped_relationship:pearson:family-1:alpha:zeta");
    assert_eq!(artifact_key(&a).unwrap(), artifact_key(&b).unwrap());
}

#[test]
fn business_keys() {
    assert_eq!(artifact_key(&common::profile("age")).unwrap(), "variable_profile:age");

    let fam = FamilyKey { snapshot_id: "s".into(),
                          cohort_hash: "c".into(),
                          stage_name: "pairwise".into(),
                          test_type: TestType::Pearson,
                          registry_hash: "r".into(),
                          stage_plan_hash: "p".into() };
    let payload = FdrFamilyPayload::new(fam.clone(), 3, "BH");
    let a = Artifact::new(ArtifactPayload::FdrFamily(payload));
    assert_eq!(artifact_key(&a).unwrap(), format!("fdr_family:{}", fam.family_id()));

    let plan = StagePlan::new(vec![StageSpec::new("profile", StageKind::Stats)]);
    let run = common::manifest("run-7", &plan, 1).to_artifact();
    assert_eq!(artifact_key(&run).unwrap(), "run_manifest:run-7");
}

#[test]
fn empty_business_id_falls_back_to_artifact_id() {
    let a = common::profile("");
    assert_eq!(artifact_key(&a).unwrap(), a.id.to_string());
}

#[test]
fn kind_mismatch_is_rejected() {
    let good = common::relationship("A", "B");
    assert!(validate_artifact(&good).is_ok());

    let bad = Artifact::with_kind(ArtifactKind::Hypothesis, good.payload.clone());
    let err = validate_artifact(&bad).unwrap_err();
    assert!(matches!(err, RegistryError::ArtifactValidation { kind: ArtifactKind::Hypothesis, .. }));
}

#[test]
fn missing_required_fields_are_rejected() {
    let no_id = common::relationship("A", "B").with_id("");
    assert!(validate_artifact(&no_id).is_err());

    let no_var = common::relationship("", "B");
    assert!(validate_artifact(&no_var).is_err());

    let mut zero_n = common::relationship("A", "B");
    if let ArtifactPayload::Relationship(p) = &mut zero_n.payload {
        p.metrics.sample_size = 0;
    }
    assert!(validate_artifact(&zero_n).is_err());

    let plan = StagePlan::new(vec![StageSpec::new("profile", StageKind::Stats)]);
    let mut manifest = common::manifest("run-1", &plan, 1);
    manifest.cohort_hash = "".into();
    assert!(validate_artifact(&manifest.to_artifact()).is_err());
}

#[test]
fn unknown_kind_in_custom_registry() {
    let registry = ArtifactRegistry::empty();
    let a = common::profile("age");
    assert!(matches!(registry.validate_artifact(&a),
                     Err(RegistryError::UnknownArtifactKind(ArtifactKind::VariableProfile))));
    assert!(registry.artifact_key(&a).is_err());
    assert!(get_schema(ArtifactKind::VariableProfile).is_ok());
}
