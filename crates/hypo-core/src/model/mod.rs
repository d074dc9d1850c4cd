//! Modelo de artifacts: kinds, payloads tipados y veredictos del referee.

pub mod artifact;
pub mod payloads;
pub mod verdict;

pub use artifact::{Artifact, ArtifactKind, ArtifactPayload, GenericPayload};
pub use payloads::{CanonicalMetrics, DataQuality, FamilyKey, FdrFamilyPayload, HealthStatus, HypothesisPayload,
                   RelationshipKey, RelationshipPayload, SkippedRelationshipPayload, SweepManifestPayload, TestType,
                   VariableHealthPayload, VariableProfilePayload, WarningCode};
pub use verdict::{FalsificationLog, NullDistributionSummary, RejectionReason, ValidationResult, VerdictStatus};
