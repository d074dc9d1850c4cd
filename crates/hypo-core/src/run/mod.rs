//! Manifest de corrida y fingerprint de determinismo.

pub mod fingerprint;
pub mod manifest;

pub use fingerprint::{compute_run_fingerprint, RunFingerprint};
pub use manifest::RunManifest;
