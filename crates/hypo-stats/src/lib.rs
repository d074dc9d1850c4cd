//! hypo-stats: kernels estadísticos, referee de permutaciones y stages
//! concretos (profile, pairwise, sweep, battery, audit).
//!
//! El core no conoce estos stages: se registran en el orquestador a través
//! de los `StageExecutor` de `executors`.
pub mod correlation;
pub mod errors;
pub mod executors;
pub mod fdr;
pub mod referee;
pub mod stages;

pub use errors::RefereeError;
pub use executors::{standard_executors, AuditExecutor, BatteryExecutor, StatsExecutor};
pub use referee::{HypothesisSpec, PermutationReferee, PrimaryRelationship, RefereeConfig, RefereeContext};
