//! Referee estadístico: test de permutaciones no paramétrico.

pub mod config;
pub mod permutation;

pub use config::{RefereeConfig, BLOCK_SIZE, DEFAULT_SHUFFLES, MAX_SHUFFLES, MIN_SHUFFLES};
pub use permutation::{HypothesisSpec, PermutationReferee, PrimaryRelationship, RefereeContext};
