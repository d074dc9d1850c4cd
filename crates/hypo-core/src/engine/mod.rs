//! Orquestador de stages.
//!
//! Provee el `Orchestrator`, su builder y la bandera de cancelación
//! compartida entre el caller y los stages de una corrida.

pub mod builder;
pub mod cancel;
pub mod core;

pub use builder::OrchestratorBuilder;
pub use cancel::CancellationFlag;
pub use self::core::{Orchestrator, PipelineRequest};
