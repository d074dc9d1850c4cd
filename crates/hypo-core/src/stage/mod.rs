//! Stages: plan, resultados, fase de la corrida y contrato de ejecución.

pub mod executor;
pub mod plan;
pub mod result;
pub mod status;

pub use executor::{StageContext, StageExecutor, StageOutput};
pub use plan::{names, StageKind, StagePlan, StageSpec};
pub use result::{elapsed_ms, PipelineResult, PipelineSummary, StageExecutionAudit, StageMetrics, StageResult};
pub use status::RunPhase;
