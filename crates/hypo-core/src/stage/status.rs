/// Fase de una corrida dentro del orquestador.
///
/// Las transiciones válidas son:
/// - `ManifestPending` -> `ManifestStored`
/// - `ManifestStored` -> `StagesExecuting`
/// - `StagesExecuting` -> `Completed`
/// - cualquier fase no terminal -> `Failed` | `Cancelled`
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    ManifestPending,
    ManifestStored,
    StagesExecuting,
    Completed,
    Failed,
    Cancelled,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Failed | RunPhase::Cancelled)
    }

    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;
        match (self, next) {
            (ManifestPending, ManifestStored) | (ManifestStored, StagesExecuting) | (StagesExecuting, Completed) => true,
            (from, Failed | Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}
