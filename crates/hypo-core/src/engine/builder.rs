//! Builder para `Orchestrator`.
//!
//! ```ignore
//! let orchestrator = Orchestrator::builder(InMemoryLedger::new())
//!     .executor(StatsExecutor::new())
//!     .executor(BatteryExecutor::new(rng))
//!     .build();
//! ```

use std::collections::HashMap;

use crate::engine::core::Orchestrator;
use crate::ledger::Ledger;
use crate::registry::ArtifactRegistry;
use crate::stage::{StageExecutor, StageKind};

pub struct OrchestratorBuilder<L: Ledger> {
    ledger: L,
    registry: ArtifactRegistry,
    executors: HashMap<StageKind, Box<dyn StageExecutor>>,
}

impl<L: Ledger> OrchestratorBuilder<L> {
    pub(crate) fn new(ledger: L) -> Self {
        Self { ledger,
               registry: ArtifactRegistry::standard(),
               executors: HashMap::new() }
    }

    /// Reemplaza el registry estándar.
    pub fn registry(mut self, registry: ArtifactRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registra el executor de su `StageKind`; uno posterior del mismo kind
    /// reemplaza al anterior.
    pub fn executor<X: StageExecutor + 'static>(self, executor: X) -> Self {
        self.boxed_executor(Box::new(executor))
    }

    pub fn boxed_executor(mut self, executor: Box<dyn StageExecutor>) -> Self {
        self.executors.insert(executor.kind(), executor);
        self
    }

    pub fn executors<I>(self, executors: I) -> Self
        where I: IntoIterator<Item = Box<dyn StageExecutor>>
    {
        executors.into_iter().fold(self, |b, e| b.boxed_executor(e))
    }

    pub fn build(self) -> Orchestrator<L> {
        Orchestrator::from_parts(self.ledger, self.registry, self.executors)
    }
}
