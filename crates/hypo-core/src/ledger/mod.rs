//! Puerto de ledger (append-only) e implementación en memoria.

pub mod memory;
pub mod store;

pub use memory::InMemoryLedger;
pub use store::{ArtifactFilters, Ledger, LedgerReader, LedgerWriter};
