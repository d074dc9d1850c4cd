//! Identificadores fuertemente tipados.
//!
//! Todos son newtypes sobre `String` serializados de forma transparente. Un
//! id "vacío" es el que sólo contiene espacios; los validadores lo tratan
//! como ausente.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identificador de una corrida del pipeline.
    RunId
);
string_id!(
    /// Identificador del snapshot de datos sobre el que corre el pipeline.
    SnapshotId
);
string_id!(
    /// Clave de una variable (columna de la matriz).
    VariableKey
);
string_id!(HypothesisId);
string_id!(
    /// Identificador único de un artifact. Generado como UUID v7 (ordenable en el tiempo).
    ArtifactId
);
string_id!(
    /// Hash del registro de variables usado para resolver la matriz.
    RegistryHash
);
string_id!(CohortHash);
string_id!(StagePlanHash);

impl RunId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

impl ArtifactId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

/// Lag temporal aplicado al snapshot, en segundos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lag(pub i64);

impl Lag {
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    pub fn to_duration(self) -> chrono::Duration {
        chrono::Duration::seconds(self.0)
    }

    /// Corte efectivo: `at - lag`.
    pub fn apply(self, at: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
        at - self.to_duration()
    }
}
