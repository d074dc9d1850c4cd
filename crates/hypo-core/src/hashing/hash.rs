//! Hash helpers SHA-256 (hex en minúsculas).

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::canonical_json::to_canonical_json;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    hash_bytes(input.as_bytes())
}

pub fn hash_bytes(input: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(input);
    format!("{:x}", h.finalize())
}

/// Hash del JSON canónico de cualquier valor serializable.
///
/// Devuelve `None` si el valor no puede representarse como JSON (por
/// ejemplo, mapas con claves no string).
pub fn hash_value<T: Serialize>(value: &T) -> Option<String> {
    let v = serde_json::to_value(value).ok()?;
    Some(hash_str(&to_canonical_json(&v)))
}
