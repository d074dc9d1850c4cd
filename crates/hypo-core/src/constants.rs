//! Constantes del core.
//!
//! Valores estáticos que participan en el registro de schemas y en la
//! compatibilidad entre versiones. `SCHEMA_VERSION` viaja con cada schema del
//! registry; cambiarlo implica que artifacts previos se lean con otra forma.

/// Versión de schema de todos los kinds registrados por defecto.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Versión del código del core. Se usa como `code_version` por defecto al
/// construir manifests desde la configuración.
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Separador de los componentes de la stable key de un artifact.
pub const KEY_SEPARATOR: char = ':';
