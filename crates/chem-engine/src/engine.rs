//! Contrato del motor y manejo con alcance de los handles de estructura.
//!
//! El motor entrega handles opacos (`MolHandle`) que deben liberarse
//! explícitamente. `MolGuard` los libera en `Drop`, por lo que cualquier
//! salida (éxito, validación fallida o error con `?`) suelta el handle.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Descriptores tal como los entrega el motor: nombre → valor. Los que el
/// motor no pudo calcular simplemente no aparecen.
pub type RawDescriptors = IndexMap<String, f64>;

/// Instancia única del motor, compartida en modo sólo lectura.
pub type SharedEngine = Arc<dyn StructureEngine>;

/// Identificador opaco de una estructura viva dentro del motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MolHandle(pub u64);

/// Tipos de fingerprint soportados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FingerprintKind {
    /// Circular (conectividad), parametrizado por radio y longitud en bits.
    Morgan { radius: u32, n_bits: u32 },
    /// Patrones topológicos; sin parámetros expuestos.
    Pattern,
}

impl FingerprintKind {
    pub const DEFAULT_RADIUS: u32 = 2;
    pub const DEFAULT_BITS: u32 = 2048;

    pub const fn morgan() -> Self {
        FingerprintKind::Morgan { radius: Self::DEFAULT_RADIUS, n_bits: Self::DEFAULT_BITS }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FingerprintKind::Morgan { .. } => "morgan",
            FingerprintKind::Pattern => "pattern",
        }
    }
}

impl Default for FingerprintKind {
    fn default() -> Self {
        Self::morgan()
    }
}

impl fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerprintKind::Morgan { radius, n_bits } => write!(f, "morgan(r={radius}, bits={n_bits})"),
            FingerprintKind::Pattern => write!(f, "pattern"),
        }
    }
}

/// Acepta `morgan`, `circular`, `morgan:<radio>:<bits>`, `pattern` y
/// `topological`.
impl FromStr for FingerprintKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let mut parts = lower.split(':');
        match parts.next() {
            Some("morgan") | Some("circular") => {
                let radius = match parts.next() {
                    Some(r) => r.parse().map_err(|_| format!("radio inválido: {r}"))?,
                    None => Self::DEFAULT_RADIUS,
                };
                let n_bits = match parts.next() {
                    Some(b) => b.parse().map_err(|_| format!("longitud inválida: {b}"))?,
                    None => Self::DEFAULT_BITS,
                };
                if n_bits == 0 {
                    return Err("la longitud del fingerprint debe ser > 0".into());
                }
                Ok(FingerprintKind::Morgan { radius, n_bits })
            }
            Some("pattern") | Some("topological") => Ok(FingerprintKind::Pattern),
            _ => Err(format!("tipo de fingerprint desconocido: {s}")),
        }
    }
}

/// Contrato estrecho con el motor externo.
///
/// Todas las operaciones son síncronas; la única suspensión ocurre al cargar
/// el motor (ver `loader`). `parse` devuelve `Ok(None)` cuando la notación
/// no produce una estructura.
pub trait StructureEngine: Send + Sync {
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    fn parse(&self, smiles: &str) -> Result<Option<MolHandle>, EngineError>;
    fn is_valid(&self, handle: MolHandle) -> Result<bool, EngineError>;
    fn render_svg(&self, handle: MolHandle, width: u32, height: u32) -> Result<String, EngineError>;
    fn canonical_smiles(&self, handle: MolHandle) -> Result<String, EngineError>;
    fn descriptors(&self, handle: MolHandle) -> Result<RawDescriptors, EngineError>;
    /// Cadena de `0`/`1` de longitud fija para el tipo pedido.
    fn fingerprint(&self, handle: MolHandle, kind: &FingerprintKind) -> Result<String, EngineError>;
    fn release(&self, handle: MolHandle);
}

/// Handle con liberación garantizada.
pub struct MolGuard<'e> {
    engine: &'e dyn StructureEngine,
    handle: MolHandle,
}

impl<'e> MolGuard<'e> {
    /// Parsea y valida la notación. `Ok(None)` si el motor la rechaza; en ese
    /// caso cualquier handle parcial ya fue liberado.
    pub fn open(engine: &'e dyn StructureEngine, smiles: &str) -> Result<Option<Self>, EngineError> {
        let Some(handle) = engine.parse(smiles)? else {
            return Ok(None);
        };
        let guard = MolGuard { engine, handle };
        if !engine.is_valid(handle)? {
            return Ok(None);
        }
        Ok(Some(guard))
    }

    pub fn render_svg(&self, width: u32, height: u32) -> Result<String, EngineError> {
        self.engine.render_svg(self.handle, width, height)
    }

    pub fn canonical_smiles(&self) -> Result<String, EngineError> {
        self.engine.canonical_smiles(self.handle)
    }

    pub fn descriptors(&self) -> Result<RawDescriptors, EngineError> {
        self.engine.descriptors(self.handle)
    }

    pub fn fingerprint(&self, kind: &FingerprintKind) -> Result<String, EngineError> {
        self.engine.fingerprint(self.handle, kind)
    }
}

impl Drop for MolGuard<'_> {
    fn drop(&mut self) {
        self.engine.release(self.handle);
    }
}
