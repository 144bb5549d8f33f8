//! chemengine: frontera con el motor quimioinformático externo.
//!
//! Todo lo químico (parseo de SMILES, depicción 2D, descriptores y
//! fingerprints) se delega al motor. Este crate sólo define el contrato
//! (`StructureEngine`), el manejo con alcance de los handles (`MolGuard`),
//! la carga con reintentos (`loader`) y dos implementaciones: RDKit vía pyo3
//! (feature `rdkit`) y un motor determinista para pruebas (`mock`).
use thiserror::Error;

pub mod engine;
pub mod loader;
pub mod mock;
#[cfg(feature = "rdkit")]
pub mod rdkit;

pub use engine::{FingerprintKind, MolGuard, MolHandle, RawDescriptors, SharedEngine, StructureEngine};
pub use loader::{CancelFlag, EngineLoader, EngineSource, LoadState, RetryPolicy};
pub use mock::{MockEngine, MockSource};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Error inicializando el motor: {0}")]
    Init(String),
    #[error("Error en '{op}': {message}")]
    Operation { op: &'static str, message: String },
    #[error("Operación no soportada por el motor cargado: {0}")]
    Unsupported(&'static str),
    #[error("Handle desconocido o ya liberado: {0}")]
    UnknownHandle(u64),
}

impl EngineError {
    pub fn operation(op: &'static str, message: impl Into<String>) -> Self {
        EngineError::Operation { op, message: message.into() }
    }
}
