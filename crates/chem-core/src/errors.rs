//! Avisos visibles para el usuario. Ningún error del motor sale del
//! controlador: todo termina convertido en un `Advisory`.

use chem_domain::SimilarityError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::Role;

#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Advisory {
    /// Terminal: el motor no cargó; sólo se recupera recargando la sesión.
    #[error("Motor químico no disponible: {reason}")]
    EngineUnavailable { reason: String },
    #[error("SMILES inválido ({role}): '{notation}'")]
    InvalidNotation { role: Role, notation: String },
    #[error("Error del motor al procesar la {role}: {message}")]
    EngineFailure { role: Role, message: String },
    #[error("No hay una molécula de referencia")]
    ReferenceMissing,
    #[error("El modo comparación no está activo")]
    ComparisonClosed,
    #[error("No se pudo calcular la similitud: {reason}")]
    SimilarityUnavailable { reason: String },
    #[error("Ejemplo desconocido: {index}")]
    UnknownExample { index: usize },
}

impl From<SimilarityError> for Advisory {
    fn from(e: SimilarityError) -> Self {
        Advisory::SimilarityUnavailable { reason: e.to_string() }
    }
}

impl Advisory {
    /// Rol afectado, si el aviso corresponde a uno.
    pub fn role(&self) -> Option<Role> {
        match self {
            Advisory::InvalidNotation { role, .. } | Advisory::EngineFailure { role, .. } => Some(*role),
            Advisory::SimilarityUnavailable { .. } | Advisory::ComparisonClosed => Some(Role::Comparison),
            Advisory::ReferenceMissing => Some(Role::Reference),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Advisory::EngineUnavailable { .. })
    }
}
