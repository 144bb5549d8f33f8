//! Estado observable de una sesión de comparación.
use chem_domain::StructureRecord;
use chemengine::FingerprintKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Advisory;
use crate::state::WorkflowState;

/// Puntuación de Tanimoto junto con el tipo de fingerprint que la produjo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    pub score: f64,
    pub kind: FingerprintKind,
}

/// Sólo el `ComparisonController` la modifica; hacia fuera es de lectura.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSession {
    pub(crate) id: Uuid,
    pub(crate) state: WorkflowState,
    pub(crate) reference: Option<StructureRecord>,
    pub(crate) comparison: Option<StructureRecord>,
    pub(crate) fingerprint_kind: FingerprintKind,
    pub(crate) similarity: Option<Similarity>,
    pub(crate) advisory: Option<Advisory>,
}

impl ComparisonSession {
    pub(crate) fn new(fingerprint_kind: FingerprintKind) -> Self {
        Self { id: Uuid::new_v4(),
               state: WorkflowState::Idle,
               reference: None,
               comparison: None,
               fingerprint_kind,
               similarity: None,
               advisory: None }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn state(&self) -> WorkflowState {
        self.state
    }
    pub fn reference(&self) -> Option<&StructureRecord> {
        self.reference.as_ref()
    }
    pub fn comparison(&self) -> Option<&StructureRecord> {
        self.comparison.as_ref()
    }
    pub fn fingerprint_kind(&self) -> FingerprintKind {
        self.fingerprint_kind
    }
    pub fn similarity(&self) -> Option<Similarity> {
        self.similarity
    }
    /// Último aviso emitido; se limpia con la siguiente operación exitosa.
    pub fn advisory(&self) -> Option<&Advisory> {
        self.advisory.as_ref()
    }

    /// Descarta la mitad de comparación (registro y puntuación).
    pub(crate) fn drop_comparison(&mut self) {
        self.comparison = None;
        self.similarity = None;
    }
}
