//! Tipos de evento de la sesión y estructura `SessionEvent`.
//!
//! Rol en el flujo:
//! - El `ComparisonController` emite un evento por cada transición o intento
//!   rechazado, en un `EventStore` append-only.
//! - Los fingerprints se referencian por su digest, nunca por los bits.
use chemengine::FingerprintKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEventKind {
    EngineAttached { name: String, version: String },
    /// Invariante: tras este evento no se emiten más renders en la sesión.
    EngineUnavailable { reason: String },
    /// Notación recibida mientras el motor aún carga; se dibuja al adjuntarlo.
    RenderDeferred { smiles: String },
    StructureRendered { role: Role, smiles: String, canonical: String },
    StructureRejected { role: Role, smiles: String },
    EngineFailure { role: Role, message: String },
    ComparisonOpened,
    SimilarityComputed {
        kind: FingerprintKind,
        score: f64,
        reference_fingerprint: String,
        comparison_fingerprint: String,
    },
    SimilarityInvalidated,
    FingerprintKindChanged { kind: FingerprintKind },
    ComparisonCleared,
    ComparisonClosed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub session_id: Uuid,
    pub kind: SessionEventKind,
    pub ts: DateTime<Utc>,
}
