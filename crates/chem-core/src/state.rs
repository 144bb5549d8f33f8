//! Estados del flujo de comparación y roles de cada estructura.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ciclo de vida: `Idle → ReferenceRendered → ComparisonOpen → BothRendered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Sin referencia dibujada.
    Idle,
    ReferenceRendered,
    /// Modo comparación activo, todavía sin estructura de comparación.
    ComparisonOpen,
    /// Ambas estructuras válidas; la similitud se intentó calcular.
    BothRendered,
}

impl WorkflowState {
    pub fn comparison_mode(&self) -> bool {
        matches!(self, WorkflowState::ComparisonOpen | WorkflowState::BothRendered)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::ReferenceRendered => "reference_rendered",
            WorkflowState::ComparisonOpen => "comparison_open",
            WorkflowState::BothRendered => "both_rendered",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Reference,
    Comparison,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Reference => f.write_str("referencia"),
            Role::Comparison => f.write_str("comparación"),
        }
    }
}
