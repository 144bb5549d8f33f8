//! Frontera de herramienta: una única herramienta (`show_molecule`) y un
//! único recurso de interfaz, servidos por JSON-RPC sobre stdio.
pub mod protocol;
pub mod server;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub use server::ToolServer;

pub const TOOL_NAME: &str = "show_molecule";
pub const VIEWER_URI: &str = "ui://chemview/viewer.html";
pub const VIEWER_MIME: &str = "text/html";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowMoleculeInput {
    pub smiles: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowMoleculeOutput {
    pub smiles: String,
}

/// La notación pasa sin cambios; la validación ocurre en el controlador.
pub fn show_molecule(input: ShowMoleculeInput) -> ShowMoleculeOutput {
    ShowMoleculeOutput { smiles: input.smiles }
}

/// Descriptor de la herramienta para `tools/list`.
pub fn tool_descriptor() -> Value {
    json!({
        "name": TOOL_NAME,
        "title": "Mostrar molécula",
        "description": "Muestra la estructura 2D, los descriptores y la similitud de una molécula dada en SMILES.",
        "inputSchema": {
            "type": "object",
            "properties": { "smiles": { "type": "string", "description": "Notación SMILES de la molécula" } },
            "required": ["smiles"]
        },
        "outputSchema": {
            "type": "object",
            "properties": { "smiles": { "type": "string" } },
            "required": ["smiles"]
        },
        "_meta": { "ui/resourceUri": VIEWER_URI }
    })
}

/// Descriptor del recurso para `resources/list`.
pub fn viewer_descriptor() -> Value {
    json!({
        "uri": VIEWER_URI,
        "name": "chemview",
        "description": "Visor de estructuras y comparación de similitud",
        "mimeType": VIEWER_MIME
    })
}
