//! Registro inmutable derivado de una notación por el motor.
use std::fmt;

use chemengine::{EngineError, FingerprintKind, MolGuard, StructureEngine};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::descriptor::DescriptorSet;
use crate::fingerprint::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { width: 350, height: 300 }
    }
}

/// Sólo existe para notaciones que el motor aceptó como válidas. No guarda
/// fingerprint: se deriva bajo demanda con `derive_fingerprint`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    input: String,
    canonical_smiles: String,
    svg: String,
    descriptors: DescriptorSet,
}

impl StructureRecord {
    /// Parsea, dibuja y extrae descriptores en un único bloque con el handle
    /// bajo guarda.
    ///
    /// `Ok(None)` si la notación es inválida. Un error en la depicción o en la
    /// forma canónica se propaga; los descriptores son de mejor esfuerzo y,
    /// si fallan, el conjunto queda vacío.
    pub fn render(engine: &dyn StructureEngine, smiles: &str, options: &RenderOptions) -> Result<Option<Self>, EngineError> {
        let Some(mol) = MolGuard::open(engine, smiles)? else {
            debug!("notación rechazada por el motor: '{smiles}'");
            return Ok(None);
        };
        let svg = mol.render_svg(options.width, options.height)?;
        let canonical_smiles = mol.canonical_smiles()?;
        let descriptors = match mol.descriptors() {
            Ok(raw) => DescriptorSet::from_raw(&raw),
            Err(e) => {
                warn!("descriptores no disponibles para '{smiles}': {e}");
                DescriptorSet::default()
            }
        };
        Ok(Some(Self { input: smiles.to_string(), canonical_smiles, svg, descriptors }))
    }

    pub fn input(&self) -> &str {
        &self.input
    }
    pub fn canonical_smiles(&self) -> &str {
        &self.canonical_smiles
    }
    pub fn svg(&self) -> &str {
        &self.svg
    }
    pub fn descriptors(&self) -> &DescriptorSet {
        &self.descriptors
    }
}

impl fmt::Display for StructureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<smiles: {}, canonical: {}>", self.input, self.canonical_smiles)
    }
}

/// Vuelve a parsear la notación y genera un fingerprint del tipo pedido.
/// `Ok(None)` si la notación ya no es válida para el motor.
pub fn derive_fingerprint(engine: &dyn StructureEngine, smiles: &str, kind: &FingerprintKind) -> Result<Option<Fingerprint>, EngineError> {
    match MolGuard::open(engine, smiles)? {
        Some(mol) => {
            let bits = mol.fingerprint(kind)?;
            Fingerprint::from_bit_string(*kind, &bits).map(Some)
                                                      .map_err(|e| EngineError::operation("fingerprint", e.to_string()))
        }
        None => Ok(None),
    }
}
