//! Motor real: RDKit embebido vía pyo3.
//!
//! El módulo Python (`python/rdkit_wrapper.py`) se compila una vez al cargar
//! y queda en poder de la instancia de `RdkitEngine`; las moléculas viven en
//! una tabla de handles hasta que se liberan.
use std::collections::HashMap;
use std::ffi::CString;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use pyo3::ffi::c_str;
use pyo3::prelude::*;
use pyo3::types::PyModule;

use crate::engine::{FingerprintKind, MolHandle, RawDescriptors, SharedEngine, StructureEngine};
use crate::loader::EngineSource;
use crate::EngineError;

pub struct RdkitEngine {
    module: Py<PyModule>,
    version: String,
    handles: Mutex<HashMap<u64, Py<PyAny>>>,
    next_handle: AtomicU64,
}

impl RdkitEngine {
    pub fn load() -> Result<Self, EngineError> {
        Python::attach(|py| {
            let code = CString::new(include_str!("../python/rdkit_wrapper.py")).map_err(|e| EngineError::Init(e.to_string()))?;
            let module = PyModule::from_code(py, code.as_c_str(), c_str!("rdkit_wrapper.py"), c_str!("rdkit_wrapper"))
                .map_err(|e| EngineError::Init(e.to_string()))?;
            let version: String = module.getattr("rdkit_version")
                                        .and_then(|f| f.call0())
                                        .and_then(|v| v.extract())
                                        .map_err(|e| EngineError::Init(e.to_string()))?;
            Ok(Self { module: module.unbind(),
                      version,
                      handles: Mutex::new(HashMap::new()),
                      next_handle: AtomicU64::new(0) })
        })
    }

    fn table(&self) -> MutexGuard<'_, HashMap<u64, Py<PyAny>>> {
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ejecuta `call` con el módulo y la molécula del handle bajo el GIL.
    fn call_with_mol<T>(&self,
                        op: &'static str,
                        handle: MolHandle,
                        call: impl for<'py> FnOnce(&Bound<'py, PyModule>, &Bound<'py, PyAny>) -> PyResult<T>)
                        -> Result<T, EngineError> {
        Python::attach(|py| {
            let mol = self.table()
                          .get(&handle.0)
                          .map(|m| m.clone_ref(py))
                          .ok_or(EngineError::UnknownHandle(handle.0))?;
            call(self.module.bind(py), mol.bind(py)).map_err(|e| EngineError::operation(op, e.to_string()))
        })
    }
}

impl StructureEngine for RdkitEngine {
    fn name(&self) -> &str {
        "rdkit"
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn parse(&self, smiles: &str) -> Result<Option<MolHandle>, EngineError> {
        Python::attach(|py| {
            let mol = self.module
                          .bind(py)
                          .getattr("parse")
                          .and_then(|f| f.call1((smiles,)))
                          .map_err(|e| EngineError::operation("parse", e.to_string()))?;
            if mol.is_none() {
                return Ok(None);
            }
            let id = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
            self.table().insert(id, mol.unbind());
            Ok(Some(MolHandle(id)))
        })
    }

    fn is_valid(&self, handle: MolHandle) -> Result<bool, EngineError> {
        self.call_with_mol("is_valid", handle, |m, mol| m.getattr("is_valid")?.call1((mol,))?.extract())
    }

    fn render_svg(&self, handle: MolHandle, width: u32, height: u32) -> Result<String, EngineError> {
        self.call_with_mol("render_svg", handle, |m, mol| m.getattr("render_svg")?.call1((mol, width, height))?.extract())
    }

    fn canonical_smiles(&self, handle: MolHandle) -> Result<String, EngineError> {
        self.call_with_mol("canonical_smiles", handle, |m, mol| m.getattr("canonical_smiles")?.call1((mol,))?.extract())
    }

    fn descriptors(&self, handle: MolHandle) -> Result<RawDescriptors, EngineError> {
        let values: HashMap<String, f64> =
            self.call_with_mol("descriptors", handle, |m, mol| m.getattr("descriptors")?.call1((mol,))?.extract())?;
        Ok(values.into_iter().collect())
    }

    fn fingerprint(&self, handle: MolHandle, kind: &FingerprintKind) -> Result<String, EngineError> {
        match *kind {
            FingerprintKind::Morgan { radius, n_bits } => self.call_with_mol("morgan_fingerprint", handle, |m, mol| {
                                                            m.getattr("morgan_fingerprint")?.call1((mol, radius, n_bits))?.extract()
                                                        }),
            FingerprintKind::Pattern => self.call_with_mol("pattern_fingerprint", handle, |m, mol| {
                                            m.getattr("pattern_fingerprint")?.call1((mol,))?.extract()
                                        }),
        }
    }

    fn release(&self, handle: MolHandle) {
        // La tabla se suelta antes de tomar el GIL; `call_with_mol` los toma en orden inverso.
        let mol = self.table().remove(&handle.0);
        if let Some(mol) = mol {
            Python::attach(|_py| drop(mol));
        }
    }
}

/// Fuente para `EngineLoader`: intenta inicializar Python e importar RDKit.
#[derive(Debug, Default)]
pub struct RdkitSource;

#[async_trait]
impl EngineSource for RdkitSource {
    fn describe(&self) -> &str {
        "rdkit"
    }

    async fn try_load(&self) -> Result<Option<SharedEngine>, EngineError> {
        let engine = tokio::task::spawn_blocking(RdkitEngine::load).await
                                                                   .map_err(|e| EngineError::Init(e.to_string()))??;
        let engine: SharedEngine = Arc::new(engine);
        Ok(Some(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MolGuard;

    #[test]
    #[ignore = "requiere Python con RDKit"]
    fn test_rdkit_roundtrip() {
        let engine = RdkitEngine::load().expect("Fallo al inicializar Python/RDKit");
        let guard = MolGuard::open(&engine, "OCC").unwrap().expect("etanol válido");
        assert_eq!(guard.canonical_smiles().unwrap(), "CCO");
        assert!(guard.render_svg(200, 150).unwrap().contains("<svg"));
        let fp = guard.fingerprint(&FingerprintKind::morgan()).unwrap();
        assert_eq!(fp.len(), 2048);
        let desc = guard.descriptors().unwrap();
        assert!((desc["amw"] - 46.07).abs() < 0.1);
    }

    #[test]
    #[ignore = "requiere Python con RDKit"]
    fn test_rdkit_concurrent_release() {
        let engine = RdkitEngine::load().expect("Fallo al inicializar Python/RDKit");
        std::thread::scope(|scope| {
            for smiles in ["CCO", "c1ccccc1", "CC(=O)Oc1ccccc1C(=O)O", "Oc1ccccc1C(=O)O"] {
                let engine = &engine;
                scope.spawn(move || {
                    for _ in 0..50 {
                        let guard = MolGuard::open(engine, smiles).unwrap().expect("notación válida");
                        guard.fingerprint(&FingerprintKind::Pattern).unwrap();
                    }
                });
            }
        });
        assert!(engine.table().is_empty());
    }

    #[test]
    #[ignore = "requiere Python con RDKit"]
    fn test_rdkit_rejects_invalid() {
        let engine = RdkitEngine::load().expect("Fallo al inicializar Python/RDKit");
        assert!(MolGuard::open(&engine, "C1CC(").unwrap().is_none());
        assert!(MolGuard::open(&engine, "").unwrap().is_none());
    }
}
