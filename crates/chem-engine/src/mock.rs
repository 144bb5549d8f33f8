//! Motor determinista que imita el contrato de `StructureEngine` sin química
//! real. La validez es sintáctica (caracteres, paréntesis, cierres de anillo)
//! y los fingerprints se construyen a partir de n-gramas de la notación, por
//! lo que notaciones que comparten fragmentos comparten bits.
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::engine::{FingerprintKind, MolHandle, RawDescriptors, SharedEngine, StructureEngine};
use crate::loader::EngineSource;
use crate::EngineError;

const PATTERN_BITS: usize = 2048;

#[derive(Debug, Default, Clone, Copy)]
struct MockFailures {
    render: bool,
    descriptors: bool,
    fingerprints: bool,
}

#[derive(Debug, Default)]
pub struct MockEngine {
    handles: Mutex<HashMap<u64, String>>,
    next_handle: AtomicU64,
    parse_calls: AtomicUsize,
    fingerprint_calls: AtomicUsize,
    failures: MockFailures,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// `render_svg` falla siempre (simula una excepción inesperada del motor).
    pub fn failing_render(mut self) -> Self {
        self.failures.render = true;
        self
    }

    /// `descriptors` no está disponible en esta "compilación" del motor.
    pub fn failing_descriptors(mut self) -> Self {
        self.failures.descriptors = true;
        self
    }

    pub fn failing_fingerprints(mut self) -> Self {
        self.failures.fingerprints = true;
        self
    }

    pub fn parse_calls(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }

    pub fn fingerprint_calls(&self) -> usize {
        self.fingerprint_calls.load(Ordering::SeqCst)
    }

    pub fn live_handles(&self) -> usize {
        self.table().len()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<u64, String>> {
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notation(&self, handle: MolHandle) -> Result<String, EngineError> {
        self.table().get(&handle.0).cloned().ok_or(EngineError::UnknownHandle(handle.0))
    }
}

impl StructureEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn parse(&self, smiles: &str) -> Result<Option<MolHandle>, EngineError> {
        self.parse_calls.fetch_add(1, Ordering::SeqCst);
        let trimmed = smiles.trim();
        if !looks_valid(trimmed) {
            return Ok(None);
        }
        let id = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
        self.table().insert(id, trimmed.to_string());
        Ok(Some(MolHandle(id)))
    }

    fn is_valid(&self, handle: MolHandle) -> Result<bool, EngineError> {
        Ok(self.table().contains_key(&handle.0))
    }

    fn render_svg(&self, handle: MolHandle, width: u32, height: u32) -> Result<String, EngineError> {
        if self.failures.render {
            return Err(EngineError::operation("render_svg", "fallo simulado de depicción"));
        }
        let smiles = self.notation(handle)?;
        Ok(format!("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\">\
                    <text x=\"10\" y=\"20\">{}</text></svg>",
                   smiles.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")))
    }

    fn canonical_smiles(&self, handle: MolHandle) -> Result<String, EngineError> {
        self.notation(handle)
    }

    fn descriptors(&self, handle: MolHandle) -> Result<RawDescriptors, EngineError> {
        if self.failures.descriptors {
            return Err(EngineError::Unsupported("descriptors"));
        }
        let smiles = self.notation(handle)?;
        // Sólo un subconjunto: el resto queda ausente como en motores recortados.
        let mut out = RawDescriptors::new();
        out.insert("NumHeavyAtoms".into(), heavy_atom_count(&smiles) as f64);
        out.insert("NumRings".into(), ring_closure_count(&smiles) as f64);
        Ok(out)
    }

    fn fingerprint(&self, handle: MolHandle, kind: &FingerprintKind) -> Result<String, EngineError> {
        self.fingerprint_calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.fingerprints {
            return Err(EngineError::Unsupported("fingerprint"));
        }
        let smiles = self.notation(handle)?;
        let chars: Vec<char> = smiles.chars().collect();
        let (n_bits, grams, seed) = match kind {
            FingerprintKind::Morgan { radius, n_bits } => (*n_bits as usize, 1..=(*radius as usize + 1), 0x6d6f7267u64),
            FingerprintKind::Pattern => (PATTERN_BITS, 2..=4, 0x70617474u64),
        };
        if n_bits == 0 {
            return Err(EngineError::operation("fingerprint", "n_bits debe ser > 0"));
        }
        let mut bits = vec![false; n_bits];
        for n in grams {
            for window in chars.windows(n) {
                let mut hasher = DefaultHasher::new();
                seed.hash(&mut hasher);
                window.hash(&mut hasher);
                bits[(hasher.finish() % n_bits as u64) as usize] = true;
            }
        }
        Ok(bits.iter().map(|b| if *b { '1' } else { '0' }).collect())
    }

    fn release(&self, handle: MolHandle) {
        self.table().remove(&handle.0);
    }
}

fn looks_valid(smiles: &str) -> bool {
    if smiles.is_empty() || !smiles.chars().any(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    let mut depth = 0i32;
    let mut in_bracket = false;
    let mut ring_open = [false; 10];
    for c in smiles.chars() {
        match c {
            '(' if !in_bracket => depth += 1,
            ')' if !in_bracket => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            '[' if !in_bracket => in_bracket = true,
            ']' if in_bracket => in_bracket = false,
            '[' | ']' => return false,
            '0'..='9' if !in_bracket => {
                let d = c as usize - '0' as usize;
                ring_open[d] = !ring_open[d];
            }
            c if c.is_ascii_alphanumeric() => {}
            '=' | '#' | '@' | '+' | '-' | '/' | '\\' | '.' | ':' | '*' | '%' | '(' | ')' => {}
            _ => return false,
        }
    }
    depth == 0 && !in_bracket && ring_open.iter().all(|open| !open)
}

fn heavy_atom_count(smiles: &str) -> usize {
    let mut count = 0;
    let mut in_bracket = false;
    let mut prev_upper: Option<char> = None;
    for c in smiles.chars() {
        match c {
            '[' => {
                in_bracket = true;
                count += 1;
            }
            ']' => in_bracket = false,
            _ if in_bracket => {}
            'H' => {}
            'l' if prev_upper == Some('C') => {}
            'r' if prev_upper == Some('B') => {}
            c if c.is_ascii_uppercase() => count += 1,
            'b' | 'c' | 'n' | 'o' | 'p' | 's' => count += 1,
            _ => {}
        }
        prev_upper = if c.is_ascii_uppercase() { Some(c) } else { None };
    }
    count
}

fn ring_closure_count(smiles: &str) -> usize {
    let mut in_bracket = false;
    let mut digits = 0;
    for c in smiles.chars() {
        match c {
            '[' => in_bracket = true,
            ']' => in_bracket = false,
            '0'..='9' if !in_bracket => digits += 1,
            _ => {}
        }
    }
    digits / 2
}

/// Fuente que entrega un `MockEngine` nuevo en el primer intento.
#[derive(Debug, Default)]
pub struct MockSource;

#[async_trait]
impl EngineSource for MockSource {
    fn describe(&self) -> &str {
        "mock"
    }

    async fn try_load(&self) -> Result<Option<SharedEngine>, EngineError> {
        let engine: SharedEngine = Arc::new(MockEngine::new());
        Ok(Some(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_rules() {
        assert!(looks_valid("CCO"));
        assert!(looks_valid("c1ccccc1"));
        assert!(looks_valid("CC(=O)Oc1ccccc1C(=O)O"));
        assert!(looks_valid("[Na+].[Cl-]"));
        assert!(!looks_valid(""));
        assert!(!looks_valid("C1CC"));
        assert!(!looks_valid("CC)("));
        assert!(!looks_valid("C[C"));
        assert!(!looks_valid("123"));
        assert!(!looks_valid("C C"));
    }

    #[test]
    fn counts() {
        assert_eq!(heavy_atom_count("CCO"), 3);
        assert_eq!(heavy_atom_count("c1ccccc1"), 6);
        assert_eq!(heavy_atom_count("ClCBr"), 3);
        assert_eq!(heavy_atom_count("[NH4+]"), 1);
        assert_eq!(ring_closure_count("c1ccccc1"), 1);
        assert_eq!(ring_closure_count("CCO"), 0);
    }

    #[test]
    fn fingerprint_length_follows_kind() {
        let engine = MockEngine::new();
        let h = engine.parse("CCO").unwrap().unwrap();
        let morgan = engine.fingerprint(h, &FingerprintKind::Morgan { radius: 2, n_bits: 512 }).unwrap();
        let pattern = engine.fingerprint(h, &FingerprintKind::Pattern).unwrap();
        assert_eq!(morgan.len(), 512);
        assert_eq!(pattern.len(), PATTERN_BITS);
        assert!(morgan.chars().all(|c| c == '0' || c == '1'));
        assert!(morgan.contains('1'));
        engine.release(h);
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let engine = MockEngine::new();
        let a = engine.parse("c1ccccc1O").unwrap().unwrap();
        let b = engine.parse("c1ccccc1O").unwrap().unwrap();
        let kind = FingerprintKind::morgan();
        assert_eq!(engine.fingerprint(a, &kind).unwrap(), engine.fingerprint(b, &kind).unwrap());
    }

    #[test]
    fn released_handle_is_unknown() {
        let engine = MockEngine::new();
        let h = engine.parse("CCO").unwrap().unwrap();
        engine.release(h);
        assert_eq!(engine.canonical_smiles(h), Err(EngineError::UnknownHandle(h.0)));
        assert!(!engine.is_valid(h).unwrap());
    }

    #[test]
    fn injected_failures() {
        let engine = MockEngine::new().failing_descriptors().failing_fingerprints();
        let h = engine.parse("CCO").unwrap().unwrap();
        assert_eq!(engine.descriptors(h), Err(EngineError::Unsupported("descriptors")));
        assert!(engine.fingerprint(h, &FingerprintKind::Pattern).is_err());
        assert!(engine.render_svg(h, 10, 10).unwrap().contains("CCO"));
        assert_eq!(engine.fingerprint_calls(), 1);
    }

    #[tokio::test]
    async fn mock_source_is_ready_on_first_try() {
        let engine = MockSource.try_load().await.unwrap().expect("motor");
        assert_eq!(engine.name(), "mock");
    }
}
