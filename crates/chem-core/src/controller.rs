//! Orquestador del flujo de comparación.
//! Se encarga de:
//! - Dibujar la referencia y la estructura de comparación con el motor
//!   inyectado (una sola instancia compartida).
//! - Regenerar fingerprints bajo demanda y calcular la similitud.
//! - Mantener el ciclo `Idle → ReferenceRendered → ComparisonOpen →
//!   BothRendered` y emitir un evento por transición.
//! - Contener todos los fallos: cada operación devuelve `Advisory` y lo deja
//!   registrado en la sesión.
use std::collections::HashMap;

use chem_domain::{derive_fingerprint, tanimoto, Fingerprint, RenderOptions, StructureRecord};
use chemengine::{EngineError, FingerprintKind, LoadState, SharedEngine};
use log::{debug, info, warn};

use crate::catalog;
use crate::errors::Advisory;
use crate::event::{EventStore, InMemoryEventStore, SessionEvent, SessionEventKind};
use crate::session::{ComparisonSession, Similarity};
use crate::state::{Role, WorkflowState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub width: u32,
    pub height: u32,
    pub fingerprint_kind: FingerprintKind,
    /// Reutiliza fingerprints por (notación canónica, tipo) mientras no
    /// cambie la referencia. Apagado por defecto: la referencia se vuelve a
    /// derivar con el motor en cada comparación.
    pub cache_fingerprints: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        let render = RenderOptions::default();
        Self { width: render.width,
               height: render.height,
               fingerprint_kind: FingerprintKind::default(),
               cache_fingerprints: false }
    }
}

/// Ranura del motor compartido.
#[derive(Clone)]
enum EngineSlot {
    Loading,
    Ready(SharedEngine),
    Unavailable(String),
}

pub struct ComparisonController<E: EventStore = InMemoryEventStore> {
    engine: EngineSlot,
    session: ComparisonSession,
    options: ControllerOptions,
    events: E,
    /// Última referencia recibida mientras el motor cargaba.
    pending_reference: Option<String>,
    fingerprint_cache: HashMap<(String, FingerprintKind), Fingerprint>,
}

impl ComparisonController<InMemoryEventStore> {
    /// Controlador a la espera del motor (ver `attach_engine`).
    pub fn new(options: ControllerOptions) -> Self {
        Self::with_event_store(options, InMemoryEventStore::default())
    }

    /// Controlador con el motor ya cargado.
    pub fn with_engine(engine: SharedEngine, options: ControllerOptions) -> Self {
        let mut controller = Self::new(options);
        controller.engine = EngineSlot::Ready(engine);
        controller
    }
}

impl<E: EventStore> ComparisonController<E> {
    pub fn with_event_store(options: ControllerOptions, events: E) -> Self {
        Self { engine: EngineSlot::Loading,
               session: ComparisonSession::new(options.fingerprint_kind),
               options,
               events,
               pending_reference: None,
               fingerprint_cache: HashMap::new() }
    }

    pub fn session(&self) -> &ComparisonSession {
        &self.session
    }

    pub fn state(&self) -> WorkflowState {
        self.session.state
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn engine_ready(&self) -> bool {
        matches!(self.engine, EngineSlot::Ready(_))
    }

    pub fn pending_reference(&self) -> Option<&str> {
        self.pending_reference.as_deref()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.list(self.session.id)
    }

    /// Aplica el resultado del cargador. Con el motor listo, dibuja la
    /// referencia diferida si la hay; si falló, la sesión queda bloqueada.
    pub fn attach_engine(&mut self, state: LoadState) -> Result<WorkflowState, Advisory> {
        match state {
            LoadState::Ready(engine) => {
                self.emit(SessionEventKind::EngineAttached { name: engine.name().to_string(),
                                                             version: engine.version().to_string() });
                self.engine = EngineSlot::Ready(engine);
                match self.pending_reference.take() {
                    Some(smiles) => self.submit_reference(&smiles),
                    None => Ok(self.session.state),
                }
            }
            LoadState::Failed(reason) => {
                self.pending_reference = None;
                self.emit(SessionEventKind::EngineUnavailable { reason: reason.clone() });
                self.engine = EngineSlot::Unavailable(reason.clone());
                Err(self.fail(Advisory::EngineUnavailable { reason }))
            }
            LoadState::Loading { .. } | LoadState::Abandoned => Ok(self.session.state),
        }
    }

    /// Nueva referencia: siempre descarta la mitad de comparación.
    pub fn submit_reference(&mut self, smiles: &str) -> Result<WorkflowState, Advisory> {
        let engine = match &self.engine {
            EngineSlot::Ready(engine) => engine.clone(),
            EngineSlot::Loading => {
                debug!("motor cargando; referencia '{smiles}' diferida");
                self.pending_reference = Some(smiles.to_string());
                self.emit(SessionEventKind::RenderDeferred { smiles: smiles.to_string() });
                return Ok(self.session.state);
            }
            EngineSlot::Unavailable(reason) => {
                let reason = reason.clone();
                return Err(self.fail(Advisory::EngineUnavailable { reason }));
            }
        };
        self.session.drop_comparison();
        self.session.reference = None;
        self.session.state = WorkflowState::Idle;
        self.fingerprint_cache.clear();

        let record = self.render(&engine, Role::Reference, smiles)?;
        self.session.reference = Some(record);
        self.transition(WorkflowState::ReferenceRendered);
        Ok(self.session.state)
    }

    /// Activa el modo comparación. No llama al motor.
    pub fn open_comparison(&mut self) -> Result<WorkflowState, Advisory> {
        match self.session.state {
            WorkflowState::Idle => Err(self.fail(Advisory::ReferenceMissing)),
            WorkflowState::ReferenceRendered => {
                self.emit(SessionEventKind::ComparisonOpened);
                self.transition(WorkflowState::ComparisonOpen);
                Ok(self.session.state)
            }
            state => Ok(state),
        }
    }

    /// Desactiva el modo comparación conservando la referencia.
    pub fn close_comparison(&mut self) -> Result<WorkflowState, Advisory> {
        if !self.session.state.comparison_mode() {
            return Ok(self.session.state);
        }
        self.session.drop_comparison();
        self.emit(SessionEventKind::ComparisonClosed);
        let next = if self.session.reference.is_some() { WorkflowState::ReferenceRendered } else { WorkflowState::Idle };
        self.transition(next);
        Ok(self.session.state)
    }

    /// Dibuja la estructura de comparación y calcula la similitud con fingerprints
    /// recién derivados de ambas notaciones.
    pub fn submit_comparison(&mut self, smiles: &str) -> Result<WorkflowState, Advisory> {
        if !self.session.state.comparison_mode() {
            return Err(self.fail(Advisory::ComparisonClosed));
        }
        let engine = self.ready_engine()?;
        self.session.drop_comparison();
        self.session.state = WorkflowState::ComparisonOpen;

        let record = self.render(&engine, Role::Comparison, smiles)?;
        self.session.comparison = Some(record);
        self.transition(WorkflowState::BothRendered);
        self.compute_similarity(&engine)
    }

    /// Cambia el tipo de fingerprint. Con ambas estructuras dibujadas invalida
    /// la puntuación y la recalcula con el nuevo tipo.
    pub fn set_fingerprint_kind(&mut self, kind: FingerprintKind) -> Result<WorkflowState, Advisory> {
        if kind == self.session.fingerprint_kind {
            return Ok(self.session.state);
        }
        self.session.fingerprint_kind = kind;
        self.emit(SessionEventKind::FingerprintKindChanged { kind });
        if self.session.state != WorkflowState::BothRendered {
            return Ok(self.session.state);
        }
        self.session.similarity = None;
        self.emit(SessionEventKind::SimilarityInvalidated);
        self.transition(WorkflowState::ComparisonOpen);
        let engine = self.ready_engine()?;
        self.transition(WorkflowState::BothRendered);
        self.compute_similarity(&engine)
    }

    /// Quita la estructura de comparación y su puntuación; el modo sigue activo.
    pub fn clear_comparison(&mut self) -> Result<WorkflowState, Advisory> {
        if !self.session.state.comparison_mode() {
            return Err(self.fail(Advisory::ComparisonClosed));
        }
        self.session.drop_comparison();
        self.session.advisory = None;
        self.emit(SessionEventKind::ComparisonCleared);
        self.transition(WorkflowState::ComparisonOpen);
        Ok(self.session.state)
    }

    pub fn load_example(&mut self, index: usize) -> Result<WorkflowState, Advisory> {
        let example = catalog::example(index).ok_or(Advisory::UnknownExample { index })
                                             .map_err(|a| self.fail(a))?;
        self.submit_reference(example.smiles)
    }

    /// Dibuja el par completo: referencia, modo comparación y comparación.
    pub fn load_example_pair(&mut self, index: usize) -> Result<WorkflowState, Advisory> {
        let pair = catalog::example_pair(index).ok_or(Advisory::UnknownExample { index })
                                               .map_err(|a| self.fail(a))?;
        self.submit_reference(pair.reference)?;
        self.open_comparison()?;
        self.submit_comparison(pair.comparison)
    }

    fn ready_engine(&mut self) -> Result<SharedEngine, Advisory> {
        match &self.engine {
            EngineSlot::Ready(engine) => Ok(engine.clone()),
            EngineSlot::Loading => Err(self.fail(Advisory::EngineUnavailable { reason: "el motor todavía está cargando".into() })),
            EngineSlot::Unavailable(reason) => {
                let reason = reason.clone();
                Err(self.fail(Advisory::EngineUnavailable { reason }))
            }
        }
    }

    /// Registro nuevo para el rol; en caso de fallo el rol queda vacío.
    fn render(&mut self, engine: &SharedEngine, role: Role, smiles: &str) -> Result<StructureRecord, Advisory> {
        let options = RenderOptions { width: self.options.width, height: self.options.height };
        match StructureRecord::render(engine.as_ref(), smiles, &options) {
            Ok(Some(record)) => {
                self.session.advisory = None;
                self.emit(SessionEventKind::StructureRendered { role,
                                                                smiles: smiles.to_string(),
                                                                canonical: record.canonical_smiles().to_string() });
                Ok(record)
            }
            Ok(None) => {
                self.emit(SessionEventKind::StructureRejected { role, smiles: smiles.to_string() });
                Err(self.fail(Advisory::InvalidNotation { role, notation: smiles.to_string() }))
            }
            Err(e) => Err(self.engine_failure(role, e)),
        }
    }

    /// Requiere estado `BothRendered`. Un fallo al generar fingerprints deja
    /// ambos registros intactos y la sesión sin puntuación.
    fn compute_similarity(&mut self, engine: &SharedEngine) -> Result<WorkflowState, Advisory> {
        let (Some(reference), Some(comparison)) = (&self.session.reference, &self.session.comparison) else {
            return Ok(self.session.state);
        };
        let (reference, comparison) = (reference.clone(), comparison.clone());
        let kind = self.session.fingerprint_kind;

        let pair = self.fingerprint(engine, &reference, &kind)
                       .and_then(|a| self.fingerprint(engine, &comparison, &kind).map(|b| a.zip(b)));
        let (a, b) = match pair {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                return Err(self.fail(Advisory::SimilarityUnavailable { reason: "una de las notaciones dejó de ser válida".into() }));
            }
            Err(e) => {
                warn!("fingerprints {kind} no disponibles: {e}");
                return Ok(self.session.state);
            }
        };
        let score = tanimoto(&a, &b).map_err(|e| self.fail(e.into()))?;
        info!("similitud {kind} '{}' vs '{}' = {score:.3}", reference.input(), comparison.input());
        self.session.similarity = Some(Similarity { score, kind });
        self.emit(SessionEventKind::SimilarityComputed { kind,
                                                         score,
                                                         reference_fingerprint: a.digest(),
                                                         comparison_fingerprint: b.digest() });
        Ok(self.session.state)
    }

    fn fingerprint(&mut self, engine: &SharedEngine, record: &StructureRecord, kind: &FingerprintKind) -> Result<Option<Fingerprint>, EngineError> {
        let key = (record.canonical_smiles().to_string(), *kind);
        if self.options.cache_fingerprints {
            if let Some(fp) = self.fingerprint_cache.get(&key) {
                return Ok(Some(fp.clone()));
            }
        }
        let fp = derive_fingerprint(engine.as_ref(), record.input(), kind)?;
        if let (true, Some(fp)) = (self.options.cache_fingerprints, &fp) {
            self.fingerprint_cache.insert(key, fp.clone());
        }
        Ok(fp)
    }

    fn engine_failure(&mut self, role: Role, e: EngineError) -> Advisory {
        self.emit(SessionEventKind::EngineFailure { role, message: e.to_string() });
        self.fail(Advisory::EngineFailure { role, message: e.to_string() })
    }

    fn fail(&mut self, advisory: Advisory) -> Advisory {
        warn!("{advisory}");
        self.session.advisory = Some(advisory.clone());
        advisory
    }

    fn transition(&mut self, next: WorkflowState) {
        if self.session.state != next {
            debug!("sesión {}: {} -> {next}", self.session.id, self.session.state);
            self.session.state = next;
        }
    }

    fn emit(&mut self, kind: SessionEventKind) {
        self.events.append_kind(self.session.id, kind);
    }
}
