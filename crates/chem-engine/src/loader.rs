//! Carga del motor con reintentos acotados.
//!
//! Máquina de estados explícita: `Loading { attempt } → Ready | Failed |
//! Abandoned`. Cada intento consulta la `EngineSource`; entre intentos se
//! espera un intervalo fijo. No hay cancelación real: el `CancelFlag` se
//! revisa antes de cada actualización de estado y, si está activo, el
//! cargador se abandona sin hacer más trabajo.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::engine::SharedEngine;
use crate::EngineError;

/// Origen del motor. `Ok(None)` significa "todavía no disponible".
#[async_trait]
pub trait EngineSource: Send + Sync {
    fn describe(&self) -> &str;
    async fn try_load(&self) -> Result<Option<SharedEngine>, EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), interval }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(50, Duration::from_millis(100))
    }
}

/// Bandera cooperativa de "no hacer más trabajo".
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub enum LoadState {
    Loading { attempt: u32 },
    Ready(SharedEngine),
    Failed(String),
    Abandoned,
}

impl LoadState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadState::Loading { .. })
    }

    pub fn engine(&self) -> Option<&SharedEngine> {
        match self {
            LoadState::Ready(engine) => Some(engine),
            _ => None,
        }
    }
}

impl fmt::Debug for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Loading { attempt } => f.debug_struct("Loading").field("attempt", attempt).finish(),
            LoadState::Ready(engine) => write!(f, "Ready({} {})", engine.name(), engine.version()),
            LoadState::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
            LoadState::Abandoned => write!(f, "Abandoned"),
        }
    }
}

pub struct EngineLoader<S: EngineSource> {
    source: S,
    policy: RetryPolicy,
    state: LoadState,
    cancel: CancelFlag,
    last_error: Option<String>,
}

impl<S: EngineSource> EngineLoader<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source,
               policy,
               state: LoadState::Loading { attempt: 0 },
               cancel: CancelFlag::new(),
               last_error: None }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Ejecuta un único intento y devuelve el estado resultante.
    pub async fn attempt(&mut self) -> &LoadState {
        let attempt = match self.state {
            LoadState::Loading { attempt } => attempt + 1,
            _ => return &self.state,
        };
        if self.cancel.is_cancelled() {
            self.state = LoadState::Abandoned;
            return &self.state;
        }
        let result = self.source.try_load().await;
        if self.cancel.is_cancelled() {
            debug!("carga de '{}' abandonada tras el intento {attempt}", self.source.describe());
            self.state = LoadState::Abandoned;
            return &self.state;
        }
        match result {
            Ok(Some(engine)) => {
                info!("motor {} {} listo (intento {attempt})", engine.name(), engine.version());
                self.state = LoadState::Ready(engine);
            }
            Ok(None) => self.next_or_fail(attempt),
            Err(e) => {
                debug!("intento {attempt} de carga fallido: {e}");
                self.last_error = Some(e.to_string());
                self.next_or_fail(attempt);
            }
        }
        &self.state
    }

    fn next_or_fail(&mut self, attempt: u32) {
        if attempt >= self.policy.max_attempts {
            let mut reason = format!("el motor '{}' no estuvo disponible tras {attempt} intentos", self.source.describe());
            if let Some(last) = &self.last_error {
                reason.push_str(&format!(" (último error: {last})"));
            }
            warn!("{reason}");
            self.state = LoadState::Failed(reason);
        } else {
            self.state = LoadState::Loading { attempt };
        }
    }

    /// Reintenta hasta un estado terminal.
    pub async fn run(mut self) -> LoadState {
        loop {
            if self.attempt().await.is_terminal() {
                return self.state;
            }
            tokio::time::sleep(self.policy.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEngine;
    use std::sync::atomic::AtomicU32;

    /// Disponible a partir del intento `ready_at` (0 = nunca).
    struct CountingSource {
        calls: AtomicU32,
        ready_at: u32,
        error: bool,
    }

    impl CountingSource {
        fn new(ready_at: u32) -> Self {
            Self { calls: AtomicU32::new(0), ready_at, error: false }
        }
    }

    #[async_trait]
    impl EngineSource for CountingSource {
        fn describe(&self) -> &str {
            "counting"
        }
        async fn try_load(&self) -> Result<Option<SharedEngine>, EngineError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.ready_at != 0 && n >= self.ready_at {
                let engine: SharedEngine = Arc::new(MockEngine::new());
                return Ok(Some(engine));
            }
            if self.error {
                return Err(EngineError::Init("módulo ausente".into()));
            }
            Ok(None)
        }
    }

    fn fast(max: u32) -> RetryPolicy {
        RetryPolicy::new(max, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn becomes_ready_within_budget() {
        let loader = EngineLoader::new(CountingSource::new(3), fast(5));
        let state = loader.run().await;
        assert!(matches!(state, LoadState::Ready(_)));
        assert_eq!(state.engine().map(|e| e.name().to_string()), Some("mock".to_string()));
    }

    #[tokio::test]
    async fn fails_after_budget() {
        let mut source = CountingSource::new(0);
        source.error = true;
        let state = EngineLoader::new(source, fast(4)).run().await;
        match state {
            LoadState::Failed(reason) => {
                assert!(reason.contains("4 intentos"), "{reason}");
                assert!(reason.contains("módulo ausente"), "{reason}");
            }
            other => panic!("esperado Failed, obtenido {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_attempts_step_the_state() {
        let mut loader = EngineLoader::new(CountingSource::new(2), fast(3));
        assert!(matches!(loader.attempt().await, LoadState::Loading { attempt: 1 }));
        assert!(matches!(loader.attempt().await, LoadState::Ready(_)));
        // Estado terminal: más intentos no hacen nada.
        assert!(matches!(loader.attempt().await, LoadState::Ready(_)));
    }

    #[tokio::test]
    async fn cancelled_loader_is_abandoned() {
        let cancel = CancelFlag::new();
        let loader = EngineLoader::new(CountingSource::new(0), fast(100)).with_cancel_flag(cancel.clone());
        cancel.cancel();
        assert!(matches!(loader.run().await, LoadState::Abandoned));
    }

    #[test]
    fn policy_budget_is_at_least_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
