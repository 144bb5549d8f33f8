//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
//! Valores ausentes o no parseables toman su valor por defecto.
use std::env;
use std::str::FromStr;
use std::time::Duration;

use chem_core::ControllerOptions;
use chemengine::{FingerprintKind, RetryPolicy};
use log::LevelFilter;
use once_cell::sync::Lazy;

/// Motor a usar en tiempo de ejecución.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineChoice {
    Rdkit,
    Mock,
}

impl FromStr for EngineChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rdkit" => Ok(EngineChoice::Rdkit),
            "mock" => Ok(EngineChoice::Mock),
            other => Err(format!("motor desconocido: {other}")),
        }
    }
}

/// Configuración global de la aplicación.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: LevelFilter,
    pub engine: EngineConfig,
    pub depiction: DepictionConfig,
    pub fingerprint: FingerprintConfig,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub choice: EngineChoice,
    /// Intentos de carga antes de declarar el motor no disponible.
    pub max_attempts: u32,
    pub retry_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct DepictionConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct FingerprintConfig {
    pub morgan_radius: u32,
    pub morgan_bits: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignora error si no existe .env
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda de claves.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
            lookup(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
        }
        AppConfig { log_level: parsed(&lookup, "CHEMVIEW_LOG_LEVEL", LevelFilter::Info),
                    engine: EngineConfig { choice: parsed(&lookup, "CHEMVIEW_ENGINE", EngineChoice::Rdkit),
                                           max_attempts: parsed(&lookup, "CHEMVIEW_ENGINE_MAX_ATTEMPTS", 50),
                                           retry_interval: Duration::from_millis(parsed(&lookup, "CHEMVIEW_ENGINE_RETRY_MS", 100)) },
                    depiction: DepictionConfig { width: parsed(&lookup, "CHEMVIEW_DEPICTION_WIDTH", 350),
                                                 height: parsed(&lookup, "CHEMVIEW_DEPICTION_HEIGHT", 300) },
                    fingerprint: FingerprintConfig { morgan_radius: parsed(&lookup, "CHEMVIEW_MORGAN_RADIUS", FingerprintKind::DEFAULT_RADIUS),
                                                     morgan_bits: parsed(&lookup, "CHEMVIEW_MORGAN_BITS", FingerprintKind::DEFAULT_BITS).max(1) } }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.engine.max_attempts, self.engine.retry_interval)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions { width: self.depiction.width,
                            height: self.depiction.height,
                            fingerprint_kind: FingerprintKind::Morgan { radius: self.fingerprint.morgan_radius,
                                                                        n_bits: self.fingerprint.morgan_bits },
                            cache_fingerprints: false }
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);
