//! chemview
//!
//! Capa de presentación sobre un motor quimioinformático externo:
//! - `tool` expone la herramienta `show_molecule` y el recurso de interfaz.
//! - `view` dibuja la sesión de comparación como HTML.
//! - `config` carga la configuración desde el entorno.
//!
//! La química vive en `chemengine`, la similitud en `chem_domain` y el flujo
//! de comparación en `chem_core`.

pub mod config;
pub mod errors;
pub mod tool;
pub mod view;

use chemengine::{CancelFlag, EngineLoader, LoadState, MockSource, RetryPolicy};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use config::EngineChoice;
use errors::CoreError;

/// Instala el logger en stderr; stdout queda libre para el protocolo.
pub fn init_logging(level: LevelFilter) -> Result<(), CoreError> {
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
        .map_err(|e| CoreError::Internal(format!("no se pudo instalar el logger: {e}")))
}

/// Carga el motor elegido hasta un estado terminal.
pub async fn load_engine(choice: EngineChoice, policy: RetryPolicy, cancel: CancelFlag) -> LoadState {
    match choice {
        EngineChoice::Mock => EngineLoader::new(MockSource, policy).with_cancel_flag(cancel).run().await,
        #[cfg(feature = "rdkit")]
        EngineChoice::Rdkit => {
            EngineLoader::new(chemengine::rdkit::RdkitSource, policy).with_cancel_flag(cancel)
                                                                      .run()
                                                                      .await
        }
        #[cfg(not(feature = "rdkit"))]
        EngineChoice::Rdkit => LoadState::Failed("binario compilado sin la feature 'rdkit'".to_string()),
    }
}
