//! Servidor stdio de chemview: una herramienta (`show_molecule`) y su visor.
use chem_core::ComparisonController;
use chemengine::CancelFlag;
use chemview::config::CONFIG;
use chemview::errors::CoreError;
use chemview::tool::ToolServer;
use chemview::{init_logging, load_engine};
use log::{error, info};
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CoreError> {
    let cfg = &*CONFIG;
    init_logging(cfg.log_level)?;
    info!("chemview {} (motor: {:?}, {} intentos cada {:?})",
          env!("CARGO_PKG_VERSION"),
          cfg.engine.choice,
          cfg.engine.max_attempts,
          cfg.engine.retry_interval);

    let cancel = CancelFlag::new();
    let load = load_engine(cfg.engine.choice, cfg.retry_policy(), cancel.clone());
    let mut server = ToolServer::new(ComparisonController::new(cfg.controller_options()));
    let result = server.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), load).await;
    // Si la carga sigue en curso, no hace más trabajo.
    cancel.cancel();
    result
}
