//! Modo interactivo: órdenes de línea sobre una sesión de comparación.
mod command;

use std::io::Write;
use std::time::Duration;

use chem_core::ComparisonController;
use chemengine::{CancelFlag, FingerprintKind, RetryPolicy};
use chemview::config::{EngineChoice, CONFIG};
use chemview::{init_logging, load_engine};
use clap::Parser;
use log::{info, warn, LevelFilter};
use tokio::io::{AsyncBufReadExt, BufReader};

use command::{execute, summary, Command, HELP};

/// Visor y comparador de moléculas en la terminal.
#[derive(Debug, Parser)]
#[command(name = "chem-cli", version)]
struct Args {
    /// Motor químico: rdkit | mock
    #[arg(long)]
    engine: Option<EngineChoice>,
    /// Tipo de fingerprint inicial: morgan | morgan:<radio>:<bits> | pattern
    #[arg(long)]
    kind: Option<FingerprintKind>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    /// Reutiliza fingerprints ya calculados
    #[arg(long)]
    cache: bool,
    #[arg(long)]
    max_attempts: Option<u32>,
    #[arg(long)]
    retry_ms: Option<u64>,
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let cfg = &*CONFIG;
    if let Err(e) = init_logging(args.log_level.unwrap_or(cfg.log_level)) {
        eprintln!("{e}");
    }

    let mut options = cfg.controller_options();
    options.fingerprint_kind = args.kind.unwrap_or(options.fingerprint_kind);
    options.width = args.width.unwrap_or(options.width);
    options.height = args.height.unwrap_or(options.height);
    options.cache_fingerprints = args.cache;
    let policy = RetryPolicy::new(args.max_attempts.unwrap_or(cfg.engine.max_attempts),
                                  args.retry_ms.map(Duration::from_millis).unwrap_or(cfg.engine.retry_interval));
    let choice = args.engine.unwrap_or(cfg.engine.choice);
    info!("chem-cli: motor {choice:?}, fingerprint {}", options.fingerprint_kind);

    let cancel = CancelFlag::new();
    let load = load_engine(choice, policy, cancel.clone());
    tokio::pin!(load);
    let mut loading = true;
    let mut controller = ComparisonController::new(options);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    prompt();
    loop {
        tokio::select! {
            biased;
            state = &mut load, if loading => {
                loading = false;
                match controller.attach_engine(state) {
                    Ok(_) => println!("\nmotor listo\n{}", summary(&controller)),
                    Err(advisory) => println!("\nerror: {advisory}"),
                }
                prompt();
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("error leyendo stdin: {e}");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    prompt();
                    continue;
                }
                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(cmd) => print!("{}", ensure_newline(execute(&mut controller, cmd))),
                    Err(msg) => println!("{msg} (escriba 'help')"),
                }
                prompt();
            }
        }
    }
    cancel.cancel();
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn ensure_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
