//! Órdenes de línea del modo interactivo.
use std::fmt::Write;

use chem_core::{Advisory, ComparisonController, EXAMPLES, EXAMPLE_PAIRS};
use chem_domain::StructureRecord;
use chemengine::FingerprintKind;
use chemview::view::format_score;

pub const HELP: &str = "\
Órdenes:
  ref <SMILES>        dibuja la molécula de referencia
  compare on|off      activa o desactiva el modo comparación
  cmp <SMILES>        dibuja la molécula de comparación y calcula la similitud
  kind <TIPO>         morgan | morgan:<radio>:<bits> | pattern
  clear               limpia la molécula de comparación
  examples | pairs    lista los ejemplos
  example <N>         carga el ejemplo N como referencia
  pair <N>            carga el par de ejemplo N
  show                muestra la sesión
  events              muestra el registro de eventos
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Reference(String),
    Compare(bool),
    Comparison(String),
    Kind(FingerprintKind),
    Clear,
    Examples,
    Pairs,
    Example(usize),
    Pair(usize),
    Show,
    Events,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        let index = |what: &str| rest.parse::<usize>().map_err(|_| format!("{what}: se esperaba un número, no '{rest}'"));
        match word {
            "ref" => Ok(Command::Reference(rest.to_string())),
            "cmp" => Ok(Command::Comparison(rest.to_string())),
            "compare" => match rest {
                "on" => Ok(Command::Compare(true)),
                "off" => Ok(Command::Compare(false)),
                other => Err(format!("compare: se esperaba on|off, no '{other}'")),
            },
            "kind" => rest.parse().map(Command::Kind),
            "clear" => Ok(Command::Clear),
            "examples" => Ok(Command::Examples),
            "pairs" => Ok(Command::Pairs),
            "example" => index("example").map(Command::Example),
            "pair" => index("pair").map(Command::Pair),
            "show" => Ok(Command::Show),
            "events" => Ok(Command::Events),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "" => Err("orden vacía".to_string()),
            other => Err(format!("orden desconocida: {other}")),
        }
    }
}

/// Ejecuta la orden y devuelve el texto a mostrar.
pub fn execute(controller: &mut ComparisonController, command: Command) -> String {
    let outcome = match command {
        Command::Reference(smiles) => controller.submit_reference(&smiles),
        Command::Compare(true) => controller.open_comparison(),
        Command::Compare(false) => controller.close_comparison(),
        Command::Comparison(smiles) => controller.submit_comparison(&smiles),
        Command::Kind(kind) => controller.set_fingerprint_kind(kind),
        Command::Clear => controller.clear_comparison(),
        Command::Example(i) => controller.load_example(i),
        Command::Pair(i) => controller.load_example_pair(i),
        Command::Examples => return list_examples(),
        Command::Pairs => return list_pairs(),
        Command::Show => return summary(controller),
        Command::Events => return events(controller),
        Command::Help => return HELP.to_string(),
        Command::Quit => return String::new(),
    };
    match outcome {
        Ok(_) => summary(controller),
        Err(advisory) => format_advisory(&advisory),
    }
}

fn format_advisory(advisory: &Advisory) -> String {
    if advisory.is_terminal() {
        format!("error: {advisory} (reinicie para reintentar)")
    } else {
        format!("aviso: {advisory}")
    }
}

fn list_examples() -> String {
    let mut out = String::new();
    for (i, e) in EXAMPLES.iter().enumerate() {
        let _ = writeln!(out, "{i}. {} ({})", e.name, e.smiles);
    }
    out
}

fn list_pairs() -> String {
    let mut out = String::new();
    for (i, p) in EXAMPLE_PAIRS.iter().enumerate() {
        let _ = writeln!(out, "{i}. {} [{}]", p.name, p.expected);
    }
    out
}

fn record_lines(out: &mut String, title: &str, record: Option<&StructureRecord>) {
    let Some(record) = record else {
        let _ = writeln!(out, "{title}: -");
        return;
    };
    let _ = writeln!(out, "{title}: {}", record.canonical_smiles());
    for (descriptor, value) in record.descriptors().iter() {
        let _ = writeln!(out, "  {}: {value}", descriptor.label());
    }
}

pub fn summary(controller: &ComparisonController) -> String {
    let session = controller.session();
    let mut out = String::new();
    if !controller.engine_ready() {
        out.push_str("motor: cargando\n");
    }
    let _ = writeln!(out, "estado: {}", session.state());
    record_lines(&mut out, "referencia", session.reference());
    if session.state().comparison_mode() {
        record_lines(&mut out, "comparación", session.comparison());
        match session.similarity() {
            Some(sim) => {
                let _ = writeln!(out, "similitud: {} ({})", format_score(sim.score), sim.kind);
            }
            None => {
                let _ = writeln!(out, "fingerprint: {}", session.fingerprint_kind());
            }
        }
    }
    if let Some(advisory) = session.advisory() {
        let _ = writeln!(out, "{}", format_advisory(advisory));
    }
    out
}

fn events(controller: &ComparisonController) -> String {
    let mut out = String::new();
    for event in controller.events() {
        let kind = serde_json::to_string(&event.kind).unwrap_or_else(|_| format!("{:?}", event.kind));
        let _ = writeln!(out, "#{} {} {kind}", event.seq, event.ts.format("%H:%M:%S%.3f"));
    }
    out
}
