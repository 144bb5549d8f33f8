use std::future;

use chem_core::{ComparisonController, ControllerOptions, WorkflowState};
use chemengine::{LoadState, MockEngine, SharedEngine};
use chemview::tool::ToolServer;
use serde_json::Value;
use std::sync::Arc;

fn responses(out: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(out).lines().map(|l| serde_json::from_str(l).unwrap()).collect()
}

const SESSION: &str = concat!(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
                              "\n",
                              r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                              "\n",
                              r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
                              "\n",
                              r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"show_molecule","arguments":{"smiles":"CC(=O)Oc1ccccc1C(=O)O"}}}"#,
                              "\n",
                              r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#,
                              "\n");

#[tokio::test]
async fn full_handshake_with_ready_engine() {
    let engine: SharedEngine = Arc::new(MockEngine::new());
    let mut server = ToolServer::new(ComparisonController::new(ControllerOptions::default()));
    let mut out = Vec::new();
    server.serve(SESSION.as_bytes(), &mut out, future::ready(LoadState::Ready(engine))).await.unwrap();

    let replies = responses(&out);
    // La notificación no produce respuesta
    assert_eq!(replies.len(), 4);
    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[1]["result"]["tools"][0]["name"], "show_molecule");
    assert_eq!(replies[2]["result"]["structuredContent"]["smiles"], "CC(=O)Oc1ccccc1C(=O)O");
    assert_eq!(replies[3]["result"]["resources"][0]["uri"], "ui://chemview/viewer.html");

    assert!(server.is_initialized());
    assert_eq!(server.controller().state(), WorkflowState::ReferenceRendered);
}

#[tokio::test]
async fn tool_call_while_loading_is_deferred() {
    let mut server = ToolServer::new(ComparisonController::new(ControllerOptions::default()));
    let mut out = Vec::new();
    server.serve(SESSION.as_bytes(), &mut out, future::pending::<LoadState>()).await.unwrap();

    let replies = responses(&out);
    assert_eq!(replies[2]["result"]["structuredContent"]["smiles"], "CC(=O)Oc1ccccc1C(=O)O");
    assert_eq!(server.controller().state(), WorkflowState::Idle);
    assert_eq!(server.controller().pending_reference(), Some("CC(=O)Oc1ccccc1C(=O)O"));

    let engine: SharedEngine = Arc::new(MockEngine::new());
    assert_eq!(server.controller_mut().attach_engine(LoadState::Ready(engine)), Ok(WorkflowState::ReferenceRendered));
}

#[tokio::test]
async fn failed_engine_still_answers_protocol() {
    let mut server = ToolServer::new(ComparisonController::new(ControllerOptions::default()));
    let mut out = Vec::new();
    let failed = future::ready(LoadState::Failed("sin motor".into()));
    server.serve(SESSION.as_bytes(), &mut out, failed).await.unwrap();

    assert_eq!(responses(&out).len(), 4);
    let advisory = server.controller().session().advisory().expect("aviso");
    assert!(advisory.is_terminal());
}
