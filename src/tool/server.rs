//! Servidor de la herramienta sobre un flujo de líneas.
//!
//! Cada línea de entrada es un mensaje JSON-RPC; cada respuesta se escribe
//! en una línea. La carga del motor corre en paralelo con la lectura: las
//! invocaciones que llegan antes de que termine quedan diferidas en el
//! controlador.
use std::future::Future;

use chem_core::ComparisonController;
use chemengine::LoadState;
use log::{debug, info, warn};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::protocol::{Request, Response, RpcError, INVALID_REQUEST, JSONRPC_VERSION, PARSE_ERROR};
use super::{show_molecule, tool_descriptor, viewer_descriptor, ShowMoleculeInput, TOOL_NAME, VIEWER_MIME, VIEWER_URI};
use crate::errors::CoreError;
use crate::view;

pub const PROTOCOL_VERSION: &str = "2025-06-18";

pub struct ToolServer {
    controller: ComparisonController,
    initialized: bool,
}

impl ToolServer {
    pub fn new(controller: ComparisonController) -> Self {
        Self { controller, initialized: false }
    }

    pub fn controller(&self) -> &ComparisonController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ComparisonController {
        &mut self.controller
    }

    /// `true` tras recibir `notifications/initialized`.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Atiende mensajes hasta fin de entrada. `load` es la carga del motor;
    /// su resultado se entrega al controlador en cuanto está disponible.
    pub async fn serve<R, W, F>(&mut self, reader: R, mut writer: W, load: F) -> Result<(), CoreError>
        where R: AsyncBufRead + Unpin,
              W: AsyncWrite + Unpin,
              F: Future<Output = LoadState>
    {
        tokio::pin!(load);
        let mut lines = reader.lines();
        let mut loading = true;
        loop {
            tokio::select! {
                biased;
                state = &mut load, if loading => {
                    loading = false;
                    match self.controller.attach_engine(state) {
                        Ok(s) => info!("motor adjuntado; estado {s}"),
                        Err(advisory) => warn!("{advisory}"),
                    }
                }
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if let Some(out) = self.handle_line(&line)? {
                        writer.write_all(out.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;
                    }
                }
            }
        }
        debug!("fin de la entrada; servidor detenido");
        Ok(())
    }

    /// Procesa una línea cruda. Devuelve la respuesta serializada, si la hay.
    pub fn handle_line(&mut self, line: &str) -> Result<Option<String>, CoreError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let response = match serde_json::from_str::<Value>(line) {
            Err(e) => Some(Response::failure(Value::Null, RpcError::new(PARSE_ERROR, e.to_string()))),
            Ok(value) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<Request>(value) {
                    Ok(request) => self.handle(request),
                    Err(e) => Some(Response::failure(id, RpcError::new(INVALID_REQUEST, e.to_string()))),
                }
            }
        };
        response.map(|r| serde_json::to_string(&r)).transpose().map_err(CoreError::from)
    }

    /// Despacha una petición. Las notificaciones no producen respuesta.
    pub fn handle(&mut self, request: Request) -> Option<Response> {
        if request.jsonrpc != JSONRPC_VERSION {
            return request.id
                          .map(|id| Response::failure(id, RpcError::new(INVALID_REQUEST, format!("versión jsonrpc no soportada: {}", request.jsonrpc))));
        }
        let Some(id) = request.id else {
            self.handle_notification(&request.method);
            return None;
        };
        debug!("petición {}", request.method);
        let result = match request.method.as_str() {
            "initialize" => Ok(self.initialize(request.params.as_ref())),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": [tool_descriptor()] })),
            "tools/call" => self.call_tool(request.params),
            "resources/list" => Ok(json!({ "resources": [viewer_descriptor()] })),
            "resources/read" => self.read_resource(request.params.as_ref()),
            other => Err(RpcError::method_not_found(other)),
        };
        Some(match result {
                 Ok(value) => Response::success(id, value),
                 Err(error) => Response::failure(id, error),
             })
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "notifications/initialized" => {
                self.initialized = true;
                info!("cliente inicializado");
            }
            other => debug!("notificación ignorada: {other}"),
        }
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let version = params.and_then(|p| p.get("protocolVersion"))
                            .and_then(Value::as_str)
                            .unwrap_or(PROTOCOL_VERSION);
        json!({
            "protocolVersion": version,
            "capabilities": { "tools": {}, "resources": {} },
            "serverInfo": { "name": "chemview", "version": env!("CARGO_PKG_VERSION") }
        })
    }

    fn call_tool(&mut self, params: Option<Value>) -> Result<Value, RpcError> {
        let params = params.ok_or_else(|| RpcError::invalid_params("faltan parámetros"))?;
        let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
        if name != TOOL_NAME {
            return Err(RpcError::invalid_params(format!("herramienta desconocida: {name}")));
        }
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        let input: ShowMoleculeInput =
            serde_json::from_value(arguments).map_err(|e| RpcError::invalid_params(format!("argumentos inválidos: {e}")))?;
        let output = show_molecule(input);

        match self.controller.submit_reference(&output.smiles) {
            Ok(state) => debug!("{TOOL_NAME}: estado {state}"),
            Err(advisory) => warn!("{TOOL_NAME}: {advisory}"),
        }
        Ok(json!({
            "content": [{ "type": "text", "text": json!({ "smiles": &output.smiles }).to_string() }],
            "structuredContent": { "smiles": output.smiles },
            "isError": false
        }))
    }

    fn read_resource(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let uri = params.and_then(|p| p.get("uri"))
                        .and_then(Value::as_str)
                        .ok_or_else(|| RpcError::invalid_params("falta 'uri'"))?;
        if uri != VIEWER_URI {
            return Err(RpcError::invalid_params(format!("recurso desconocido: {uri}")));
        }
        let html = view::render_html(self.controller.session(), self.controller.engine_ready());
        Ok(json!({ "contents": [{ "uri": VIEWER_URI, "mimeType": VIEWER_MIME, "text": html }] }))
    }
}
