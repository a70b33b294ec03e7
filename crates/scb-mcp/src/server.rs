// SCB MCP - Statistics Sweden Model Context Protocol bridge
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! MCP Server implementation.

use crate::client::{HttpStatisticsApi, StatisticsApi, DEFAULT_BASE_URL, DEFAULT_POST_THRESHOLD};
use crate::error::{McpError, McpResult};
use crate::protocol::*;
use crate::service::{ScbService, ServiceSettings};
use crate::tools::{execute_tool, get_tools, into_tool_result};
use crate::{SERVER_NAME, VERSION};
use scb_core::rate::{DEFAULT_MAX_CALLS, DEFAULT_WINDOW_SECS};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader as AsyncBufReader};
use tracing::{debug, info, warn};

const INSTRUCTIONS: &str = "Tools for Statistics Sweden (SCB) open data. Typical flow: scb_search_tables -> scb_get_table_metadata -> scb_validate_selection -> scb_get_table_data. Selections accept codes, labels and common Swedish or English names.";

/// MCP Server configuration.
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    /// Server name reported in protocol handshake.
    pub name: String,

    /// Server version reported in protocol handshake.
    pub version: String,

    /// Base URL of the PxWebApi 2.0 endpoint.
    pub base_url: String,

    /// Per-request timeout for upstream calls.
    pub timeout: Duration,

    /// Language used when a tool call does not name one (`en` or `sv`).
    pub language: String,

    /// Call quota used until the upstream reports its own.
    pub fallback_max_calls: u32,
    pub fallback_window_secs: u64,

    /// Encoded query length above which data requests are sent as POST.
    pub post_threshold: usize,

    /// Table whose region dimension backs the region tools.
    pub region_table: String,

    /// Region dimension code in `region_table`. Detected when unset.
    pub region_dimension: Option<String>,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: VERSION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            language: "en".to_string(),
            fallback_max_calls: DEFAULT_MAX_CALLS,
            fallback_window_secs: DEFAULT_WINDOW_SECS,
            post_threshold: DEFAULT_POST_THRESHOLD,
            region_table: "TAB638".to_string(),
            region_dimension: None,
        }
    }
}

impl McpServerConfig {
    fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            language: self.language.clone(),
            fallback_max_calls: self.fallback_max_calls,
            fallback_window_secs: self.fallback_window_secs,
            region_table: self.region_table.clone(),
            region_dimension: self.region_dimension.clone(),
        }
    }
}

/// SCB MCP Server.
///
/// Speaks JSON-RPC 2.0 over stdio and dispatches `tools/call` requests to
/// the statistics tools. All tools share one [`ScbService`], and with it
/// one rate governor.
pub struct McpServer {
    config: McpServerConfig,

    /// Set by `initialize`, cleared by `shutdown`.
    initialized: bool,

    service: ScbService,
}

impl McpServer {
    /// Create a server talking to the upstream over HTTP.
    ///
    /// # Examples
    ///
    /// ```
    /// use scb_mcp::{McpServer, McpServerConfig};
    /// use std::time::Duration;
    ///
    /// let config = McpServerConfig {
    ///     timeout: Duration::from_secs(10),
    ///     language: "sv".to_string(),
    ///     ..Default::default()
    /// };
    /// let server = McpServer::new(config).unwrap();
    /// assert!(!server.is_initialized());
    /// ```
    pub fn new(config: McpServerConfig) -> McpResult<Self> {
        let api = HttpStatisticsApi::new(&config.base_url, config.timeout)?
            .with_post_threshold(config.post_threshold);
        Ok(Self::with_api(config, Arc::new(api)))
    }

    /// Create a server over any [`StatisticsApi`] implementation.
    pub fn with_api(config: McpServerConfig, api: Arc<dyn StatisticsApi>) -> Self {
        let service = ScbService::new(api, config.service_settings());
        Self {
            config,
            initialized: false,
            service,
        }
    }

    pub fn config(&self) -> &McpServerConfig {
        &self.config
    }

    pub fn service(&self) -> &ScbService {
        &self.service
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the server on stdin/stdout until stdin closes.
    ///
    /// One JSON-RPC message per line in each direction. Notifications get
    /// no reply.
    pub async fn run_stdio(&mut self) -> McpResult<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = AsyncBufReader::new(stdin);

        info!("SCB MCP Server starting on stdio");

        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                break;
            }
            if let Some(response) = self.handle_line(line.trim()).await {
                write_response(&mut stdout, &response).await?;
            }
        }

        info!("stdin closed, SCB MCP Server stopping");
        Ok(())
    }

    /// Handle one raw input line. Returns `None` for blank lines and
    /// notifications.
    pub async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        if line.is_empty() {
            return None;
        }
        debug!("Received: {}", line);

        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) if request.is_notification() => {
                self.handle_notification(&request);
                None
            }
            Ok(request) => Some(self.handle_request(request).await),
            Err(e) => Some(JsonRpcResponse::error(
                None,
                -32700,
                format!("Parse error: {}", e),
                None,
            )),
        }
    }

    /// Handle a JSON-RPC request.
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "initialized" | "notifications/initialized" => JsonRpcResponse::success(id, json!({})),
            "shutdown" => self.handle_shutdown(id),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "ping" => JsonRpcResponse::success(id, json!({})),
            method => {
                warn!("Unknown method: {}", method);
                JsonRpcResponse::error(id, -32601, format!("Method not found: {}", method), None)
            }
        }
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "initialized" | "notifications/initialized" => {
                info!("Client sent initialized notification")
            }
            method => debug!("Ignoring notification: {}", method),
        }
    }

    fn handle_initialize(&mut self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params = match params.map(serde_json::from_value::<InitializeParams>) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::from_error(
                    id,
                    &McpError::InvalidArguments(format!("Invalid params: {}", e)),
                );
            }
            None => {
                return JsonRpcResponse::from_error(
                    id,
                    &McpError::InvalidArguments("Missing params".to_string()),
                );
            }
        };

        if params.protocol_version != PROTOCOL_VERSION {
            debug!(
                "Client asked for protocol {}, answering with {}",
                params.protocol_version, PROTOCOL_VERSION
            );
        }

        self.initialized = true;
        info!(
            "Server initialized for {} {}",
            params.client_info.name, params.client_info.version
        );

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
            },
            server_info: ServerInfo {
                name: self.config.name.clone(),
                version: self.config.version.clone(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        JsonRpcResponse::from_result(id, &result)
    }

    fn handle_shutdown(&mut self, id: Option<Value>) -> JsonRpcResponse {
        info!("Server shutting down");
        self.initialized = false;
        JsonRpcResponse::success(id, json!({}))
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::from_result(id, &ListToolsResult { tools: get_tools() })
    }

    /// Tool failures are answered as successful responses whose result has
    /// `isError` set. Only malformed `tools/call` params are protocol errors.
    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params = match params.map(serde_json::from_value::<CallToolParams>) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::from_error(
                    id,
                    &McpError::InvalidArguments(format!("Invalid params: {}", e)),
                );
            }
            None => {
                return JsonRpcResponse::from_error(
                    id,
                    &McpError::InvalidArguments("Missing params".to_string()),
                );
            }
        };

        debug!("Calling tool {}", params.name);
        let outcome = execute_tool(&params.name, params.arguments, &self.service).await;
        let result = into_tool_result(&params.name, outcome);
        JsonRpcResponse::from_result(id, &result)
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    out: &mut W,
    response: &JsonRpcResponse,
) -> McpResult<()> {
    let text = serde_json::to_string(response)?;
    debug!("Sending: {}", text);
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = McpServerConfig::default();
        assert_eq!(config.name, "scb-mcp");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.fallback_max_calls, 30);
        assert_eq!(config.fallback_window_secs, 10);
        assert_eq!(config.post_threshold, 2000);
        assert_eq!(config.region_table, "TAB638");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = McpServerConfig {
            base_url: "::not a url::".to_string(),
            ..Default::default()
        };
        let err = McpServer::new(config).err().unwrap();
        assert_eq!(err.kind(), "TransportError");
    }

    #[tokio::test]
    async fn test_parse_error_and_blank_lines() {
        let mut server = McpServer::new(McpServerConfig::default()).unwrap();
        assert!(server.handle_line("").await.is_none());

        let response = server.handle_line("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let mut server = McpServer::new(McpServerConfig::default()).unwrap();
        let reply = server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mut server = McpServer::new(McpServerConfig::default()).unwrap();
        let response = server
            .handle_request(JsonRpcRequest::new(1, "resources/list", None))
            .await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_tools_call_without_params() {
        let mut server = McpServer::new(McpServerConfig::default()).unwrap();
        let response = server
            .handle_request(JsonRpcRequest::new(2, "tools/call", None))
            .await;
        assert_eq!(response.error.unwrap().code, -32602);
    }
}
