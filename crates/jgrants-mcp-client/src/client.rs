// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-scoped JSON-RPC client for the intermediary server.
//!
//! The first [`McpClient::call_tool`] performs the `initialize` handshake
//! under a `tokio` mutex so concurrent callers share one session. Tool calls
//! are never retried here: a transport failure is reported as unreachable
//! and an expired session resets the state for the caller to retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use jgrants_config::model::McpConfig;
use jgrants_core::{JgrantsError, NetworkFailure};
use jgrants_security::{HttpClientSettings, build_client, network_error, validate_url};
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::message::{JsonRpcNotification, JsonRpcRequest, ToolCallResult};
use crate::session::{SessionState, mentions_session};
use crate::sse::read_envelope;

/// Header carrying the session id in both directions.
pub const SESSION_HEADER: &str = "mcp-session-id";

const ACCEPT_BOTH: &str = "application/json, text/event-stream";

/// Client for one intermediary server.
#[derive(Debug)]
pub struct McpClient {
    http: reqwest::Client,
    endpoint: Url,
    protocol_version: String,
    client_name: String,
    client_version: String,
    require_session_id: bool,
    call_timeout: Duration,
    init_timeout: Duration,
    tls_disabled: bool,
    next_id: AtomicU64,
    session: Mutex<SessionState>,
}

impl McpClient {
    pub fn new(config: &McpConfig) -> Result<Self, JgrantsError> {
        let joined = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.endpoint.trim_start_matches('/')
        );
        let endpoint = Url::parse(&joined)
            .map_err(|e| JgrantsError::Config(format!("invalid mcp endpoint `{joined}`: {e}")))?;
        if let Err(e) = validate_url(endpoint.as_str()) {
            warn!(endpoint = %endpoint, "{e}");
        }

        let call_timeout = Duration::from_secs(config.timeout_secs);
        let settings = HttpClientSettings {
            label: "mcp",
            timeout: call_timeout,
            connect_timeout: Duration::from_secs(config.init_timeout_secs),
            accept_invalid_certs: config.accept_invalid_certs,
        };

        Ok(Self {
            http: build_client(&settings)?,
            endpoint,
            protocol_version: config.protocol_version.clone(),
            client_name: config.client_name.clone(),
            client_version: config.client_version.clone(),
            require_session_id: config.require_session_id,
            call_timeout,
            init_timeout: Duration::from_secs(config.init_timeout_secs),
            tls_disabled: config.accept_invalid_certs,
            next_id: AtomicU64::new(1),
            session: Mutex::new(SessionState::Uninitialized),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn tls_verification_disabled(&self) -> bool {
        self.tls_disabled
    }

    /// Current session state. Waits for an in-flight handshake to finish.
    pub async fn session_state(&self) -> SessionState {
        self.session.lock().await.clone()
    }

    /// Performs the handshake now, replacing any existing session.
    ///
    /// Returns the session id the server issued, if any.
    pub async fn initialize(&self) -> Result<Option<String>, JgrantsError> {
        let mut state = self.session.lock().await;
        self.handshake_locked(&mut state).await
    }

    /// Invokes `name` with `arguments` and returns the tool's JSON payload.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, JgrantsError> {
        let session_id = self.ensure_session().await?;

        let request = JsonRpcRequest::new(
            self.next_id(),
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        );
        debug!(tool = name, id = %request.id, "tools/call");

        let response = self
            .post(&request, session_id.as_deref(), self.call_timeout)
            .await
            .map_err(|e| unreachable_error(name, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(self.expire(session_id, "server answered HTTP 404").await);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::BAD_REQUEST && mentions_session(&body) {
                return Err(self.expire(session_id, body.trim()).await);
            }
            return Err(JgrantsError::upstream(status.as_u16(), &body));
        }

        let envelope = match read_envelope(response, &request.id).await {
            Ok(envelope) => envelope,
            Err(JgrantsError::Network { kind, source, .. }) => {
                return Err(JgrantsError::ToolUnreachable {
                    tool: name.to_string(),
                    kind,
                    source,
                });
            }
            Err(e) => return Err(e),
        };

        if let Some(error) = envelope.error {
            if mentions_session(&error.message) {
                return Err(self.expire(session_id, &error.message).await);
            }
            return Err(JgrantsError::tool(name, error.message));
        }
        let result = envelope.result.ok_or_else(|| {
            JgrantsError::Protocol("response has neither result nor error".into())
        })?;

        tool_payload(name, result)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the ready session's id, performing the handshake first if needed.
    async fn ensure_session(&self) -> Result<Option<String>, JgrantsError> {
        let mut state = self.session.lock().await;
        if let SessionState::Ready { session_id } = &*state {
            return Ok(session_id.clone());
        }
        self.handshake_locked(&mut state).await
    }

    async fn handshake_locked(
        &self,
        state: &mut SessionState,
    ) -> Result<Option<String>, JgrantsError> {
        *state = SessionState::Initializing;
        match self.handshake().await {
            Ok(session_id) => {
                *state = SessionState::Ready {
                    session_id: session_id.clone(),
                };
                Ok(session_id)
            }
            Err(e) => {
                *state = SessionState::Uninitialized;
                Err(e)
            }
        }
    }

    async fn handshake(&self) -> Result<Option<String>, JgrantsError> {
        let request = JsonRpcRequest::new(
            self.next_id(),
            "initialize",
            json!({
                "protocolVersion": self.protocol_version,
                "capabilities": {},
                "clientInfo": {
                    "name": self.client_name,
                    "version": self.client_version,
                },
            }),
        );

        let response = self
            .post(&request, None, self.init_timeout)
            .await
            .map_err(network_error)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(JgrantsError::Session(format!(
                "initialize returned HTTP {status}"
            )));
        }

        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match read_envelope(response, &request.id).await {
            Ok(envelope) => {
                if let Some(error) = envelope.error {
                    return Err(JgrantsError::Session(format!(
                        "initialize rejected: {}",
                        error.message
                    )));
                }
            }
            // The handshake outcome is carried by the status and header.
            Err(e) => debug!("initialize response body ignored: {e}"),
        }

        if session_id.is_none() && self.require_session_id {
            return Err(JgrantsError::Session(format!(
                "server did not return the {SESSION_HEADER} header"
            )));
        }

        info!(
            endpoint = %self.endpoint,
            session = session_id.as_deref().unwrap_or("<none>"),
            "protocol session established"
        );
        self.notify_initialized(session_id.as_deref()).await;
        Ok(session_id)
    }

    /// Best-effort `notifications/initialized`.
    async fn notify_initialized(&self, session_id: Option<&str>) {
        let notification = JsonRpcNotification::new("notifications/initialized");
        match self.post(&notification, session_id, self.init_timeout).await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => warn!(status = %response.status(), "initialized notification rejected"),
            Err(e) => warn!("initialized notification failed: {e}"),
        }
    }

    /// Resets a stale session and builds the error returned to the caller.
    async fn expire(&self, stale: Option<String>, reason: &str) -> JgrantsError {
        let mut state = self.session.lock().await;
        // Another task may already have replaced the session.
        let current = state.session_id().map(str::to_string);
        if state.is_ready() && current == stale {
            *state = SessionState::Uninitialized;
        }
        warn!(reason, "protocol session invalidated");
        JgrantsError::SessionExpired(reason.to_string())
    }

    async fn post<T: Serialize>(
        &self,
        body: &T,
        session_id: Option<&str>,
        timeout: Duration,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .http
            .post(self.endpoint.clone())
            .timeout(timeout)
            .header(ACCEPT, ACCEPT_BOTH)
            .json(body);
        if let Some(id) = session_id {
            request = request.header(SESSION_HEADER, id);
        }
        request.send().await
    }
}

fn unreachable_error(tool: &str, err: reqwest::Error) -> JgrantsError {
    let kind = if err.is_timeout() {
        NetworkFailure::Timeout
    } else if err.is_connect() {
        NetworkFailure::Connect
    } else {
        NetworkFailure::Other
    };
    JgrantsError::ToolUnreachable {
        tool: tool.to_string(),
        kind,
        source: Some(Box::new(err)),
    }
}

/// Extracts the JSON payload from a `tools/call` result.
fn tool_payload(name: &str, result: Value) -> Result<Value, JgrantsError> {
    let call: ToolCallResult = serde_json::from_value(result)
        .map_err(|e| JgrantsError::parse("malformed tools/call result", e))?;

    let text = call.content.first().and_then(|item| item.text.as_deref());

    if call.is_error {
        return Err(JgrantsError::tool(
            name,
            text.unwrap_or("tool reported an error"),
        ));
    }

    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Err(JgrantsError::tool(name, "empty response"));
    };

    let payload: Value = serde_json::from_str(text).map_err(|e| JgrantsError::Tool {
        tool: name.to_string(),
        message: "tool returned text that is not JSON".to_string(),
        source: Some(Box::new(e)),
    })?;

    if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(JgrantsError::tool(name, message));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> McpConfig {
        McpConfig {
            base_url: server.uri(),
            timeout_secs: 2,
            init_timeout_secs: 2,
            ..McpConfig::default()
        }
    }

    fn init_ok(session: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header(SESSION_HEADER, session)
            .set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {"protocolVersion": "2024-11-05", "capabilities": {"tools": {}}}
            }))
    }

    fn tool_text(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": {"content": [{"type": "text", "text": text}], "isError": false}
        }))
    }

    async fn mount_handshake(server: &MockServer, session: &str, expected_inits: u64) {
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .and(body_partial_json(json!({"method": "initialize"})))
            .respond_with(init_ok(session))
            .expect(expected_inits)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "notifications/initialized"})))
            .respond_with(ResponseTemplate::new(202))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn initializes_once_and_sends_session_header() {
        let server = MockServer::start().await;
        mount_handshake(&server, "sess-1", 1).await;
        Mock::given(method("POST"))
            .and(header(SESSION_HEADER, "sess-1"))
            .and(body_partial_json(json!({
                "method": "tools/call",
                "params": {"name": "search_subsidies"}
            })))
            .respond_with(tool_text(r#"{"total_count": 0, "subsidies": []}"#))
            .expect(2)
            .mount(&server)
            .await;

        let client = McpClient::new(&config(&server)).unwrap();
        assert_eq!(client.session_state().await, SessionState::Uninitialized);

        for _ in 0..2 {
            let payload = client
                .call_tool("search_subsidies", json!({"keyword": "事業"}))
                .await
                .unwrap();
            assert_eq!(payload["total_count"], 0);
        }
        assert_eq!(
            client.session_state().await,
            SessionState::Ready {
                session_id: Some("sess-1".into())
            }
        );
    }

    #[tokio::test]
    async fn concurrent_first_calls_share_one_handshake() {
        let server = MockServer::start().await;
        mount_handshake(&server, "sess-c", 1).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(tool_text(r#"{"status": "ok"}"#))
            .expect(3)
            .mount(&server)
            .await;

        let client = McpClient::new(&config(&server)).unwrap();
        let (a, b, c) = tokio::join!(
            client.call_tool("ping", json!({})),
            client.call_tool("ping", json!({})),
            client.call_tool("ping", json!({})),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
    }

    #[tokio::test]
    async fn failed_handshake_sends_no_tool_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "initialize"})))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(tool_text("{}"))
            .expect(0)
            .mount(&server)
            .await;

        let client = McpClient::new(&config(&server)).unwrap();
        let err = client.call_tool("ping", json!({})).await.unwrap_err();
        assert!(matches!(err, JgrantsError::Session(_)), "got {err:?}");
        assert_eq!(client.session_state().await, SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn missing_session_header_when_required() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "initialize"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": {}})))
            .mount(&server)
            .await;

        let mut cfg = config(&server);
        cfg.require_session_id = true;
        let err = McpClient::new(&cfg).unwrap().initialize().await.unwrap_err();
        assert!(err.to_string().contains(SESSION_HEADER));

        cfg.require_session_id = false;
        let id = McpClient::new(&cfg).unwrap().initialize().await.unwrap();
        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn handshake_json_rpc_error_is_session_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "initialize"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "error": {"code": -32602, "message": "Unsupported protocol version"}
            })))
            .mount(&server)
            .await;
        let err = McpClient::new(&config(&server)).unwrap().initialize().await.unwrap_err();
        assert!(matches!(err, JgrantsError::Session(ref m) if m.contains("Unsupported protocol")));
    }

    #[tokio::test]
    async fn expired_session_resets_and_reinitializes() {
        let server = MockServer::start().await;
        mount_handshake(&server, "sess-x", 2).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(tool_text(r#"{"status": "ok"}"#))
            .mount(&server)
            .await;

        let client = McpClient::new(&config(&server)).unwrap();
        let err = client.call_tool("ping", json!({})).await.unwrap_err();
        assert!(matches!(err, JgrantsError::SessionExpired(_)), "got {err:?}");
        assert_eq!(client.session_state().await, SessionState::Uninitialized);

        let payload = client.call_tool("ping", json!({})).await.unwrap();
        assert_eq!(payload["status"], "ok");
    }

    #[tokio::test]
    async fn session_error_in_envelope_resets() {
        let server = MockServer::start().await;
        mount_handshake(&server, "sess-y", 1).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 2,
                "error": {"code": -32600, "message": "Session not found"}
            })))
            .mount(&server)
            .await;

        let client = McpClient::new(&config(&server)).unwrap();
        let err = client.call_tool("ping", json!({})).await.unwrap_err();
        assert!(matches!(err, JgrantsError::SessionExpired(_)), "got {err:?}");
        assert!(!client.session_state().await.is_ready());
    }

    #[tokio::test]
    async fn tool_failures_are_tool_errors() {
        let cases = vec![
            (
                json!({"content": [{"type": "text", "text": "subsidy_id is required"}], "isError": true}),
                "subsidy_id is required",
            ),
            (json!({"content": []}), "empty response"),
            (
                json!({"content": [{"type": "text", "text": "{\"error\": \"補助金が見つかりません\"}"}]}),
                "補助金が見つかりません",
            ),
        ];

        for (result, expected) in cases {
            let server = MockServer::start().await;
            mount_handshake(&server, "s", 1).await;
            Mock::given(method("POST"))
                .and(body_partial_json(json!({"method": "tools/call"})))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0", "id": 2, "result": result
                })))
                .mount(&server)
                .await;

            let client = McpClient::new(&config(&server)).unwrap();
            match client.call_tool("get_subsidy_detail", json!({})).await {
                Err(JgrantsError::Tool { tool, message, .. }) => {
                    assert_eq!(tool, "get_subsidy_detail");
                    assert_eq!(message, expected);
                }
                other => panic!("expected Tool error, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn error_envelope_is_tool_error() {
        let server = MockServer::start().await;
        mount_handshake(&server, "s", 1).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 2,
                "error": {"code": -32601, "message": "Unknown tool: nope"}
            })))
            .mount(&server)
            .await;
        let client = McpClient::new(&config(&server)).unwrap();
        let err = client.call_tool("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, JgrantsError::Tool { ref message, .. } if message == "Unknown tool: nope"));
        assert!(client.session_state().await.is_ready());
    }

    #[tokio::test]
    async fn streamed_tool_response() {
        let server = MockServer::start().await;
        mount_handshake(&server, "s", 1).await;
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"content\":[{\"type\":\"text\",\"text\":\"{\\\"status\\\":\\\"ok\\\"}\"}]}}\n\n";
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let client = McpClient::new(&config(&server)).unwrap();
        let payload = client.call_tool("ping", json!({})).await.unwrap();
        assert_eq!(payload, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn slow_tool_is_unreachable_without_retry() {
        let server = MockServer::start().await;
        mount_handshake(&server, "s", 1).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(tool_text("{}").set_delay(Duration::from_secs(5)))
            .expect(1)
            .mount(&server)
            .await;

        let mut cfg = config(&server);
        cfg.timeout_secs = 1;
        let client = McpClient::new(&cfg).unwrap();
        let err = client.call_tool("search_subsidies", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            JgrantsError::ToolUnreachable { kind: NetworkFailure::Timeout, ref tool, .. } if tool == "search_subsidies"
        ));
        assert_eq!(err.cause(), jgrants_core::FailureCause::Timeout);
    }

    #[tokio::test]
    async fn refused_handshake_reports_unreachable() {
        let cfg = McpConfig {
            base_url: "http://127.0.0.1:1".into(),
            timeout_secs: 2,
            init_timeout_secs: 2,
            ..McpConfig::default()
        };
        let client = McpClient::new(&cfg).unwrap();
        let err = client.call_tool("ping", json!({})).await.unwrap_err();
        assert!(
            matches!(err, JgrantsError::Network { kind: NetworkFailure::Connect, .. }),
            "got {err:?}"
        );
        assert_eq!(err.cause(), jgrants_core::FailureCause::Unreachable);
        assert_eq!(client.session_state().await, SessionState::Uninitialized);
    }
}
