// JSON-RPC client for the fleet telemetry API (Authenticate, Get, MultiCall)
use crate::application::telemetry_api::ApiError;
use crate::infrastructure::config::ApiSettings;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Credentials injected into every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    #[serde(skip)]
    pub server: String,
    pub database: String,
    pub user_name: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
struct AuthenticateResult {
    credentials: AuthSession,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    errors: Vec<RpcErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// One entry of a MultiCall batch
#[derive(Debug, Clone, Serialize)]
pub struct RpcCall {
    pub method: &'static str,
    pub params: Value,
}

impl RpcCall {
    pub fn get(type_name: &str, search: Value) -> Self {
        Self {
            method: "Get",
            params: json!({ "typeName": type_name, "search": search }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    session: AuthSession,
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl JsonRpcClient {
    /// Build a client from settings, authenticating unless a session id is
    /// already configured.
    pub async fn connect(settings: &ApiSettings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let session = match (&settings.session_id, &settings.password) {
            (Some(session_id), _) => AuthSession {
                server: settings.server.clone(),
                database: settings.database.clone(),
                user_name: settings.user_name.clone(),
                session_id: session_id.clone(),
            },
            (None, Some(password)) => {
                Self::authenticate(&http, &settings.server, &settings.database, &settings.user_name, password)
                    .await?
            }
            (None, None) => return Err(ApiError::NotAuthenticated),
        };

        Ok(Self { http, session })
    }

    async fn authenticate(
        http: &reqwest::Client,
        server: &str,
        database: &str,
        user_name: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        let params = json!({
            "database": database,
            "userName": user_name,
            "password": password,
        });

        let result = Self::post(http, server, "Authenticate", params)
            .await
            .map_err(|e| match e {
                ApiError::Upstream { message, .. } => ApiError::Auth(message),
                other => other,
            })?;

        let auth: AuthenticateResult = serde_json::from_value(result)
            .map_err(|e| ApiError::Decode(format!("Authenticate result: {}", e)))?;

        let server = resolve_server(server, auth.path.as_deref());
        tracing::info!("Authenticated {} on {} (database {})", user_name, server, database);

        Ok(AuthSession {
            server,
            ..auth.credentials
        })
    }

    /// Single call with session credentials injected
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, ApiError> {
        let params = with_credentials(params, &self.session);
        Self::post(&self.http, &self.session.server, method, params).await
    }

    pub async fn get(&self, type_name: &str, search: Value) -> Result<Value, ApiError> {
        let call = RpcCall::get(type_name, search);
        self.call(call.method, call.params).await
    }

    /// Batched calls; results are matched to `calls` by position
    pub async fn multi_call(&self, calls: Vec<RpcCall>) -> Result<Vec<Value>, ApiError> {
        let expected = calls.len();
        let result = self.call("MultiCall", json!({ "calls": calls })).await?;

        let results: Vec<Value> = serde_json::from_value(result)
            .map_err(|e| ApiError::Decode(format!("MultiCall result: {}", e)))?;
        if results.len() != expected {
            return Err(ApiError::Decode(format!(
                "MultiCall returned {} results for {} calls",
                results.len(),
                expected
            )));
        }
        Ok(results)
    }

    async fn post(http: &reqwest::Client, server: &str, method: &str, params: Value) -> Result<Value, ApiError> {
        let url = endpoint(server);
        tracing::debug!("RPC {} -> {}", method, url);

        let response = http
            .post(&url)
            .json(&json!({ "method": method, "params": params }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Transport(format!("HTTP {}: {}", status, body)));
        }

        let envelope: Value = response.json().await?;
        parse_envelope(envelope)
    }
}

/// RPC endpoint for a server given as a bare host or a full base URL
pub fn endpoint(server: &str) -> String {
    let server = server.trim_end_matches('/');
    if server.starts_with("http://") || server.starts_with("https://") {
        format!("{}/apiv1", server)
    } else {
        format!("https://{}/apiv1", server)
    }
}

/// Authenticate may redirect the session to another server
fn resolve_server(current: &str, path: Option<&str>) -> String {
    match path {
        Some(p) if !p.is_empty() && p != "ThisServer" => p.to_string(),
        _ => current.to_string(),
    }
}

fn with_credentials(mut params: Value, session: &AuthSession) -> Value {
    if let Value::Object(map) = &mut params {
        map.insert(
            "credentials".to_string(),
            json!({
                "database": session.database,
                "userName": session.user_name,
                "sessionId": session.session_id,
            }),
        );
    }
    params
}

/// Unwrap a response, checking `error` before trusting `result`
fn parse_envelope(envelope: Value) -> Result<Value, ApiError> {
    let envelope: RpcEnvelope =
        serde_json::from_value(envelope).map_err(|e| ApiError::Decode(e.to_string()))?;

    if let Some(error) = envelope.error {
        let detail = error.errors.first();
        let message = error
            .message
            .or_else(|| detail.and_then(|d| d.message.clone()))
            .unwrap_or_else(|| "unknown error".to_string());
        let name = error.name.or_else(|| detail.and_then(|d| d.name.clone()));
        return Err(ApiError::Upstream { message, name });
    }

    envelope
        .result
        .ok_or_else(|| ApiError::Decode("response has neither result nor error".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> AuthSession {
        AuthSession {
            server: "my.geotab.com".to_string(),
            database: "fleet_demo".to_string(),
            user_name: "ops@example.com".to_string(),
            session_id: "abc123".to_string(),
        }
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(endpoint("my.geotab.com"), "https://my.geotab.com/apiv1");
        assert_eq!(endpoint("http://localhost:9000/"), "http://localhost:9000/apiv1");
    }

    #[test]
    fn test_resolve_server() {
        assert_eq!(resolve_server("my.geotab.com", Some("ThisServer")), "my.geotab.com");
        assert_eq!(resolve_server("my.geotab.com", None), "my.geotab.com");
        assert_eq!(resolve_server("my.geotab.com", Some("my42.geotab.com")), "my42.geotab.com");
    }

    #[test]
    fn test_credentials_injected() {
        let params = with_credentials(json!({ "typeName": "Device" }), &session());
        assert_eq!(params["typeName"], "Device");
        assert_eq!(params["credentials"]["sessionId"], "abc123");
        assert_eq!(params["credentials"]["userName"], "ops@example.com");
    }

    #[test]
    fn test_error_checked_before_result() {
        let err = parse_envelope(json!({
            "result": [],
            "error": { "message": "Incorrect login credentials", "name": "InvalidUserException" }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ApiError::Upstream {
                message: "Incorrect login credentials".to_string(),
                name: Some("InvalidUserException".to_string()),
            }
        );
    }

    #[test]
    fn test_error_detail_fallback() {
        let err = parse_envelope(json!({
            "error": { "errors": [{ "message": "Diagnostic not found", "name": "ArgumentException" }] }
        }))
        .unwrap_err();
        assert!(matches!(err, ApiError::Upstream { ref message, .. } if message == "Diagnostic not found"));
    }

    #[test]
    fn test_result_unwrapped() {
        let value = parse_envelope(json!({ "jsonrpc": "2.0", "result": [{ "id": "b1" }] })).unwrap();
        assert_eq!(value[0]["id"], "b1");

        assert!(matches!(parse_envelope(json!({})), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_authenticate_result_shape() {
        let auth: AuthenticateResult = serde_json::from_value(json!({
            "credentials": { "database": "fleet_demo", "userName": "ops@example.com", "sessionId": "s1" },
            "path": "ThisServer"
        }))
        .unwrap();
        assert_eq!(auth.credentials.session_id, "s1");
        assert_eq!(auth.credentials.server, "");
        assert_eq!(auth.path.as_deref(), Some("ThisServer"));
    }

    #[test]
    fn test_multicall_serialisation() {
        let call = RpcCall::get("StatusData", json!({ "deviceSearch": { "id": "b1" } }));
        let body = json!({ "calls": vec![call] });
        assert_eq!(body["calls"][0]["method"], "Get");
        assert_eq!(body["calls"][0]["params"]["typeName"], "StatusData");
    }
}
