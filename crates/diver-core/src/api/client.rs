//! API client for the Universal Control Plane REST API.
//!
//! `UcpClient` owns the HTTP transport, the bearer token obtained at login and
//! the typed resource calls built on top of them. Requests are issued one at
//! a time; nothing here retries.

use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info, warn};

use crate::auth::SessionData;
use crate::config::{normalize_url, ClientConfig};
use crate::models::{Account, Container, ContainerStats, ContainerUsage, Network};

use super::ApiError;

// ============================================================================
// Endpoints
// ============================================================================

const LOGIN_PATH: &str = "/auth/login";
const ACCOUNT_PATH: &str = "/id/";
const CONTAINERS_PATH: &str = "/containers/json";
const ALL_CONTAINERS_PATH: &str = "/containers/json?all=1";
const NETWORKS_PATH: &str = "/networks";
const CLIENT_BUNDLE_PATH: &str = "/api/clientbundle";

/// Login reply. Only `auth_token` matters; anything else is ignored.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    auth_token: Option<serde_json::Value>,
}

impl LoginResponse {
    fn into_token(self) -> Result<String, ApiError> {
        match self.auth_token {
            Some(serde_json::Value::String(token)) if !token.is_empty() => Ok(token),
            _ => Err(ApiError::Auth("no authorization token returned".to_string())),
        }
    }
}

/// Client for one control plane and at most one session.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct UcpClient {
    client: Client,
    url: String,
    username: String,
    ignore_cert: bool,
    token: Option<String>,
}

impl UcpClient {
    /// Create an unauthenticated client for the configured endpoint
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::build(&config.url, &config.username, config.ignore_cert, None)
    }

    /// Rebuild a client from a stored session, token already in place
    pub fn from_session(session: &SessionData) -> Result<Self, ApiError> {
        Self::build(
            &session.url,
            &session.username,
            session.ignore_cert,
            Some(session.token.clone()),
        )
    }

    fn build(
        url: &str,
        username: &str,
        ignore_cert: bool,
        token: Option<String>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(ignore_cert)
            .build()?;

        if ignore_cert {
            warn!(url = url, "TLS certificate verification is disabled");
        }

        Ok(Self {
            client,
            url: normalize_url(url),
            username: username.to_string(),
            ignore_cert,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Log in with the configured credentials and return a client holding the token
    pub async fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut client = Self::new(config)?;
        client.login(&config.username, &config.password).await?;
        Ok(client)
    }

    /// Exchange credentials for a bearer token. The token is only stored on success.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        let body = serde_json::to_vec(&serde_json::json!({
            "username": username,
            "password": password,
        }))
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        let bytes = self
            .do_request(Method::POST, LOGIN_PATH, Some(body), false)
            .await?;

        let response: LoginResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("login response: {}", e)))?;
        let token = response.into_token()?;

        self.username = username.to_string();
        self.token = Some(token);
        info!(url = %self.url, username = username, "Logged in");
        Ok(())
    }

    /// Nothing to tear down remotely; the token simply stops being used.
    pub async fn disconnect(&mut self) -> Result<(), ApiError> {
        Ok(())
    }

    /// Who the current token belongs to. A failure here means the session is no longer usable.
    pub async fn auth_status(&self) -> Result<Account, ApiError> {
        self.get(ACCOUNT_PATH).await
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Set the bearer token for authenticated requests. An empty token clears it.
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token).filter(|t| !t.is_empty());
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn ignore_cert(&self) -> bool {
        self.ignore_cert
    }

    /// Snapshot of this session for the token store
    pub fn session_data(&self) -> Result<SessionData, ApiError> {
        let token = self.token.clone().ok_or(ApiError::MissingToken)?;
        Ok(SessionData::new(
            self.url.clone(),
            token,
            self.ignore_cert,
            self.username.clone(),
        ))
    }

    // ===== Transport =====

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::Auth("session token is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Execute one request against `<url><path>` and return the raw body.
    ///
    /// With `require_auth` the bearer token is attached, and a client without
    /// a token fails with [`ApiError::MissingToken`] before anything is sent.
    /// Without it no `Authorization` header is sent at all. Any status other
    /// than 200 becomes [`ApiError::Api`] carrying the response body.
    pub async fn do_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        require_auth: bool,
    ) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}{}", self.url, path);

        let mut request = self.client.request(method.clone(), &url);
        if require_auth {
            if self.token.is_none() {
                return Err(ApiError::MissingToken);
            }
            request = request.headers(self.auth_headers()?);
        }
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        debug!(method = %method, url = %url, "Sending request");
        let response = request.send().await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if status != StatusCode::OK {
            warn!(method = %method, url = %url, status = %status, "Request failed");
            return Err(ApiError::from_status(status, &bytes));
        }

        debug!(url = %url, bytes = bytes.len(), "Response received");
        Ok(bytes.to_vec())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let bytes = self.do_request(Method::GET, path, None, true).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    // ===== Resource Operations =====

    /// All containers across every node, stopped ones included
    pub async fn list_containers(&self) -> Result<Vec<Container>, ApiError> {
        self.get(ALL_CONTAINERS_PATH).await
    }

    /// Sample CPU usage of every running container, busiest first
    pub async fn container_top(&self) -> Result<Vec<ContainerUsage>, ApiError> {
        let containers: Vec<Container> = self.get(CONTAINERS_PATH).await?;
        debug!(count = containers.len(), "Sampling running containers");

        let mut usage = Vec::with_capacity(containers.len());
        for container in &containers {
            let path = format!("/containers/{}/stats?stream=false", container.id);
            let stats: ContainerStats = self.get(&path).await?;
            usage.push(ContainerUsage::new(container, &stats));
        }

        usage.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
        Ok(usage)
    }

    pub async fn list_networks(&self) -> Result<Vec<Network>, ApiError> {
        self.get(NETWORKS_PATH).await
    }

    /// Download the client bundle archive (zip) for the logged-in user
    pub async fn client_bundle(&self) -> Result<Vec<u8>, ApiError> {
        self.do_request(Method::GET, CLIENT_BUNDLE_PATH, None, true)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("admin", "secret", "https://ucp.local/", true)
    }

    #[test]
    fn test_login_response_string_token() {
        let response: LoginResponse = serde_json::from_str(r#"{"auth_token":"abc"}"#).unwrap();
        assert_eq!(response.into_token().unwrap(), "abc");
    }

    #[test]
    fn test_login_response_missing_token() {
        let response: LoginResponse = serde_json::from_str(r#"{"other":"abc"}"#).unwrap();
        assert!(matches!(response.into_token(), Err(ApiError::Auth(_))));
    }

    #[test]
    fn test_login_response_wrong_type() {
        let response: LoginResponse = serde_json::from_str(r#"{"auth_token":42}"#).unwrap();
        assert!(matches!(response.into_token(), Err(ApiError::Auth(_))));

        let response: LoginResponse = serde_json::from_str(r#"{"auth_token":null}"#).unwrap();
        assert!(matches!(response.into_token(), Err(ApiError::Auth(_))));
    }

    #[test]
    fn test_login_response_empty_token() {
        let response: LoginResponse = serde_json::from_str(r#"{"auth_token":""}"#).unwrap();
        assert!(matches!(response.into_token(), Err(ApiError::Auth(_))));
    }

    #[test]
    fn test_new_client_has_no_token() {
        let client = UcpClient::new(&config()).unwrap();
        assert_eq!(client.token(), None);
        assert_eq!(client.url(), "https://ucp.local");
        assert!(client.ignore_cert());
        assert!(matches!(client.session_data(), Err(ApiError::MissingToken)));
    }

    #[test]
    fn test_set_token_empty_clears() {
        let mut client = UcpClient::new(&config()).unwrap();
        client.set_token("abc".to_string());
        assert_eq!(client.token(), Some("abc"));
        client.set_token(String::new());
        assert_eq!(client.token(), None);
    }

    #[test]
    fn test_auth_headers() {
        let mut client = UcpClient::new(&config()).unwrap();
        assert!(client.auth_headers().unwrap().is_empty());

        client.set_token("abc".to_string());
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn test_session_data_snapshot() {
        let mut client = UcpClient::new(&config()).unwrap();
        client.set_token("abc".to_string());
        let data = client.session_data().unwrap();
        assert_eq!(data.url, "https://ucp.local");
        assert_eq!(data.token, "abc");
        assert!(data.ignore_cert);
        assert_eq!(data.username, "admin");
    }

    #[tokio::test]
    async fn test_authenticated_request_without_token_fails_fast() {
        let client = UcpClient::new(&config()).unwrap();
        let result = client.list_networks().await;
        assert!(matches!(result, Err(ApiError::MissingToken)));
    }
}
