use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{ProbeError, Result};
use crate::types::*;

fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Async client for the design service HTTP API.
///
/// Covers the four calls a smoke test needs: create a session, post a
/// message, list artifacts, list messages. Every call fails fast: a
/// non-success status or transport error is returned as-is, never retried.
///
/// # Example
/// ```no_run
/// use tailor_probe::DesignClient;
///
/// # async fn example() -> tailor_probe::Result<()> {
/// let client = DesignClient::new("http://localhost:3000");
/// let session = client.create_session("simple geometric pattern").await?;
/// let artifacts = client.artifacts(&session.id).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DesignClient {
    http: Client,
    endpoint: String,
    request_timeout: Duration,
}

impl DesignClient {
    /// Create a new client pointing at the given service endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: normalize(endpoint.into()),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Use a custom `reqwest::Client` (for connection pooling, proxies, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Bound every individual request. Polling cannot interrupt a call in
    /// flight, so this is the only limit on a hung request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Browser link for a session's design page.
    pub fn design_url(&self, session_id: &str) -> String {
        format!("{}/design/{}", self.endpoint, session_id)
    }

    // ── Sessions ────────────────────────────────────────────────────

    /// Create a new design session. Returns the created session.
    pub async fn create_session(&self, vibe_description: &str) -> Result<Session> {
        let url = format!("{}/api/sessions", self.endpoint);
        let body = CreateSessionRequest { vibe_description };
        let resp = self.send(self.http.post(&url).json(&body), "create session").await?;
        decode(resp, "create session").await
    }

    // ── Messages ────────────────────────────────────────────────────

    /// Post a message to a session on behalf of `author_name`.
    pub async fn send_message(
        &self,
        session_id: &str,
        content: &str,
        author_name: &str,
    ) -> Result<Message> {
        let url = format!("{}/api/sessions/{}/messages", self.endpoint, session_id);
        let body = SendMessageRequest {
            content,
            author_name,
        };
        let resp = self.send(self.http.post(&url).json(&body), "send message").await?;
        decode(resp, "send message").await
    }

    /// List the conversation for a session, in server order.
    pub async fn messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let url = format!("{}/api/sessions/{}/messages", self.endpoint, session_id);
        let resp = self.send(self.http.get(&url), "list messages").await?;
        decode(resp, "list messages").await
    }

    // ── Artifacts ───────────────────────────────────────────────────

    /// List artifacts for a session, newest first.
    pub async fn artifacts(&self, session_id: &str) -> Result<Vec<Artifact>> {
        let url = format!("{}/api/sessions/{}/artifacts", self.endpoint, session_id);
        let resp = self.send(self.http.get(&url), "list artifacts").await?;
        decode(resp, "list artifacts").await
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
        let resp = req
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProbeError::Connect {
                        endpoint: self.endpoint.clone(),
                        source: e,
                    }
                } else {
                    ProbeError::Network {
                        context: format!("Failed to {} at {}", what, self.endpoint),
                        source: e,
                    }
                }
            })?;

        tracing::debug!(url = %resp.url(), status = resp.status().as_u16(), "{}", what);

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProbeError::Http { status, body });
        }
        Ok(resp)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    let bytes = resp.bytes().await.map_err(|e| ProbeError::Network {
        context: format!("Failed to read {} response", what),
        source: e,
    })?;
    let parsed = serde_json::from_slice(&bytes).inspect_err(|e| {
        tracing::debug!(error = %e, "unexpected {} response body", what);
    })?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize("http://localhost:3000/".into()), "http://localhost:3000");
        assert_eq!(normalize("http://localhost:3000".into()), "http://localhost:3000");
        assert_eq!(normalize("http://host:3000///".into()), "http://host:3000");
    }

    #[test]
    fn test_design_url() {
        let client = DesignClient::new("http://localhost:3000/");
        assert_eq!(client.endpoint(), "http://localhost:3000");
        assert_eq!(client.design_url("s-1"), "http://localhost:3000/design/s-1");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_connect_error() {
        // Grab a free port, then close it so nothing is listening.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let endpoint = format!("http://127.0.0.1:{port}");
        let client = DesignClient::new(endpoint.clone())
            .with_request_timeout(Duration::from_secs(2));
        let err = client.artifacts("s-1").await.unwrap_err();
        assert!(err.is_connect(), "expected connect error, got {err:?}");
        assert!(err.to_string().contains(&format!("Could not connect to {endpoint}")));
    }
}
