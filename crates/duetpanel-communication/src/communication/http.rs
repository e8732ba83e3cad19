//! reqwest-backed transport

use super::{Method, Payload, Request, Transport};
use async_trait::async_trait;
use duetpanel_core::TransportError;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Controller base URL, e.g. `http://192.168.1.50`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Accept self-signed controller certificates
    pub accept_invalid_certs: bool,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            timeout: Duration::from_secs(5),
            accept_invalid_certs: false,
        }
    }
}

/// Transport over the controller's HTTP API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport with its own connection pool
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| TransportError::Network {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: Request) -> Result<Payload, TransportError> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "text/plain").body(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::debug!("Network or SSL error, unable to reach {}: {}", url, e);
            TransportError::Network {
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Network response was not ok. Status: {}", status.as_u16());
            return Err(TransportError::Http {
                status: status.as_u16(),
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));

        if is_json {
            response
                .json::<serde_json::Value>()
                .await
                .map(Payload::Json)
                .map_err(|e| TransportError::Decode {
                    reason: e.to_string(),
                })
        } else {
            response
                .text()
                .await
                .map(Payload::Text)
                .map_err(|e| TransportError::Decode {
                    reason: e.to_string(),
                })
        }
    }
}
