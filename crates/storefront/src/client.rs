//! HTTP client for the background cart endpoints.
//!
//! Every request is a `POST` carrying the CSRF token. No timeout and no
//! retry are applied: a request runs until it completes or the transport
//! fails, and the user can simply click again.

use reqwest::{Client, StatusCode};
use rink_rental_core::ActionResult;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::EnhanceConfig;
use crate::cookies::CsrfToken;
use crate::error::ActionError;

/// Status and parsed body of a background request.
#[derive(Debug, Clone)]
pub struct ActionResponse {
    pub status: StatusCode,
    /// `None` if the body is not a JSON object of the expected shape.
    pub body: Option<ActionResult>,
}

/// Client for the cart endpoints.
#[derive(Debug, Clone)]
pub struct CartClient {
    client: Client,
    base_url: Url,
    csrf_header: String,
}

impl CartClient {
    /// Create a client resolving relative endpoints against `base_url`.
    #[must_use]
    pub fn new(base_url: Url, csrf_header: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            csrf_header: csrf_header.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &EnhanceConfig) -> Self {
        Self::new(config.base_url.clone(), config.csrf_header.clone())
    }

    /// Resolve `endpoint` (absolute or relative) against the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::InvalidEndpoint` if the endpoint cannot be parsed.
    pub fn resolve(&self, endpoint: &str) -> Result<Url, ActionError> {
        self.base_url
            .join(endpoint)
            .map_err(|e| ActionError::InvalidEndpoint(endpoint.to_string(), e.to_string()))
    }

    /// `POST` to `endpoint` with the token and an optional JSON payload.
    ///
    /// The token header is omitted when no token is available. A payload
    /// is sent with `Content-Type: application/json`.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Transport` if the request or body read fails,
    /// or `ActionError::InvalidEndpoint` if the endpoint cannot be resolved.
    /// An unparseable body is not an error; it yields `body: None`.
    #[instrument(skip(self, token, payload), fields(has_token = token.is_some()))]
    pub async fn post(
        &self,
        endpoint: &str,
        token: Option<&CsrfToken>,
        payload: Option<&Value>,
    ) -> Result<ActionResponse, ActionError> {
        let url = self.resolve(endpoint)?;

        let mut request = self.client.post(url);
        if let Some(token) = token {
            request = request.header(self.csrf_header.as_str(), token.expose());
        }
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Cart request failed");
            ActionError::from(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            warn!(error = %e, %status, "Failed to read cart response");
            ActionError::from(e)
        })?;

        let body = match serde_json::from_slice::<ActionResult>(&bytes) {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(error = %e, %status, "Unparseable cart response");
                None
            }
        };

        debug!(%status, parsed = body.is_some(), "Cart response received");

        Ok(ActionResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CartClient {
        CartClient::from_config(&EnhanceConfig::default())
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = client()
            .resolve("/rental/cart/remove-ajax/3/")
            .expect("relative path");
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/rental/cart/remove-ajax/3/");
    }

    #[test]
    fn test_resolve_absolute_url() {
        let url = client()
            .resolve("https://rink.example/rental/checkout-ajax/")
            .expect("absolute url");
        assert_eq!(url.as_str(), "https://rink.example/rental/checkout-ajax/");
    }

    #[test]
    fn test_resolve_invalid_endpoint() {
        let result = client().resolve("http://[::1");
        assert!(matches!(result, Err(ActionError::InvalidEndpoint(_, _))));
    }

    #[tokio::test]
    async fn test_post_to_closed_port_is_transport_error() {
        let client = CartClient::new(
            Url::parse("http://127.0.0.1:9").expect("url"),
            "X-CSRFToken",
        );
        let result = client.post("/rental/checkout-ajax/", None, None).await;
        assert!(matches!(result, Err(ActionError::Transport(_))));
    }
}
