//! HTTP client for the invoice backend API

use crate::{ApiResponse, ClientConfig, ClientError, ClientResult};
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Thin JSON client; every response is an [`ApiResponse`] envelope
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a URL from path segments; each segment is percent-encoded
    pub fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.url(segments)?;
        tracing::debug!(%url, "GET");
        let response = self.authorize(self.client.get(url)).send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<T> {
        let url = self.url(segments)?;
        tracing::debug!(%url, "POST");
        let response = self.authorize(self.client.post(url).json(body)).send().await?;
        Self::handle_response(response).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<T> {
        let url = self.url(segments)?;
        tracing::debug!(%url, "PUT");
        let response = self.authorize(self.client.put(url).json(body)).send().await?;
        Self::handle_response(response).await
    }

    /// Unwrap the response envelope
    ///
    /// Error envelopes become [`ClientError::Api`] whatever the status code;
    /// non-2xx bodies that are not envelopes fall back to the status code.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            if let Ok(envelope) = serde_json::from_slice::<ApiResponse<serde_json::Value>>(&body)
                && let Err(app) = envelope.into_result()
            {
                return Err(ClientError::Api(app));
            }
            let text = String::from_utf8_lossy(&body).into_owned();
            return Err(match status {
                StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
                StatusCode::NOT_FOUND => ClientError::NotFound(text),
                _ => ClientError::InvalidResponse(format!("{}: {}", status, text)),
            });
        }

        let envelope: ApiResponse<T> = serde_json::from_slice(&body)?;
        envelope.into_result().map_err(ClientError::Api)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpClient {
        HttpClient::new(&ClientConfig::new(base_url)).unwrap()
    }

    #[test]
    fn test_url_joins_and_encodes_segments() {
        let url = client("http://localhost:3000/").url(&["api", "invoices", "F 1/2"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/invoices/F%201%2F2");
    }

    #[test]
    fn test_url_keeps_base_path() {
        let url = client("http://host/billing").url(&["api", "auth", "pin"]).unwrap();
        assert_eq!(url.as_str(), "http://host/billing/api/auth/pin");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = client("not a url").url(&["api"]);
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
