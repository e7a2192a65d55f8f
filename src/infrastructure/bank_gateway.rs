use crate::domain::gateway::{
    AuthorizationRequest, AuthorizationResponse, GatewayError, OperationId,
};
use crate::domain::ports::BankGateway;
use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

/// Error body the bank sends with non-2xx answers. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct BankErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the bank's HTTP authorization API.
#[derive(Clone)]
pub struct HttpBankGateway {
    client: Client,
    base_url: String,
}

impl HttpBankGateway {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn operation_url(&self, operation_id: &OperationId, action: &str) -> String {
        format!("{}/payments/{}/{}", self.base_url, operation_id, action)
    }

    async fn put_operation(
        &self,
        operation_id: &OperationId,
        action: &'static str,
    ) -> Result<(), GatewayError> {
        let url = self.operation_url(operation_id, action);
        debug!("PUT {}", url);

        let response = self.client.put(&url).send().await.map_err(|e| {
            error!("Bank {} of operation {} failed: {}", action, operation_id, e);
            GatewayError::Transport(e.to_string())
        })?;

        if !response.status().is_success() {
            let err = rejection(response).await;
            error!("Bank refused {} of operation {}: {}", action, operation_id, err);
            return Err(err);
        }
        Ok(())
    }
}

/// Best-effort extraction of the bank's message from a non-2xx response.
async fn rejection(response: Response) -> GatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    GatewayError::rejected(status.as_u16(), error_message(status.as_u16(), &body))
}

fn error_message(status: u16, body: &str) -> String {
    let parsed: BankErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("unknown bank error")
                .to_string()
        })
}

#[async_trait]
impl BankGateway for HttpBankGateway {
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<OperationId, GatewayError> {
        let url = format!("{}/pay", self.base_url);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Bank payment request failed: {}", e);
                GatewayError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body: AuthorizationResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("malformed bank response: {e}")))?;
        Ok(body.operation_id)
    }

    async fn reverse(&self, operation_id: &OperationId) -> Result<(), GatewayError> {
        self.put_operation(operation_id, "reversal").await
    }

    async fn refund(&self, operation_id: &OperationId) -> Result<(), GatewayError> {
        self.put_operation(operation_id, "refund").await
    }
}
