//! Invoice backend collaborators
//!
//! ```text
//! GET  {base}/api/invoices/{number}   -> InvoiceRecord
//! POST {base}/api/auth/pin            -> PinCheckResponse
//! PUT  {base}/api/invoices/{number}   -> SaveReceipt
//! ```

use crate::{ClientConfig, ClientError, ClientResult, HttpClient};
use async_trait::async_trait;
use invoice_engine::{CollaboratorError, InvoiceSource, PinValidator, SubmissionSink};
use serde::{Deserialize, Serialize};
use shared::error::ErrorCode;
use shared::invoice::{Authorizer, InvoiceRecord, PinOutcome, SaveReceipt, SaveSubmission};

/// Body of the PIN check; never logged
#[derive(Serialize, Deserialize)]
pub struct PinCheckRequest {
    pub pin: String,
}

impl std::fmt::Debug for PinCheckRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinCheckRequest").field("pin", &"***").finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PinCheckResponse {
    pub valid: bool,
    #[serde(default)]
    pub authorizer_id: Option<i64>,
    #[serde(default)]
    pub authorizer_name: Option<String>,
}

impl From<PinCheckResponse> for PinOutcome {
    fn from(response: PinCheckResponse) -> Self {
        if response.valid {
            PinOutcome::Authorized(Authorizer {
                id: response.authorizer_id,
                name: response.authorizer_name,
            })
        } else {
            PinOutcome::Rejected
        }
    }
}

/// Implements all three boundary collaborators over one HTTP client
#[derive(Debug, Clone)]
pub struct InvoiceApiClient {
    http: HttpClient,
}

impl InvoiceApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub async fn get_invoice(&self, invoice_number: &str) -> ClientResult<InvoiceRecord> {
        self.http.get(&["api", "invoices", invoice_number]).await
    }

    /// One PIN check; a server-side "invalid PIN" error counts as a rejection
    pub async fn check_pin(&self, pin: &str) -> ClientResult<PinOutcome> {
        let request = PinCheckRequest {
            pin: pin.to_string(),
        };
        match self
            .http
            .post::<PinCheckResponse, _>(&["api", "auth", "pin"], &request)
            .await
        {
            Ok(response) => Ok(response.into()),
            Err(ClientError::Api(app)) if app.code == ErrorCode::InvalidPin => {
                Ok(PinOutcome::Rejected)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn put_invoice(
        &self,
        invoice_number: &str,
        submission: &SaveSubmission,
    ) -> ClientResult<SaveReceipt> {
        self.http
            .put(&["api", "invoices", invoice_number], submission)
            .await
    }
}

#[async_trait]
impl InvoiceSource for InvoiceApiClient {
    async fn fetch_invoice(&self, invoice_number: &str) -> Result<InvoiceRecord, CollaboratorError> {
        let record = self.get_invoice(invoice_number).await?;
        tracing::debug!(
            invoice_number = %record.invoice_number,
            lines = record.line_items.len(),
            "Invoice retrieved"
        );
        Ok(record)
    }
}

#[async_trait]
impl PinValidator for InvoiceApiClient {
    async fn validate_pin(&self, pin: &str) -> Result<PinOutcome, CollaboratorError> {
        Ok(self.check_pin(pin).await?)
    }
}

#[async_trait]
impl SubmissionSink for InvoiceApiClient {
    async fn submit(
        &self,
        invoice_number: &str,
        submission: &SaveSubmission,
    ) -> Result<SaveReceipt, CollaboratorError> {
        Ok(self.put_invoice(invoice_number, submission).await?)
    }
}
