//! Remote data gateway
//!
//! Talks to the spreadsheet-backed script endpoint. Every response is an
//! envelope `{status, data?, message?}`; anything but `status == "success"`
//! is a business error whose message is passed through verbatim.

use std::time::Duration;

use reqwest::blocking::{Client, Request, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::services::config::{AppConfig, AuthMode};
use crate::types::{CatalogEntry, PrestaError, Result, Submission, Transaction};

/// Action discriminator for the transaction listing
const ACTION_GET_TRANSACTIONS: &str = "getTransactions";

/// The script endpoint rejects CORS preflights, so JSON travels as text/plain
const SUBMIT_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

/// Fallback when the backend reports a failure without a message
const UNSPECIFIED_BACKEND_ERROR: &str = "Le serveur a refusé la requête.";

/// Data provider for catalog, submissions and history
pub trait Gateway {
    /// Available services and their default prices
    fn list_catalog(&self) -> Result<Vec<CatalogEntry>>;

    /// Record a transaction on behalf of the signed-in user
    fn submit_transaction(&self, submission: &Submission, token: &str) -> Result<()>;

    /// Full transaction history visible to the signed-in user
    fn list_transactions(&self, token: &str) -> Result<Vec<Transaction>>;
}

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
    message: Option<String>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<Option<T>> {
        if self.status == "success" {
            return Ok(self.data);
        }
        let message = self
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| UNSPECIFIED_BACKEND_ERROR.to_string());
        Err(PrestaError::Backend(message))
    }
}

/// Decode an envelope body, mapping malformed JSON to a transport error
fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|e| PrestaError::Transport(format!("JSON parse error: {}", e)))?;
    envelope.into_result()
}

fn require_token(token: &str) -> Result<&str> {
    let token = token.trim();
    if token.is_empty() {
        return Err(PrestaError::not_signed_in());
    }
    Ok(token)
}

/// HTTP implementation of [`Gateway`]
pub struct HttpGateway {
    client: Client,
    config: AppConfig,
}

impl HttpGateway {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PrestaError::Transport(format!("HTTP client error: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.config.auth_mode
    }

    fn with_auth(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        match self.config.auth_mode {
            AuthMode::Body => builder,
            AuthMode::Bearer => builder.bearer_auth(token),
        }
    }

    fn build(builder: RequestBuilder) -> Result<Request> {
        builder
            .build()
            .map_err(|e| PrestaError::Config(format!("invalid request: {}", e)))
    }

    fn catalog_request(&self) -> Result<Request> {
        Self::build(self.client.get(self.config.endpoint()?))
    }

    /// Bearer mode keeps the token out of the URL
    fn transactions_request(&self, token: &str) -> Result<Request> {
        let builder = self
            .client
            .get(self.config.stats_endpoint()?)
            .query(&[("action", ACTION_GET_TRANSACTIONS)]);
        let builder = match self.config.auth_mode {
            AuthMode::Body => builder.query(&[("token", token)]),
            AuthMode::Bearer => builder,
        };
        Self::build(self.with_auth(builder, token))
    }

    fn submit_request(&self, submission: &Submission, token: &str) -> Result<Request> {
        let body = Submission {
            token: match self.config.auth_mode {
                AuthMode::Body => Some(token.to_string()),
                AuthMode::Bearer => None,
            },
            ..submission.clone()
        };
        let json = serde_json::to_string(&body)
            .map_err(|e| PrestaError::Parse(format!("Serialization failed: {}", e)))?;

        let builder = self
            .client
            .post(self.config.endpoint()?)
            .header(CONTENT_TYPE, SUBMIT_CONTENT_TYPE)
            .body(json);
        Self::build(self.with_auth(builder, token))
    }

    /// Send a request and return the raw response body
    fn execute(&self, request: Request) -> Result<String> {
        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!(%method, host = url.host_str().unwrap_or(""), "sending request");

        let response = self.client.execute(request).map_err(|e| {
            tracing::warn!(%method, error = %e, "request failed");
            PrestaError::Transport(format!("HTTP request failed: {}", e))
        })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| PrestaError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::warn!(%method, %status, "non-success HTTP status");
            // A well-formed envelope still carries the backend's own message
            if let Err(err @ PrestaError::Backend(_)) = decode_envelope::<serde_json::Value>(&body) {
                return Err(err);
            }
            return Err(PrestaError::Transport(format!("HTTP status {}", status)));
        }

        Ok(body)
    }
}

impl Gateway for HttpGateway {
    fn list_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let request = self.catalog_request()?;
        let body = self.execute(request)?;
        let entries: Vec<CatalogEntry> = decode_envelope(&body)?.unwrap_or_default();
        tracing::debug!(count = entries.len(), "catalog loaded");
        Ok(entries)
    }

    fn submit_transaction(&self, submission: &Submission, token: &str) -> Result<()> {
        let token = require_token(token)?;
        let request = self.submit_request(submission, token)?;
        let body = self.execute(request)?;
        decode_envelope::<serde_json::Value>(&body)?;
        tracing::info!(
            prestations = submission.prestations.len(),
            invoice = %submission.invoice_number,
            "transaction recorded"
        );
        Ok(())
    }

    fn list_transactions(&self, token: &str) -> Result<Vec<Transaction>> {
        let token = require_token(token)?;
        let request = self.transactions_request(token)?;
        let body = self.execute(request)?;
        let transactions: Vec<Transaction> = decode_envelope(&body)?.unwrap_or_default();
        tracing::debug!(count = transactions.len(), "transactions loaded");
        Ok(transactions)
    }
}
