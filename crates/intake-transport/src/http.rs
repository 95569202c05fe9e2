//! HTTP transport for the contract service's upload/confirm/delete endpoints.

use async_trait::async_trait;
use intake_core::{
    ConfirmBody, ConfirmEnvelope, ConfirmReceipt, ContractId, DeleteEnvelope, DeleteReceipt,
    Extraction, Pin, Record, UploadEnvelope, UploadFile,
};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::{Transport, TransportError};

/// HTTP client for the contract service.
///
/// The service endpoints sit behind a login handled elsewhere; pass the
/// resulting session cookie with [`with_session_cookie`](Self::with_session_cookie).
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl HttpTransport {
    /// Create a transport for the given service base URL.
    ///
    /// `base_url` should be like `http://localhost:5000` (no trailing slash).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session_cookie: None,
        }
    }

    /// Send `cookie` verbatim as the `Cookie` header on every request.
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    /// Use a preconfigured client (proxies, TLS roots, connect timeouts).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/contracts/{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session_cookie {
            Some(cookie) => req.header(reqwest::header::COOKIE, cookie),
            None => req,
        }
    }
}

/// Read a JSON envelope regardless of status: the service reports failures
/// as non-2xx responses whose body is still the envelope.
async fn read_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, TransportError> {
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    decode_envelope(status, &body)
}

fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, TransportError> {
    match serde_json::from_str(body) {
        Ok(envelope) => Ok(envelope),
        Err(e) if (200..300).contains(&status) => Err(TransportError::Json(e)),
        Err(_) => Err(TransportError::Server {
            status,
            body: body.to_string(),
        }),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn upload(&self, file: &UploadFile) -> Result<Extraction, TransportError> {
        let url = self.endpoint("upload");
        info!(url = %url, file = %file.file_name, bytes = file.size_bytes(), "uploading contract");

        let part = Part::bytes(file.content.clone()).file_name(file.file_name.clone());
        let form = Form::new().part("file", part);
        let resp = self
            .authorize(self.client.post(&url).multipart(form))
            .send()
            .await?;

        let envelope: UploadEnvelope = read_envelope(resp).await?;
        match envelope.into_result() {
            Ok(extraction) => {
                info!(contract_id = %extraction.contract_id, "extraction received");
                Ok(extraction)
            }
            Err(rejected) => {
                warn!(reason = %rejected, "upload rejected");
                Err(rejected.into())
            }
        }
    }

    async fn confirm(
        &self,
        contract_id: &ContractId,
        record: &Record,
        pin: &Pin,
    ) -> Result<ConfirmReceipt, TransportError> {
        let url = self.endpoint("confirm");
        info!(url = %url, contract_id = %contract_id, "confirming contract");

        let body = ConfirmBody {
            contract_id: contract_id.as_str(),
            extracted: record,
            pin: pin.as_str(),
        };
        let resp = self
            .authorize(self.client.post(&url).json(&body))
            .send()
            .await?;

        let envelope: ConfirmEnvelope = read_envelope(resp).await?;
        match envelope.into_result() {
            Ok(receipt) => {
                info!(
                    contract_id = %contract_id,
                    subscription_id = receipt.subscription_id.as_deref().unwrap_or("-"),
                    skipped = receipt.skipped,
                    "confirmation accepted"
                );
                Ok(receipt)
            }
            Err(rejected) => {
                warn!(contract_id = %contract_id, reason = %rejected, "confirmation rejected");
                Err(rejected.into())
            }
        }
    }

    async fn delete_all(&self) -> Result<DeleteReceipt, TransportError> {
        let url = self.endpoint("delete");
        info!(url = %url, "deleting all stored contracts");

        let resp = self.authorize(self.client.delete(&url)).send().await?;
        let envelope: DeleteEnvelope = read_envelope(resp).await?;
        match envelope.into_result() {
            Ok(receipt) => {
                info!("delete complete");
                Ok(receipt)
            }
            Err(rejected) => {
                warn!(reason = %rejected, "delete rejected");
                Err(rejected.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::Rejected;

    #[test]
    fn transport_trims_trailing_slash() {
        let transport = HttpTransport::new("http://localhost:5000/".into());
        assert_eq!(transport.base_url(), "http://localhost:5000");
        assert_eq!(
            transport.endpoint("confirm"),
            "http://localhost:5000/api/contracts/confirm"
        );
    }

    #[test]
    fn error_status_with_envelope_body_is_decoded() {
        let env: UploadEnvelope =
            decode_envelope(400, r#"{"error": "No file selected"}"#).unwrap();
        assert_eq!(
            env.into_result().unwrap_err(),
            Rejected("No file selected".into())
        );
    }

    #[test]
    fn unauthorized_envelope_surfaces_text() {
        let env: ConfirmEnvelope = decode_envelope(401, r#"{"error": "Unauthorized"}"#).unwrap();
        assert_eq!(env.into_result().unwrap_err().0, "Unauthorized");
    }

    #[test]
    fn non_json_error_body_is_server_error() {
        let err = decode_envelope::<DeleteEnvelope>(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, TransportError::Server { status: 502, .. }));
        assert_eq!(err.to_string(), "server returned 502: <html>Bad Gateway</html>");
    }

    #[test]
    fn non_json_success_body_is_parse_error() {
        let err = decode_envelope::<DeleteEnvelope>(200, "ok").unwrap_err();
        assert!(matches!(err, TransportError::Json(_)));
    }

    #[test]
    fn delete_success_keeps_message() {
        let env: DeleteEnvelope = decode_envelope(
            200,
            r#"{"success": true, "message": "All files deleted successfully"}"#,
        )
        .unwrap();
        assert_eq!(
            env.into_result().unwrap().message.as_deref(),
            Some("All files deleted successfully")
        );
    }
}
