//! Reqwest client for the raffle backend.

use crate::error::{ApiError, classify_failure};
use crate::types::{
    Ack, Availability, PurchaseRecord, RaffleDetail, ReceiptUpload, ReservationAck,
    ReservationRequest, Session, VerificationDecision, VerificationItem, VerificationOutcome,
};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

/// HTTP client for the raffle backend REST API.
///
/// The base URL includes whatever prefix the backend mounts the API under
/// (e.g. `http://localhost:8000/api/v1`). All methods issue exactly one
/// request; retry for idempotent reads is the caller's concern so the policy
/// stays in one place.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    http: reqwest::Client,
    base_url: String,
}

impl StorefrontClient {
    /// Create a client for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    /// Create a client with a preconfigured [`reqwest::Client`]
    /// (custom timeouts, proxies, etc.).
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }

    /// Fetch raffle metadata.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`] if the raffle does not exist, plus the usual
    /// network/parse failures.
    pub async fn raffle_detail(&self, raffle_id: i64) -> Result<RaffleDetail, ApiError> {
        let url = format!("{}/raffles/{raffle_id}/", self.base_url);
        let response = self.http.get(url).send().await.map_err(network)?;
        decode(response).await
    }

    /// Fetch the taken/processing number sets for a raffle.
    ///
    /// # Errors
    ///
    /// Network failures, 5xx responses, or a body that is not JSON.
    pub async fn availability(&self, raffle_id: i64) -> Result<Availability, ApiError> {
        let url = format!("{}/raffles/{raffle_id}/availability/", self.base_url);
        let response = self.http.get(url).send().await.map_err(network)?;
        decode(response).await
    }

    /// Create a reservation holding the requested numbers.
    ///
    /// # Errors
    ///
    /// [`ApiError::NumbersInConflict`] when another client got there first,
    /// [`ApiError::Server`] for "raffle not on sale" and other rejections.
    pub async fn create_reservation(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservationAck, ApiError> {
        let url = format!("{}/purchases/", self.base_url);
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    /// Look up a guest's purchases by phone.
    ///
    /// A 404 here means "no purchases", not an error, and yields an empty
    /// list.
    ///
    /// # Errors
    ///
    /// Network failures, 5xx responses, or a body that is not JSON.
    pub async fn purchases_by_phone(&self, phone: &str) -> Result<Vec<PurchaseRecord>, ApiError> {
        let url = format!("{}/purchases/", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("phone", phone)])
            .send()
            .await
            .map_err(network)?;

        match decode(response).await {
            Err(ApiError::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Attach a payment receipt to an existing purchase (multipart).
    ///
    /// # Errors
    ///
    /// [`ApiError::NumbersInConflict`] when some covered numbers are already
    /// in process, plus the usual failures.
    pub async fn upload_receipt(
        &self,
        purchase_id: i64,
        upload: ReceiptUpload,
    ) -> Result<Ack, ApiError> {
        let url = format!("{}/purchases/{purchase_id}/upload_receipt/", self.base_url);

        let image = Part::bytes(upload.image)
            .file_name(upload.filename)
            .mime_str(&upload.content_type)
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let mut form = Form::new()
            .part("receipt_image", image)
            .text("phone", upload.phone);
        for number in upload.numbers {
            form = form.text("numbers", number.to_string());
        }

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    /// Cancel a reservation, releasing all its numbers back to the pool.
    ///
    /// # Errors
    ///
    /// [`ApiError::AuthRequired`] when the phone does not match the
    /// purchase, plus the usual failures.
    pub async fn cancel_purchase(&self, purchase_id: i64, phone: &str) -> Result<Ack, ApiError> {
        let url = format!("{}/purchases/{purchase_id}/cancel/", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "phone": phone }))
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    /// List receipts awaiting verification (organizer only).
    ///
    /// # Errors
    ///
    /// [`ApiError::AuthRequired`] when the session token is missing or
    /// expired.
    pub async fn pending_verifications(
        &self,
        session: &Session,
    ) -> Result<Vec<VerificationItem>, ApiError> {
        let url = format!("{}/purchases/verifications/", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("status", "pending")])
            .bearer_auth(session.token())
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    /// Approve or reject a submitted receipt (organizer only).
    ///
    /// # Errors
    ///
    /// [`ApiError::AuthRequired`] for a stale session,
    /// [`ApiError::NotFound`] for an unknown payment.
    pub async fn verify_payment(
        &self,
        session: &Session,
        payment_id: i64,
        decision: VerificationDecision,
    ) -> Result<VerificationOutcome, ApiError> {
        let url = format!(
            "{}/purchases/verifications/{payment_id}/verify/",
            self.base_url
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(session.token())
            .json(&serde_json::json!({ "action": decision }))
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }
}

fn network(error: reqwest::Error) -> ApiError {
    ApiError::Network(error.to_string())
}

/// Decode a response, classifying failures per the error taxonomy.
///
/// A success status with a non-JSON body is reported as
/// [`ApiError::MalformedResponse`] rather than being treated as an empty
/// result; callers must never mistake an HTML error page for "zero numbers
/// taken".
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(network)?;

    if status.is_success() {
        serde_json::from_slice(&body).map_err(|e| ApiError::MalformedResponse {
            status: status.as_u16(),
            reason: e.to_string(),
        })
    } else {
        tracing::debug!(status = status.as_u16(), "backend rejected request");
        Err(classify_failure(status.as_u16(), &body))
    }
}
