//! HTTP-level tests for `StorefrontClient` against a mock backend.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use boletera_api::{
    ApiError, ReceiptUpload, ReservationRequest, Session, StorefrontClient, VerificationDecision,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> StorefrontClient {
    StorefrontClient::new(server.uri())
}

#[tokio::test]
async fn availability_parses_taken_and_processing_sets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raffles/7/availability/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "taken_numbers": [5, 10],
            "processing_numbers": [12],
        })))
        .mount(&server)
        .await;

    let availability = client_for(&server).availability(7).await.unwrap();

    assert_eq!(availability.taken_numbers, vec![5, 10]);
    assert_eq!(availability.processing_numbers, vec![12]);
}

#[tokio::test]
async fn html_availability_body_is_a_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raffles/7/availability/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Proxy error</body></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let error = client_for(&server).availability(7).await.unwrap_err();

    assert!(matches!(error, ApiError::MalformedResponse { .. }));
}

#[tokio::test]
async fn missing_raffle_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raffles/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    let error = client_for(&server).raffle_detail(99).await.unwrap_err();

    assert!(matches!(error, ApiError::NotFound(_)));
}

#[tokio::test]
async fn reservation_posts_payload_and_parses_ack() {
    let server = MockServer::start().await;
    let expected = json!({
        "raffle_id": 3,
        "numbers": [1, 2, 7],
        "guest_name": "Ana",
        "guest_email": "ana@example.com",
        "guest_phone": "5551234567",
    });
    Mock::given(method("POST"))
        .and(path("/purchases/"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 42,
            "status": "pending",
            "total_amount": "150.00",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ReservationRequest {
        raffle_id: 3,
        numbers: vec![1, 2, 7],
        guest_name: "Ana".to_string(),
        guest_email: "ana@example.com".to_string(),
        guest_phone: "5551234567".to_string(),
    };
    let ack = client_for(&server)
        .create_reservation(&request)
        .await
        .unwrap();

    assert_eq!(ack.id, 42);
    assert_eq!(ack.total_amount.as_deref(), Some("150.00"));
}

#[tokio::test]
async fn reservation_conflict_maps_to_numbers_in_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/purchases/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"numbers": "some numbers are en proceso"})),
        )
        .mount(&server)
        .await;

    let request = ReservationRequest {
        raffle_id: 3,
        numbers: vec![1],
        guest_name: "Ana".to_string(),
        guest_email: "ana@example.com".to_string(),
        guest_phone: "5551234567".to_string(),
    };
    let error = client_for(&server)
        .create_reservation(&request)
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::NumbersInConflict(_)));
}

#[tokio::test]
async fn phone_lookup_treats_404_as_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/purchases/"))
        .and(query_param("phone", "5551234567"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    let purchases = client_for(&server)
        .purchases_by_phone("5551234567")
        .await
        .unwrap();

    assert!(purchases.is_empty());
}

#[tokio::test]
async fn receipt_upload_sends_multipart_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/purchases/42/upload_receipt/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"detail": "receipt received"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let upload = ReceiptUpload {
        image: vec![0xFF, 0xD8, 0xFF],
        filename: "comprobante.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        phone: "5551234567".to_string(),
        numbers: vec![1, 2],
    };
    let ack = client_for(&server).upload_receipt(42, upload).await.unwrap();
    assert_eq!(ack.detail.as_deref(), Some("receipt received"));

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
}

#[tokio::test]
async fn verification_listing_carries_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/purchases/verifications/"))
        .and(query_param("status", "pending"))
        .and(header("authorization", "Bearer organizer-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "payment_id": 9,
            "purchase_id": 42,
            "customer_name": "Ana",
            "selected_numbers": [1, 2],
        }])))
        .mount(&server)
        .await;

    let session = Session::new("organizer-token".to_string());
    let items = client_for(&server)
        .pending_verifications(&session)
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].payment_id, 9);
}

#[tokio::test]
async fn stale_session_maps_to_auth_required() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/purchases/verifications/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Authentication credentials were not provided."})),
        )
        .mount(&server)
        .await;

    let session = Session::new("expired".to_string());
    let error = client_for(&server)
        .pending_verifications(&session)
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::AuthRequired));
}

#[tokio::test]
async fn verify_payment_posts_the_decision() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/purchases/verifications/9/verify/"))
        .and(body_json(&json!({"action": "approve"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "approved"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::new("organizer-token".to_string());
    let outcome = client_for(&server)
        .verify_payment(&session, 9, VerificationDecision::Approve)
        .await
        .unwrap();

    assert_eq!(outcome.status, "approved");
}
