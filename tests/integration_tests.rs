//! Integration tests for the foundation backend.
//!
//! These tests exercise the external-channel clients and the notification
//! dispatcher against wiremock stubs standing in for the email, WhatsApp,
//! and payment-gateway HTTP APIs.
//!
//! NOTE: Database-backed tests live in `src/db.rs` and are `#[ignore]`d
//! unless a PostgreSQL instance is available. Nothing here needs a database.

use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use foundation_backend::email::Mailer;
use foundation_backend::notify::{NotificationEvent, Notifier};
use foundation_backend::payments::PaymentGateway;
use foundation_backend::whatsapp::WhatsAppClient;

// ==================== Test Helpers ====================

fn test_mailer(server: &MockServer) -> Mailer {
    Mailer::new(server.uri(), "test-key", "noreply@example.org")
}

fn test_whatsapp(server: &MockServer) -> WhatsAppClient {
    WhatsAppClient::new(server.uri(), "ACtest", "twilio-token", "+14155238886")
}

fn test_gateway(server: &MockServer) -> PaymentGateway {
    PaymentGateway::new(server.uri(), "rzp_test_key", "rzp_test_secret")
}

async fn wait_for_requests(server: &MockServer, count: usize) {
    for _ in 0..100 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("Timed out waiting for {} requests", count);
}

// ==================== Email Client Tests ====================

#[tokio::test]
async fn test_mailer_sends_documented_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let mailer = test_mailer(&server);
    mailer
        .send(
            "Thank you",
            "<p>Hello</p>",
            &["donor@example.org".to_string()],
        )
        .await
        .expect("send should succeed");

    let received = server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 1);

    let auth = received[0]
        .headers
        .get("authorization")
        .expect("authorization header");
    assert_eq!(auth.to_str().unwrap(), "Bearer test-key");

    let body: serde_json::Value =
        serde_json::from_slice(&received[0].body).expect("JSON body");
    assert_eq!(body["subject"], "Thank you");
    assert_eq!(body["from"]["email"], "noreply@example.org");
    assert_eq!(
        body["personalizations"][0]["to"][0]["email"],
        "donor@example.org"
    );
    assert_eq!(body["content"][0]["type"], "text/html");
    assert_eq!(body["content"][0]["value"], "<p>Hello</p>");
}

#[tokio::test]
async fn test_mailer_surfaces_provider_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad api key"))
        .mount(&server)
        .await;

    let mailer = test_mailer(&server);
    let result = mailer
        .send("Subject", "<p>Body</p>", &["a@b.cc".to_string()])
        .await;

    let err = result.expect_err("401 should be an error").to_string();
    assert!(err.contains("401"), "error was: {}", err);
}

// ==================== WhatsApp Client Tests ====================

#[tokio::test]
async fn test_whatsapp_send_returns_message_sid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/ACtest/Messages.json"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({ "sid": "SM42" })),
        )
        .mount(&server)
        .await;

    let whatsapp = test_whatsapp(&server);
    let sid = whatsapp
        .send("+919900112233", "Thank you!")
        .await
        .expect("send should succeed");
    assert_eq!(sid, "SM42");

    let received = server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 1);

    // Both numbers go over the wire with the whatsapp: prefix
    // (form-encoded, so ':' appears as %3A).
    let form = String::from_utf8(received[0].body.clone()).expect("utf8 body");
    assert!(form.contains("From=whatsapp%3A"), "form was: {}", form);
    assert!(form.contains("To=whatsapp%3A"), "form was: {}", form);
    assert!(form.contains("Body="), "form was: {}", form);
}

#[tokio::test]
async fn test_whatsapp_error_is_returned_not_panicked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/ACtest/Messages.json"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid number"))
        .mount(&server)
        .await;

    let whatsapp = test_whatsapp(&server);
    let result = whatsapp.send("not-a-number", "hi").await;

    let err = result.expect_err("400 should be an error").to_string();
    assert!(err.contains("400"), "error was: {}", err);
    assert!(err.contains("invalid number"), "error was: {}", err);
}

// ==================== Payment Gateway Tests ====================

#[tokio::test]
async fn test_create_order_converts_to_minor_units() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "order_A1",
            "amount": 250000,
            "currency": "INR",
            "status": "created",
        })))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let order = gateway
        .create_order(2500.0, "INR", "don_42")
        .await
        .expect("order creation should succeed");

    assert_eq!(order.id, "order_A1");
    assert_eq!(order.status, "created");

    let received = server.received_requests().await.unwrap_or_default();
    let body: serde_json::Value =
        serde_json::from_slice(&received[0].body).expect("JSON body");
    assert_eq!(body["amount"], 250000); // 2500.00 in paise
    assert_eq!(body["currency"], "INR");
    assert_eq!(body["receipt"], "don_42");
}

#[tokio::test]
async fn test_verify_payment_checks_status_and_order_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/payments/pay_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "pay_1",
            "order_id": "order_A1",
            "status": "captured",
        })))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);

    let matching = gateway
        .verify_payment("pay_1", "order_A1")
        .await
        .expect("verification should not fail");
    assert!(matching);

    // Same payment checked against a different order fails verification.
    let mismatched = gateway
        .verify_payment("pay_1", "order_B2")
        .await
        .expect("verification should not fail");
    assert!(!mismatched);
}

#[tokio::test]
async fn test_verify_payment_rejects_uncaptured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/payments/pay_9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "pay_9",
            "order_id": "order_A1",
            "status": "failed",
        })))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let verified = gateway
        .verify_payment("pay_9", "order_A1")
        .await
        .expect("verification should not fail");
    assert!(!verified);
}

// ==================== Dispatcher Integration Tests ====================

#[tokio::test]
async fn test_contact_event_delivers_confirmation_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let notifier = Notifier::start(test_mailer(&server), test_whatsapp(&server), 16, 2);

    notifier.dispatch(NotificationEvent::ContactReceived {
        name: "Meera".to_string(),
        email: "meera@example.org".to_string(),
    });

    wait_for_requests(&server, 1).await;
    let received = server.received_requests().await.unwrap_or_default();
    let body: serde_json::Value =
        serde_json::from_slice(&received[0].body).expect("JSON body");

    assert_eq!(body["subject"], "We received your message");
    assert_eq!(
        body["personalizations"][0]["to"][0]["email"],
        "meera@example.org"
    );
    assert!(body["content"][0]["value"]
        .as_str()
        .unwrap()
        .contains("Meera"));
}

#[tokio::test]
async fn test_donation_event_with_phone_goes_to_whatsapp_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/ACtest/Messages.json"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({ "sid": "SM7" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0) // exactly one channel per event
        .mount(&server)
        .await;

    let notifier = Notifier::start(test_mailer(&server), test_whatsapp(&server), 16, 1);

    notifier.dispatch(NotificationEvent::DonationCompleted {
        donor: "Asha".to_string(),
        email: "asha@example.org".to_string(),
        phone: Some("+919900112233".to_string()),
        amount: 2500.0,
        receipt_id: "order_A1".to_string(),
    });

    wait_for_requests(&server, 1).await;
    let received = server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 1);
    assert!(received[0].url.path().ends_with("/Messages.json"));
}

#[tokio::test]
async fn test_failed_delivery_is_contained() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(503).set_body_string("provider down"))
        .mount(&server)
        .await;

    let notifier = Notifier::start(test_mailer(&server), test_whatsapp(&server), 16, 1);

    // A failing provider must not panic a worker or block the caller; later
    // events still reach the channel.
    for _ in 0..3 {
        notifier.dispatch(NotificationEvent::NewsletterSubscribed {
            email: "reader@example.org".to_string(),
        });
    }

    wait_for_requests(&server, 3).await;
}
