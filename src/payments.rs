//! Thin client for the Razorpay-style payment gateway.
//!
//! The gateway does the heavy lifting; this module only creates orders and
//! verifies completed payments by fetching them back and checking status and
//! order linkage. Amounts cross the wire in minor currency units (paise).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct PaymentGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

/// Order as returned by the gateway; handed to the frontend payment widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct GatewayPayment {
    #[allow(dead_code)]
    id: String,
    order_id: Option<String>,
    status: String,
}

/// Convert a major-unit amount to the gateway's minor units.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

impl PaymentGateway {
    pub fn new(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }

    /// Create a payment order for the given amount.
    pub async fn create_order(
        &self,
        amount: f64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentOrder> {
        let url = format!("{}/v1/orders", self.base_url);
        let payload = json!({
            "amount": to_minor_units(amount),
            "currency": currency,
            "receipt": receipt,
            "payment_capture": 1,
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to payment gateway")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Payment gateway error ({}): {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse payment order response")
    }

    /// Check that a payment exists, was captured, and belongs to `order_id`.
    pub async fn verify_payment(&self, payment_id: &str, order_id: &str) -> Result<bool> {
        let url = format!("{}/v1/payments/{}", self.base_url, payment_id);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .context("Failed to send request to payment gateway")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Payment gateway error ({}): {}", status, body);
        }

        let payment: GatewayPayment = response
            .json()
            .await
            .context("Failed to parse payment response")?;

        let captured = matches!(payment.status.as_str(), "captured" | "authorized");
        Ok(captured && payment.order_id.as_deref() == Some(order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(500.0), 50000);
        assert_eq!(to_minor_units(99.99), 9999);
        assert_eq!(to_minor_units(0.0), 0);
        // Rounds instead of truncating
        assert_eq!(to_minor_units(10.005), 1001);
    }

    #[test]
    fn test_payment_order_deserialization() {
        let json = r#"{
            "id": "order_ABC123",
            "amount": 50000,
            "currency": "INR",
            "status": "created",
            "receipt": "don_42"
        }"#;

        let order: PaymentOrder = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(order.id, "order_ABC123");
        assert_eq!(order.amount, 50000);
        assert_eq!(order.currency, "INR");
        assert_eq!(order.status, "created");
    }
}
