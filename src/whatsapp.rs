use anyhow::{Context, Result};
use serde::Deserialize;

/// Client for the Twilio WhatsApp messages API.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

#[derive(Debug, Deserialize)]
struct MessageCreated {
    sid: String,
}

impl WhatsAppClient {
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
        }
    }

    /// Send a WhatsApp message; returns the provider's message sid.
    pub async fn send(&self, to_number: &str, body: &str) -> Result<String> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let from = format!("whatsapp:{}", self.from_number);
        let to = format!("whatsapp:{}", to_number);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("From", from.as_str()),
                ("To", to.as_str()),
                ("Body", body),
            ])
            .send()
            .await
            .context("Failed to send request to Twilio API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Twilio API error ({}): {}", status, body);
        }

        let created: MessageCreated = response
            .json()
            .await
            .context("Failed to parse Twilio response")?;

        Ok(created.sid)
    }
}
