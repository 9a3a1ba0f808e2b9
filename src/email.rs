use anyhow::{Context, Result};
use serde_json::json;

/// Client for the transactional email provider's HTTP API.
///
/// Constructed once at startup and injected into the notification workers;
/// holds no mutable state, so clones are cheap and safe.
#[derive(Debug, Clone)]
pub struct Mailer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl Mailer {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }

    /// Send an HTML email to the given recipients.
    pub async fn send(&self, subject: &str, body_html: &str, recipients: &[String]) -> Result<()> {
        let to: Vec<_> = recipients.iter().map(|r| json!({ "email": r })).collect();
        let payload = json!({
            "personalizations": [{ "to": to }],
            "from": { "email": self.from },
            "subject": subject,
            "content": [{ "type": "text/html", "value": body_html }],
        });

        let url = format!("{}/v3/mail/send", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to email provider")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Email provider error ({}): {}", status, body);
        }

        Ok(())
    }
}
