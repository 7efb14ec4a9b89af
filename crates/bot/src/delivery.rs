use anyhow::Result;
use kidz_dialogue::Outbound;
use serde_json::json;
use std::time::Duration;

/// Outbound delivery to the Messenger Graph API.
///
/// Sends one platform message per outbound unit, with a short pacing delay
/// between units to keep a natural reply cadence. Delivery failures are
/// logged and swallowed; a lost message never fails the webhook turn.
pub struct MessengerClient {
    http: reqwest::Client,
    api_url: String,
    page_access_token: String,
    pacing: Duration,
}

impl MessengerClient {
    pub fn new(page_access_token: String) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()?,
            api_url: std::env::var("GRAPH_API_URL")
                .unwrap_or_else(|_| "https://graph.facebook.com/v17.0".to_string()),
            page_access_token,
            pacing: Duration::from_millis(600),
        })
    }

    pub async fn deliver(&self, user_id: &str, units: &[Outbound]) {
        for (i, unit) in units.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pacing).await;
            }
            let message = match unit {
                Outbound::Text(text) => json!({ "text": text }),
                Outbound::ImageUrl(url) => json!({
                    "attachment": {
                        "type": "image",
                        "payload": { "url": url, "is_reusable": true }
                    }
                }),
            };
            if let Err(err) = self.send(user_id, message).await {
                log::error!("Delivery to {user_id} failed: {err}");
            }
        }
    }

    async fn send(&self, user_id: &str, message: serde_json::Value) -> Result<()> {
        let url = format!(
            "{}/me/messages?access_token={}",
            self.api_url, self.page_access_token
        );
        let response = self
            .http
            .post(&url)
            .json(&json!({
                "recipient": { "id": user_id },
                "message": message,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Graph API returned {status}: {body}");
        }
        Ok(())
    }
}
