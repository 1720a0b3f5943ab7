use super::{Action, Notification, Presenter};
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Clone)]
pub struct DiscordPresenter {
    webhook: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl DiscordPresenter {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }
}

/// Webhook body for one notification; links become markdown.
fn payload_for(n: &Notification) -> DiscordWebhookPayload {
    let mut description = format!("**{}**\n{}", n.detail_line, n.time_line);
    if let Some(loc) = &n.location {
        description.push_str(&format!("\n{loc}"));
    }
    let links: Vec<String> = n
        .actions
        .iter()
        .filter_map(|a| a.url().map(|u| format!("[{}]({})", a.caption(), u)))
        .collect();
    if !links.is_empty() {
        description.push_str(&format!("\n{}", links.join(" · ")));
    }
    DiscordWebhookPayload::embed(&n.headline, &description)
}

#[async_trait::async_trait]
impl Presenter for DiscordPresenter {
    async fn present(&self, n: &Notification) -> Result<Option<Action>> {
        let payload = payload_for(n);

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    if let Err(e) = rsp.error_for_status_ref() {
                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1)))
                                .await;
                            continue;
                        }
                        return Err(anyhow!("Discord webhook HTTP error: {e}"));
                    }
                    return Ok(None);
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(anyhow!("Discord webhook request failed: {e}"));
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}

#[derive(Serialize)]
struct DiscordEmbed {
    title: String,
    description: String,
}

#[derive(Serialize)]
struct DiscordWebhookPayload {
    content: Option<String>,
    embeds: Vec<DiscordEmbed>,
}

impl DiscordWebhookPayload {
    fn embed(title: &str, description: &str) -> Self {
        Self {
            content: None,
            embeds: vec![DiscordEmbed {
                title: title.to_string(),
                description: description.to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_headline_and_links() {
        let n = Notification {
            headline: "T-1 day.".into(),
            time_line: "2026-11-02 15:30:00".into(),
            detail_line: "Falcon 9 (SpaceX) | Crew-9".into(),
            location: Some("LC-39A".into()),
            actions: vec![
                Action::Dismiss,
                Action::MoreInfo("https://a.test/1".into()),
            ],
        };
        let v = serde_json::to_value(payload_for(&n)).unwrap();
        assert_eq!(v["embeds"][0]["title"], "T-1 day.");
        let d = v["embeds"][0]["description"].as_str().unwrap();
        assert!(d.contains("LC-39A"));
        assert!(d.contains("[More info](https://a.test/1)"));
        assert!(!d.contains("Dismiss"));
    }
}
