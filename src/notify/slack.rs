use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;

use super::{Action, Notification, Presenter};

pub struct SlackPresenter {
    webhook_url: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl SlackPresenter {
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
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

fn text_for(n: &Notification) -> String {
    let mut text = format!("*{}* {}\n{}", n.headline, n.detail_line, n.time_line);
    if let Some(loc) = &n.location {
        text.push_str(&format!(" @ {loc}"));
    }
    for a in &n.actions {
        if let Some(u) = a.url() {
            text.push_str(&format!("\n<{}|{}>", u, a.caption()));
        }
    }
    text
}

#[async_trait::async_trait]
impl Presenter for SlackPresenter {
    async fn present(&self, n: &Notification) -> Result<Option<Action>> {
        let body = serde_json::json!({ "text": text_for(n) });

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook_url)
                .timeout(self.timeout)
                .json(&body)
                .send()
                .await
                .and_then(|rsp| rsp.error_for_status());
            match res {
                Ok(_) => return Ok(None),
                Err(e) if attempt < self.max_retries => {
                    tracing::debug!(error = %e, attempt, "slack post failed, retrying");
                    tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                }
                Err(e) => return Err(anyhow!("slack webhook failed after {attempt} attempts: {e}")),
            }
        }
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_uses_slack_link_markup() {
        let n = Notification {
            headline: "Liftoff!".into(),
            time_line: "2026-11-02 15:30:00".into(),
            detail_line: "Electron (Rocket Lab) | Kinéis".into(),
            location: Some("Mahia".into()),
            actions: vec![Action::Dismiss, Action::WatchLive("https://yt.test/1".into())],
        };
        let t = text_for(&n);
        assert!(t.starts_with("*Liftoff!* Electron"));
        assert!(t.contains(" @ Mahia"));
        assert!(t.ends_with("<https://yt.test/1|Watch live>"));
    }
}
