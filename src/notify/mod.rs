//! # Notifications
//! What gets shown to the user and where it goes. A [`Notification`] is the
//! rendered alert for one launch; [`Presenter`]s deliver it (console,
//! Discord, Slack) and [`PresenterMux`] fans it out without ever letting a
//! delivery failure reach the scheduler.

pub mod antiflutter;
pub mod console;
pub mod discord;
pub mod slack;

use anyhow::{bail, Result};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::countdown::format_local_time;
use crate::launch::CanonicalLaunch;

pub use antiflutter::FiredLedger;
pub use console::ConsolePresenter;
pub use discord::DiscordPresenter;
pub use slack::SlackPresenter;

/// Buttons offered with a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "url")]
pub enum Action {
    Dismiss,
    MoreInfo(String),
    WatchLive(String),
}

impl Action {
    pub fn caption(&self) -> &'static str {
        match self {
            Action::Dismiss => "Dismiss",
            Action::MoreInfo(_) => "More info",
            Action::WatchLive(_) => "Watch live",
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Action::Dismiss => None,
            Action::MoreInfo(u) | Action::WatchLive(u) => Some(u),
        }
    }
}

/// A rendered launch alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// `T-1 hour.`, `Liftoff!`, ...
    pub headline: String,
    /// Local liftoff time.
    pub time_line: String,
    /// `<rocket> (<provider>) | <mission>`
    pub detail_line: String,
    pub location: Option<String>,
    pub actions: Vec<Action>,
}

impl Notification {
    pub fn for_launch(launch: &CanonicalLaunch, headline: impl Into<String>) -> Self {
        let time_line = match launch.launch_time.known() {
            Some(t) => format_local_time(t),
            None => "Time not yet known".to_string(),
        };

        let mut actions = vec![Action::Dismiss];
        if let Some(link) = &launch.detail_link {
            actions.push(Action::MoreInfo(link.clone()));
        }
        if let Some(link) = &launch.live_link {
            actions.push(Action::WatchLive(link.clone()));
        }

        Self {
            headline: headline.into(),
            time_line,
            detail_line: launch.summary(),
            location: launch.location.clone(),
            actions,
        }
    }

    pub fn live_link(&self) -> Option<&str> {
        self.actions.iter().find_map(|a| match a {
            Action::WatchLive(u) => Some(u.as_str()),
            _ => None,
        })
    }
}

/// Somewhere a notification can be shown.
///
/// Returns the action the user picked, if the channel is interactive.
#[async_trait::async_trait]
pub trait Presenter: Send + Sync {
    async fn present(&self, n: &Notification) -> Result<Option<Action>>;
    fn name(&self) -> &'static str;
}

fn default_console() -> bool {
    true
}

/// `[notify]`: enabled presenters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyCfg {
    #[serde(default = "default_console")]
    pub console: bool,
    #[serde(default)]
    pub discord_webhook: Option<String>,
    #[serde(default)]
    pub slack_webhook: Option<String>,
}

impl Default for NotifyCfg {
    fn default() -> Self {
        Self {
            console: default_console(),
            discord_webhook: None,
            slack_webhook: None,
        }
    }
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("notify_sent_total", "Notifications delivered per presenter.");
        describe_counter!("notify_errors_total", "Presenter delivery failures.");
    });
}

/// Fan-out over every configured presenter.
pub struct PresenterMux {
    presenters: Vec<Box<dyn Presenter>>,
}

impl PresenterMux {
    pub fn new(presenters: Vec<Box<dyn Presenter>>) -> Self {
        Self { presenters }
    }

    /// Build from config. This is the presentation subsystem's init step:
    /// an error here is fatal for the process.
    pub fn from_config(cfg: &NotifyCfg) -> Result<Self> {
        let mut presenters: Vec<Box<dyn Presenter>> = Vec::new();
        if cfg.console {
            presenters.push(Box::new(ConsolePresenter::stdout()));
        }
        if let Some(url) = non_blank(&cfg.discord_webhook) {
            check_webhook_url("discord_webhook", url)?;
            presenters.push(Box::new(DiscordPresenter::new(url.to_string())));
        }
        if let Some(url) = non_blank(&cfg.slack_webhook) {
            check_webhook_url("slack_webhook", url)?;
            presenters.push(Box::new(SlackPresenter::new(url.to_string())));
        }
        if presenters.is_empty() {
            bail!("no notification channel enabled (console is off and no webhook is set)");
        }
        Ok(Self::new(presenters))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.presenters.iter().map(|p| p.name()).collect()
    }

    /// Deliver to every presenter. Failures are logged and counted only.
    /// Returns the first action any interactive presenter reported.
    pub async fn present(&self, n: &Notification) -> Option<Action> {
        ensure_metrics_described();

        let mut picked = None;
        for p in &self.presenters {
            match p.present(n).await {
                Ok(action) => {
                    counter!("notify_sent_total", "presenter" => p.name()).increment(1);
                    if picked.is_none() {
                        picked = action;
                    }
                }
                Err(e) => {
                    counter!("notify_errors_total", "presenter" => p.name()).increment(1);
                    tracing::warn!(error = ?e, presenter = p.name(), "notification failed");
                }
            }
        }
        picked
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn check_webhook_url(field: &str, url: &str) -> Result<()> {
    match reqwest::Url::parse(url) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
        Ok(u) => bail!("{field}: unsupported scheme `{}`", u.scheme()),
        Err(e) => bail!("{field}: invalid url: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::{LaunchRecord, LaunchTime};
    use anyhow::anyhow;
    use std::sync::Mutex;

    fn launch() -> CanonicalLaunch {
        CanonicalLaunch::from(
            &LaunchRecord::bare("a", LaunchTime::At(1_700_000_000))
                .rocket("Falcon 9")
                .provider("SpaceX")
                .mission("Crew-9")
                .detail_link("https://a.test/crew-9")
                .location("LC-39A"),
        )
    }

    #[test]
    fn actions_follow_available_links() {
        let n = Notification::for_launch(&launch(), "T-1 hour.");
        assert_eq!(n.detail_line, "Falcon 9 (SpaceX) | Crew-9");
        assert_eq!(
            n.actions,
            vec![Action::Dismiss, Action::MoreInfo("https://a.test/crew-9".into())]
        );
        assert_eq!(n.live_link(), None);

        let mut l = launch();
        l.live_link = Some("https://youtube.com/live".into());
        let n = Notification::for_launch(&l, "T-1 hour.");
        assert_eq!(n.live_link(), Some("https://youtube.com/live"));
        assert_eq!(n.actions.last().map(Action::caption), Some("Watch live"));
    }

    #[test]
    fn from_config_rejects_empty_and_bad_urls() {
        let off = NotifyCfg {
            console: false,
            ..NotifyCfg::default()
        };
        assert!(PresenterMux::from_config(&off).is_err());

        let bad = NotifyCfg {
            discord_webhook: Some("not a url".into()),
            ..NotifyCfg::default()
        };
        assert!(PresenterMux::from_config(&bad).is_err());

        let ok = NotifyCfg {
            slack_webhook: Some("https://hooks.slack.test/T000".into()),
            ..NotifyCfg::default()
        };
        let mux = PresenterMux::from_config(&ok).unwrap();
        assert_eq!(mux.names(), vec!["console", "slack"]);
    }

    struct Failing;
    struct Picking(Mutex<u32>);

    #[async_trait::async_trait]
    impl Presenter for Failing {
        async fn present(&self, _n: &Notification) -> Result<Option<Action>> {
            Err(anyhow!("toast service down"))
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[async_trait::async_trait]
    impl Presenter for Picking {
        async fn present(&self, n: &Notification) -> Result<Option<Action>> {
            *self.0.lock().unwrap() += 1;
            Ok(n.actions.last().cloned())
        }
        fn name(&self) -> &'static str {
            "picking"
        }
    }

    #[tokio::test]
    async fn failing_presenter_does_not_stop_others() {
        let mux = PresenterMux::new(vec![Box::new(Failing), Box::new(Picking(Mutex::new(0)))]);
        let n = Notification::for_launch(&launch(), "Liftoff!");
        let action = mux.present(&n).await;
        assert_eq!(action, Some(Action::MoreInfo("https://a.test/crew-9".into())));
    }
}
