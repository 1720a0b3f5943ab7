use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Mutex;

use super::{Action, Notification, Presenter};

/// Prints notifications as a small text card. Non-interactive.
pub struct ConsolePresenter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsolePresenter {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    /// Optional builder for tests/tools
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

/// Plain-text rendering shared with the demo binary.
pub fn render(n: &Notification) -> String {
    let mut s = format!("== {} ==\n   {}\n   {}\n", n.headline, n.time_line, n.detail_line);
    if let Some(loc) = &n.location {
        s.push_str(&format!("   {loc}\n"));
    }
    let buttons: Vec<String> = n
        .actions
        .iter()
        .map(|a| match a.url() {
            Some(url) => format!("[{}: {}]", a.caption(), url),
            None => format!("[{}]", a.caption()),
        })
        .collect();
    s.push_str(&format!("   {}\n", buttons.join(" ")));
    s
}

#[async_trait::async_trait]
impl Presenter for ConsolePresenter {
    async fn present(&self, n: &Notification) -> Result<Option<Action>> {
        let text = render(n);
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("console writer poisoned"))?;
        out.write_all(text.as_bytes()).context("console write")?;
        out.flush().context("console flush")?;
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
