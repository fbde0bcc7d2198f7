use std::{collections::VecDeque, io::Write, sync::Arc};

use anyhow::Result;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc,
};
use tokio_stream::{wrappers::SplitStream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    bridge::Platform,
    refresh::{Alert, Refresher, DEFAULT_REFRESH_INTERVAL},
    usage::store::UsageStore,
};

use super::render::{render_alert, render_store};

pub const UNSUPPORTED_SETTINGS_MESSAGE: &str =
    "Usage access is not available on this platform, there is nothing to grant.";

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Refresh,
    OpenSettings,
    Quit,
}

impl Action {
    pub fn parse(line: &str) -> Option<Action> {
        match line.trim().to_ascii_lowercase().as_str() {
            "r" | "refresh" => Some(Action::Refresh),
            "p" | "permissions" | "settings" => Some(Action::OpenSettings),
            "q" | "quit" | "exit" => Some(Action::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Runs the permission settings shortcut. Failures to open the screen are ignored; an
/// unsupported platform gets an explanation instead.
pub async fn open_settings(platform: &Platform) -> Option<Alert> {
    if !platform.is_supported() {
        return Some(Alert::info(UNSUPPORTED_SETTINGS_MESSAGE));
    }
    if let Err(e) = platform.provider.open_settings().await {
        debug!("Ignoring settings shortcut failure {e}");
    }
    None
}

/// Terminals may hand over bytes that aren't UTF-8; those lines are just unrecognised input.
fn decode_line(bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(bytes);
    line.strip_suffix('\r').unwrap_or(&line).to_string()
}

/// Interactive list of daily usage. Redraws whenever the store changes, an alert arrives or the
/// user enters a command.
pub struct UsageView<W> {
    refresher: Arc<Refresher>,
    platform: Platform,
    alerts: mpsc::UnboundedReceiver<Alert>,
    pending: VecDeque<Alert>,
    out: W,
    clear_screen: bool,
}

impl<W: Write> UsageView<W> {
    pub fn new(
        refresher: Arc<Refresher>,
        platform: Platform,
        alerts: mpsc::UnboundedReceiver<Alert>,
        out: W,
    ) -> Self {
        Self {
            refresher,
            platform,
            alerts,
            pending: VecDeque::new(),
            out,
            clear_screen: false,
        }
    }

    pub fn with_clear_screen(self, clear_screen: bool) -> Self {
        Self {
            clear_screen,
            ..self
        }
    }

    /// Executes the view event loop until the user quits, input ends or `shutdown` fires. The
    /// periodic refresh lives exactly as long as this call.
    pub async fn run(
        mut self,
        input: impl AsyncBufRead + Unpin,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let mut store = self.refresher.subscribe();
        let _timer = self
            .platform
            .is_supported()
            .then(|| self.refresher.start_periodic(DEFAULT_REFRESH_INTERVAL));
        let mut lines = SplitStream::new(input.split(b'\n'));

        let snapshot = store.borrow_and_update().clone();
        self.draw(&snapshot)?;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                line = lines.next() => match line {
                    Some(line) => {
                        if self.handle_line(&decode_line(&line?)).await == Flow::Quit {
                            break;
                        }
                    }
                    None => break,
                },
                changed = store.changed() => {
                    if changed.is_err() {
                        break;
                    }
                },
                Some(alert) = self.alerts.recv() => self.pending.push_back(alert),
            }

            let snapshot = store.borrow_and_update().clone();
            self.draw(&snapshot)?;
        }
        Ok(())
    }

    /// While an alert is shown any line only dismisses it.
    async fn handle_line(&mut self, line: &str) -> Flow {
        if self.pending.pop_front().is_some() {
            return Flow::Continue;
        }

        match Action::parse(line) {
            Some(Action::Refresh) => {
                let refresher = self.refresher.clone();
                tokio::spawn(async move {
                    refresher.refresh_today().await;
                });
            }
            Some(Action::OpenSettings) => {
                if let Some(alert) = open_settings(&self.platform).await {
                    self.pending.push_back(alert);
                }
            }
            Some(Action::Quit) => return Flow::Quit,
            None => debug!("Ignoring input {line:?}"),
        }
        Flow::Continue
    }

    fn draw(&mut self, store: &UsageStore) -> Result<()> {
        if self.clear_screen {
            write!(self.out, "{CLEAR_SCREEN}")?;
        }
        render_store(&mut self.out, store, &self.refresher.today_key())?;
        if let Some(alert) = self.pending.front() {
            render_alert(&mut self.out, alert)?;
        }
        write!(self.out, "> ")?;
        self.out.flush()?;
        Ok(())
    }
}
