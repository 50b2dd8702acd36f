//! Browser session lifecycle: one Chromium process, one page.
//!
//! Launch failures are fatal; teardown must run on every path, so the
//! workflow result is collected before [`BrowserSession::close`] is awaited
//! rather than short-circuiting past it.

use crate::config::Config;
use crate::driver::CdpDriver;
use anyhow::{Context, Result, anyhow};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch Chromium and open a single blank page.
    pub async fn launch(config: &Config, headless: bool) -> Result<Self> {
        debug!(headless, "launching Chromium");
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport.width, config.viewport.height)
            .viewport(Some(Viewport {
                width: config.viewport.width,
                height: config.viewport.height,
                ..Default::default()
            }))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-blink-features=AutomationControlled");
        if !headless {
            builder = builder.with_head();
        }
        let browser_config = builder
            .build()
            .map_err(|e| anyhow!("failed to configure browser: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("failed to launch Chromium")?;

        // The CDP event stream must be drained for the browser to function.
        let handler_task = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;

        debug!("browser ready");
        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// Driver handle for the session's page.
    pub fn driver(&self) -> CdpDriver {
        CdpDriver::new(self.page.clone())
    }

    /// Close the page and the browser process. Never fails; teardown
    /// problems are logged and swallowed.
    pub async fn close(self) {
        debug!("closing browser session");
        let Self {
            browser,
            page,
            mut handler_task,
        } = self;

        if let Err(e) = page.close().await {
            debug!("page close failed: {e}");
        }
        // Dropping the browser tears down the CDP connection and the child
        // process; the handler stream then ends on its own.
        drop(browser);
        if tokio::time::timeout(Duration::from_secs(2), &mut handler_task)
            .await
            .is_err()
        {
            handler_task.abort();
        }
        debug!("browser closed");
    }
}
