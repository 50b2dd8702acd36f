//! The token-creation pipeline.
//!
//! One linear pass per process: login, navigate, select scopes, create,
//! reveal, extract. Login-form failures abort the run; everything after
//! login is fail-open: a step that cannot find its target logs a warning
//! and the pipeline keeps going, because extraction is the only real
//! success signal.

use crate::config::{Config, Credentials};
use crate::driver::{PageDriver, StepError};
use crate::extract;
use crate::selectors;
use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// How often the redirect wait re-checks the page URL.
const URL_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// What one run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub token_name: String,
    pub token: Option<String>,
}

/// Name for the token being created: a fixed prefix plus the current Unix
/// timestamp, so repeated runs stay distinguishable on the token page.
pub fn generate_token_name() -> String {
    format!("FullAccess_{}", Utc::now().timestamp())
}

// ── Pipeline ────────────────────────────────────────────────────────────────

/// Run the whole pipeline against an already-open page.
///
/// Returns `Err` only when login fails outright; every later step degrades
/// to a logged warning. The caller owns browser teardown.
pub async fn run(
    driver: &dyn PageDriver,
    config: &Config,
    credentials: &Credentials,
) -> anyhow::Result<RunOutcome> {
    let token_name = generate_token_name();
    info!(token_name = %token_name, "starting token creation run");

    login(driver, config, credentials)
        .await
        .map_err(|e| anyhow::anyhow!(e).context("login failed"))?;
    info!("login complete");

    if let Err(e) = navigate_to_token_page(driver, config).await {
        warn!("token page navigation issue: {e}");
    }

    let clicked = click_all_scopes(driver, config).await;
    info!(clicked, total = selectors::SCOPES.len(), "scope selection finished");

    if let Err(e) = fill_token_name(driver, &token_name).await {
        warn!("could not fill token name: {e}");
    }
    if let Err(e) = click_create(driver, config).await {
        warn!("could not click Create: {e}");
    }
    if let Err(e) = reveal_token(driver, config).await {
        debug!("could not reveal token: {e}");
    }

    let token = match scan_for_token(driver).await {
        Ok(token) => token,
        Err(e) => {
            warn!("token scan failed: {e}");
            None
        }
    };
    match &token {
        Some(_) => info!("token extracted"),
        None => warn!("no token found on the page"),
    }

    Ok(RunOutcome { token_name, token })
}

// ── Steps ───────────────────────────────────────────────────────────────────

/// Drive the OAuth login form and wait for the redirect back to Deriv.
///
/// A missing form element fails the step (and the run). A missed redirect
/// is only a warning: slow redirects have been seen on the live page, so
/// the run proceeds and lets extraction decide.
pub async fn login(
    driver: &dyn PageDriver,
    config: &Config,
    credentials: &Credentials,
) -> Result<(), StepError> {
    let url = config.oauth_authorize_url();
    info!(url = %url, "navigating to OAuth authorize page");
    driver.goto(&url).await?;
    driver.wait_for_ready(config.timeouts.page_settle()).await?;

    debug!(email = %credentials.email, "filling email");
    driver
        .fill_first(
            selectors::EMAIL_INPUTS,
            &credentials.email,
            config.timeouts.email_wait(),
        )
        .await?;

    debug!("filling password");
    driver
        .fill_first(
            selectors::PASSWORD_INPUTS,
            &credentials.password,
            config.timeouts.password_wait(),
        )
        .await?;

    info!("submitting login form");
    if let Err(e) = driver
        .click_first(selectors::SUBMIT_BUTTONS, config.timeouts.submit_wait())
        .await
    {
        debug!("submit selector missed ({e}), trying visible text");
        driver.click_by_text(selectors::SUBMIT_TEXT).await?;
    }

    match wait_for_host(driver, &config.redirect_host, config.timeouts.redirect_wait()).await {
        Ok(url) => info!(url = %url, "redirected back to Deriv"),
        Err(e) => warn!("redirect not observed: {e}"),
    }
    driver.wait_for_ready(config.timeouts.page_settle()).await?;
    Ok(())
}

/// Load the API-token management page.
pub async fn navigate_to_token_page(
    driver: &dyn PageDriver,
    config: &Config,
) -> Result<(), StepError> {
    info!(url = %config.token_page_url, "navigating to the API token page");
    driver.goto(&config.token_page_url).await?;
    driver.wait_for_ready(config.timeouts.nav_settle()).await?;
    match driver.current_url().await {
        Ok(url) => info!(url = %url, "token page loaded"),
        Err(e) => debug!("could not read page url: {e}"),
    }
    Ok(())
}

/// Click every permission scope. Individual failures are warnings; all
/// five are always attempted. Returns how many clicks landed.
pub async fn click_all_scopes(driver: &dyn PageDriver, config: &Config) -> usize {
    info!("selecting all scopes");
    let mut clicked = 0;
    for (name, text) in selectors::SCOPES {
        debug!(scope = *name, "clicking scope");
        match driver.click_by_text(text).await {
            Ok(()) => {
                clicked += 1;
                info!(scope = *name, "scope selected");
            }
            Err(e) => warn!(scope = *name, "failed to select scope: {e}"),
        }
        driver.settle(config.timeouts.scope_pace()).await;
    }
    driver.settle(config.timeouts.scope_settle()).await;
    clicked
}

/// Fill the token-name textbox.
pub async fn fill_token_name(driver: &dyn PageDriver, name: &str) -> Result<(), StepError> {
    info!(name = %name, "filling token name");
    driver.fill_by_label(selectors::TOKEN_NAME_LABEL, name).await
}

/// Click the Create button. There is no confirmation the server actually
/// created a token; extraction is the only success signal.
pub async fn click_create(driver: &dyn PageDriver, config: &Config) -> Result<(), StepError> {
    driver.settle(config.timeouts.create_pace()).await;
    info!("clicking Create");
    driver.click_by_label(selectors::CREATE_LABEL).await?;
    driver.settle(config.timeouts.create_settle()).await;
    Ok(())
}

/// Best-effort reveal of the masked token value.
pub async fn reveal_token(driver: &dyn PageDriver, config: &Config) -> Result<(), StepError> {
    let toggles = driver.count(selectors::VISIBILITY_TOGGLE).await?;
    // Token rows render oldest-first, so with two or more toggles the second
    // belongs to the token just created. Ordering assumption about the live
    // page, not a contract.
    let index = match toggles {
        0 => {
            debug!("no visibility toggle found, token may already be visible");
            return Ok(());
        }
        1 => 0,
        _ => 1,
    };
    driver.click_nth(selectors::VISIBILITY_TOGGLE, index).await?;
    info!("revealed token value");
    driver.settle(config.timeouts.reveal_settle()).await;
    Ok(())
}

/// Snapshot the page and scan it for the token.
pub async fn scan_for_token(driver: &dyn PageDriver) -> Result<Option<String>, StepError> {
    debug!("scanning page for token");
    let html = driver.html_snapshot().await?;
    Ok(extract::find_token(&html))
}

// ── Waits ───────────────────────────────────────────────────────────────────

/// Poll the page URL until its host lands on `host_suffix`, bounded by
/// `ceiling`.
async fn wait_for_host(
    driver: &dyn PageDriver,
    host_suffix: &str,
    ceiling: Duration,
) -> Result<String, StepError> {
    let deadline = Instant::now() + ceiling;
    loop {
        let current = driver.current_url().await?;
        if host_matches(&current, host_suffix) {
            return Ok(current);
        }
        if Instant::now() >= deadline {
            return Err(StepError::Timeout(
                ceiling,
                format!("redirect to *.{host_suffix}"),
            ));
        }
        tokio::time::sleep(URL_POLL_INTERVAL.min(ceiling)).await;
    }
}

fn host_matches(url: &str, host_suffix: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    match parsed.host_str() {
        Some(host) => host == host_suffix || host.ends_with(&format!(".{host_suffix}")),
        None => false,
    }
}
