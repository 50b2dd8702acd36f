//! Page-driver seam between the workflow and the browser.
//!
//! The workflow only ever talks to a [`PageDriver`], so the whole pipeline can
//! be exercised against a scripted stub in tests. [`CdpDriver`] is the real
//! implementation over a `chromiumoxide` page.
//!
//! Accessible-name and visible-text lookups have no direct CDP query, so the
//! driver resolves them with small injected scripts, the CDP equivalent of a
//! role/text query.

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::element::Element;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often element waits re-poll the page.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A step-local browser failure. Caught and logged at the call site;
/// only login-form failures abort the run.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("element not found: {0}")]
    ElementNotFound(String),
    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),
    #[error("browser error: {0}")]
    Browser(String),
    #[error("script evaluation failed: {0}")]
    Evaluate(String),
}

impl From<chromiumoxide::error::CdpError> for StepError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        StepError::Browser(e.to_string())
    }
}

/// The browser operations the workflow needs, and nothing more.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate the page to `url`.
    async fn goto(&self, url: &str) -> Result<(), StepError>;

    /// The page's current URL.
    async fn current_url(&self) -> Result<String, StepError>;

    /// Wait until the document is ready, up to `ceiling`. The ceiling is an
    /// upper bound, not a fixed sleep; a page that settles early returns
    /// early, and hitting the ceiling is not an error.
    async fn wait_for_ready(&self, ceiling: Duration) -> Result<(), StepError>;

    /// Wait for the first element matching any of `candidates` (tried in
    /// order each poll) and fill it with `value`.
    async fn fill_first(
        &self,
        candidates: &[&str],
        value: &str,
        ceiling: Duration,
    ) -> Result<(), StepError>;

    /// Wait for the first element matching any of `candidates` and click it.
    async fn click_first(&self, candidates: &[&str], ceiling: Duration) -> Result<(), StepError>;

    /// Click the innermost element whose rendered text contains `text`.
    async fn click_by_text(&self, text: &str) -> Result<(), StepError>;

    /// Fill the form field whose accessible name is `label`.
    async fn fill_by_label(&self, label: &str, value: &str) -> Result<(), StepError>;

    /// Click the button whose accessible name is `label`.
    async fn click_by_label(&self, label: &str) -> Result<(), StepError>;

    /// Number of elements matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize, StepError>;

    /// Click the `index`-th (0-based) element matching `selector`.
    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), StepError>;

    /// Full HTML snapshot of the rendered page.
    async fn html_snapshot(&self) -> Result<String, StepError>;

    /// Pacing delay between interactions. Stubs override this to a no-op.
    async fn settle(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ── CDP implementation ──────────────────────────────────────────────────────

/// [`PageDriver`] over a live `chromiumoxide` page.
pub struct CdpDriver {
    page: Page,
}

impl CdpDriver {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Poll for the first element matching any candidate selector.
    async fn wait_for_element(
        &self,
        candidates: &[&str],
        ceiling: Duration,
    ) -> Result<Element, StepError> {
        let deadline = Instant::now() + ceiling;
        loop {
            for selector in candidates {
                if let Ok(element) = self.page.find_element(*selector).await {
                    return Ok(element);
                }
            }
            if Instant::now() >= deadline {
                return Err(StepError::Timeout(ceiling, candidates.join(", ")));
            }
            tokio::time::sleep(POLL_INTERVAL.min(ceiling)).await;
        }
    }

    /// Run an injected script that reports whether it found its target.
    async fn eval_hit(&self, script: String) -> Result<bool, StepError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| StepError::Evaluate(e.to_string()))?
            .into_value()
            .map_err(|e| StepError::Evaluate(e.to_string()))
    }
}

/// Quote a Rust string as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn goto(&self, url: &str) -> Result<(), StepError> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, StepError> {
        self.page
            .evaluate("window.location.href")
            .await
            .map_err(|e| StepError::Evaluate(e.to_string()))?
            .into_value()
            .map_err(|e| StepError::Evaluate(e.to_string()))
    }

    async fn wait_for_ready(&self, ceiling: Duration) -> Result<(), StepError> {
        let deadline = Instant::now() + ceiling;
        loop {
            let state: String = self
                .page
                .evaluate("document.readyState")
                .await
                .map_err(|e| StepError::Evaluate(e.to_string()))?
                .into_value()
                .unwrap_or_default();
            if state == "complete" || Instant::now() >= deadline {
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL.min(ceiling)).await;
        }
    }

    async fn fill_first(
        &self,
        candidates: &[&str],
        value: &str,
        ceiling: Duration,
    ) -> Result<(), StepError> {
        let element = self.wait_for_element(candidates, ceiling).await?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn click_first(&self, candidates: &[&str], ceiling: Duration) -> Result<(), StepError> {
        let element = self.wait_for_element(candidates, ceiling).await?;
        element.click().await?;
        Ok(())
    }

    async fn click_by_text(&self, text: &str) -> Result<(), StepError> {
        let script = format!(
            r#"(function(target) {{
                const all = Array.from(document.querySelectorAll('body *'));
                const hits = all.filter(el => (el.textContent || '').includes(target));
                if (hits.length === 0) return false;
                const innermost = hits.filter(el => !hits.some(other => other !== el && el.contains(other)));
                (innermost[0] || hits[hits.length - 1]).click();
                return true;
            }})({})"#,
            js_str(text)
        );
        if self.eval_hit(script).await? {
            Ok(())
        } else {
            Err(StepError::ElementNotFound(format!("text {text:?}")))
        }
    }

    async fn fill_by_label(&self, label: &str, value: &str) -> Result<(), StepError> {
        let script = format!(
            r#"(function(name, value) {{
                function accName(el) {{
                    const aria = el.getAttribute('aria-label');
                    if (aria) return aria.trim();
                    if (el.id) {{
                        const lab = document.querySelector('label[for="' + el.id + '"]');
                        if (lab) return (lab.textContent || '').trim();
                    }}
                    const wrap = el.closest('label');
                    if (wrap) return (wrap.textContent || '').trim();
                    return (el.placeholder || '').trim();
                }}
                const fields = Array.from(document.querySelectorAll('input, textarea'));
                const el = fields.find(f => accName(f) === name);
                if (!el) return false;
                el.focus();
                el.value = value;
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})({}, {})"#,
            js_str(label),
            js_str(value)
        );
        if self.eval_hit(script).await? {
            Ok(())
        } else {
            Err(StepError::ElementNotFound(format!("textbox {label:?}")))
        }
    }

    async fn click_by_label(&self, label: &str) -> Result<(), StepError> {
        let script = format!(
            r#"(function(name) {{
                const controls = Array.from(document.querySelectorAll('button, [role="button"]'));
                const el = controls.find(c =>
                    ((c.getAttribute('aria-label') || c.textContent || '').trim()) === name);
                if (!el) return false;
                el.click();
                return true;
            }})({})"#,
            js_str(label)
        );
        if self.eval_hit(script).await? {
            Ok(())
        } else {
            Err(StepError::ElementNotFound(format!("button {label:?}")))
        }
    }

    async fn count(&self, selector: &str) -> Result<usize, StepError> {
        match self.page.find_elements(selector).await {
            Ok(elements) => Ok(elements.len()),
            // No matches surfaces as an error in CDP; treat it as zero.
            Err(_) => Ok(0),
        }
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), StepError> {
        let elements = self.page.find_elements(selector).await?;
        let element = elements
            .get(index)
            .ok_or_else(|| StepError::ElementNotFound(format!("{selector} [{index}]")))?;
        element.click().await?;
        Ok(())
    }

    async fn html_snapshot(&self) -> Result<String, StepError> {
        self.page.content().await.map_err(StepError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_str_escapes_quotes_and_backslashes() {
        assert_eq!(js_str("plain"), "\"plain\"");
        assert_eq!(js_str("a\"b"), "\"a\\\"b\"");
        assert_eq!(js_str("a\\b"), "\"a\\\\b\"");
    }

    #[test]
    fn step_error_display_names_the_target() {
        let err = StepError::Timeout(Duration::from_secs(5), "input[name=\"email\"]".into());
        assert!(err.to_string().contains("input[name=\"email\"]"));
        let err = StepError::ElementNotFound("button \"Create\"".into());
        assert!(err.to_string().starts_with("element not found"));
    }
}
