//! Browser-automation seam.
//!
//! One shared page/session per run: the engine sequences all navigation, so
//! implementations do not need to be reentrant across jobs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A link found on the current page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub url: String,
    /// Visible link text (a job link's label is the job title).
    pub label: String,
}

impl PageLink {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// Opaque scroll position token.
///
/// The engine only carries this between `scroll_position` and
/// `restore_scroll`; its contents are the driver's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollState(pub serde_json::Value);

/// Driver for the single browser page a run operates on.
///
/// Implementations report failures as [`crate::error::NavigationError`]
/// wrapped in `EngineError::Navigation`, or `EngineError::DriverLost` when
/// the browser session itself is gone.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Load a URL in the shared page.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// URL of the currently loaded page.
    async fn current_url(&self) -> Result<String>;

    /// All links matching a selector on the current page.
    async fn find_links(&self, selector: &str) -> Result<Vec<PageLink>>;

    /// Capture the current scroll position.
    async fn scroll_position(&self) -> Result<ScrollState>;

    /// Restore a previously captured scroll position on the current page.
    async fn restore_scroll(&self, state: &ScrollState) -> Result<()>;

    /// Text content of the first element matching a selector.
    async fn text_content(&self, selector: &str) -> Result<String>;

    /// Type text into the first element matching a selector.
    async fn type_text(&self, selector: &str, text: &str) -> Result<()>;

    /// Whether any element matches the selector on the current page.
    /// Used to detect "already applied" markers.
    async fn has_marker(&self, selector: &str) -> Result<bool>;
}
