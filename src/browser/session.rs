use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::browser::selector::Locator;
use crate::error::BrowserResult;

/// Scroll to the far bottom-right so lazily rendered content is laid out.
pub const SCROLL_TO_END: &str =
    "window.scrollTo(document.body.scrollWidth, document.body.scrollHeight);";

/// Scroll back to the top-left corner.
pub const SCROLL_TO_ORIGIN: &str = "window.scrollTo(0, 0); document.body.scrollTop = 0;";

/// Rendered size of the document body as `{width, height}`.
pub const MEASURE_BODY: &str =
    "return { width: document.body.scrollWidth, height: document.body.scrollHeight };";

/// Current vertical scroll offset of the document.
pub const SCROLL_TOP: &str =
    "return document.body.scrollTop || document.documentElement.scrollTop || 0;";

/// Element geometry in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    /// Document scroll offset at the time the rectangle was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_top: Option<f64>,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            scroll_top: None,
        }
    }
}

/// A resolved page element.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    async fn text(&self) -> BrowserResult<String>;
    async fn is_selected(&self) -> BrowserResult<bool>;
    async fn is_displayed(&self) -> BrowserResult<bool>;
    async fn click(&self) -> BrowserResult<()>;
    async fn clear(&self) -> BrowserResult<()>;
    async fn send_keys(&self, text: &str) -> BrowserResult<()>;
    async fn rect(&self) -> BrowserResult<Rect>;
}

/// Remote browser automation capability used by the step handlers and the
/// run orchestrator.
///
/// Every method is a suspension point. Methods take `&self` so that the
/// read-only checks of one step can be issued concurrently; callers never
/// share a session between steps.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Element: ElementHandle;

    async fn navigate(&self, url: &str) -> BrowserResult<()>;

    async fn title(&self) -> BrowserResult<String>;

    /// Resolve a locator, failing fast with `NoSuchElement` when nothing
    /// matches or `InvalidSelector` when the engine rejects the locator.
    async fn find_element(&self, locator: &Locator) -> BrowserResult<Self::Element>;

    /// Poll for an element until it exists or `timeout` expires.
    async fn wait_for_element(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> BrowserResult<Self::Element>;

    /// Run a script in the page. Used only for scrolling and measurement.
    async fn execute_script(&self, script: &str) -> BrowserResult<Value>;

    async fn scroll_into_view(&self, element: &Self::Element) -> BrowserResult<()>;

    /// Move the pointer to `(x_offset, y_offset)` relative to the element's
    /// top-left corner.
    async fn move_pointer_to(
        &self,
        element: &Self::Element,
        x_offset: i64,
        y_offset: i64,
    ) -> BrowserResult<()>;

    async fn set_window_size(&self, width: u32, height: u32) -> BrowserResult<()>;

    /// Capture the current page as PNG bytes.
    async fn screenshot(&self) -> BrowserResult<Vec<u8>>;

    async fn quit(&self) -> BrowserResult<()>;
}
