use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::browser::selector::Locator;
use crate::browser::session::{
    BrowserSession, ElementHandle, MEASURE_BODY, Rect, SCROLL_TO_END, SCROLL_TO_ORIGIN, SCROLL_TOP,
};
use crate::error::{BrowserError, BrowserResult};

// ============================================================================
// MockSession: scriptable in-memory browser for tests and dry runs
// ============================================================================

/// PNG file signature returned as screenshot content.
pub const MOCK_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// An element on the mock page.
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    pub text: String,
    pub selected: bool,
    pub displayed: bool,
    /// Whether the element accepts `clear`/`send_keys`
    pub editable: bool,
    pub rect: Rect,
}

impl MockElement {
    /// A visible, read-only element with the given text.
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            selected: false,
            displayed: true,
            editable: false,
            rect: Rect::new(0.0, 0.0, 100.0, 20.0),
        }
    }

    /// An empty text field.
    pub fn field() -> Self {
        Self {
            editable: true,
            ..Self::text("")
        }
    }

    /// A checkbox/radio in the given state.
    pub fn checkbox(selected: bool) -> Self {
        Self {
            selected,
            ..Self::text("")
        }
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn at(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }
}

#[derive(Debug)]
struct MockState {
    title: String,
    elements: HashMap<String, MockElement>,
    invalid: HashMap<String, String>,
    failing_urls: HashSet<String>,
    failing_clicks: HashSet<String>,
    click_titles: HashMap<String, String>,
    failing_scripts: HashSet<&'static str>,
    body: (f64, f64),
    lose_session_on_screenshot: bool,
    window: Option<(u32, u32)>,
    calls: Vec<String>,
    quit_count: usize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            title: String::new(),
            elements: HashMap::new(),
            invalid: HashMap::new(),
            failing_urls: HashSet::new(),
            failing_clicks: HashSet::new(),
            click_titles: HashMap::new(),
            failing_scripts: HashSet::new(),
            body: (0.0, 0.0),
            lose_session_on_screenshot: false,
            window: None,
            calls: Vec::new(),
            quit_count: 0,
        }
    }
}

/// In-memory [`BrowserSession`] with an ordered log of every call made.
///
/// Clones share the same page, so a test can hand one clone to the runner
/// and inspect the other afterwards.
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<MockState>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(self, title: &str) -> Self {
        self.lock().title = title.to_string();
        self
    }

    pub fn with_element(self, selector: &str, element: MockElement) -> Self {
        self.lock().elements.insert(selector.to_string(), element);
        self
    }

    pub fn with_text(self, selector: &str, text: &str) -> Self {
        self.with_element(selector, MockElement::text(text))
    }

    /// Make the engine reject `selector` as malformed.
    pub fn with_invalid_selector(self, selector: &str, message: &str) -> Self {
        self.lock()
            .invalid
            .insert(selector.to_string(), message.to_string());
        self
    }

    /// Make one of the page scripts fail with a javascript error.
    ///
    /// `name` is the script's name in the call log, e.g. `scroll_to_origin`.
    pub fn with_failing_script(self, name: &'static str) -> Self {
        self.lock().failing_scripts.insert(name);
        self
    }

    /// Make navigation to `url` fail.
    pub fn with_failing_navigation(self, url: &str) -> Self {
        self.lock().failing_urls.insert(url.to_string());
        self
    }

    pub fn with_failing_click(self, selector: &str) -> Self {
        self.lock().failing_clicks.insert(selector.to_string());
        self
    }

    /// Clicking `selector` changes the document title.
    pub fn with_click_title(self, selector: &str, title: &str) -> Self {
        self.lock()
            .click_titles
            .insert(selector.to_string(), title.to_string());
        self
    }

    /// Rendered size of the document body.
    pub fn with_body_size(self, width: f64, height: f64) -> Self {
        self.lock().body = (width, height);
        self
    }

    /// The session dies when a screenshot is requested.
    pub fn losing_session_on_screenshot(self) -> Self {
        self.lock().lose_session_on_screenshot = true;
        self
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Index of the first call equal to `call`.
    pub fn position(&self, call: &str) -> Option<usize> {
        self.lock().calls.iter().position(|c| c == call)
    }

    pub fn count(&self, call: &str) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn element(&self, selector: &str) -> Option<MockElement> {
        self.lock().elements.get(selector).cloned()
    }

    pub fn window_size(&self) -> Option<(u32, u32)> {
        self.lock().window
    }

    pub fn quit_count(&self) -> usize {
        self.lock().quit_count
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }

    fn log(&self, call: String) {
        self.lock().calls.push(call);
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to an element of a [`MockSession`] page.
#[derive(Debug, Clone)]
pub struct MockElementHandle {
    selector: String,
    state: Arc<Mutex<MockState>>,
}

impl MockElementHandle {
    /// Log `call` and run `f` against the element, if it still exists.
    fn with<T>(&self, call: &str, f: impl FnOnce(&mut MockElement) -> BrowserResult<T>) -> BrowserResult<T> {
        let mut state = lock(&self.state);
        state.calls.push(format!("{} {}", call, self.selector));
        match state.elements.get_mut(&self.selector) {
            Some(element) => f(element),
            None => Err(BrowserError::Command(format!(
                "stale element reference: {}",
                self.selector
            ))),
        }
    }
}

#[async_trait]
impl ElementHandle for MockElementHandle {
    async fn text(&self) -> BrowserResult<String> {
        self.with("text", |e| Ok(e.text.clone()))
    }

    async fn is_selected(&self) -> BrowserResult<bool> {
        self.with("is_selected", |e| Ok(e.selected))
    }

    async fn is_displayed(&self) -> BrowserResult<bool> {
        self.with("is_displayed", |e| Ok(e.displayed))
    }

    async fn click(&self) -> BrowserResult<()> {
        let mut state = lock(&self.state);
        state.calls.push(format!("click {}", self.selector));
        if state.failing_clicks.contains(&self.selector) {
            return Err(BrowserError::Command("element click intercepted".into()));
        }
        if let Some(title) = state.click_titles.get(&self.selector).cloned() {
            state.title = title;
        }
        match state.elements.get_mut(&self.selector) {
            Some(element) => {
                element.selected = !element.selected;
                Ok(())
            }
            None => Err(BrowserError::Command(format!(
                "stale element reference: {}",
                self.selector
            ))),
        }
    }

    async fn clear(&self) -> BrowserResult<()> {
        self.with("clear", |e| {
            if !e.editable {
                return Err(BrowserError::Command("invalid element state".into()));
            }
            e.text.clear();
            Ok(())
        })
    }

    async fn send_keys(&self, text: &str) -> BrowserResult<()> {
        self.with(&format!("send_keys {}", text), |e| {
            if !e.editable {
                return Err(BrowserError::Command("element not interactable".into()));
            }
            e.text.push_str(text);
            Ok(())
        })
    }

    async fn rect(&self) -> BrowserResult<Rect> {
        self.with("rect", |e| Ok(e.rect))
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    type Element = MockElementHandle;

    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        let mut state = self.lock();
        state.calls.push(format!("navigate {}", url));
        if state.failing_urls.contains(url) {
            return Err(BrowserError::Command(format!(
                "unknown error: net::ERR_NAME_NOT_RESOLVED ({})",
                url
            )));
        }
        Ok(())
    }

    async fn title(&self) -> BrowserResult<String> {
        let mut state = self.lock();
        state.calls.push("title".into());
        Ok(state.title.clone())
    }

    async fn find_element(&self, locator: &Locator) -> BrowserResult<Self::Element> {
        let selector = locator.selector();
        let mut state = self.lock();
        state.calls.push(format!("find {}", selector));
        if let Some(message) = state.invalid.get(selector) {
            return Err(BrowserError::InvalidSelector {
                selector: selector.to_string(),
                message: message.clone(),
            });
        }
        if !state.elements.contains_key(selector) {
            return Err(BrowserError::NoSuchElement {
                selector: selector.to_string(),
            });
        }
        Ok(MockElementHandle {
            selector: selector.to_string(),
            state: Arc::clone(&self.state),
        })
    }

    async fn wait_for_element(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> BrowserResult<Self::Element> {
        self.log(format!("wait {}", locator.selector()));
        match self.find_element(locator).await {
            Err(BrowserError::NoSuchElement { selector }) => Err(BrowserError::Timeout {
                selector,
                timeout_ms: timeout.as_millis() as u64,
            }),
            other => other,
        }
    }

    async fn execute_script(&self, script: &str) -> BrowserResult<Value> {
        let mut state = self.lock();
        let (name, value) = match script {
            SCROLL_TO_END => ("scroll_to_end", Value::Null),
            SCROLL_TO_ORIGIN => ("scroll_to_origin", Value::Null),
            MEASURE_BODY => (
                "measure_body",
                json!({ "width": state.body.0, "height": state.body.1 }),
            ),
            SCROLL_TOP => ("scroll_top", json!(0)),
            _ => ("script", Value::Null),
        };
        state.calls.push(format!("execute_script {}", name));
        if state.failing_scripts.contains(name) {
            return Err(BrowserError::Command(format!("javascript error in {}", name)));
        }
        Ok(value)
    }

    async fn scroll_into_view(&self, element: &Self::Element) -> BrowserResult<()> {
        self.log(format!("scroll_into_view {}", element.selector));
        Ok(())
    }

    async fn move_pointer_to(
        &self,
        element: &Self::Element,
        x_offset: i64,
        y_offset: i64,
    ) -> BrowserResult<()> {
        self.log(format!("hover {} {},{}", element.selector, x_offset, y_offset));
        Ok(())
    }

    async fn set_window_size(&self, width: u32, height: u32) -> BrowserResult<()> {
        let mut state = self.lock();
        state.calls.push(format!("set_window_size {}x{}", width, height));
        state.window = Some((width, height));
        Ok(())
    }

    async fn screenshot(&self) -> BrowserResult<Vec<u8>> {
        let mut state = self.lock();
        state.calls.push("screenshot".into());
        if state.lose_session_on_screenshot {
            return Err(BrowserError::SessionLost("chrome not reachable".into()));
        }
        Ok(MOCK_PNG.to_vec())
    }

    async fn quit(&self) -> BrowserResult<()> {
        let mut state = self.lock();
        state.calls.push("quit".into());
        state.quit_count += 1;
        Ok(())
    }
}
