use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::actions::{InputSource, MouseActions, PointerAction};
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::browser::selector::Locator;
use crate::browser::session::{BrowserSession, ElementHandle, Rect};
use crate::error::{BrowserError, BrowserResult};

/// Browser engine requested from the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Chrome,
    Firefox,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Chrome => "chrome",
            Engine::Firefox => "firefox",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to reach the remote WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    pub hub_url: String,
    pub engine: Engine,
    pub headless: bool,
}

/// W3C capabilities for the requested engine.
pub fn capabilities(engine: Engine, headless: bool) -> serde_json::Map<String, Value> {
    let mut caps = serde_json::Map::new();
    caps.insert("browserName".into(), json!(engine.as_str()));
    match engine {
        Engine::Chrome => {
            let mut args = vec!["--no-sandbox", "--disable-dev-shm-usage"];
            if headless {
                args.push("--headless=new");
                args.push("--disable-gpu");
            }
            caps.insert("goog:chromeOptions".into(), json!({ "args": args }));
        }
        Engine::Firefox => {
            let args: Vec<&str> = if headless { vec!["--headless"] } else { Vec::new() };
            caps.insert("moz:firefoxOptions".into(), json!({ "args": args }));
        }
    }
    caps
}

// ============================================================================
// WebDriverSession: fantoccini client against a Selenium hub
// ============================================================================

pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    /// Open a new remote session.
    pub async fn connect(config: &WebDriverConfig) -> BrowserResult<Self> {
        info!(hub = %config.hub_url, engine = %config.engine, headless = config.headless, "connecting");
        let client = ClientBuilder::rustls()
            .map_err(|e| BrowserError::Connect(format!("{}: {}", config.hub_url, e)))?
            .capabilities(capabilities(config.engine, config.headless))
            .connect(&config.hub_url)
            .await
            .map_err(|e| BrowserError::Connect(format!("{}: {}", config.hub_url, e)))?;
        Ok(Self { client })
    }

    fn to_fantoccini(locator: &Locator) -> fantoccini::Locator<'_> {
        match locator {
            Locator::XPath(s) => fantoccini::Locator::XPath(s),
            Locator::Css(s) => fantoccini::Locator::Css(s),
        }
    }

    fn element_arg(element: &WebDriverElement) -> BrowserResult<Value> {
        serde_json::to_value(&element.inner)
            .map_err(|e| BrowserError::Command(format!("could not reference element: {}", e)))
    }
}

/// Translate a fantoccini failure into the crate's error kinds.
fn classify(selector: Option<&str>, err: CmdError) -> BrowserError {
    match err {
        CmdError::Standard(wd) if matches!(wd.error, ErrorStatus::NoSuchElement) => {
            BrowserError::NoSuchElement {
                selector: selector.unwrap_or_default().to_string(),
            }
        }
        CmdError::Standard(wd) if matches!(wd.error, ErrorStatus::InvalidSelector) => {
            BrowserError::InvalidSelector {
                selector: selector.unwrap_or_default().to_string(),
                message: wd.message.to_string(),
            }
        }
        CmdError::Standard(wd) if matches!(wd.error, ErrorStatus::InvalidSessionId) => {
            BrowserError::SessionLost(wd.message.to_string())
        }
        CmdError::Standard(wd) if matches!(wd.error, ErrorStatus::NoSuchWindow) => {
            BrowserError::SessionLost(wd.message.to_string())
        }
        CmdError::Lost(e) => BrowserError::SessionLost(e.to_string()),
        other => BrowserError::Command(other.to_string()),
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    type Element = WebDriverElement;

    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        debug!(url, "goto");
        self.client.goto(url).await.map_err(|e| classify(None, e))
    }

    async fn title(&self) -> BrowserResult<String> {
        self.client.title().await.map_err(|e| classify(None, e))
    }

    async fn find_element(&self, locator: &Locator) -> BrowserResult<Self::Element> {
        let inner = self
            .client
            .find(Self::to_fantoccini(locator))
            .await
            .map_err(|e| classify(Some(locator.selector()), e))?;
        Ok(WebDriverElement { inner })
    }

    async fn wait_for_element(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> BrowserResult<Self::Element> {
        let found = self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Self::to_fantoccini(locator))
            .await;
        match found {
            Ok(inner) => Ok(WebDriverElement { inner }),
            Err(CmdError::WaitTimeout) => Err(BrowserError::Timeout {
                selector: locator.selector().to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
            Err(e) => Err(classify(Some(locator.selector()), e)),
        }
    }

    async fn execute_script(&self, script: &str) -> BrowserResult<Value> {
        self.client
            .execute(script, vec![])
            .await
            .map_err(|e| classify(None, e))
    }

    async fn scroll_into_view(&self, element: &Self::Element) -> BrowserResult<()> {
        let arg = Self::element_arg(element)?;
        self.client
            .execute("arguments[0].scrollIntoView(true);", vec![arg])
            .await
            .map(|_| ())
            .map_err(|e| classify(None, e))
    }

    async fn move_pointer_to(
        &self,
        element: &Self::Element,
        x_offset: i64,
        y_offset: i64,
    ) -> BrowserResult<()> {
        // Pointer origins are element centres; shift to the top-left corner.
        let (_, _, width, height) = element
            .inner
            .rectangle()
            .await
            .map_err(|e| classify(None, e))?;
        let dx = x_offset as f64 - width / 2.0;
        let dy = y_offset as f64 - height / 2.0;

        let actions = MouseActions::new("mouse".to_string()).then(PointerAction::MoveToElement {
            element: element.inner.clone(),
            duration: None,
            x: dx as _,
            y: dy as _,
        });
        self.client
            .perform_actions(actions)
            .await
            .map_err(|e| classify(None, e))
    }

    async fn set_window_size(&self, width: u32, height: u32) -> BrowserResult<()> {
        self.client
            .set_window_size(width, height)
            .await
            .map_err(|e| classify(None, e))
    }

    async fn screenshot(&self) -> BrowserResult<Vec<u8>> {
        self.client.screenshot().await.map_err(|e| classify(None, e))
    }

    async fn quit(&self) -> BrowserResult<()> {
        self.client
            .clone()
            .close()
            .await
            .map_err(|e| classify(None, e))
    }
}

/// A located element of a [`WebDriverSession`].
#[derive(Debug, Clone)]
pub struct WebDriverElement {
    inner: Element,
}

#[async_trait]
impl ElementHandle for WebDriverElement {
    async fn text(&self) -> BrowserResult<String> {
        self.inner.text().await.map_err(|e| classify(None, e))
    }

    async fn is_selected(&self) -> BrowserResult<bool> {
        self.inner.is_selected().await.map_err(|e| classify(None, e))
    }

    async fn is_displayed(&self) -> BrowserResult<bool> {
        self.inner.is_displayed().await.map_err(|e| classify(None, e))
    }

    async fn click(&self) -> BrowserResult<()> {
        self.inner.click().await.map_err(|e| classify(None, e))
    }

    async fn clear(&self) -> BrowserResult<()> {
        self.inner.clear().await.map_err(|e| classify(None, e))
    }

    async fn send_keys(&self, text: &str) -> BrowserResult<()> {
        self.inner.send_keys(text).await.map_err(|e| classify(None, e))
    }

    async fn rect(&self) -> BrowserResult<Rect> {
        let (x, y, width, height) = self.inner.rectangle().await.map_err(|e| classify(None, e))?;
        Ok(Rect::new(x, y, width, height))
    }
}
