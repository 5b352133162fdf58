use std::time::Duration;

use futures::future::join_all;
use indexmap::IndexMap;
use serde_json::Value;

use crate::browser::selector::resolve;
use crate::browser::session::{BrowserSession, ElementHandle, Rect, SCROLL_TOP};
use crate::error::{BrowserError, BrowserResult};
use crate::spec::spec_model::InputValue;

// ============================================================================
// Step action handlers
//
// Each handler converts its own failures into messages pushed onto `errors`
// and keeps going. The only `Err` a handler returns is a fatal session error,
// after its message has been pushed like any other.
// ============================================================================

/// A single failed check.
#[derive(Debug)]
struct Failure {
    message: String,
    fatal: Option<BrowserError>,
}

impl Failure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: None,
        }
    }

    /// A failed command: `message` unless the session itself died.
    fn command(err: BrowserError, message: impl Into<String>) -> Self {
        let fatal = err.is_fatal().then_some(err);
        Self {
            message: message.into(),
            fatal,
        }
    }

    /// A failed lookup. Malformed selectors get their own message so they
    /// can be told apart from elements that are simply missing.
    fn lookup(selector: &str, err: BrowserError, not_found: impl Into<String>) -> Self {
        match err {
            BrowserError::InvalidSelector { message, .. } => {
                Self::new(format!("\"{}\" {}", selector, message))
            }
            other => Self::command(other, not_found),
        }
    }
}

/// Push every failure message, then surface the first fatal error.
fn settle(
    failures: impl IntoIterator<Item = Failure>,
    errors: &mut Vec<String>,
) -> BrowserResult<()> {
    let mut fatal = None;
    for failure in failures {
        errors.push(failure.message);
        if fatal.is_none() {
            fatal = failure.fatal;
        }
    }
    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// chai-style equality message.
fn mismatch(actual: &str, expected: &str) -> String {
    format!("expected '{}' to equal '{}'", actual, expected)
}

/// Wait for every selector to match at least one element.
pub async fn wait_for_elements<S: BrowserSession>(
    session: &S,
    selectors: &[String],
    timeout: Duration,
    errors: &mut Vec<String>,
) -> BrowserResult<()> {
    let mut failures = Vec::new();
    for selector in selectors {
        let locator = resolve(selector);
        if let Err(e) = session.wait_for_element(&locator, timeout).await {
            let message = format!("{} could not waitForElements: {}", selector, e);
            let fatal = e.is_fatal();
            failures.push(Failure::lookup(selector, e, message));
            if fatal {
                break;
            }
        }
    }
    settle(failures, errors)
}

/// Compare the document title with the expected one.
pub async fn title<S: BrowserSession>(
    session: &S,
    expected: &str,
    errors: &mut Vec<String>,
) -> BrowserResult<()> {
    let failure = match session.title().await {
        Ok(actual) if actual == expected => None,
        Ok(actual) => Some(Failure::new(format!("title: {}", mismatch(&actual, expected)))),
        Err(e) => {
            let message = format!("title: {}", e);
            Some(Failure::command(e, message))
        }
    };
    settle(failure, errors)
}

/// Move the pointer near the element's top-left corner and return its
/// bounding rectangle.
pub async fn hover<S: BrowserSession>(
    session: &S,
    selector: &str,
    offset: i64,
    errors: &mut Vec<String>,
) -> BrowserResult<Option<Rect>> {
    let element = match session.find_element(&resolve(selector)).await {
        Ok(element) => element,
        Err(e) => {
            let failure = Failure::lookup(selector, e, format!("{} could not hover", selector));
            return settle(Some(failure), errors).map(|_| None);
        }
    };

    let outcome = async {
        session.move_pointer_to(&element, offset, offset).await?;
        element.rect().await
    }
    .await;

    match outcome {
        Ok(rect) => Ok(Some(rect)),
        Err(e) => {
            let failure = Failure::command(e, format!("{} could not hover", selector));
            settle(Some(failure), errors).map(|_| None)
        }
    }
}

/// Check that every selector exists and, where an expected text is given,
/// that its text matches. All selectors are checked concurrently.
pub async fn elements<S: BrowserSession>(
    session: &S,
    expected: &IndexMap<String, Option<String>>,
    errors: &mut Vec<String>,
) -> BrowserResult<()> {
    let checks = expected.iter().map(|(selector, text)| async move {
        let element = match session.find_element(&resolve(selector)).await {
            Ok(element) => element,
            Err(e) => {
                return Some(Failure::lookup(selector, e, format!("{} not found", selector)));
            }
        };
        let actual = match element.text().await {
            Ok(actual) => actual,
            Err(e) => {
                let message = format!("\"{}\" text: {}", selector, e);
                return Some(Failure::command(e, message));
            }
        };
        match text.as_deref().filter(|t| !t.is_empty()) {
            Some(wanted) if actual != wanted => Some(Failure::new(format!(
                "\"{}\" text: {}",
                selector,
                mismatch(&actual, wanted)
            ))),
            _ => None,
        }
    });

    let failures = join_all(checks).await.into_iter().flatten();
    settle(failures, errors)
}

/// Every selector must fail to resolve.
pub async fn elements_not_exist<S: BrowserSession>(
    session: &S,
    selectors: &[String],
    errors: &mut Vec<String>,
) -> BrowserResult<()> {
    let mut failures = Vec::new();
    for selector in selectors {
        match session.find_element(&resolve(selector)).await {
            Ok(_) => failures.push(Failure::new(format!("{} should not exist", selector))),
            Err(BrowserError::InvalidSelector { message, .. }) => {
                failures.push(Failure::new(format!("\"{}\" {}", selector, message)));
            }
            Err(e) if e.is_fatal() => {
                let message = format!("{} could not be checked: {}", selector, e);
                failures.push(Failure::command(e, message));
                break;
            }
            Err(_) => {}
        }
    }
    settle(failures, errors)
}

/// Every selector must resolve to an element that is hidden.
pub async fn elements_not_visible<S: BrowserSession>(
    session: &S,
    selectors: &[String],
    errors: &mut Vec<String>,
) -> BrowserResult<()> {
    let mut failures = Vec::new();
    for selector in selectors {
        let failure = match session.find_element(&resolve(selector)).await {
            Err(e) => Some(Failure::lookup(selector, e, format!("{} should exist", selector))),
            Ok(element) => match element.is_displayed().await {
                Ok(false) => None,
                Ok(true) => Some(Failure::new(format!("{} should not be visible", selector))),
                Err(e) => {
                    let message = format!("{} should not be visible: {}", selector, e);
                    Some(Failure::command(e, message))
                }
            },
        };
        if let Some(failure) = failure {
            let fatal = failure.fatal.is_some();
            failures.push(failure);
            if fatal {
                break;
            }
        }
    }
    settle(failures, errors)
}

/// Fill text fields and set checkbox/radio/option states, in declared order.
pub async fn input<S: BrowserSession>(
    session: &S,
    fields: &IndexMap<String, InputValue>,
    errors: &mut Vec<String>,
) -> BrowserResult<()> {
    let mut failures = Vec::new();
    for (selector, value) in fields {
        if let Some(failure) = input_one(session, selector, value).await {
            let fatal = failure.fatal.is_some();
            failures.push(failure);
            if fatal {
                break;
            }
        }
    }
    settle(failures, errors)
}

async fn input_one<S: BrowserSession>(
    session: &S,
    selector: &str,
    value: &InputValue,
) -> Option<Failure> {
    if let InputValue::Unsupported(raw) = value {
        return Some(Failure::new(format!(
            "{} input unprocessed: {}",
            selector,
            display_raw(raw)
        )));
    }

    let element = match session.find_element(&resolve(selector)).await {
        Ok(element) => element,
        Err(e) => {
            return Some(Failure::lookup(
                selector,
                e,
                format!("{} input field not found", selector),
            ));
        }
    };

    let outcome = match value {
        InputValue::Text(text) => async {
            element.clear().await?;
            element.send_keys(text).await
        }
        .await,
        InputValue::Toggle(wanted) => async {
            if element.is_selected().await? != *wanted {
                element.click().await?;
            }
            Ok::<(), BrowserError>(())
        }
        .await,
        InputValue::Unsupported(_) => Ok(()),
    };

    outcome
        .err()
        .map(|e| Failure::command(e, format!("{} no input field", selector)))
}

fn display_raw(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Scroll the element into view, take its rectangle (with the document
/// scroll offset) and click it.
pub async fn click<S: BrowserSession>(
    session: &S,
    selector: &str,
    errors: &mut Vec<String>,
) -> BrowserResult<Option<Rect>> {
    let element = match session.find_element(&resolve(selector)).await {
        Ok(element) => element,
        Err(e) => {
            let failure = Failure::lookup(selector, e, format!("{} could not click", selector));
            return settle(Some(failure), errors).map(|_| None);
        }
    };

    let mut rect = None;
    let outcome = async {
        session.scroll_into_view(&element).await?;
        let mut r = element.rect().await?;
        r.scroll_top = session.execute_script(SCROLL_TOP).await?.as_f64();
        rect = Some(r);
        element.click().await
    }
    .await;

    match outcome {
        Ok(()) => Ok(rect),
        Err(e) => {
            let failure = Failure::command(e, format!("{} could not click", selector));
            settle(Some(failure), errors).map(|_| rect)
        }
    }
}
