use std::fmt;

use serde::Serialize;

/// Engine-level element locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "using", content = "value", rename_all = "lowercase")]
pub enum Locator {
    XPath(String),
    Css(String),
}

impl Locator {
    /// The selector string as written in the test specification.
    pub fn selector(&self) -> &str {
        match self {
            Locator::XPath(s) | Locator::Css(s) => s,
        }
    }

    pub fn is_xpath(&self) -> bool {
        matches!(self, Locator::XPath(_))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

/// Classify a selector: `//...` is XPath, anything else is CSS.
///
/// A bare `//` with nothing after it is treated as CSS and left for the
/// engine to reject.
pub fn resolve(selector: &str) -> Locator {
    if selector.len() > 2 && selector.starts_with("//") {
        Locator::XPath(selector.to_string())
    } else {
        Locator::Css(selector.to_string())
    }
}
