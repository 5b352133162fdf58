use std::fmt;
use std::path::{Component, Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RunError;

/// A complete test specification, loaded from YAML or JSON.
///
/// Every mapping keeps declaration order: viewports, cases and steps are a
/// sequential script, not sets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestSpecification {
    /// Human-readable name for the suite
    pub name: String,

    /// Optional grouping label shown by the results viewer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Output root; each viewport pass writes below `<dump_directory>/<viewport>/`
    #[serde(default, alias = "dumpDir", skip_serializing_if = "Option::is_none")]
    pub dump_directory: Option<String>,

    /// Window sizes to run the whole suite at, in order
    #[serde(default)]
    pub viewports: IndexMap<String, Viewport>,

    /// Test cases keyed by unique name, in order
    #[serde(default)]
    pub test_cases: IndexMap<String, TestCase>,
}

impl TestSpecification {
    /// Load a specification from YAML (`.yaml`/`.yml`) or JSON (`.json`).
    ///
    /// Other extensions are parsed as YAML, which also accepts JSON.
    pub fn load(path: &Path) -> Result<Self, RunError> {
        if !path.is_file() {
            return Err(RunError::SpecNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| RunError::io(path, e))?;
        let parse_error = |message: String| RunError::SpecParse {
            path: path.to_path_buf(),
            message,
        };

        let is_json = path.extension().is_some_and(|e| e == "json");
        let spec: Self = if is_json {
            serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?
        } else {
            serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
        };
        spec.validate().map_err(|e| parse_error(e.to_string()))?;
        Ok(spec)
    }

    /// Check that every viewport and case name can name a directory below
    /// the output root.
    pub fn validate(&self) -> Result<(), RunError> {
        let names = self
            .viewports
            .keys()
            .map(|name| ("viewport", name))
            .chain(self.test_cases.keys().map(|name| ("test case", name)));
        for (kind, name) in names {
            if !is_plain_name(name) {
                return Err(RunError::UnsafeName {
                    kind,
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Number of steps one viewport pass will execute.
    pub fn step_count(&self) -> usize {
        self.test_cases.values().map(|c| c.steps.len()).sum()
    }

    /// Whether a run would execute nothing at all.
    pub fn is_vacuous(&self) -> bool {
        self.viewports.is_empty() || self.step_count() == 0
    }
}

/// A single normal path component: not empty, absolute, `.` or `..`.
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A named sequence of steps starting from a fresh navigation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    /// Absolute URL loaded at case start
    pub uri: String,

    /// Expected document title right after navigation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Steps keyed by label, executed in declaration order
    #[serde(default)]
    pub steps: IndexMap<String, TestStep>,
}

/// One batch of assertions and actions against the current page.
///
/// Field order here is irrelevant; handlers always run as
/// `waitForElements, title, hover, elements, elementsNotExist,
/// elementsNotVisible, input, (remeasure), screenshot, click`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_elements: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<String>,

    /// selector -> expected text; empty or null only checks existence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<IndexMap<String, Option<String>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements_not_exist: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements_not_visible: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<IndexMap<String, InputValue>>,

    /// Clicked last, after the screenshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click: Option<String>,
}

impl TestStep {
    /// Whether the step declares anything to check or do.
    pub fn has_actions(&self) -> bool {
        self.wait_for_elements.is_some()
            || self.title.is_some()
            || self.hover.is_some()
            || self.elements.is_some()
            || self.elements_not_exist.is_some()
            || self.elements_not_visible.is_some()
            || self.input.is_some()
            || self.click.is_some()
    }
}

/// Value written into a form control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum InputValue {
    /// Clear the field and type this text
    Text(String),

    /// Desired checked/selected state of a checkbox, radio or option
    Toggle(bool),

    /// Anything else; reported as a configuration error when the step runs
    Unsupported(Value),
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Text(s) => f.write_str(s),
            InputValue::Toggle(b) => write!(f, "{}", b),
            InputValue::Unsupported(v) => write!(f, "{}", v),
        }
    }
}
