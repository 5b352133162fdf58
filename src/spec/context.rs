use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::browser::session::Rect;
use crate::spec::spec_model::{TestStep, Viewport};

/// Step counters for one viewport pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub executed: usize,
    pub success: usize,
    pub fail: usize,
    pub total: usize,
}

impl Summary {
    pub fn all_passed(&self) -> bool {
        self.fail == 0
    }
}

/// Outcome of a single executed step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// The step as declared in the specification
    pub config: TestStep,

    /// Failure messages in the order they were recorded
    pub errors: Vec<String>,

    /// Screenshot path relative to the viewport directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,

    /// Whether the page was taller than the viewport, keyed by viewport name
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub vertical_scrollbar: IndexMap<String, bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_rect: Option<Rect>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_rect: Option<Rect>,
}

impl StepResult {
    fn new(config: TestStep) -> Self {
        Self {
            config,
            errors: Vec::new(),
            screenshot: None,
            vertical_scrollbar: IndexMap::new(),
            click_rect: None,
            hover_rect: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Everything one viewport pass produced; serialized to `results.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunResults {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    pub viewport: String,

    pub viewport_size: Viewport,

    pub summary: Summary,

    /// case name -> step label -> result
    pub test_cases: IndexMap<String, IndexMap<String, StepResult>>,
}

impl RunResults {
    pub fn step(&self, case: &str, label: &str) -> Option<&StepResult> {
        self.test_cases.get(case).and_then(|steps| steps.get(label))
    }

    /// All steps in execution order as `(case, label, result)`.
    pub fn steps(&self) -> impl Iterator<Item = (&str, &str, &StepResult)> {
        self.test_cases.iter().flat_map(|(case, steps)| {
            steps
                .iter()
                .map(move |(label, result)| (case.as_str(), label.as_str(), result))
        })
    }
}

/// Identifies the step that recorded data belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepKey {
    pub case: String,
    pub step: String,
}

/// Accumulates step outcomes for one viewport pass.
///
/// At most one step is open at a time. A step closes through
/// [`ResultRecorder::finish_step`], [`ResultRecorder::abort_open_step`] or
/// [`ResultRecorder::finalize`], and every closed step counts exactly once
/// as success or fail.
#[derive(Debug)]
pub struct ResultRecorder {
    results: RunResults,
    open: Option<StepKey>,
    case: Option<String>,
    deferred: Vec<String>,
}

/// Step bucket that receives case-level errors when a case has no step to
/// carry them.
pub const CASE_LEVEL_STEP: &str = "(case)";

impl ResultRecorder {
    pub fn new(name: &str, group: Option<&str>, viewport: &str, viewport_size: Viewport) -> Self {
        Self {
            results: RunResults {
                name: name.to_string(),
                group: group.map(str::to_string),
                viewport: viewport.to_string(),
                viewport_size,
                summary: Summary::default(),
                test_cases: IndexMap::new(),
            },
            open: None,
            case: None,
            deferred: Vec::new(),
        }
    }

    pub fn begin_case(&mut self, name: &str) {
        self.flush_deferred();
        info!(case = name, "test case");
        self.case = Some(name.to_string());
        self.results.test_cases.entry(name.to_string()).or_default();
    }

    /// Queue an error for the next step of the current case.
    ///
    /// Used for checks that run before any step exists, such as the title
    /// expected right after navigation. Errors still queued when the case
    /// ends land in a [`CASE_LEVEL_STEP`] bucket that counts as failed.
    pub fn defer_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.deferred.push(message);
    }

    /// Open a bucket for a step, snapshotting its declared configuration.
    pub fn begin_step(&mut self, case: &str, label: &str, config: &TestStep) -> StepKey {
        if self.open.is_some() {
            self.abort_open_step("step did not complete");
        }
        info!(case, step = label, "test step");
        self.results
            .test_cases
            .entry(case.to_string())
            .or_default()
            .insert(label.to_string(), StepResult::new(config.clone()));
        self.results.summary.total += 1;

        let key = StepKey {
            case: case.to_string(),
            step: label.to_string(),
        };
        for message in std::mem::take(&mut self.deferred) {
            if let Some(step) = self.step_mut(&key) {
                step.errors.push(message);
            }
        }
        self.open = Some(key.clone());
        key
    }

    /// Append an error to a step and echo it to the operator log.
    pub fn record_error(&mut self, key: &StepKey, message: impl Into<String>) {
        let message = message.into();
        warn!(case = %key.case, step = %key.step, "{}", message);
        if let Some(step) = self.step_mut(key) {
            step.errors.push(message);
        }
    }

    pub fn record_screenshot(&mut self, key: &StepKey, path: impl Into<String>) {
        if let Some(step) = self.step_mut(key) {
            step.screenshot = Some(path.into());
        }
    }

    pub fn record_vertical_scrollbar(&mut self, key: &StepKey, viewport: &str, present: bool) {
        if let Some(step) = self.step_mut(key) {
            step.vertical_scrollbar.insert(viewport.to_string(), present);
        }
    }

    pub fn record_click_rect(&mut self, key: &StepKey, rect: Rect) {
        if let Some(step) = self.step_mut(key) {
            step.click_rect = Some(rect);
        }
    }

    pub fn record_hover_rect(&mut self, key: &StepKey, rect: Rect) {
        if let Some(step) = self.step_mut(key) {
            step.hover_rect = Some(rect);
        }
    }

    pub fn errors(&self, key: &StepKey) -> &[String] {
        self.results
            .step(&key.case, &key.step)
            .map(|s| s.errors.as_slice())
            .unwrap_or(&[])
    }

    /// Close a step and count it. Returns whether it passed.
    ///
    /// Closing a step that is not open is a no-op returning its status.
    pub fn finish_step(&mut self, key: &StepKey) -> bool {
        let passed = self.errors(key).is_empty();
        if self.open.as_ref() != Some(key) {
            return passed;
        }
        self.open = None;

        let summary = &mut self.results.summary;
        summary.executed += 1;
        if passed {
            summary.success += 1;
        } else {
            summary.fail += 1;
        }
        passed
    }

    /// Fail and close the open step, if any, after an error that abandoned it.
    pub fn abort_open_step(&mut self, reason: &str) {
        if let Some(key) = self.open.clone() {
            self.record_error(&key, reason);
            self.finish_step(&key);
        }
    }

    pub fn summary(&self) -> Summary {
        self.results.summary
    }

    /// Close anything still open and hand back the pass results.
    pub fn finalize(mut self) -> RunResults {
        self.abort_open_step("step did not complete");
        self.flush_deferred();
        self.results
    }

    fn flush_deferred(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        match self.case.clone() {
            Some(case) => {
                let key = self.begin_step(&case, CASE_LEVEL_STEP, &TestStep::default());
                self.finish_step(&key);
            }
            None => self.deferred.clear(),
        }
    }

    fn step_mut(&mut self, key: &StepKey) -> Option<&mut StepResult> {
        self.results
            .test_cases
            .get_mut(&key.case)
            .and_then(|steps| steps.get_mut(&key.step))
    }
}
