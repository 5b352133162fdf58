use serde::{Deserialize, Serialize};

use crate::spec::context::{RunResults, Summary};
use crate::spec::runner::RunOutcome;
use crate::spec::spec_model::Viewport;

// ============================================================================
// Run report: aggregates the results of every viewport pass
// ============================================================================

/// Outcome of one step, flattened for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub case: String,
    pub step: String,
    pub passed: bool,
    pub errors: Vec<String>,

    /// Screenshot path relative to the run output root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

/// One viewport pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportReport {
    pub viewport: String,
    pub size: Viewport,
    pub summary: Summary,
    pub steps: Vec<StepReport>,

    /// Error that cut the pass short
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated report for a whole run.
///
/// Built from `RunResults` via `from_results()` or from a finished run via
/// `from_outcome()`. Consumed by the console, HTML, and JUnit reporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Name of the test specification
    pub name: String,

    /// Steps counted across every viewport
    pub total: usize,
    pub passed: usize,
    pub failed: usize,

    /// Total execution duration in milliseconds (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,

    pub viewports: Vec<ViewportReport>,
}

impl RunReport {
    /// Build a report from per-viewport results.
    pub fn from_results(name: &str, results: Vec<RunResults>) -> Self {
        let viewports = results.iter().map(|r| viewport_report(r, None)).collect();
        Self::from_viewports(name, viewports)
    }

    /// Build a report from a finished run, keeping pass-level errors and the
    /// run duration.
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        let viewports = outcome
            .passes
            .iter()
            .map(|p| viewport_report(&p.results, p.error.clone()))
            .collect();
        Self::from_viewports(&outcome.name, viewports).with_duration(outcome.duration.as_millis())
    }

    fn from_viewports(name: &str, viewports: Vec<ViewportReport>) -> Self {
        let steps = viewports.iter().flat_map(|v| v.steps.iter());
        let total = steps.clone().count();
        let passed = steps.filter(|s| s.passed).count();
        Self {
            name: name.to_string(),
            total,
            passed,
            failed: total - passed,
            duration_ms: None,
            viewports,
        }
    }

    /// Set the total execution duration.
    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Whether every step of every viewport passed and no pass was cut short.
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.viewports.iter().all(|v| v.error.is_none())
    }
}

fn viewport_report(results: &RunResults, error: Option<String>) -> ViewportReport {
    let steps = results
        .steps()
        .map(|(case, step, result)| StepReport {
            case: case.to_string(),
            step: step.to_string(),
            passed: result.passed(),
            errors: result.errors.clone(),
            screenshot: result
                .screenshot
                .as_ref()
                .map(|s| format!("{}/{}", results.viewport, s)),
        })
        .collect();
    ViewportReport {
        viewport: results.viewport.clone(),
        size: results.viewport_size,
        summary: results.summary,
        steps,
        error,
    }
}
