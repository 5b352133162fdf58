use crate::report::report_model::{RunReport, StepReport};

// ============================================================================
// JUnit XML reporter: standard CI integration format
// ============================================================================

/// Generate a JUnit XML report for CI systems.
///
/// One `<testsuite>` per viewport, one `<testcase>` per step:
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <testsuites name="Checkout" tests="2" failures="1" time="1.234">
///   <testsuite name="desktop" tests="2" failures="1">
///     <testcase name="open" classname="login" />
///     <testcase name="submit" classname="login">
///       <failure message="1 error(s)" type="StepFailure">#user not found</failure>
///     </testcase>
///   </testsuite>
/// </testsuites>
/// ```
pub fn generate_junit_xml(report: &RunReport) -> String {
    let time_attr = report
        .duration_ms
        .map(|ms| format!(" time=\"{:.3}\"", ms as f64 / 1000.0))
        .unwrap_or_default();

    let mut suites = String::new();
    for viewport in &report.viewports {
        let failures = viewport.steps.iter().filter(|s| !s.passed).count();
        suites.push_str(&format!(
            "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\">\n",
            escape_xml(&viewport.viewport),
            viewport.steps.len(),
            failures,
        ));
        for step in &viewport.steps {
            suites.push_str(&testcase(step));
        }
        if let Some(ref error) = viewport.error {
            suites.push_str(&format!(
                "    <system-err>{}</system-err>\n",
                escape_xml(error)
            ));
        }
        suites.push_str("  </testsuite>\n");
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuites name=\"{name}\" tests=\"{tests}\" failures=\"{failures}\"{time}>\n{suites}</testsuites>\n",
        name = escape_xml(&report.name),
        tests = report.total,
        failures = report.failed,
        time = time_attr,
        suites = suites,
    )
}

fn testcase(step: &StepReport) -> String {
    if step.passed {
        return format!(
            "    <testcase name=\"{}\" classname=\"{}\" />\n",
            escape_xml(&step.step),
            escape_xml(&step.case)
        );
    }
    format!(
        "    <testcase name=\"{name}\" classname=\"{class}\">\n      <failure message=\"{message}\" type=\"StepFailure\">{body}</failure>\n    </testcase>\n",
        name = escape_xml(&step.step),
        class = escape_xml(&step.case),
        message = format!("{} error(s)", step.errors.len()),
        body = escape_xml(&step.errors.join("\n")),
    )
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
