use crate::report::report_model::RunReport;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a run report for terminal output.
///
/// Produces output like:
/// ```text
/// === Checkout: desktop (1280x800) ===
///
/// ✓ PASS  login / open
/// ✗ FAIL  login / submit
///     #user not found
///
/// === Results: 1 passed, 1 failed (2 total) ===
/// ```
pub fn format_console_report(report: &RunReport) -> String {
    let mut out = String::new();

    for viewport in &report.viewports {
        out.push_str(&format!(
            "=== {}: {} ({}) ===\n\n",
            report.name, viewport.viewport, viewport.size
        ));

        for step in &viewport.steps {
            let marker = if step.passed {
                "\u{2713} PASS"
            } else {
                "\u{2717} FAIL"
            };
            out.push_str(&format!("{}  {} / {}\n", marker, step.case, step.step));
            for error in &step.errors {
                out.push_str(&format!("    {}\n", error));
            }
        }

        if let Some(ref error) = viewport.error {
            out.push_str(&format!("    [ERROR] {}\n", error));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "=== Results: {} passed, {} failed ({} total)",
        report.passed, report.failed, report.total
    ));

    if let Some(ms) = report.duration_ms {
        let secs = ms as f64 / 1000.0;
        out.push_str(&format!(" in {:.1}s", secs));
    }

    out.push_str(" ===\n");

    out
}
