use crate::report::report_model::{RunReport, ViewportReport};

// ============================================================================
// HTML reporter: self-contained HTML report
// ============================================================================

/// Generate a self-contained HTML report.
///
/// One section per viewport. Failed steps list their errors and link the
/// step screenshot relative to the run output root.
pub fn generate_html_report(report: &RunReport) -> String {
    let header_color = if report.all_passed() {
        "#4CAF50"
    } else {
        "#f44336"
    };

    let status_text = if report.all_passed() {
        "ALL STEPS PASSED"
    } else {
        "SOME STEPS FAILED"
    };

    let duration_text = report
        .duration_ms
        .map(|ms| format!(" in {:.1}s", ms as f64 / 1000.0))
        .unwrap_or_default();

    let sections: String = report.viewports.iter().map(viewport_section).collect();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{name} - E2E Report</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; padding: 0; background: #f5f5f5; }}
.header {{ background: {header_color}; color: white; padding: 20px 30px; }}
.header h1 {{ margin: 0 0 8px 0; font-size: 24px; }}
.header p {{ margin: 0; font-size: 16px; opacity: 0.9; }}
.content {{ max-width: 900px; margin: 20px auto; padding: 0 20px; }}
.viewport h2 {{ font-size: 18px; margin: 24px 0 12px 0; }}
.step {{ background: white; border-radius: 6px; padding: 12px 20px; margin-bottom: 8px; border-left: 4px solid #ccc; }}
.step.pass {{ border-left-color: #4CAF50; }}
.step.fail {{ border-left-color: #f44336; }}
.step h3 {{ margin: 0; font-size: 15px; }}
.step a {{ font-size: 13px; }}
.error {{ color: #f44336; font-weight: bold; }}
.failures {{ margin: 8px 0 0 0; padding-left: 20px; }}
.failures li {{ color: #c62828; font-size: 13px; margin-bottom: 4px; }}
</style>
</head>
<body>
<div class="header">
<h1>{status_text}</h1>
<p>{name}: {passed} passed, {failed} failed ({total} total){duration}</p>
</div>
<div class="content">
{sections}
</div>
</body>
</html>"##,
        name = escape_html(&report.name),
        header_color = header_color,
        status_text = status_text,
        passed = report.passed,
        failed = report.failed,
        total = report.total,
        duration = duration_text,
        sections = sections,
    )
}

fn viewport_section(viewport: &ViewportReport) -> String {
    let mut out = format!(
        "<div class=\"viewport\">\n<h2>{} ({}) - {} of {} steps passed</h2>\n",
        escape_html(&viewport.viewport),
        viewport.size,
        viewport.summary.success,
        viewport.summary.total,
    );

    if let Some(ref error) = viewport.error {
        out.push_str(&format!(
            "<p class=\"error\">Error: {}</p>\n",
            escape_html(error)
        ));
    }

    for step in &viewport.steps {
        let (class, marker) = if step.passed {
            ("pass", "\u{2713}")
        } else {
            ("fail", "\u{2717}")
        };
        out.push_str(&format!(
            "<div class=\"step {}\">\n<h3>{} {} / {}</h3>\n",
            class,
            marker,
            escape_html(&step.case),
            escape_html(&step.step),
        ));
        if let Some(ref shot) = step.screenshot {
            out.push_str(&format!(
                "<a href=\"{}\">screenshot</a>\n",
                escape_html(shot)
            ));
        }
        if !step.errors.is_empty() {
            out.push_str("<ul class=\"failures\">\n");
            for error in &step.errors {
                out.push_str(&format!("<li>{}</li>\n", escape_html(error)));
            }
            out.push_str("</ul>\n");
        }
        out.push_str("</div>\n");
    }

    out.push_str("</div>\n");
    out
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
