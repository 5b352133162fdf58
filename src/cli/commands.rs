use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::browser::webdriver::{Engine, WebDriverSession};
use crate::cli::config::{AppConfig, build_run_options, build_webdriver_config};
use crate::report::console::format_console_report;
use crate::report::html::generate_html_report;
use crate::report::junit::generate_junit_xml;
use crate::report::report_model::RunReport;
use crate::spec::runner::{TestRunner, load_results};
use crate::spec::spec_model::TestSpecification;

// ============================================================================
// run subcommand
// ============================================================================

/// Run a test specification and return whether every step passed.
pub async fn cmd_run(
    config: &AppConfig,
    spec_path: &str,
    hub: Option<&str>,
    browser: Option<Engine>,
    format: Option<&str>,
    output: Option<&str>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let path = Path::new(spec_path);
    let spec = TestSpecification::load(path)?;
    if spec.is_vacuous() {
        warn!(spec = spec_path, "specification has no viewports or no steps");
    }

    let webdriver = build_webdriver_config(config, hub, browser);
    let options = build_run_options(config, webdriver.engine, &spec, path);
    info!(
        spec = %spec.name,
        viewports = spec.viewports.len(),
        steps = spec.step_count(),
        output = %options.output_root.display(),
        "running"
    );

    if let Err(e) = check_hub(&webdriver.hub_url).await {
        warn!(hub = %webdriver.hub_url, "hub status unavailable: {}", e);
    }

    let outcome = TestRunner::run(&spec, &options, || WebDriverSession::connect(&webdriver)).await?;

    let report = RunReport::from_outcome(&outcome);
    let format = format.unwrap_or(&config.report.format);
    let output = output.or(config.report.output.as_deref());
    emit(&render_report(&report, format), output)?;

    Ok(outcome.all_passed())
}

// ============================================================================
// report subcommand
// ============================================================================

/// Re-render a saved `results.json` and return whether every step passed.
pub fn cmd_report(
    results_path: &str,
    format: &str,
    output: Option<&str>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let results = load_results(Path::new(results_path))?;
    let name = results.name.clone();
    let report = RunReport::from_results(&name, vec![results]);
    emit(&render_report(&report, format), output)?;
    Ok(report.all_passed())
}

// ============================================================================
// check subcommand
// ============================================================================

pub fn cmd_check(spec_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let spec = TestSpecification::load(Path::new(spec_path))?;
    print!("{}", render_plan(&spec));
    Ok(())
}

/// List every viewport x case x step a run would execute, in order.
pub fn render_plan(spec: &TestSpecification) -> String {
    let mut out = format!(
        "{}: {} viewport(s), {} case(s), {} step(s) per viewport\n",
        spec.name,
        spec.viewports.len(),
        spec.test_cases.len(),
        spec.step_count()
    );
    for (viewport_name, viewport) in &spec.viewports {
        out.push_str(&format!("\n[{}] {}\n", viewport_name, viewport));
        for (case_name, case) in &spec.test_cases {
            out.push_str(&format!("  {} -> {}\n", case_name, case.uri));
            for (label, step) in &case.steps {
                let marker = if step.has_actions() { "" } else { " (screenshot only)" };
                out.push_str(&format!("    - {}{}\n", label, marker));
            }
        }
    }
    out
}

// ============================================================================
// Helpers
// ============================================================================

/// Render a report in the requested format; unknown formats fall back to console.
pub fn render_report(report: &RunReport, format: &str) -> String {
    match format {
        "html" => generate_html_report(report),
        "junit" => generate_junit_xml(report),
        _ => format_console_report(report),
    }
}

/// Write to `output`, or print when none is given.
fn emit(content: &str, output: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => std::fs::write(path, content)?,
        None => print!("{}", content),
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct HubStatus {
    value: HubStatusValue,
}

#[derive(Debug, Deserialize)]
struct HubStatusValue {
    #[serde(default)]
    ready: bool,

    #[serde(default)]
    message: String,
}

/// Ask the hub's `/status` endpoint whether it can take a new session.
async fn check_hub(hub_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("{}/status", hub_url.trim_end_matches('/'));
    let status: HubStatus = reqwest::Client::new()
        .get(&url)
        .timeout(Duration::from_secs(5))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    if status.value.ready {
        info!(hub = hub_url, "hub ready: {}", status.value.message);
    } else {
        warn!(hub = hub_url, "hub not ready: {}", status.value.message);
    }
    Ok(())
}
