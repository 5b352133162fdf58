use std::io::Write;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use e2e_workflow::browser::webdriver::Engine;
use e2e_workflow::cli::commands::{cmd_report, render_plan, render_report};
use e2e_workflow::cli::config::{
    AppConfig, Cli, Commands, DEFAULT_SPEC, HeightCorrection, build_run_options,
    build_webdriver_config, hub_url_from, load_config, output_root,
};
use e2e_workflow::report::report_model::RunReport;
use e2e_workflow::spec::runner::write_results;
use e2e_workflow::spec::spec_model::TestStep;

use crate::common::utils::{case, recorder, spec};

mod common;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_run_defaults() {
    let cli = Cli::parse_from(["e2e-workflow", "run"]);
    match cli.command {
        Commands::Run {
            cfg,
            hub,
            browser,
            format,
            output,
        } => {
            assert_eq!(cfg, DEFAULT_SPEC);
            assert!(hub.is_none());
            assert!(browser.is_none());
            assert!(format.is_none());
            assert!(output.is_none());
        }
        _ => panic!("Expected Run command"),
    }
    assert_eq!(cli.verbose, 0);
}

#[test]
fn cli_parse_run_all_args() {
    let cli = Cli::parse_from([
        "e2e-workflow",
        "run",
        "--cfg",
        "config/shop.yaml",
        "--hub",
        "http://grid:4444/wd/hub",
        "--browser",
        "firefox",
        "--format",
        "junit",
        "-o",
        "report.xml",
    ]);
    match cli.command {
        Commands::Run {
            cfg,
            hub,
            browser,
            format,
            output,
        } => {
            assert_eq!(cfg, "config/shop.yaml");
            assert_eq!(hub.as_deref(), Some("http://grid:4444/wd/hub"));
            assert_eq!(browser, Some(Engine::Firefox));
            assert_eq!(format.as_deref(), Some("junit"));
            assert_eq!(output.as_deref(), Some("report.xml"));
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn cli_parse_report() {
    let cli = Cli::parse_from(["e2e-workflow", "report", "--results", "results/shop/Mobile/results.json"]);
    match cli.command {
        Commands::Report {
            results,
            format,
            output,
        } => {
            assert_eq!(results, "results/shop/Mobile/results.json");
            assert_eq!(format, "console");
            assert!(output.is_none());
        }
        _ => panic!("Expected Report command"),
    }
}

#[test]
fn cli_parse_global_flags_after_subcommand() {
    let cli = Cli::parse_from(["e2e-workflow", "check", "-vv", "--config", "ci.yaml"]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.config.as_deref(), Some("ci.yaml"));
    assert!(matches!(cli.command, Commands::Check { ref cfg } if cfg == DEFAULT_SPEC));
}

#[test]
fn cli_rejects_unknown_browser() {
    let result = Cli::try_parse_from(["e2e-workflow", "run", "--browser", "safari"]);
    assert!(result.is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn missing_config_file_gives_defaults() {
    let config = load_config(Some("/nonexistent/e2e-workflow.yaml"));
    assert_eq!(config.browser, Engine::Chrome);
    assert!(config.headless);
    assert_eq!(config.wait_timeout_ms, 2000);
    assert_eq!(config.hover_offset, 5);
    assert_eq!(config.height_correction.chrome, 110);
    assert_eq!(config.height_correction.firefox, 0);
    assert_eq!(config.results_dir, "results");
    assert_eq!(config.report.format, "console");
}

#[test]
fn partial_config_file_keeps_other_defaults() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "hub_url: http://grid:4444/wd/hub\nbrowser: firefox\nheight_correction:\n  firefox: 74\nreport:\n  format: html"
    )
    .unwrap();

    let config = load_config(file.path().to_str());
    assert_eq!(config.hub_url, "http://grid:4444/wd/hub");
    assert_eq!(config.browser, Engine::Firefox);
    assert_eq!(config.height_correction.firefox, 74);
    assert_eq!(config.height_correction.chrome, 110);
    assert_eq!(config.report.format, "html");
    assert_eq!(config.wait_timeout_ms, 2000);
}

#[test]
fn malformed_config_file_gives_defaults() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "wait_timeout_ms: [not, a, number]").unwrap();
    let config = load_config(file.path().to_str());
    assert_eq!(config.wait_timeout_ms, 2000);
}

#[test]
fn hub_url_from_host_and_port() {
    assert_eq!(hub_url_from(Some("grid"), Some("4445")), "http://grid:4445/wd/hub");
    assert_eq!(hub_url_from(Some("grid"), None), "http://localhost:4444/wd/hub");
    assert_eq!(hub_url_from(None, None), "http://localhost:4444/wd/hub");
    assert_eq!(hub_url_from(Some(""), Some("4444")), "http://localhost:4444/wd/hub");
}

#[test]
fn height_correction_per_engine() {
    let correction = HeightCorrection::default();
    assert_eq!(correction.for_engine(Engine::Chrome), 110);
    assert_eq!(correction.for_engine(Engine::Firefox), 0);
}

// ============================================================================
// Config Builder Tests
// ============================================================================

#[test]
fn cli_values_override_config_file() {
    let config = AppConfig::default();
    let webdriver = build_webdriver_config(&config, Some("http://grid/wd/hub"), Some(Engine::Firefox));
    assert_eq!(webdriver.hub_url, "http://grid/wd/hub");
    assert_eq!(webdriver.engine, Engine::Firefox);

    let webdriver = build_webdriver_config(&config, None, None);
    assert_eq!(webdriver.hub_url, config.hub_url);
    assert_eq!(webdriver.engine, Engine::Chrome);
}

#[test]
fn run_options_follow_engine_and_config() {
    let config = AppConfig {
        wait_timeout_ms: 500,
        ..AppConfig::default()
    };
    let spec = spec(vec![]);
    let options = build_run_options(&config, Engine::Chrome, &spec, Path::new("config/shop.yaml"));
    assert_eq!(options.step.wait_timeout, Duration::from_millis(500));
    assert_eq!(options.step.height_correction, 110);
    assert_eq!(options.step.hover_offset, 5);

    let options = build_run_options(&config, Engine::Firefox, &spec, Path::new("config/shop.yaml"));
    assert_eq!(options.step.height_correction, 0);
}

#[test]
fn output_root_prefers_dump_directory() {
    let config = AppConfig::default();
    let mut spec = spec(vec![]);
    assert_eq!(
        output_root(&config, &spec, Path::new("config/shop.yaml")),
        Path::new("results").join("shop")
    );

    spec.dump_directory = Some("/tmp/dump".into());
    assert_eq!(
        output_root(&config, &spec, Path::new("config/shop.yaml")),
        Path::new("/tmp/dump")
    );
}

// ============================================================================
// Command Helper Tests
// ============================================================================

#[test]
fn plan_lists_viewport_case_step_matrix() {
    let spec = spec(vec![(
        "home",
        case(
            "http://example.test/",
            vec![
                ("open", TestStep::default()),
                (
                    "go",
                    TestStep {
                        click: Some("#go".into()),
                        ..TestStep::default()
                    },
                ),
            ],
        ),
    )]);
    let plan = render_plan(&spec);
    assert!(plan.starts_with("Example: 1 viewport(s), 1 case(s), 2 step(s) per viewport\n"));
    assert!(plan.contains("[Mobile] 320x568"));
    assert!(plan.contains("  home -> http://example.test/\n"));
    assert!(plan.contains("    - open (screenshot only)\n"));
    assert!(plan.contains("    - go\n"));
}

#[test]
fn render_report_falls_back_to_console() {
    let report = RunReport::from_results("Shop", vec![]);
    assert!(render_report(&report, "html").starts_with("<!DOCTYPE html>"));
    assert!(render_report(&report, "junit").starts_with("<?xml"));
    assert!(render_report(&report, "markdown").starts_with("=== Results:"));
}

#[tokio::test]
async fn report_command_renders_saved_results() {
    let dir = tempfile::tempdir().unwrap();
    let mut rec = recorder();
    rec.begin_case("home");
    let key = rec.begin_step("home", "s1", &TestStep::default());
    rec.record_error(&key, "#x not found");
    rec.finish_step(&key);
    let results_path = write_results(dir.path(), &rec.finalize()).await.unwrap();

    let out = dir.path().join("report.xml");
    let all_passed = cmd_report(
        results_path.to_str().unwrap(),
        "junit",
        out.to_str(),
    )
    .unwrap();
    assert!(!all_passed);

    let xml = std::fs::read_to_string(&out).unwrap();
    assert!(xml.contains("<testcase name=\"s1\" classname=\"home\">"));
    assert!(xml.contains("#x not found"));
}
