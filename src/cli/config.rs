use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::browser::webdriver::{Engine, WebDriverConfig};
use crate::spec::executor::StepOptions;
use crate::spec::runner::RunOptions;
use crate::spec::spec_model::TestSpecification;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

/// Default test specification path, relative to the working directory.
pub const DEFAULT_SPEC: &str = "config/default.yaml";

/// Default run configuration file.
pub const DEFAULT_CONFIG: &str = "e2e-workflow.yaml";

#[derive(Parser, Debug)]
#[command(
    name = "e2e-workflow",
    version,
    about = "Browser-driven end-to-end test runner"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: e2e-workflow.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a test specification against a WebDriver hub
    Run {
        /// Path to the test specification (YAML or JSON)
        #[arg(long, default_value = DEFAULT_SPEC)]
        cfg: String,

        /// WebDriver hub URL (overrides config and HUB_HOST/HUB_PORT)
        #[arg(long)]
        hub: Option<String>,

        /// Browser engine
        #[arg(long, value_enum)]
        browser: Option<Engine>,

        /// Output format: console, html, junit
        #[arg(long)]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Render a report from an existing results.json
    Report {
        /// Path to a results.json written by a previous run
        #[arg(long)]
        results: String,

        /// Output format: console, html, junit
        #[arg(long, default_value = "console")]
        format: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate a test specification and list what a run would execute
    Check {
        /// Path to the test specification (YAML or JSON)
        #[arg(long, default_value = DEFAULT_SPEC)]
        cfg: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `e2e-workflow.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_hub_url")]
    pub hub_url: String,

    #[serde(default)]
    pub browser: Engine,

    #[serde(default = "default_true")]
    pub headless: bool,

    /// Upper bound for each `waitForElements` selector
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Pointer offset from the hovered element's top-left corner
    #[serde(default = "default_hover_offset")]
    pub hover_offset: i64,

    #[serde(default)]
    pub height_correction: HeightCorrection,

    /// Output root for specifications without a `dumpDirectory`
    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hub_url: default_hub_url(),
            browser: Engine::default(),
            headless: true,
            wait_timeout_ms: default_wait_timeout_ms(),
            hover_offset: default_hover_offset(),
            height_correction: HeightCorrection::default(),
            results_dir: default_results_dir(),
            report: ReportConfig::default(),
        }
    }
}

/// Pixels each engine's window chrome takes from the content height.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeightCorrection {
    #[serde(default = "default_chrome_correction")]
    pub chrome: u32,

    #[serde(default)]
    pub firefox: u32,
}

impl Default for HeightCorrection {
    fn default() -> Self {
        Self {
            chrome: default_chrome_correction(),
            firefox: 0,
        }
    }
}

impl HeightCorrection {
    pub fn for_engine(&self, engine: Engine) -> u32 {
        match engine {
            Engine::Chrome => self.chrome,
            Engine::Firefox => self.firefox,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_console")]
    pub format: String,

    pub output: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "console".to_string(),
            output: None,
        }
    }
}

// Serde default helpers
fn default_true() -> bool { true }
fn default_wait_timeout_ms() -> u64 { 2000 }
fn default_hover_offset() -> i64 { 5 }
fn default_chrome_correction() -> u32 { 110 }
fn default_results_dir() -> String { "results".to_string() }
fn default_console() -> String { "console".to_string() }

fn default_hub_url() -> String {
    hub_url_from(
        std::env::var("HUB_HOST").ok().as_deref(),
        std::env::var("HUB_PORT").ok().as_deref(),
    )
}

/// Hub URL from `HUB_HOST`/`HUB_PORT`, falling back to a local hub.
pub fn hub_url_from(host: Option<&str>, port: Option<&str>) -> String {
    match (host, port) {
        (Some(host), Some(port)) if !host.is_empty() && !port.is_empty() => {
            format!("http://{}:{}/wd/hub", host, port)
        }
        _ => "http://localhost:4444/wd/hub".to_string(),
    }
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Build the WebDriver connection settings; CLI values win over the file.
pub fn build_webdriver_config(
    config: &AppConfig,
    hub: Option<&str>,
    browser: Option<Engine>,
) -> WebDriverConfig {
    WebDriverConfig {
        hub_url: hub.map(str::to_string).unwrap_or_else(|| config.hub_url.clone()),
        engine: browser.unwrap_or(config.browser),
        headless: config.headless,
    }
}

/// Build run options for a loaded specification.
pub fn build_run_options(
    config: &AppConfig,
    engine: Engine,
    spec: &TestSpecification,
    spec_path: &Path,
) -> RunOptions {
    RunOptions {
        output_root: output_root(config, spec, spec_path),
        step: StepOptions {
            wait_timeout: Duration::from_millis(config.wait_timeout_ms),
            hover_offset: config.hover_offset,
            height_correction: config.height_correction.for_engine(engine),
        },
    }
}

/// `dumpDirectory` when the specification sets one, else
/// `<results_dir>/<spec file stem>`.
pub fn output_root(config: &AppConfig, spec: &TestSpecification, spec_path: &Path) -> PathBuf {
    match &spec.dump_directory {
        Some(dir) => PathBuf::from(dir),
        None => {
            let stem = spec_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "default".to_string());
            Path::new(&config.results_dir).join(stem)
        }
    }
}
