use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::browser::session::BrowserSession;
use crate::error::{BrowserResult, RunError};
use crate::spec::context::{ResultRecorder, RunResults, Summary};
use crate::spec::executor::{StepExecutor, StepOptions, StepTarget};
use crate::spec::spec_model::{TestCase, TestSpecification, Viewport, is_plain_name};

/// File every viewport pass serializes its results to.
pub const RESULTS_FILE: &str = "results.json";

/// Run-level settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Each viewport pass writes below `<output_root>/<viewport>/`
    pub output_root: PathBuf,

    pub step: StepOptions,
}

/// Results of one viewport pass.
#[derive(Debug, Clone)]
pub struct ViewportPass {
    pub viewport: String,
    pub output_dir: PathBuf,
    pub results: RunResults,

    /// Error that cut the pass short, if any
    pub error: Option<String>,
}

/// Results of a whole run, one entry per configured viewport.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub name: String,
    pub passes: Vec<ViewportPass>,
    pub duration: Duration,
}

impl RunOutcome {
    /// Summaries added up across viewports.
    pub fn summary(&self) -> Summary {
        self.passes.iter().fold(Summary::default(), |acc, pass| {
            let s = pass.results.summary;
            Summary {
                executed: acc.executed + s.executed,
                success: acc.success + s.success,
                fail: acc.fail + s.fail,
                total: acc.total + s.total,
            }
        })
    }

    pub fn all_passed(&self) -> bool {
        self.passes
            .iter()
            .all(|p| p.results.summary.all_passed() && p.error.is_none())
    }
}

/// Walks viewports, cases and steps against one browser session.
pub struct TestRunner;

impl TestRunner {
    /// Build a session, run every viewport pass on it, then quit it.
    ///
    /// A session that cannot be built aborts the run before any results
    /// exist. Everything after that is contained and recorded.
    pub async fn run<S, F, Fut>(
        spec: &TestSpecification,
        options: &RunOptions,
        connect: F,
    ) -> Result<RunOutcome, RunError>
    where
        S: BrowserSession,
        F: FnOnce() -> Fut,
        Fut: Future<Output = BrowserResult<S>>,
    {
        spec.validate()?;
        let session = connect().await.map_err(RunError::SessionBuild)?;
        let outcome = Self::run_session(spec, options, &session).await;
        if let Err(e) = session.quit().await {
            warn!("could not quit browser session: {}", e);
        }
        Ok(outcome)
    }

    /// Run every viewport pass, in configured order, on an existing session.
    pub async fn run_session<S: BrowserSession>(
        spec: &TestSpecification,
        options: &RunOptions,
        session: &S,
    ) -> RunOutcome {
        let start = Instant::now();
        let mut passes = Vec::with_capacity(spec.viewports.len());
        for (name, viewport) in &spec.viewports {
            passes.push(Self::run_viewport(spec, options, session, name, *viewport).await);
        }
        RunOutcome {
            name: spec.name.clone(),
            passes,
            duration: start.elapsed(),
        }
    }

    async fn run_viewport<S: BrowserSession>(
        spec: &TestSpecification,
        options: &RunOptions,
        session: &S,
        name: &str,
        viewport: Viewport,
    ) -> ViewportPass {
        let output_dir = options.output_root.join(name);
        let mut recorder = ResultRecorder::new(&spec.name, spec.group.as_deref(), name, viewport);
        if !is_plain_name(name) {
            let e = RunError::UnsafeName {
                kind: "viewport",
                name: name.to_string(),
            };
            error!(viewport = name, "viewport pass skipped: {}", e);
            return ViewportPass {
                viewport: name.to_string(),
                output_dir,
                results: recorder.finalize(),
                error: Some(e.to_string()),
            };
        }

        info!(
            viewport = name,
            size = %viewport,
            output = %output_dir.display(),
            "starting {}",
            spec.name
        );

        let pass = Self::run_cases(spec, options, session, &output_dir, name, viewport, &mut recorder)
            .await;
        let error = pass.err().map(|e| {
            error!(viewport = name, "viewport pass failed: {}", e);
            e.to_string()
        });

        let results = recorder.finalize();
        if let Err(e) = write_results(&output_dir, &results).await {
            error!(viewport = name, "{}", e);
        }

        let summary = results.summary;
        if summary.fail == 0 {
            info!(viewport = name, "Executed {} steps, no errors", summary.executed);
        } else {
            warn!(
                viewport = name,
                "Executed {} steps, {} failed",
                summary.executed,
                summary.fail
            );
        }

        ViewportPass {
            viewport: name.to_string(),
            output_dir,
            results,
            error,
        }
    }

    async fn run_cases<S: BrowserSession>(
        spec: &TestSpecification,
        options: &RunOptions,
        session: &S,
        output_dir: &Path,
        viewport_name: &str,
        viewport: Viewport,
        recorder: &mut ResultRecorder,
    ) -> Result<(), RunError> {
        reset_dir(output_dir).await?;
        let executor = StepExecutor::new(session, &options.step);

        for (case_name, case) in &spec.test_cases {
            if !is_plain_name(case_name) {
                error!(case = %case_name, "test case skipped: name must be a single path component");
                continue;
            }
            recorder.begin_case(case_name);
            let ctx = CaseContext {
                name: case_name,
                output_dir,
                viewport_name,
                viewport,
            };
            if let Err(e) = Self::run_case(&executor, session, recorder, &ctx, case).await {
                error!(case = %case_name, "test case aborted: {}", e);
                recorder.abort_open_step(&format!("case aborted: {}", e));
                if e.is_fatal() {
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn run_case<S: BrowserSession>(
        executor: &StepExecutor<'_, S>,
        session: &S,
        recorder: &mut ResultRecorder,
        ctx: &CaseContext<'_>,
        case: &TestCase,
    ) -> Result<(), RunError> {
        let case_dir = ctx.output_dir.join(ctx.name);
        tokio::fs::create_dir_all(&case_dir)
            .await
            .map_err(|e| RunError::io(&case_dir, e))?;

        info!(case = ctx.name, uri = %case.uri, "navigating");
        session.navigate(&case.uri).await?;
        executor.resize(ctx.viewport.width, ctx.viewport.height).await?;

        if let Some(expected) = &case.title {
            let actual = session.title().await?;
            if actual != *expected {
                recorder.defer_error(format!(
                    "title: expected '{}' to equal '{}'",
                    actual, expected
                ));
            }
        }

        for (label, step) in &case.steps {
            let target = StepTarget {
                case: ctx.name,
                label,
                output_dir: ctx.output_dir,
                viewport_name: ctx.viewport_name,
                viewport: ctx.viewport,
            };
            executor.execute(recorder, target, step).await?;
        }
        Ok(())
    }
}

struct CaseContext<'a> {
    name: &'a str,
    output_dir: &'a Path,
    viewport_name: &'a str,
    viewport: Viewport,
}

/// Remove any previous artefacts for a viewport and recreate its directory.
async fn reset_dir(dir: &Path) -> Result<(), RunError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(RunError::io(dir, e)),
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| RunError::io(dir, e))
}

/// Pretty-print results to `<dir>/results.json`.
pub async fn write_results(dir: &Path, results: &RunResults) -> Result<PathBuf, RunError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| RunError::io(dir, e))?;
    let path = dir.join(RESULTS_FILE);
    let json = serde_json::to_string_pretty(results)?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| RunError::io(&path, e))?;
    info!(path = %path.display(), "results saved");
    Ok(path)
}

/// Read back a `results.json` written by a viewport pass.
pub fn load_results(path: &Path) -> Result<RunResults, RunError> {
    let content = std::fs::read_to_string(path).map_err(|e| RunError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| RunError::SpecParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
