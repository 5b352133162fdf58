use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::browser::session::{BrowserSession, MEASURE_BODY, SCROLL_TO_END, SCROLL_TO_ORIGIN};
use crate::error::{BrowserError, RunError};
use crate::spec::context::{ResultRecorder, StepKey};
use crate::spec::handlers;
use crate::spec::spec_model::{TestStep, Viewport};

/// Knobs shared by every step of a run.
#[derive(Debug, Clone)]
pub struct StepOptions {
    /// Upper bound for each `waitForElements` selector
    pub wait_timeout: Duration,

    /// Pointer offset from the hovered element's top-left corner
    pub hover_offset: i64,

    /// Pixels the engine's window chrome takes from the content height
    pub height_correction: u32,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_millis(2000),
            hover_offset: 5,
            height_correction: 0,
        }
    }
}

/// Where the step lands on disk and which viewport it runs at.
#[derive(Debug, Clone, Copy)]
pub struct StepTarget<'a> {
    pub case: &'a str,
    pub label: &'a str,
    pub output_dir: &'a Path,
    pub viewport_name: &'a str,
    pub viewport: Viewport,
}

#[derive(Debug, Deserialize)]
struct BodySize {
    width: f64,
    height: f64,
}

/// Runs one step: handlers in fixed order, remeasure, screenshot, click.
pub struct StepExecutor<'a, S: BrowserSession> {
    session: &'a S,
    options: &'a StepOptions,
}

impl<'a, S: BrowserSession> StepExecutor<'a, S> {
    pub fn new(session: &'a S, options: &'a StepOptions) -> Self {
        Self { session, options }
    }

    /// Execute a step and report whether it passed.
    ///
    /// Assertion and action failures end up in the step's error list. An
    /// `Err` means the screenshot could not be saved or the session died;
    /// the step is then left open for the caller to abort.
    pub async fn execute(
        &self,
        recorder: &mut ResultRecorder,
        target: StepTarget<'_>,
        step: &TestStep,
    ) -> Result<bool, RunError> {
        let key = recorder.begin_step(target.case, target.label, step);
        let session = self.session;
        let mut errors = Vec::new();

        if let Some(selectors) = &step.wait_for_elements {
            let r = handlers::wait_for_elements(
                session,
                selectors,
                self.options.wait_timeout,
                &mut errors,
            )
            .await;
            commit(recorder, &key, &mut errors, r)?;
        }

        if let Some(expected) = &step.title {
            let r = handlers::title(session, expected, &mut errors).await;
            commit(recorder, &key, &mut errors, r)?;
        }

        if let Some(selector) = &step.hover {
            let r = handlers::hover(session, selector, self.options.hover_offset, &mut errors).await;
            if let Some(rect) = commit(recorder, &key, &mut errors, r)? {
                recorder.record_hover_rect(&key, rect);
            }
        }

        if let Some(expected) = &step.elements {
            let r = handlers::elements(session, expected, &mut errors).await;
            commit(recorder, &key, &mut errors, r)?;
        }

        if let Some(selectors) = &step.elements_not_exist {
            let r = handlers::elements_not_exist(session, selectors, &mut errors).await;
            commit(recorder, &key, &mut errors, r)?;
        }

        if let Some(selectors) = &step.elements_not_visible {
            let r = handlers::elements_not_visible(session, selectors, &mut errors).await;
            commit(recorder, &key, &mut errors, r)?;
        }

        if let Some(fields) = &step.input {
            let r = handlers::input(session, fields, &mut errors).await;
            commit(recorder, &key, &mut errors, r)?;
        }

        self.remeasure(recorder, &key, &target).await?;
        self.capture(recorder, &key, &target).await?;

        if let Some(selector) = &step.click {
            let r = handlers::click(session, selector, &mut errors).await;
            if let Some(rect) = commit(recorder, &key, &mut errors, r)? {
                recorder.record_click_rect(&key, rect);
            }
        }

        Ok(recorder.finish_step(&key))
    }

    /// Settle lazy content, flag a vertical scrollbar, and size the window to
    /// the full content so the screenshot covers the whole page.
    async fn remeasure(
        &self,
        recorder: &mut ResultRecorder,
        key: &StepKey,
        target: &StepTarget<'_>,
    ) -> Result<(), RunError> {
        let measured = async {
            self.session.execute_script(SCROLL_TO_END).await?;
            self.session.execute_script(SCROLL_TO_ORIGIN).await?;
            let value = self.session.execute_script(MEASURE_BODY).await?;
            serde_json::from_value::<BodySize>(value)
                .map_err(|e| BrowserError::Command(format!("unexpected body size: {}", e)))
        }
        .await;

        let body = match measured {
            Ok(body) => body,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!(case = target.case, step = target.label, "could not measure page: {}", e);
                return Ok(());
            }
        };

        let viewport = target.viewport;
        let scrollbar = body.height > f64::from(viewport.height);
        recorder.record_vertical_scrollbar(key, target.viewport_name, scrollbar);

        let width = viewport.width.max(body.width.ceil() as u32);
        let height = viewport.height.max(body.height.ceil() as u32);
        debug!(width, height, scrollbar, "resizing window to content");
        self.resize(width, height).await
    }

    /// Save `<output_dir>/<case>/<label>.png` and put the window back to the
    /// configured viewport.
    async fn capture(
        &self,
        recorder: &mut ResultRecorder,
        key: &StepKey,
        target: &StepTarget<'_>,
    ) -> Result<(), RunError> {
        if let Err(e) = self.session.execute_script(SCROLL_TO_ORIGIN).await {
            if e.is_fatal() {
                return Err(e.into());
            }
            warn!(case = target.case, step = target.label, "could not reset scroll: {}", e);
        }
        let png = match self.session.screenshot().await {
            Ok(png) => png,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                recorder.record_error(key, format!("screenshot: {}", e));
                return self.resize(target.viewport.width, target.viewport.height).await;
            }
        };

        let relative = Path::new(target.case).join(screenshot_file_name(target.label));
        let path = target.output_dir.join(&relative);
        tokio::fs::write(&path, &png)
            .await
            .map_err(|e| RunError::io(&path, e))?;
        debug!(path = %path.display(), "screenshot saved");
        recorder.record_screenshot(key, relative.to_string_lossy());

        self.resize(target.viewport.width, target.viewport.height).await
    }

    /// Resize so the content area, not the window, has the given size.
    ///
    /// Non-fatal resize failures are logged; the step carries on.
    pub async fn resize(&self, width: u32, height: u32) -> Result<(), RunError> {
        let window_height = height.saturating_add(self.options.height_correction);
        match self.session.set_window_size(width, window_height).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                warn!(width, height = window_height, "could not resize window: {}", e);
                Ok(())
            }
        }
    }
}

/// Move handler messages into the recorder, then propagate a fatal error.
fn commit<T>(
    recorder: &mut ResultRecorder,
    key: &StepKey,
    errors: &mut Vec<String>,
    result: Result<T, BrowserError>,
) -> Result<T, RunError> {
    for message in errors.drain(..) {
        recorder.record_error(key, message);
    }
    result.map_err(RunError::from)
}

/// File name for a step screenshot; path separators in labels are replaced.
pub fn screenshot_file_name(label: &str) -> String {
    let safe: String = label
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}.png", safe)
}
