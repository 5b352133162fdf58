#![allow(dead_code)]

use std::path::Path;

use e2e_workflow::spec::context::ResultRecorder;
use e2e_workflow::spec::executor::StepOptions;
use e2e_workflow::spec::runner::RunOptions;
use e2e_workflow::spec::spec_model::{TestCase, TestSpecification, TestStep, Viewport};
use indexmap::IndexMap;

pub fn mobile() -> Viewport {
    Viewport {
        width: 320,
        height: 568,
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// `elements` map; an empty expected text only checks existence.
pub fn expect_text(pairs: &[(&str, &str)]) -> IndexMap<String, Option<String>> {
    pairs
        .iter()
        .map(|(sel, text)| (sel.to_string(), Some(text.to_string())))
        .collect()
}

pub fn case(uri: &str, steps: Vec<(&str, TestStep)>) -> TestCase {
    TestCase {
        uri: uri.to_string(),
        title: None,
        steps: steps
            .into_iter()
            .map(|(label, step)| (label.to_string(), step))
            .collect(),
    }
}

/// A specification with the single viewport `Mobile` (320x568).
pub fn spec(cases: Vec<(&str, TestCase)>) -> TestSpecification {
    let mut viewports = IndexMap::new();
    viewports.insert("Mobile".to_string(), mobile());
    TestSpecification {
        name: "Example".to_string(),
        group: None,
        dump_directory: None,
        viewports,
        test_cases: cases
            .into_iter()
            .map(|(name, case)| (name.to_string(), case))
            .collect(),
    }
}

pub fn run_options(root: &Path) -> RunOptions {
    RunOptions {
        output_root: root.to_path_buf(),
        step: StepOptions::default(),
    }
}

pub fn recorder() -> ResultRecorder {
    ResultRecorder::new("Example", None, "Mobile", mobile())
}
