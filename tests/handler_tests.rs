use std::time::Duration;

use e2e_workflow::browser::mock::{MockElement, MockSession};
use e2e_workflow::browser::session::Rect;
use e2e_workflow::spec::handlers;
use e2e_workflow::spec::spec_model::InputValue;
use indexmap::IndexMap;
use serde_json::json;

use crate::common::utils::{expect_text, strings};

mod common;

fn inputs(pairs: Vec<(&str, InputValue)>) -> IndexMap<String, InputValue> {
    pairs.into_iter().map(|(s, v)| (s.to_string(), v)).collect()
}

// ============================================================================
// waitForElements
// ============================================================================

#[tokio::test]
async fn wait_passes_for_present_elements() {
    let session = MockSession::new().with_text("#form", "");
    let mut errors = Vec::new();
    handlers::wait_for_elements(&session, &strings(&["#form"]), Duration::from_millis(2000), &mut errors)
        .await
        .unwrap();
    assert!(errors.is_empty());
}

#[tokio::test]
async fn wait_timeout_is_recorded_per_selector() {
    let session = MockSession::new().with_text("#form", "");
    let mut errors = Vec::new();
    handlers::wait_for_elements(
        &session,
        &strings(&["#late", "#form", "#later"]),
        Duration::from_millis(2000),
        &mut errors,
    )
    .await
    .unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].starts_with("#late could not waitForElements:"));
    assert!(errors[0].contains("2000ms"));
    assert!(errors[1].starts_with("#later could not waitForElements:"));
}

// ============================================================================
// title
// ============================================================================

#[tokio::test]
async fn title_mismatch_reports_actual_and_expected() {
    let session = MockSession::new().with_title("Home");
    let mut errors = Vec::new();
    handlers::title(&session, "Example", &mut errors).await.unwrap();
    assert_eq!(errors, vec!["title: expected 'Home' to equal 'Example'"]);
}

#[tokio::test]
async fn title_match_records_nothing() {
    let session = MockSession::new().with_title("Example");
    let mut errors = Vec::new();
    handlers::title(&session, "Example", &mut errors).await.unwrap();
    assert!(errors.is_empty());
}

// ============================================================================
// hover
// ============================================================================

#[tokio::test]
async fn hover_moves_pointer_with_offset_and_returns_rect() {
    let rect = Rect::new(10.0, 20.0, 200.0, 40.0);
    let session = MockSession::new().with_element("#menu", MockElement::text("Menu").at(rect));
    let mut errors = Vec::new();
    let hovered = handlers::hover(&session, "#menu", 5, &mut errors).await.unwrap();
    assert_eq!(hovered, Some(rect));
    assert!(errors.is_empty());
    assert!(session.calls().contains(&"hover #menu 5,5".to_string()));
}

#[tokio::test]
async fn hover_on_missing_element_is_recorded() {
    let session = MockSession::new();
    let mut errors = Vec::new();
    let hovered = handlers::hover(&session, "#menu", 5, &mut errors).await.unwrap();
    assert_eq!(hovered, None);
    assert_eq!(errors, vec!["#menu could not hover"]);
}

// ============================================================================
// elements
// ============================================================================

#[tokio::test]
async fn missing_element_does_not_stop_other_checks() {
    let session = MockSession::new().with_text("B", "y");
    let mut errors = Vec::new();
    handlers::elements(&session, &expect_text(&[("A", "x"), ("B", "y")]), &mut errors)
        .await
        .unwrap();
    assert_eq!(errors, vec!["A not found"]);
    assert!(session.calls().contains(&"text B".to_string()));
}

#[tokio::test]
async fn element_failures_are_reported_in_declared_order() {
    let session = MockSession::new().with_text("B", "y");
    let mut errors = Vec::new();
    handlers::elements(&session, &expect_text(&[("A", "x"), ("B", "z")]), &mut errors)
        .await
        .unwrap();
    assert_eq!(
        errors,
        vec!["A not found", "\"B\" text: expected 'y' to equal 'z'"]
    );
}

#[tokio::test]
async fn empty_or_null_expected_text_only_checks_existence() {
    let session = MockSession::new()
        .with_text("#a", "anything")
        .with_text("#b", "else");
    let mut expected = expect_text(&[("#a", "")]);
    expected.insert("#b".into(), None);
    let mut errors = Vec::new();
    handlers::elements(&session, &expected, &mut errors).await.unwrap();
    assert!(errors.is_empty());
}

#[tokio::test]
async fn invalid_selector_reports_engine_message() {
    let session = MockSession::new().with_invalid_selector("//h1[", "invalid selector: Unable to locate");
    let mut errors = Vec::new();
    handlers::elements(&session, &expect_text(&[("//h1[", "x")]), &mut errors)
        .await
        .unwrap();
    assert_eq!(errors, vec!["\"//h1[\" invalid selector: Unable to locate"]);
}

// ============================================================================
// elementsNotExist / elementsNotVisible
// ============================================================================

#[tokio::test]
async fn existing_element_should_not_exist() {
    let session = MockSession::new().with_text("#present", "");
    let mut errors = Vec::new();
    handlers::elements_not_exist(&session, &strings(&["#present", "#absent"]), &mut errors)
        .await
        .unwrap();
    assert_eq!(errors, vec!["#present should not exist"]);
}

#[tokio::test]
async fn absent_element_passes_not_exist() {
    let session = MockSession::new();
    let mut errors = Vec::new();
    handlers::elements_not_exist(&session, &strings(&["#absent"]), &mut errors)
        .await
        .unwrap();
    assert!(errors.is_empty());
}

#[tokio::test]
async fn invalid_selector_does_not_count_as_absent() {
    let session = MockSession::new().with_invalid_selector("##", "invalid selector");
    let mut errors = Vec::new();
    handlers::elements_not_exist(&session, &strings(&["##"]), &mut errors)
        .await
        .unwrap();
    assert_eq!(errors, vec!["\"##\" invalid selector"]);
}

#[tokio::test]
async fn not_visible_distinguishes_hidden_visible_and_missing() {
    let session = MockSession::new()
        .with_element("#hidden", MockElement::text("").hidden())
        .with_text("#shown", "");
    let mut errors = Vec::new();
    handlers::elements_not_visible(
        &session,
        &strings(&["#hidden", "#shown", "#missing"]),
        &mut errors,
    )
    .await
    .unwrap();
    assert_eq!(
        errors,
        vec!["#shown should not be visible", "#missing should exist"]
    );
}

// ============================================================================
// input
// ============================================================================

#[tokio::test]
async fn checked_checkbox_set_true_is_not_clicked() {
    let session = MockSession::new().with_element("#agree", MockElement::checkbox(true));
    let mut errors = Vec::new();
    handlers::input(&session, &inputs(vec![("#agree", InputValue::Toggle(true))]), &mut errors)
        .await
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(session.count("click #agree"), 0);
}

#[tokio::test]
async fn unchecked_checkbox_set_true_is_clicked_once() {
    let session = MockSession::new().with_element("#agree", MockElement::checkbox(false));
    let mut errors = Vec::new();
    handlers::input(&session, &inputs(vec![("#agree", InputValue::Toggle(true))]), &mut errors)
        .await
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(session.count("click #agree"), 1);
    assert!(session.element("#agree").unwrap().selected);
}

#[tokio::test]
async fn text_input_clears_then_types() {
    let session = MockSession::new().with_element(
        "#name",
        MockElement {
            text: "old".into(),
            ..MockElement::field()
        },
    );
    let mut errors = Vec::new();
    handlers::input(&session, &inputs(vec![("#name", InputValue::Text("alice".into()))]), &mut errors)
        .await
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(session.element("#name").unwrap().text, "alice");
    let clear = session.position("clear #name").unwrap();
    let typed = session.position("send_keys alice #name").unwrap();
    assert!(clear < typed);
}

#[tokio::test]
async fn fields_are_filled_in_declared_order() {
    let session = MockSession::new()
        .with_element("#first", MockElement::field())
        .with_element("#second", MockElement::field());
    let fields = inputs(vec![
        ("#second", InputValue::Text("2".into())),
        ("#first", InputValue::Text("1".into())),
    ]);
    let mut errors = Vec::new();
    handlers::input(&session, &fields, &mut errors).await.unwrap();
    assert!(session.position("send_keys 2 #second").unwrap() < session.position("send_keys 1 #first").unwrap());
}

#[tokio::test]
async fn unsupported_input_value_is_reported_without_lookup() {
    let session = MockSession::new().with_element("#age", MockElement::field());
    let mut errors = Vec::new();
    handlers::input(&session, &inputs(vec![("#age", InputValue::Unsupported(json!(42)))]), &mut errors)
        .await
        .unwrap();
    assert_eq!(errors, vec!["#age input unprocessed: 42"]);
    assert_eq!(session.count("find #age"), 0);
}

#[tokio::test]
async fn input_failures_are_distinguished() {
    let session = MockSession::new().with_text("#label", "read only");
    let fields = inputs(vec![
        ("#missing", InputValue::Text("x".into())),
        ("#label", InputValue::Text("x".into())),
    ]);
    let mut errors = Vec::new();
    handlers::input(&session, &fields, &mut errors).await.unwrap();
    assert_eq!(
        errors,
        vec!["#missing input field not found", "#label no input field"]
    );
}

// ============================================================================
// click
// ============================================================================

#[tokio::test]
async fn click_scrolls_measures_then_clicks() {
    let rect = Rect::new(0.0, 900.0, 80.0, 30.0);
    let session = MockSession::new().with_element("#go", MockElement::text("Go").at(rect));
    let mut errors = Vec::new();
    let clicked = handlers::click(&session, "#go", &mut errors).await.unwrap().unwrap();
    assert!(errors.is_empty());
    assert_eq!(clicked.y, 900.0);
    assert_eq!(clicked.scroll_top, Some(0.0));

    let scroll = session.position("scroll_into_view #go").unwrap();
    let click = session.position("click #go").unwrap();
    assert!(scroll < click);
}

#[tokio::test]
async fn failed_click_keeps_rect_and_records_error() {
    let session = MockSession::new()
        .with_text("#go", "Go")
        .with_failing_click("#go");
    let mut errors = Vec::new();
    let clicked = handlers::click(&session, "#go", &mut errors).await.unwrap();
    assert!(clicked.is_some());
    assert_eq!(errors, vec!["#go could not click"]);
}

#[tokio::test]
async fn click_on_missing_element_is_recorded() {
    let session = MockSession::new();
    let mut errors = Vec::new();
    let clicked = handlers::click(&session, "#go", &mut errors).await.unwrap();
    assert_eq!(clicked, None);
    assert_eq!(errors, vec!["#go could not click"]);
}

// ============================================================================
// Malformed selectors
// ============================================================================

const BROKEN: &str = "//div[";
const ENGINE_MESSAGE: &str = "invalid selector: Unable to locate an element";

fn broken_selector_session() -> MockSession {
    MockSession::new().with_invalid_selector(BROKEN, ENGINE_MESSAGE)
}

fn broken_selector_message() -> String {
    format!("\"{}\" {}", BROKEN, ENGINE_MESSAGE)
}

#[tokio::test]
async fn wait_reports_malformed_selector() {
    let session = broken_selector_session();
    let mut errors = Vec::new();
    handlers::wait_for_elements(&session, &strings(&[BROKEN]), Duration::from_millis(50), &mut errors)
        .await
        .unwrap();
    assert_eq!(errors, vec![broken_selector_message()]);
}

#[tokio::test]
async fn hover_reports_malformed_selector() {
    let session = broken_selector_session();
    let mut errors = Vec::new();
    let hovered = handlers::hover(&session, BROKEN, 5, &mut errors).await.unwrap();
    assert_eq!(hovered, None);
    assert_eq!(errors, vec![broken_selector_message()]);
}

#[tokio::test]
async fn not_visible_reports_malformed_selector() {
    let session = broken_selector_session();
    let mut errors = Vec::new();
    handlers::elements_not_visible(&session, &strings(&[BROKEN]), &mut errors)
        .await
        .unwrap();
    assert_eq!(errors, vec![broken_selector_message()]);
}

#[tokio::test]
async fn input_reports_malformed_selector() {
    let session = broken_selector_session();
    let mut errors = Vec::new();
    handlers::input(&session, &inputs(vec![(BROKEN, InputValue::Text("x".into()))]), &mut errors)
        .await
        .unwrap();
    assert_eq!(errors, vec![broken_selector_message()]);
}

#[tokio::test]
async fn click_reports_malformed_selector() {
    let session = broken_selector_session();
    let mut errors = Vec::new();
    let clicked = handlers::click(&session, BROKEN, &mut errors).await.unwrap();
    assert_eq!(clicked, None);
    assert_eq!(errors, vec![broken_selector_message()]);
    assert!(!session.calls().iter().any(|c| c.starts_with("click")));
}
