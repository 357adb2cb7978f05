use cdev_core::color::Painter;
use cdev_core::report::{render, OutputStyle, ReportError, TestSuites};

const PASS_FAIL_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<testsuites>
  <testsuite name="colr_basics" time="0.004" tests="2" failures="1" errors="0" skipped="0">
    <testcase name="test_format" />
    <testcase name="test_rainbow">
      <failure>assert_str_eq(a, b)
test_rainbow.c:42: assertion failed</failure>
    </testcase>
  </testsuite>
</testsuites>
"#;

#[test]
fn parses_suites_cases_and_failures() {
    let suites = TestSuites::from_output(PASS_FAIL_XML).expect("parse report");
    assert_eq!(suites.suites.len(), 1);
    assert_eq!(suites.tests, 2);
    assert_eq!(suites.failures, 1);
    assert_eq!(suites.errors, 0);

    let suite = &suites.suites[0];
    assert_eq!(suite.name, "colr_basics");
    assert!((suite.time - 0.004).abs() < 1e-9);
    assert!(suite.cases[0].failure.is_none());

    let failure = suite.cases[1].failure.as_ref().expect("failure info");
    assert_eq!(failure.file, "test_rainbow.c");
    assert_eq!(failure.line, "42");
    assert_eq!(failure.message, "assertion failed");
    assert_eq!(failure.code.as_deref(), Some("assert_str_eq(a, b)"));
}

/// Group runs concatenate several complete documents into one stream.
#[test]
fn concatenated_documents_merge_their_counts() {
    let second = r#"<testsuites>
  <testsuite name="colr_extras" time="0.001" tests="1" failures="0" errors="0" skipped="1">
    <testcase name="test_extras" />
  </testsuite>
</testsuites>
"#;
    let combined = format!("{PASS_FAIL_XML}{second}");
    let suites = TestSuites::from_output(&combined).expect("parse combined");
    assert_eq!(suites.suites.len(), 2);
    assert_eq!(suites.tests, 3);
    assert_eq!(suites.failures, 1);
    assert_eq!(suites.skipped, 1);
}

#[test]
fn non_xml_output_is_an_invalid_xml_error() {
    let err = TestSuites::from_output("Segmentation fault\n").unwrap_err();
    assert!(matches!(err, ReportError::InvalidXml(_)));
}

#[test]
fn failure_without_location_line_is_rejected() {
    let xml = "<testsuites><testsuite name=\"s\"><testcase name=\"c\"><failure>garbage</failure></testcase></testsuite></testsuites>";
    assert!(TestSuites::from_output(xml).is_err());
}

#[test]
fn case_names_unescape_xml_entities() {
    let xml = "<testsuites><testsuite name=\"s\"><testcase name=\"a &lt; b &amp; c\" /></testsuite></testsuites>";
    let suites = TestSuites::from_output(xml).expect("parse");
    assert_eq!(suites.suites[0].cases[0].name, "a < b & c");
}

#[test]
fn color_render_lists_cases_and_totals() {
    let suites = TestSuites::from_output(PASS_FAIL_XML).expect("parse");
    let out = render(&suites, OutputStyle::Color, &Painter::plain());
    assert!(out.contains("colr_basics"));
    assert!(out.contains("test_format"));
    assert!(out.contains("test_rainbow.c:42: assertion failed"));
    assert!(out.contains("All"));
    assert!(out.contains("Tests: 2"));
    assert!(out.contains("Failed: 1"));
}

#[test]
fn raw_render_is_the_debug_tree() {
    let suites = TestSuites::from_output(PASS_FAIL_XML).expect("parse");
    let out = render(&suites, OutputStyle::Raw, &Painter::plain());
    assert!(out.contains("TestSuites"));
    assert!(out.contains("test_format"));
}

#[test]
fn output_styles_map_to_the_right_cmocka_settings() {
    assert_eq!(OutputStyle::Color.cmocka_value(), "XML");
    assert_eq!(OutputStyle::Stdout.cmocka_value(), "STDOUT");
    assert_eq!(OutputStyle::Subunit.cmocka_value(), "SUBUNIT");
    assert_eq!(OutputStyle::Tap.cmocka_value(), "TAP");
    assert!(OutputStyle::Color.needs_parsing());
    assert!(OutputStyle::Raw.needs_parsing());
    assert!(!OutputStyle::Xml.needs_parsing());
}
