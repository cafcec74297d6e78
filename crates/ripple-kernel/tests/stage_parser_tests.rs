//! Stage parser tests using rstest for parameterization.

use rstest::rstest;

use ripple_kernel::{parse_pipeline, Stage};

/// Render a pipeline as `name[args]` per stage for compact expectations.
fn shape(line: &str) -> Vec<String> {
    parse_pipeline(line)
        .iter()
        .map(|stage| format!("{}{:?}", stage.name(), stage.args()))
        .collect()
}

// =============================================================================
// Single stages
// =============================================================================

#[rstest]
#[case::bare("ls", &["ls[]"])]
#[case::args("ls -l /tmp", &[r#"ls["-l", "/tmp"]"#])]
#[case::padded("   date   ", &["date[]"])]
#[case::tabs("echo\ta\t b", &[r#"echo["a", "b"]"#])]
#[case::no_quoting("echo 'a b'", &[r#"echo["'a", "b'"]"#])]
fn parse_single_stage(#[case] input: &str, #[case] expected: &[&str]) {
    assert_eq!(shape(input), expected);
}

// =============================================================================
// Pipelines
// =============================================================================

#[rstest]
#[case::two("ls | wc -l", &["ls[]", r#"wc["-l"]"#])]
#[case::three("cat f | grep x | sort", &[r#"cat["f"]"#, r#"grep["x"]"#, "sort[]"])]
#[case::tight("a|b|c", &["a[]", "b[]", "c[]"])]
#[case::empty_middle("a || b", &["a[]", "b[]"])]
#[case::leading_trailing("| a | b |", &["a[]", "b[]"])]
fn parse_pipelines(#[case] input: &str, #[case] expected: &[&str]) {
    assert_eq!(shape(input), expected);
}

#[rstest]
#[case::empty("")]
#[case::spaces("     ")]
#[case::only_pipes(" | || ")]
fn parse_empty(#[case] input: &str) {
    assert!(parse_pipeline(input).is_empty());
}

#[test]
fn stage_display_round_trips_words() {
    let stage = Stage::new("grep", ["-c", "needle"]);
    assert_eq!(stage.to_string(), "grep -c needle");
    assert_eq!(parse_pipeline(&stage.to_string()), vec![stage]);
}
