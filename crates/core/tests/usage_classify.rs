use std::collections::BTreeMap;

use cdev_core::usage::{FileHits, LineRef, NameKind, NameUsage, SortKey, UsageLabel, UsageReport};

fn with_counts(kind: NameKind, files: &[(&str, usize)]) -> NameUsage {
    let mut name = NameUsage::new("subject", kind);
    for (file_name, count) in files {
        name.files.insert(
            file_name.to_string(),
            FileHits {
                count: *count,
                lines: vec![LineRef { number: 1, text: "subject();".to_string() }],
            },
        );
        name.total += count;
    }
    name.set_counts();
    name
}

#[test]
fn bucket_counts_follow_file_naming_conventions() {
    let name = with_counts(
        NameKind::Function,
        &[("colr.c", 2), ("colr_tool.c", 1), ("test_colr.c", 4), ("rainbow_example.c", 3)],
    );
    assert_eq!(name.library_count, 2);
    assert_eq!(name.tool_count, 1);
    assert_eq!(name.test_count, 4);
    assert_eq!(name.example_count, 3);
    assert_eq!(name.total, 10);
}

#[test]
fn test_prefix_wins_over_tool_suffix() {
    let name = with_counts(NameKind::Function, &[("test_colr_tool.c", 3)]);
    assert_eq!(name.test_count, 3);
    assert_eq!(name.tool_count, 0);
}

/// Symbol barely used in the library and absent from the tool is unused.
#[test]
fn twice_in_library_only_is_unused() {
    let name = with_counts(NameKind::Function, &[("colr.c", 2)]);
    assert!(name.is_unused());
}

/// Symbols shared across both binaries are never flagged.
#[test]
fn used_in_both_binaries_is_not_unused() {
    let name = with_counts(NameKind::Function, &[("colr.c", 2), ("colr_tool.c", 1)]);
    assert!(!name.is_unused());
}

#[test]
fn heavy_single_category_usage_is_not_unused() {
    let name = with_counts(NameKind::Function, &[("colr.c", 7)]);
    assert!(!name.is_unused());
}

/// More than two test references marks a test dependency, not an unused
/// symbol.
#[test]
fn four_test_hits_classify_as_test_dependency() {
    let name = with_counts(NameKind::Function, &[("test_colr.c", 4)]);
    assert!(name.is_test_dep());
    assert!(!name.is_unused());
    assert_eq!(name.label(), UsageLabel::TestDependency);
}

/// Zero occurrences anywhere must never come out as a test dependency or
/// a normally-used symbol.
#[test]
fn zero_counts_never_classify_as_test_dep_or_used() {
    let name = with_counts(NameKind::Function, &[]);
    assert!(!name.is_test_dep());
    assert_ne!(name.label(), UsageLabel::TestDependency);
    assert_ne!(name.label(), UsageLabel::Normal);
}

#[test]
fn untested_thresholds_differ_for_test_suite_symbols() {
    let project = with_counts(NameKind::Function, &[("colr.c", 5)]);
    assert!(project.is_untested());

    let test_fn = with_counts(NameKind::TestFunction, &[("test_colr.c", 2)]);
    assert!(test_fn.is_untested());
    let test_fn_ok = with_counts(NameKind::TestFunction, &[("test_colr.c", 3)]);
    assert!(!test_fn_ok.is_untested());

    let test_macro = with_counts(NameKind::TestMacro, &[("test_colr.c", 1)]);
    assert!(test_macro.is_untested());
    let test_macro_ok = with_counts(NameKind::TestMacro, &[("test_colr.c", 2)]);
    assert!(!test_macro_ok.is_untested());
}

#[test]
fn false_positive_flag_dominates_the_label() {
    let mut name = with_counts(NameKind::Function, &[("test_colr.c", 4)]);
    name.false_positive = true;
    assert_eq!(name.label(), UsageLabel::FalsePositive);
}

/// Classification depends only on the bucket counts plus the kind, not on
/// which files produced them.
#[test]
fn classification_is_a_pure_function_of_counts_and_kind() {
    let from_source = with_counts(NameKind::Function, &[("colr.c", 2)]);
    let from_header = with_counts(NameKind::Function, &[("colr.h", 2)]);
    assert_eq!(from_source.label(), from_header.label());
    assert_eq!(from_source.is_unused(), from_header.is_unused());

    let split = with_counts(NameKind::Function, &[("colr.c", 1), ("colr.h", 1)]);
    assert_eq!(from_source.label(), split.label());
}

/// Serialized records must classify identically after a round trip.
#[test]
fn json_round_trip_preserves_classification() {
    let names = vec![
        with_counts(NameKind::Function, &[("colr.c", 2)]),
        with_counts(NameKind::Macro, &[("colr.h", 4), ("test_colr.c", 3)]),
        with_counts(NameKind::TestFunction, &[("test_colr.c", 1)]),
        {
            let mut fp = with_counts(NameKind::Function, &[("colr.c", 5), ("colr_tool.c", 5)]);
            fp.false_positive = true;
            fp
        },
    ];
    let report = UsageReport::new(names.clone());
    let json = report.to_json().expect("serialize");
    let back = UsageReport::from_json(&json).expect("deserialize");

    assert_eq!(back.names.len(), names.len());
    for (orig, parsed) in names.iter().zip(&back.names) {
        assert_eq!(orig, parsed);
        assert_eq!(orig.label(), parsed.label());
    }
}

#[test]
fn filter_used_drops_used_names_and_mark_only_flags_them() {
    let used = with_counts(NameKind::Function, &[("colr.c", 5), ("colr_tool.c", 2)]);
    let unused = with_counts(NameKind::Function, &[("colr.c", 1)]);

    let mut report = UsageReport::new(vec![used.clone(), unused.clone()]);
    report.filter_used(false, false, false);
    assert_eq!(report.names.len(), 1);
    assert_eq!(report.names[0].library_count, 1);

    let mut marked = UsageReport::new(vec![used, unused]);
    marked.filter_used(false, false, true);
    assert_eq!(marked.names.len(), 2);
    assert!(marked.names[0].false_positive);
    assert!(!marked.names[1].false_positive);
}

#[test]
fn filter_used_macros_keeps_functions_and_unused_macros() {
    let func = with_counts(NameKind::Function, &[("colr.c", 9)]);
    let used_macro = with_counts(NameKind::Macro, &[("colr.c", 9), ("colr_tool.c", 2)]);
    let unused_macro = with_counts(NameKind::Macro, &[("colr.h", 1)]);

    let mut report = UsageReport::new(vec![func, used_macro, unused_macro]);
    report.filter_used_macros();
    let kinds: Vec<NameKind> = report.names.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NameKind::Function, NameKind::Macro]);
    assert_eq!(report.names[1].library_count, 1);
}

#[test]
fn example_filter_splits_on_example_usage() {
    let with_example = with_counts(NameKind::Function, &[("rainbow_example.c", 1)]);
    let without = with_counts(NameKind::Function, &[("colr.c", 1)]);

    let mut report = UsageReport::new(vec![with_example.clone(), without.clone()]);
    report.filter_examples(true);
    assert_eq!(report.names.len(), 1);
    assert!(report.names[0].is_example());

    let mut report = UsageReport::new(vec![with_example, without]);
    report.filter_examples(false);
    assert_eq!(report.names.len(), 1);
    assert!(!report.names[0].is_example());
}

#[test]
fn sort_keys_order_names_secondary_to_alphabetical() {
    let mut a = with_counts(NameKind::Function, &[("colr.c", 3)]);
    a.name = "alpha".to_string();
    let mut b = with_counts(NameKind::Function, &[("colr.c", 1)]);
    b.name = "beta".to_string();

    let mut report = UsageReport::new(vec![b.clone(), a.clone()]);
    report.sort_by_key(SortKey::Name);
    assert_eq!(report.names[0].name, "alpha");

    report.sort_by_key(SortKey::Library);
    assert_eq!(report.names[0].name, "beta");
}

#[test]
fn sort_key_parsing_accepts_aliases_and_rejects_junk() {
    assert_eq!(SortKey::parse("n").unwrap(), SortKey::Name);
    assert_eq!(SortKey::parse("c").unwrap(), SortKey::Library);
    assert_eq!(SortKey::parse("x").unwrap(), SortKey::Example);
    assert_eq!(SortKey::parse("files").unwrap(), SortKey::File);
    assert!(SortKey::parse("bogus").is_err());
}
