use std::path::Path;

use cdev_core::testdesc::{parse_desc_name, TestFile};

const FIXTURE: &str = r#"#include "test_colr.h"

describe(colr) {
    subdesc(colr_empty) {
        it("returns an empty string") {
            char* s = colr_empty();
            assert(s != NULL);
            assert_str_eq(s, "");
            free(s);
        }
        it("handles a longer body") {
            char* s = colr_empty();
            char* t = colr_empty();
            if (s && t) {
                do_something(s, t);
            }
            assert(s != NULL);
            assert(t != NULL);
            free(s);
            free(t);
        }
    }
    it("is a lone thin test") {
        assert(1);
    }
}
"#;

#[test]
fn recovers_the_describe_subdesc_it_nesting() {
    let file = TestFile::from_source(Path::new("test_colr.c"), FIXTURE).expect("parse fixture");
    assert!(file.is_impl());
    assert_eq!(file.describes.len(), 1);

    let describe = &file.describes[0];
    assert_eq!(describe.name, "colr");
    assert_eq!(describe.line_number, 3);
    assert_eq!(describe.test_count(), 3);
}

#[test]
fn thin_tests_are_bad_and_substantial_tests_are_not() {
    let file = TestFile::from_source(Path::new("test_colr.c"), FIXTURE).expect("parse fixture");
    assert!(file.has_bad_tests());

    let bad = file.bad_tests();
    // The four-line it() and the lone one-line it() are both thin; the
    // nine-line test is fine.
    assert_eq!(bad.test_count(), 2);

    let names: Vec<String> = bad
        .describes
        .iter()
        .flat_map(|d| {
            d.entries.iter().flat_map(|e| match e {
                cdev_core::testdesc::DescEntry::Subdesc(sd) => {
                    sd.its.iter().map(|it| it.desc.clone()).collect::<Vec<_>>()
                }
                cdev_core::testdesc::DescEntry::LoneIt(it) => vec![it.desc.clone()],
            })
        })
        .collect();
    assert!(names.contains(&"returns an empty string".to_string()));
    assert!(names.contains(&"is a lone thin test".to_string()));
    assert!(!names.contains(&"handles a longer body".to_string()));
}

#[test]
fn assert_only_bodies_are_bad_even_when_long() {
    let source = r#"describe(x) {
    subdesc(y) {
        it("only asserts") {
            assert(1);
            assert(2);
            assert(3);
            assert(4);
            assert(5);
            assert(6);
        }
    }
}
"#;
    let file = TestFile::from_source(Path::new("test_x.c"), source).expect("parse");
    // Six raw lines, but zero non-assert lines.
    assert!(file.has_bad_tests());
}

#[test]
fn compound_literal_lines_keep_the_brace_count_balanced() {
    let source = r#"describe(x) {
    subdesc(y) {
        it("uses a compound literal") {
            struct Pair p = { .a = 1, .b = 2 };
            int values[] = { 1, 2, 3 };
            check_pair(p);
            check_values(values);
            assert(p.a == 1);
            assert(values[0] == 1);
        }
    }
}
"#;
    let file = TestFile::from_source(Path::new("test_x.c"), source).expect("parse");
    assert_eq!(file.test_count(), 1);
    assert!(!file.has_bad_tests());
}

#[test]
fn headers_without_describes_parse_to_empty_files() {
    let file = TestFile::from_source(Path::new("test_colr.h"), "#define helper(x) (x)\n")
        .expect("parse header");
    assert!(!file.is_impl());
    assert_eq!(file.test_count(), 0);
}

#[test]
fn desc_names_strip_parens_and_quotes() {
    assert_eq!(parse_desc_name("describe(colr) {").unwrap(), "colr");
    assert_eq!(parse_desc_name("it(\"does the thing\") {").unwrap(), "does the thing");
    assert!(parse_desc_name("no macro call here").is_err());
}

#[test]
fn formatted_tree_lists_descriptions_without_code_by_default() {
    let file = TestFile::from_source(Path::new("test_colr.c"), FIXTURE).expect("parse");
    let tree = file.formatted(&cdev_core::color::Painter::plain(), false);
    assert!(tree.contains("test_colr.c (1):"));
    assert!(tree.contains("colr_empty"));
    assert!(tree.contains("returns an empty string"));
    assert!(!tree.contains("free(s);"));

    let with_code = file.formatted(&cdev_core::color::Painter::plain(), true);
    assert!(with_code.contains("free(s);"));
}
