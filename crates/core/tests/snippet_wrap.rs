use cdev_core::project::ProjectLayout;
use cdev_core::snippet::{find_src_examples, Snippet};

fn layout() -> ProjectLayout {
    ProjectLayout::new("/proj")
}

#[test]
fn wraps_bare_code_in_main_with_headers_and_macros() {
    let snip = Snippet::new("char* s = colr_cat(\"a\", \"b\");\nprint(s)", "t");
    let wrapped = snip.wrap_code(&layout());

    assert!(wrapped.contains("#include \"colr.h\""));
    assert!(wrapped.contains("#include \"dbug.h\""));
    assert!(wrapped.contains("#ifndef print\n#define print(s) printf(\"%s\\n\", s)"));
    assert!(wrapped.contains("int main(void) {"));
    // Unindented snippets gain a four-space indent inside main().
    assert!(wrapped.contains("\n    char* s = colr_cat"));
    // The missing trailing semicolon is added.
    assert!(wrapped.contains("print(s);"));
    assert!(wrapped.trim_end().ends_with('}'));
}

#[test]
fn existing_includes_are_not_duplicated() {
    let snip = Snippet::new("#include \"colr.h\"\nint x = 1;", "t");
    let wrapped = snip.wrap_code(&layout());
    assert_eq!(wrapped.matches("#include \"colr.h\"").count(), 1);
    // dbug.h was not present, so it still gets added.
    assert_eq!(wrapped.matches("#include \"dbug.h\"").count(), 1);
}

#[test]
fn existing_main_is_left_alone() {
    let code = "int main(void) {\n    return 0;\n}";
    let snip = Snippet::new(code, "t");
    let wrapped = snip.wrap_code(&layout());
    assert_eq!(wrapped.matches("int main").count(), 1);
    assert!(wrapped.ends_with(code));
}

#[test]
fn argc_mentions_select_the_argv_signature() {
    let snip = Snippet::new("printf(\"%d\\n\", argc);", "t");
    let wrapped = snip.wrap_code(&layout());
    assert!(wrapped.contains("int main(int argc, char* argv[])"));
}

#[test]
fn predefined_macro_definitions_are_not_repeated() {
    let snip = Snippet::new("#define print(s) printf(\"%s\\n\", s)\nprint(\"hi\");", "t");
    let wrapped = snip.wrap_code(&layout());
    assert_eq!(wrapped.matches("#define print(s)").count(), 1);
}

#[test]
fn example_blocks_are_extracted_and_dedented() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("colr.h");
    std::fs::write(
        &source,
        "/*! Joins things.\n\
         \x20   \\examplecodefor{colr_cat, .c}\n\
         \x20   char* s = colr_cat(\"a\", \"b\");\n\
         \x20   printf(\"%s\\n\", s);\n\
         \x20   \\endexamplecode\n\
         */\n",
    )
    .expect("write source");

    let found = find_src_examples(&[source]);
    assert_eq!(found.len(), 1);
    let snippets = &found[0].1;
    assert_eq!(snippets.len(), 1);
    let snip = &snippets[0];
    assert!(snip.name.contains("Example code for colr_cat"));
    assert!(snip.code.contains("\nchar* s = colr_cat"), "dedented: {}", snip.code);
    assert!(snip.code.contains("\nprintf"));
}

#[test]
fn files_without_example_tags_yield_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("colr.h");
    std::fs::write(&source, "/* no examples here */\n").expect("write source");
    assert!(find_src_examples(&[source]).is_empty());
}
