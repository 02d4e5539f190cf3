use codemod_patcher::codemod::{
    add_swift_imports, insert_contents_inside_swift_function_block, FunctionPosition,
};
use codemod_patcher::merge::{merge_contents, remove_contents, Anchor, MergeRequest};
use std::fs;

fn load_fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

#[test]
fn merge_gradle_fixture() {
    let input = load_fixture("build.gradle.input");
    let expected = load_fixture("build.gradle.expected");
    let anchor = Anchor::literal("mavenCentral()").unwrap();
    let request = MergeRequest {
        src: &input,
        new_src: "        maven { url 'https://maps.example.com' }",
        tag: "maps-maven",
        anchor: &anchor,
        offset: 1,
        comment: "//",
    };

    let merged = merge_contents(&request).expect("merge");
    assert!(merged.did_merge);
    assert_eq!(merged.contents, expected);

    let again = merge_contents(&MergeRequest {
        src: &merged.contents,
        ..request
    })
    .expect("second merge");
    assert!(!again.did_merge, "expected no-op on second application");
    assert_eq!(again.contents, expected);

    let removed = remove_contents(&merged.contents, "maps-maven");
    assert_eq!(removed.contents, input);
}

#[test]
fn app_delegate_swift_fixture() {
    let input = load_fixture("AppDelegate.swift.input");
    let expected = load_fixture("AppDelegate.swift.expected");

    let with_imports = add_swift_imports(&input, &["FirebaseCore", "React"]);
    let output = insert_contents_inside_swift_function_block(
        &with_imports,
        "application(_:didFinishLaunchingWithOptions:)",
        "FirebaseApp.configure()",
        FunctionPosition::TailBeforeLastReturn,
        Some(4),
    )
    .expect("insert");

    assert_eq!(output, expected);
}
