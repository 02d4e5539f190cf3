//! Integration tests for mod files and the applicator
//!
//! Tests grouping by file, idempotency, file-level aborts and check mode

use codemod_patcher::config::{
    apply_mods, load_from_path, load_from_str, ApplicationError, ApplyMode, ModResult,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const APP_GRADLE: &str = "android {
    defaultConfig {
        minSdkVersion 24
    }
}

dependencies {
    implementation 'com.facebook.react:react-android'
}
";

/// Helper to create a temp project with native files
fn setup_test_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let app = dir.path().join("android/app");
    fs::create_dir_all(&app).unwrap();
    fs::write(app.join("build.gradle"), APP_GRADLE).unwrap();

    let values = app.join("src/main/res/values");
    fs::create_dir_all(&values).unwrap();
    fs::write(
        values.join("strings.xml"),
        "<resources>\n  <string name=\"app_name\">Demo</string>\n</resources>",
    )
    .unwrap();

    dir
}

fn read(dir: &TempDir, file: &str) -> String {
    fs::read_to_string(dir.path().join(file)).unwrap()
}

const TWO_MERGES: &str = r##"
[[mods]]
id = "maps-dep"
file = "android/app/build.gradle"
operation = { type = "merge", tag = "maps-dep", anchor = "^dependencies", offset = 1, contents = "    implementation 'com.example:maps:1.0'" }

[[mods]]
id = "multidex"
file = "android/app/build.gradle"
operation = { type = "merge", tag = "multidex", anchor = "minSdkVersion", offset = 1, contents = "        multiDexEnabled true" }
"##;

#[test]
fn test_apply_merges_to_same_file() {
    let project = setup_test_project();
    let config = load_from_str(TWO_MERGES).unwrap();

    let report = apply_mods(&config, project.path(), ApplyMode::Write);
    assert_eq!(report.failures(), 0);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].0, "maps-dep");
    assert_eq!(report.results[1].0, "multidex");
    assert!(report.results.iter().all(|(_, r)| matches!(
        r,
        Ok(ModResult::Applied {
            replaced: false,
            ..
        })
    )));
    assert_eq!(report.changes.len(), 1);

    let gradle = read(&project, "android/app/build.gradle");
    assert!(gradle.contains(
        "minSdkVersion 24\n// @generated begin multidex - "
    ));
    assert!(gradle.contains(
        "dependencies {\n// @generated begin maps-dep - "
    ));
    assert!(gradle.ends_with("// @generated end maps-dep\n    implementation 'com.facebook.react:react-android'\n}\n"));
}

#[test]
fn test_apply_twice_is_noop() {
    let project = setup_test_project();
    let config = load_from_str(TWO_MERGES).unwrap();

    let _ = apply_mods(&config, project.path(), ApplyMode::Write);
    let first = read(&project, "android/app/build.gradle");

    let report = apply_mods(&config, project.path(), ApplyMode::Write);
    assert!(report
        .results
        .iter()
        .all(|(_, r)| matches!(r, Ok(ModResult::AlreadyApplied { .. }))));
    assert!(report.changes.is_empty());
    assert_eq!(read(&project, "android/app/build.gradle"), first);
}

#[test]
fn test_changed_contents_replace_block() {
    let project = setup_test_project();
    let _ = apply_mods(
        &load_from_str(TWO_MERGES).unwrap(),
        project.path(),
        ApplyMode::Write,
    );

    let updated = TWO_MERGES.replace("maps:1.0", "maps:2.0");
    let report = apply_mods(
        &load_from_str(&updated).unwrap(),
        project.path(),
        ApplyMode::Write,
    );
    assert!(matches!(
        report.results[0].1,
        Ok(ModResult::Applied { replaced: true, .. })
    ));
    assert!(matches!(
        report.results[1].1,
        Ok(ModResult::AlreadyApplied { .. })
    ));

    let gradle = read(&project, "android/app/build.gradle");
    assert!(gradle.contains("maps:2.0"));
    assert!(!gradle.contains("maps:1.0"));
    assert_eq!(gradle.matches("@generated begin maps-dep").count(), 1);
}

#[test]
fn test_failing_mod_aborts_whole_file() {
    let project = setup_test_project();
    let config = load_from_str(
        r##"
[[mods]]
id = "good"
file = "android/app/build.gradle"
operation = { type = "merge", tag = "good", anchor = "^dependencies", offset = 1, contents = "x" }

[[mods]]
id = "bad"
file = "android/app/build.gradle"
operation = { type = "merge", tag = "bad", anchor = "^allprojects", contents = "y" }

[[mods]]
id = "other-file"
file = "android/app/src/main/res/values/strings.xml"
operation = { type = "set-resource", kind = "string", name = "greeting", value = "Hi" }
"##,
    )
    .unwrap();

    let report = apply_mods(&config, project.path(), ApplyMode::Write);
    assert_eq!(report.failures(), 2);

    match &report.results[0].1 {
        Err(ApplicationError::FileAborted { failed_mod, .. }) => assert_eq!(failed_mod, "bad"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(
        report.results[1].1,
        Err(ApplicationError::Merge { .. })
    ));
    assert!(report.results[1]
        .1
        .as_ref()
        .unwrap_err()
        .to_string()
        .contains("Failed to match \"^allprojects\""));
    assert!(matches!(
        report.results[2].1,
        Ok(ModResult::Applied { .. })
    ));

    assert_eq!(read(&project, "android/app/build.gradle"), APP_GRADLE);
    assert!(read(&project, "android/app/src/main/res/values/strings.xml")
        .contains("<string name=\"greeting\">Hi</string>"));
}

#[test]
fn test_check_mode_does_not_write() {
    let project = setup_test_project();
    let config = load_from_str(TWO_MERGES).unwrap();

    let report = apply_mods(&config, project.path(), ApplyMode::Check);
    assert!(matches!(
        report.results[0].1,
        Ok(ModResult::Applied { .. })
    ));
    assert_eq!(report.changes.len(), 1);
    assert_eq!(report.changes[0].before.as_deref(), Some(APP_GRADLE));
    assert!(report.changes[0].after.contains("multiDexEnabled true"));
    assert_eq!(read(&project, "android/app/build.gradle"), APP_GRADLE);
}

#[test]
fn test_remove_mod() {
    let project = setup_test_project();
    let _ = apply_mods(
        &load_from_str(TWO_MERGES).unwrap(),
        project.path(),
        ApplyMode::Write,
    );

    let remove = load_from_str(
        r##"
[[mods]]
id = "drop-maps"
file = "android/app/build.gradle"
operation = { type = "remove", tag = "maps-dep" }

[[mods]]
id = "drop-multidex"
file = "android/app/build.gradle"
operation = { type = "remove", tag = "multidex" }
"##,
    )
    .unwrap();

    let report = apply_mods(&remove, project.path(), ApplyMode::Write);
    assert!(report
        .results
        .iter()
        .all(|(_, r)| matches!(r, Ok(ModResult::Removed { .. }))));
    assert_eq!(read(&project, "android/app/build.gradle"), APP_GRADLE);

    let again = apply_mods(&remove, project.path(), ApplyMode::Write);
    assert!(again
        .results
        .iter()
        .all(|(_, r)| matches!(r, Ok(ModResult::NotPresent { .. }))));
}

#[test]
fn test_resource_mods_create_missing_file() {
    let project = setup_test_project();
    let config = load_from_str(
        r##"
[[mods]]
id = "primary"
file = "android/app/src/main/res/values/colors.xml"
operation = { type = "set-resource", kind = "color", name = "primary", value = "#023c69" }
"##,
    )
    .unwrap();

    let report = apply_mods(&config, project.path(), ApplyMode::Write);
    assert_eq!(report.failures(), 0);
    assert_eq!(report.changes[0].before, None);
    assert_eq!(
        read(&project, "android/app/src/main/res/values/colors.xml"),
        "<resources>\n  <color name=\"primary\">#023c69</color>\n</resources>"
    );
}

#[test]
fn test_remove_resource_leaves_missing_file_absent() {
    let project = setup_test_project();
    let config = load_from_str(
        r##"
[[mods]]
id = "splash"
file = "android/app/src/main/res/values/colors.xml"
operation = { type = "remove-resource", kind = "color", name = "splash" }
"##,
    )
    .unwrap();

    let report = apply_mods(&config, project.path(), ApplyMode::Write);
    assert!(matches!(
        report.results[0].1,
        Ok(ModResult::NotPresent { .. })
    ));
    assert!(report.changes.is_empty());
    assert!(!project
        .path()
        .join("android/app/src/main/res/values/colors.xml")
        .exists());
}

#[test]
fn test_string_resource_is_escaped_on_disk() {
    let project = setup_test_project();
    let config = load_from_str(
        r##"
[[mods]]
id = "greeting"
file = "android/app/src/main/res/values/strings.xml"
operation = { type = "set-resource", kind = "string", name = "greeting", value = "It's here" }
"##,
    )
    .unwrap();

    let _ = apply_mods(&config, project.path(), ApplyMode::Write);
    let strings = read(&project, "android/app/src/main/res/values/strings.xml");
    assert!(strings.contains(r#"<string name="greeting">It\'s here</string>"#));

    let again = apply_mods(&config, project.path(), ApplyMode::Write);
    assert!(matches!(
        again.results[0].1,
        Ok(ModResult::AlreadyApplied { .. })
    ));
}

#[test]
fn test_text_mod_on_missing_file() {
    let project = setup_test_project();
    let config = load_from_str(
        r##"
[[mods]]
id = "podfile"
file = "ios/Podfile"
operation = { type = "merge", tag = "pods", anchor = "target", comment = "#", contents = "pod 'Maps'" }
"##,
    )
    .unwrap();

    let report = apply_mods(&config, project.path(), ApplyMode::Write);
    assert!(matches!(
        report.results[0].1,
        Err(ApplicationError::MissingFile { .. })
    ));
    assert!(!project.path().join("ios").exists());
}

#[test]
fn test_paths_outside_project_are_rejected() {
    let project = setup_test_project();
    let config = load_from_str(
        r##"
[[mods]]
id = "escape"
file = "../outside.gradle"
operation = { type = "remove", tag = "x" }

[[mods]]
id = "deps"
file = "node_modules/react-native/build.gradle"
operation = { type = "remove", tag = "x" }
"##,
    )
    .unwrap();

    let report = apply_mods(&config, project.path(), ApplyMode::Write);
    assert_eq!(report.failures(), 2);
    assert!(report
        .results
        .iter()
        .all(|(_, r)| matches!(r, Err(ApplicationError::Safety(_)))));
}

#[test]
fn test_load_from_path() {
    let dir = TempDir::new().unwrap();
    let path: PathBuf = dir.path().join("maps.toml");
    fs::write(&path, TWO_MERGES).unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.mods.len(), 2);
    assert!(config.meta.project_relative);
}
