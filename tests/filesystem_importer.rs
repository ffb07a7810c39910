//! End-to-end coverage of `FilesystemImporter` resolution (spec.md §4.5):
//! partial (`_name.scss`) preference, `@use` module isolation, and `@import`
//! injecting into the current scope rather than a separate module.

use std::fs;

use sassy::{compile_path, Options};
use tempfile::tempdir;

#[test]
fn use_resolves_partial_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("_colors.scss"), "$red: #f00;\n").unwrap();
    let entry = dir.path().join("main.scss");
    fs::write(
        &entry,
        "@use \"colors\";\na { color: colors.$red; }\n",
    )
    .unwrap();

    let result = compile_path(&entry, &Options::default()).unwrap();
    assert_eq!(result.css, "a {\n  color: #ff0000;\n}\n");
}

#[test]
fn import_shares_scope_with_importer() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("_vars.scss"), "$x: 10px;\n").unwrap();
    let entry = dir.path().join("main.scss");
    fs::write(&entry, "@import \"vars\";\na { width: $x; }\n").unwrap();

    let result = compile_path(&entry, &Options::default()).unwrap();
    assert_eq!(result.css, "a {\n  width: 10px;\n}\n");
}

#[test]
fn loaded_urls_include_dependency() {
    let dir = tempdir().unwrap();
    let dep = dir.path().join("_dep.scss");
    fs::write(&dep, "$y: 1;\n").unwrap();
    let entry = dir.path().join("main.scss");
    fs::write(&entry, "@use \"dep\";\na { b: dep.$y; }\n").unwrap();

    let result = compile_path(&entry, &Options::default()).unwrap();
    assert!(result
        .loaded_urls
        .iter()
        .any(|u| u.ends_with("_dep.scss") || u.contains("dep")));
}
