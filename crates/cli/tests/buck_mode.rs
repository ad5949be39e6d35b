#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use predicates::prelude::*;
use tempfile::tempdir;

/// Install a stub `buck2` that answers the query surface for targets `A`
/// (application, no deps) and `B` (depends on `A`).
fn write_stub_buck2(dir: &Path) -> PathBuf {
    let script = r#"#!/bin/sh
case "$1 $2" in
"cquery inputs(:A)")
    echo '["src/a.cpp", "src/a.h"]'
    ;;
"cquery deps(:A)")
    echo '["root//:A (cfg:windows-x86_64)"]'
    ;;
"aquery :A")
    cat <<'EOF'
{
    "w0": {"kind": "write", "identifier": "buck-out/v2/a.rsp", "contents": "\"/W4\"\n\"/std:c++17\"\n"},
    "c0": {"kind": "run", "category": "compile", "cmd": ["cl.exe", "/Iinc", "@buck-out/v2/a.rsp", "-c", "src/a.cpp", "/Foa.obj"]},
    "l0": {"kind": "run", "category": "link-executable", "cmd": ["link.exe", "a.obj"]}
}
EOF
    ;;
"cquery inputs(:B)")
    echo '["src/b.cpp"]'
    ;;
"cquery deps(:B)")
    echo '["root//:B (cfg:windows-x86_64)", "root//:A (cfg:windows-x86_64)"]'
    ;;
"aquery :B")
    cat <<'EOF'
{
    "c0": {"kind": "run", "category": "compile", "cmd": ["cl.exe", "-c", "src/b.cpp"]},
    "l0": {"kind": "run", "category": "archive", "cmd": ["lib.exe"]}
}
EOF
    ;;
*)
    echo "stub buck2: unexpected query: $*" >&2
    exit 1
    ;;
esac
"#;
    let path = dir.join("buck2");
    fs::write(&path, script).expect("write stub buck2");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod stub buck2");
    path
}

/// Full buck2-mode pipeline against the stub: query, classify, translate
/// (through an argument file), assemble, emit.
#[test]
fn generates_solution_from_stubbed_queries() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    let stub = write_stub_buck2(root);

    assert_cmd::cargo::cargo_bin_cmd!("bucksln")
        .current_dir(root)
        .env("BUCK2_BIN", &stub)
        .arg("A")
        .arg("B")
        .arg("--output")
        .arg("out")
        .arg("--sln")
        .arg("game.sln")
        .assert()
        .success();

    let sln = fs::read_to_string(root.join("out/game.sln")).expect("sln written");
    assert!(sln.contains("\"A\", \"A.vcxproj\""));
    assert!(sln.contains("\"B\", \"B.vcxproj\""));

    let a = fs::read_to_string(root.join("out/A.vcxproj")).expect("A.vcxproj written");
    assert!(a.contains("<ConfigurationType>Application</ConfigurationType>"));
    // Options that arrived through the argument-file indirection.
    assert!(a.contains("<WarningLevel>Level4</WarningLevel>"));
    assert!(a.contains("<LanguageStandard>stdcpp17</LanguageStandard>"));

    let b = fs::read_to_string(root.join("out/B.vcxproj")).expect("B.vcxproj written");
    assert!(b.contains("<ConfigurationType>StaticLibrary</ConfigurationType>"));

    assert!(root.join("out/A.vcxproj.filters").exists());
    assert!(root.join("out/B.vcxproj.filters").exists());
}

/// The `deps` query reports `B` itself; only `A` may appear as a
/// dependency of `B` in the solution.
#[test]
fn dependency_block_references_the_dependency_project() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    let stub = write_stub_buck2(root);

    assert_cmd::cargo::cargo_bin_cmd!("bucksln")
        .current_dir(root)
        .env("BUCK2_BIN", &stub)
        .arg("A")
        .arg("B")
        .arg("--output")
        .arg("out")
        .arg("--sln")
        .arg("game.sln")
        .assert()
        .success();

    let sln = fs::read_to_string(root.join("out/game.sln")).expect("sln written");
    let a_id = slngen_core::model::project_id("A");
    assert!(sln.contains(&format!("{{{a_id}}} = {{{a_id}}}")));
}

/// Targets requested out of dependency order fail deterministically; no
/// artifacts are written for the failed run.
#[test]
fn out_of_order_targets_fail_without_artifacts() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    let stub = write_stub_buck2(root);

    assert_cmd::cargo::cargo_bin_cmd!("bucksln")
        .current_dir(root)
        .env("BUCK2_BIN", &stub)
        .arg("B")
        .arg("A")
        .arg("--output")
        .arg("out")
        .arg("--sln")
        .arg("game.sln")
        .assert()
        .failure()
        .stderr(predicate::str::contains("dependency A of target B"));

    assert!(!root.join("out/game.sln").exists());
}

/// A non-zero exit from the build tool is fatal and surfaces the query
/// that failed.
#[test]
fn build_tool_failure_is_fatal() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    assert_cmd::cargo::cargo_bin_cmd!("bucksln")
        .current_dir(root)
        .arg("A")
        .arg("--output")
        .arg("out")
        .arg("--sln")
        .arg("game.sln")
        .arg("--buck2")
        .arg("/bin/false")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to query sources of :A"));
}
