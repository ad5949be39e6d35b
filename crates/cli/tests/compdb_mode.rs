use std::fs;

use predicates::prelude::*;
use tempfile::tempdir;

const COMPDB: &str = r#"[
    {
        "file": "src/main.cpp",
        "directory": "/repo",
        "arguments": ["cl.exe", "-c", "src/main.cpp", "/Iinc", "/W4", "/std:c++20", "/Zzz"]
    },
    {
        "file": "src/util.cpp",
        "directory": "/repo",
        "arguments": ["cl.exe", "-c", "src/util.cpp", "/O2", "/DNDEBUG"]
    }
]"#;

/// End-to-end compdb mode: one target, three artifacts, unknown flag
/// reported on stderr without failing the run.
#[test]
fn compdb_mode_writes_all_three_artifacts() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    let compdb_path = root.join("compile_commands.json");
    fs::write(&compdb_path, COMPDB).expect("write compdb");

    assert_cmd::cargo::cargo_bin_cmd!("bucksln")
        .current_dir(root)
        .arg("gamelib")
        .arg("--output")
        .arg("out")
        .arg("--sln")
        .arg("test.sln")
        .arg("--compdb")
        .arg(&compdb_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("unknown compiler option /Zzz"));

    let sln = fs::read_to_string(root.join("out/test.sln")).expect("sln written");
    assert!(sln.contains("\"gamelib\", \"gamelib.vcxproj\""));

    let vcxproj = fs::read_to_string(root.join("out/gamelib.vcxproj")).expect("vcxproj written");
    assert!(vcxproj.contains("<WarningLevel>Level4</WarningLevel>"));
    assert!(vcxproj.contains("<LanguageStandard>stdcpp20</LanguageStandard>"));
    assert!(vcxproj.contains("<PreprocessorDefinitions>NDEBUG</PreprocessorDefinitions>"));
    assert!(vcxproj.contains("<AdditionalOptions>/Zzz</AdditionalOptions>"));
    // No link action in a compilation database: NMake fallback project.
    assert!(vcxproj.contains("<ConfigurationType>Makefile</ConfigurationType>"));

    let filters =
        fs::read_to_string(root.join("out/gamelib.vcxproj.filters")).expect("filters written");
    assert!(filters.contains("<Filter>Source Files</Filter>"));
}

/// The compdb path cannot attribute entries to more than one target.
#[test]
fn compdb_mode_rejects_multiple_targets() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    let compdb_path = root.join("compile_commands.json");
    fs::write(&compdb_path, COMPDB).expect("write compdb");

    assert_cmd::cargo::cargo_bin_cmd!("bucksln")
        .current_dir(root)
        .arg("a")
        .arg("b")
        .arg("--output")
        .arg("out")
        .arg("--sln")
        .arg("test.sln")
        .arg("--compdb")
        .arg(&compdb_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("exactly one target"));
}

#[test]
fn missing_compdb_file_fails() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();

    assert_cmd::cargo::cargo_bin_cmd!("bucksln")
        .current_dir(root)
        .arg("gamelib")
        .arg("--output")
        .arg("out")
        .arg("--sln")
        .arg("test.sln")
        .arg("--compdb")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read compilation database"));
}
