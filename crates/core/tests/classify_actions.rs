use indexmap::IndexMap;

use slngen_core::actions::{classify, ClassifyError, RawAction};
use slngen_core::model::BinaryKind;

fn parse(body: &str) -> IndexMap<String, RawAction> {
    serde_json::from_str(body).expect("fixture JSON")
}

#[test]
fn compile_write_and_link_records_are_partitioned() {
    let raw = parse(
        r#"{
        "a0": {
            "kind": "write",
            "identifier": "buck-out/v2/args.rsp",
            "contents": "\"/W4\"\n\n\"/O2\"\nblank-separator\n"
        },
        "a1": {
            "kind": "run",
            "category": "compile",
            "cmd": ["cl.exe", "/Iinc", "@buck-out/v2/args.rsp", "-c", "src/a.cpp", "/Foa.obj"]
        },
        "a2": { "kind": "run", "category": "archive", "cmd": ["lib.exe", "a.obj"] },
        "a3": { "kind": "symlinked_dir" }
    }"#,
    );

    let actions = classify(&raw).unwrap();

    assert_eq!(actions.binary_kind, BinaryKind::StaticLibrary);

    let argfile = actions.argument_files.get("args.rsp").expect("argument file by base name");
    assert_eq!(argfile.tokens, vec!["\"/W4\"", "\"/O2\""]);

    let entry = actions.compile_entries.get("src/a.cpp").expect("compile entry by source");
    assert_eq!(entry.arguments, vec!["cl.exe", "/Iinc", "@buck-out/v2/args.rsp"]);
    assert_eq!(entry.directory, ".");
}

#[test]
fn link_executable_marks_an_application() {
    let raw = parse(
        r#"{
        "a0": { "kind": "run", "category": "link-executable", "cmd": ["link.exe"] }
    }"#,
    );
    assert_eq!(classify(&raw).unwrap().binary_kind, BinaryKind::Application);
}

#[test]
fn link_marks_a_static_library() {
    let raw = parse(
        r#"{
        "a0": { "kind": "run", "category": "link", "cmd": ["link.exe"] }
    }"#,
    );
    assert_eq!(classify(&raw).unwrap().binary_kind, BinaryKind::StaticLibrary);
}

/// A target without link or archive actions stays Unknown.
#[test]
fn no_link_action_leaves_kind_unknown() {
    let raw = parse(
        r#"{
        "a0": {
            "kind": "run",
            "category": "compile",
            "cmd": ["cl.exe", "-c", "a.cpp"]
        }
    }"#,
    );
    assert_eq!(classify(&raw).unwrap().binary_kind, BinaryKind::Unknown);
}

/// The classifier refuses to guess at unknown build-system behavior: no
/// partial bundle comes back for a graph with an unrecognized record.
#[test]
fn unknown_kind_is_fatal() {
    let raw = parse(
        r#"{
        "a0": { "kind": "run", "category": "compile", "cmd": ["cl.exe", "-c", "a.cpp"] },
        "a1": { "kind": "unknown-experimental" }
    }"#,
    );
    assert_eq!(
        classify(&raw),
        Err(ClassifyError::UnknownAction {
            id: "a1".to_string(),
            kind: "unknown-experimental".to_string(),
            category: None,
        })
    );
}

#[test]
fn unknown_run_category_is_fatal() {
    let raw = parse(
        r#"{
        "a0": { "kind": "run", "category": "codegen", "cmd": ["tool.exe"] }
    }"#,
    );
    assert_eq!(
        classify(&raw),
        Err(ClassifyError::UnknownAction {
            id: "a0".to_string(),
            kind: "run".to_string(),
            category: Some("codegen".to_string()),
        })
    );
}

#[test]
fn write_without_contents_is_fatal() {
    let raw = parse(r#"{ "a0": { "kind": "write", "identifier": "args.rsp" } }"#);
    assert_eq!(
        classify(&raw),
        Err(ClassifyError::MissingPayload {
            id: "a0".to_string(),
            kind: "write".to_string(),
            field: "contents",
        })
    );
}
