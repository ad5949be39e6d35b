//! Build-action classification.
//!
//! buck2's action graph reports every recorded build step as an opaque id
//! mapped to a `{kind, identifier?, category?, cmd?, contents?}` record.
//! [`classify`] partitions those records into the pieces project generation
//! needs: argument-file writes, compile invocations, and the link/archive
//! evidence that tells us what kind of binary the target produces.
//!
//! Unrecognized records are a hard error. Guessing at unknown build-system
//! behavior would silently produce wrong projects.

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::model::{ArgumentFile, BinaryKind, CompileEntry};

/// Raw action record as reported by `buck2 aquery --json`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RawAction {
    pub kind: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub cmd: Option<Vec<String>>,
    #[serde(default)]
    pub contents: Option<String>,
}

/// Everything project generation needs from one target's action graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actions {
    pub binary_kind: BinaryKind,
    /// Argument files keyed by base name, as `@file` markers reference them.
    pub argument_files: IndexMap<String, ArgumentFile>,
    /// Compile entries keyed by source file, in action-report order.
    pub compile_entries: IndexMap<String, CompileEntry>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("unrecognized build action {id}: kind {kind:?}, category {category:?}")]
    UnknownAction { id: String, kind: String, category: Option<String> },
    #[error("build action {id} of kind {kind:?} is missing its {field} payload")]
    MissingPayload { id: String, kind: String, field: &'static str },
    #[error("compile action {id} has no source marker (-c <path>) in its command line")]
    MissingSource { id: String },
}

/// Classify one target's action graph.
pub fn classify(raw: &IndexMap<String, RawAction>) -> Result<Actions, ClassifyError> {
    let mut actions = Actions::default();

    for (id, record) in raw {
        match record.kind.as_str() {
            // Bookkeeping; nothing to generate from it.
            "symlinked_dir" => {}

            "write" => {
                let identifier = require(record.identifier.as_deref(), id, record, "identifier")?;
                let contents = require(record.contents.as_deref(), id, record, "contents")?;
                let name = base_name(identifier).to_string();
                let tokens = argument_file_tokens(contents);
                actions
                    .argument_files
                    .insert(name.clone(), ArgumentFile { name, tokens });
            }

            "run" => match record.category.as_deref() {
                Some("compile") => {
                    let cmd = record.cmd.as_deref().ok_or_else(|| {
                        ClassifyError::MissingPayload {
                            id: id.clone(),
                            kind: record.kind.clone(),
                            field: "cmd",
                        }
                    })?;
                    let entry = compile_entry(id, cmd)?;
                    actions.compile_entries.insert(entry.source.clone(), entry);
                }
                Some("link") | Some("archive") => {
                    actions.binary_kind = BinaryKind::StaticLibrary;
                }
                Some("link-executable") => {
                    actions.binary_kind = BinaryKind::Application;
                }
                other => {
                    return Err(ClassifyError::UnknownAction {
                        id: id.clone(),
                        kind: record.kind.clone(),
                        category: other.map(str::to_string),
                    })
                }
            },

            _ => {
                return Err(ClassifyError::UnknownAction {
                    id: id.clone(),
                    kind: record.kind.clone(),
                    category: record.category.clone(),
                })
            }
        }
    }

    Ok(actions)
}

/// Extract the compile entry from a `run`/`compile` command line.
///
/// The source is tagged by `-c <path>` (marker character varies), the object
/// output by a `/Fo`-prefixed token; both are removed. Everything else,
/// including the leading compiler executable, is kept verbatim for the
/// translator.
fn compile_entry(id: &str, cmd: &[String]) -> Result<CompileEntry, ClassifyError> {
    let mut source = None;
    let mut arguments = Vec::with_capacity(cmd.len());

    let mut i = 0;
    while i < cmd.len() {
        let token = &cmd[i];
        i += 1;

        if token == "-c" || token == "/c" {
            if let Some(path) = cmd.get(i) {
                source = Some(path.clone());
                i += 1;
                continue;
            }
            return Err(ClassifyError::MissingSource { id: id.to_string() });
        }
        if token == "-Fo" || token == "/Fo" {
            // Detached object path: skip the value token too.
            i += 1;
            continue;
        }
        if token.starts_with("-Fo") || token.starts_with("/Fo") {
            continue;
        }
        arguments.push(token.clone());
    }

    let source = source.ok_or_else(|| ClassifyError::MissingSource { id: id.to_string() })?;
    Ok(CompileEntry { source, directory: ".".to_string(), arguments })
}

/// Split a `write` action's payload into argument tokens.
///
/// Only quoted lines carry tokens; unquoted lines (blank separators and the
/// like) are discarded. Quotes are kept for the translator's tokenizer.
fn argument_file_tokens(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| line.len() >= 2 && line.starts_with('"') && line.ends_with('"'))
        .map(str::to_string)
        .collect()
}

fn require<'a>(
    value: Option<&'a str>,
    id: &str,
    record: &RawAction,
    field: &'static str,
) -> Result<&'a str, ClassifyError> {
    value.ok_or_else(|| ClassifyError::MissingPayload {
        id: id.to_string(),
        kind: record.kind.clone(),
        field,
    })
}

/// Final path component of a possibly slash- or backslash-separated path.
fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
