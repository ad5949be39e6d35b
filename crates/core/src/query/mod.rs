//! buck2 query adapter.
//!
//! Thin, blocking wrapper over `buck2 cquery`/`aquery` with captured output.
//! No retries, no timeouts: a non-zero exit from the tool is fatal for the
//! whole run and surfaces the tool's own stderr.
//!
//! The alternate input path, [`parse_compdb`], reads a clang-style
//! compilation database instead; it is a simpler substitute when
//! link/archive classification is not needed.

use std::path::{Path, PathBuf};
use std::process::Command;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::actions::RawAction;
use crate::model::CompileEntry;

/// Pattern a target descriptor must match to be project-eligible.
///
/// cquery reports descriptors like `root//:gamelib (cfg:windows-x86_64)`.
pub const TARGET_PATTERN: &str = r"^root//:([a-zA-Z0-9.-]+) .*";

static TARGET_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(TARGET_PATTERN).expect("target pattern must compile"));

/// Extract the project name from a raw buck2 target descriptor, or `None`
/// when the descriptor is not project-eligible.
pub fn extract_target_name(descriptor: &str) -> Option<&str> {
    TARGET_REGEX.captures(descriptor).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program} {args}` exited with {status}: {stderr}")]
    Failed { program: String, args: String, status: String, stderr: String },
    #[error("failed to parse {what} JSON: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Client for the external build tool's query interface.
pub struct BuckClient {
    program: PathBuf,
}

impl BuckClient {
    /// Resolve the buck2 binary: `BUCK2_BIN` if set, else `buck2` on PATH.
    ///
    /// The env override lets tests substitute a stub script.
    pub fn new() -> Self {
        let program =
            std::env::var_os("BUCK2_BIN").map(PathBuf::from).unwrap_or_else(|| "buck2".into());
        Self { program }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// All project-eligible target names in the build graph.
    pub fn all_targets(&self) -> Result<Vec<String>, QueryError> {
        let raw: Vec<String> = self.query_json("targets", &["cquery", "...", "--json"])?;
        Ok(raw.iter().filter_map(|d| extract_target_name(d)).map(str::to_string).collect())
    }

    /// Source files of `target`, in the order buck2 reports them.
    pub fn sources(&self, target: &str) -> Result<Vec<String>, QueryError> {
        let expr = format!("inputs(:{target})");
        self.query_json("sources", &["cquery", &expr, "--json"])
    }

    /// Direct project-eligible dependencies of `target`, excluding itself.
    pub fn deps(&self, target: &str) -> Result<Vec<String>, QueryError> {
        let expr = format!("deps(:{target})");
        let raw: Vec<String> = self.query_json("deps", &["cquery", &expr, "--json"])?;
        Ok(raw
            .iter()
            .filter_map(|d| extract_target_name(d))
            .filter(|name| *name != target)
            .map(str::to_string)
            .collect())
    }

    /// Raw action graph of `target`: opaque action id -> record.
    pub fn actions(&self, target: &str) -> Result<IndexMap<String, RawAction>, QueryError> {
        let expr = format!(":{target}");
        self.query_json("actions", &["aquery", &expr, "--json"])
    }

    fn query_json<T: serde::de::DeserializeOwned>(
        &self,
        what: &'static str,
        args: &[&str],
    ) -> Result<T, QueryError> {
        let output = Command::new(&self.program).args(args).output().map_err(|source| {
            QueryError::Spawn { program: self.program.display().to_string(), source }
        })?;
        if !output.status.success() {
            return Err(QueryError::Failed {
                program: self.program.display().to_string(),
                args: args.join(" "),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout).map_err(|source| QueryError::Json { what, source })
    }
}

impl Default for BuckClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct CompdbRow {
    file: String,
    directory: String,
    arguments: Vec<String>,
}

/// Parse a compilation database into compile entries keyed by source file.
///
/// Duplicate `file` rows keep their first position with the last value
/// winning, matching how databases for multiple configurations are merged.
pub fn parse_compdb(body: &str) -> Result<IndexMap<String, CompileEntry>, QueryError> {
    let rows: Vec<CompdbRow> = serde_json::from_str(body)
        .map_err(|source| QueryError::Json { what: "compilation database", source })?;

    let mut entries = IndexMap::new();
    for row in rows {
        entries.insert(
            row.file.clone(),
            CompileEntry { source: row.file, directory: row.directory, arguments: row.arguments },
        );
    }
    Ok(entries)
}
