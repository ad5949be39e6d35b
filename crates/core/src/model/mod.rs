//! Project model shared by the classifier, the translator, the solution
//! builder, and the emitters.
//!
//! Everything here is write-once: values are constructed from the build
//! tool's current state and never mutated afterwards. The only thing that
//! persists between runs is the *reproducibility* of identifiers, which are
//! derived from names, never from per-run randomness.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of binary a target produces, inferred from its link/archive actions.
///
/// `DynamicLibrary` is present for completeness but is never inferred by the
/// classifier today; only link-executable and link/archive actions are
/// recognized.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BinaryKind {
    /// No link or archive action was observed for the target.
    #[default]
    Unknown,
    Application,
    StaticLibrary,
    DynamicLibrary,
}

impl BinaryKind {
    /// MSBuild `ConfigurationType` value for this kind.
    ///
    /// Targets without a recognized link step fall back to an NMake-style
    /// `Makefile` project, which still builds through buck2.
    pub fn configuration_type(self) -> &'static str {
        match self {
            BinaryKind::Unknown => "Makefile",
            BinaryKind::Application => "Application",
            BinaryKind::StaticLibrary => "StaticLibrary",
            BinaryKind::DynamicLibrary => "DynamicLibrary",
        }
    }
}

/// An indirect, named list of command-line tokens referenced from a compile
/// action via an `@filename` marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArgumentFile {
    /// Base name of the file, as referenced by `@` markers.
    pub name: String,
    /// Ordered tokens, still carrying their surrounding quotes.
    pub tokens: Vec<String>,
}

/// One compiler invocation: the source it compiles, the directory it runs
/// in, and its raw argument vector (compiler executable first).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompileEntry {
    pub source: String,
    pub directory: String,
    pub arguments: Vec<String>,
}

/// Result of translating one compile command line.
///
/// Every input flag is accounted for in exactly one place: `include_paths`,
/// the derivation of a `settings` entry, or `passthrough` (a handful of
/// known no-op flags are deliberately dropped). Ordering is load-bearing:
/// include paths keep encounter order with duplicates, settings keep
/// first-recognized order, passthrough keeps encounter order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslatedOptions {
    pub include_paths: Vec<String>,
    pub settings: IndexMap<String, String>,
    pub passthrough: Vec<String>,
}

impl TranslatedOptions {
    /// True when nothing was translated (e.g. a header file with no compile
    /// action of its own).
    pub fn is_empty(&self) -> bool {
        self.include_paths.is_empty() && self.settings.is_empty() && self.passthrough.is_empty()
    }
}

/// One Visual Studio project, assembled from a single buck2 target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub kind: BinaryKind,
    /// Stable identifier derived from the target name; identical across runs.
    pub id: Uuid,
    /// Names of other projects this one depends on, in query-report order.
    pub dependencies: Vec<String>,
    /// Source file -> translated options, in source-report order. Headers
    /// and other non-compiled sources map to empty options.
    pub files: IndexMap<String, TranslatedOptions>,
}

/// A full solution: projects in the order their targets were requested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Solution {
    pub id: Uuid,
    pub projects: IndexMap<String, Project>,
}

/// Derive a stable 128-bit identifier from a seed string.
///
/// UUIDv5 over the DNS namespace, matching the scheme the original
/// generator used, so identifiers survive reimplementation unchanged.
pub fn derive_id(seed: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, seed.as_bytes())
}

/// Identifier for the project generated from `target`.
pub fn project_id(target: &str) -> Uuid {
    derive_id(&format!("buck2-target-to-vs-solution-{target}"))
}

/// Identifier for the solution written to `output` (the output directory as
/// the user spelled it).
pub fn solution_id(output: &str) -> Uuid {
    derive_id(&format!("buck2-target-to-vs-{output}"))
}

/// Identifier for a project's "Header Files" filter group.
pub fn header_filter_id(project: &str) -> Uuid {
    derive_id(&format!("buck2-header-filter-{project}"))
}

/// Identifier for a project's "Source Files" filter group.
pub fn source_filter_id(project: &str) -> Uuid {
    derive_id(&format!("buck2-source-filter-{project}"))
}
