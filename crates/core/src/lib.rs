//! slngen-core
//!
//! Core library for translating buck2 build graphs into Visual Studio
//! solution/project models.
//!
//! This crate defines the project model, the build-action classifier, the
//! compiler command-line translator, the buck2 query adapter, the solution
//! assembler, and the sln/vcxproj/filters emitters.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, editor integration, etc.).

pub mod actions;
pub mod emit;
pub mod model;
pub mod options;
pub mod query;
pub mod solution;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
