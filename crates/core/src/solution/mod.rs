//! Solution assembly.
//!
//! Projects are assembled one target at a time, in the order targets were
//! requested. The project map is append-only during a run: dependency
//! resolution only ever looks backwards, so a target's dependencies must
//! already be in the map when the target is added. There is no deferred
//! resolution and no topological reordering.

use indexmap::IndexMap;
use thiserror::Error;

use crate::actions::Actions;
use crate::model::{self, Project, Solution, TranslatedOptions};
use crate::options::{self, OptionError};

#[derive(Debug, Error)]
pub enum SolutionError {
    #[error("dependency {dependency} of target {target} is not part of the requested set")]
    UnresolvedDependency { target: String, dependency: String },
    #[error("failed to translate the compile command for {file}")]
    Translate {
        file: String,
        #[source]
        source: OptionError,
    },
}

/// Builds a [`Solution`] from targets in request order.
pub struct SolutionBuilder {
    output: String,
    projects: IndexMap<String, Project>,
}

impl SolutionBuilder {
    /// `output` seeds the solution identifier (the output directory as the
    /// user spelled it, for stability across runs).
    pub fn new(output: impl Into<String>) -> Self {
        Self { output: output.into(), projects: IndexMap::new() }
    }

    /// Assemble one target into a project and append it.
    ///
    /// `sources` is the query adapter's ordered file list; compile entries
    /// from `actions` supply per-file options, everything else (headers)
    /// gets empty options. Compile entries for files missing from `sources`
    /// are appended after, in action order.
    ///
    /// Returns the translator diagnostics collected across the target's
    /// files, for the frontend to report.
    pub fn add_project(
        &mut self,
        target: &str,
        sources: &[String],
        dependencies: Vec<String>,
        actions: &Actions,
    ) -> Result<Vec<String>, SolutionError> {
        for dependency in &dependencies {
            if !self.projects.contains_key(dependency) {
                return Err(SolutionError::UnresolvedDependency {
                    target: target.to_string(),
                    dependency: dependency.clone(),
                });
            }
        }

        let mut files: IndexMap<String, TranslatedOptions> = IndexMap::new();
        let mut diagnostics = Vec::new();

        for source in sources {
            let options = match actions.compile_entries.get(source) {
                Some(entry) => {
                    let translation = options::translate(&entry.arguments, &actions.argument_files)
                        .map_err(|err| SolutionError::Translate {
                            file: source.clone(),
                            source: err,
                        })?;
                    diagnostics.extend(translation.diagnostics);
                    translation.options
                }
                None => TranslatedOptions::default(),
            };
            files.insert(source.clone(), options);
        }

        for (source, entry) in &actions.compile_entries {
            if files.contains_key(source) {
                continue;
            }
            let translation = options::translate(&entry.arguments, &actions.argument_files)
                .map_err(|err| SolutionError::Translate { file: source.clone(), source: err })?;
            diagnostics.extend(translation.diagnostics);
            files.insert(source.clone(), translation.options);
        }

        let project = Project {
            name: target.to_string(),
            kind: actions.binary_kind,
            id: model::project_id(target),
            dependencies,
            files,
        };
        self.projects.insert(project.name.clone(), project);

        Ok(diagnostics)
    }

    pub fn finish(self) -> Solution {
        Solution { id: model::solution_id(&self.output), projects: self.projects }
    }
}
