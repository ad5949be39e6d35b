use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bucksln::{canonicalize_or_current, target_short_name};
use clap::Parser;

use slngen_core::actions::{self, Actions};
use slngen_core::emit;
use slngen_core::query::{self, BuckClient};
use slngen_core::solution::SolutionBuilder;

/// Generate a Visual Studio solution from buck2 targets.
///
/// This CLI is a thin wrapper around `slngen-core` (exposed in code as
/// `slngen_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "bucksln",
    version,
    about = "Generate Visual Studio solutions and projects from buck2 build graphs",
    long_about = None
)]
struct Cli {
    /// Names of the targets to create projects for. Dependencies must be
    /// listed before the targets that depend on them.
    #[arg(required = true)]
    targets: Vec<String>,

    /// Directory to write the solution and project files to.
    #[arg(short, long)]
    output: PathBuf,

    /// Name of the .sln file to generate.
    #[arg(long)]
    sln: String,

    /// Read compile commands from this compilation database instead of
    /// querying buck2. Supports exactly one target per invocation.
    #[arg(long)]
    compdb: Option<PathBuf>,

    /// Path to the buck2 binary. Defaults to `$BUCK2_BIN`, then `buck2`.
    #[arg(long)]
    buck2: Option<PathBuf>,

    /// Build root the generated NMake command changes into. Defaults to the
    /// current working directory.
    #[arg(long, default_value = ".")]
    root: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let build_root = canonicalize_or_current(&cli.root)?;
    let output_seed = cli.output.display().to_string();
    let mut builder = SolutionBuilder::new(&output_seed);

    match &cli.compdb {
        Some(compdb) => {
            if cli.targets.len() != 1 {
                bail!("--compdb supports exactly one target per invocation");
            }
            let target = target_short_name(&cli.targets[0]).to_string();

            let body = fs::read_to_string(compdb).with_context(|| {
                format!("Failed to read compilation database at {}", compdb.display())
            })?;
            let compile_entries = query::parse_compdb(&body)?;

            // The database carries no link/archive actions, so the binary
            // kind stays Unknown and no dependencies are recorded.
            let sources: Vec<String> = compile_entries.keys().cloned().collect();
            let actions = Actions { compile_entries, ..Actions::default() };

            let diagnostics = builder.add_project(&target, &sources, Vec::new(), &actions)?;
            report_diagnostics(&target, &diagnostics);
        }
        None => {
            let client = match &cli.buck2 {
                Some(program) => BuckClient::with_program(program),
                None => BuckClient::new(),
            };

            for raw_target in &cli.targets {
                let target = target_short_name(raw_target).to_string();

                let sources = client
                    .sources(&target)
                    .with_context(|| format!("Failed to query sources of :{target}"))?;
                let deps = client
                    .deps(&target)
                    .with_context(|| format!("Failed to query dependencies of :{target}"))?;
                let raw_actions = client
                    .actions(&target)
                    .with_context(|| format!("Failed to query actions of :{target}"))?;
                let actions = actions::classify(&raw_actions)
                    .with_context(|| format!("Failed to classify actions of :{target}"))?;

                let diagnostics = builder.add_project(&target, &sources, deps, &actions)?;
                report_diagnostics(&target, &diagnostics);
            }
        }
    }

    let solution = builder.finish();

    fs::create_dir_all(&cli.output).with_context(|| {
        format!("Failed to create output directory {}", cli.output.display())
    })?;

    let sln_path = cli.output.join(&cli.sln);
    let sln_file = fs::File::create(&sln_path)
        .with_context(|| format!("Failed to create {}", sln_path.display()))?;
    emit::write_sln(sln_file, &solution)
        .with_context(|| format!("Failed to write {}", sln_path.display()))?;

    for project in solution.projects.values() {
        let vcxproj_path = cli.output.join(format!("{}.vcxproj", project.name));
        let vcxproj_file = fs::File::create(&vcxproj_path)
            .with_context(|| format!("Failed to create {}", vcxproj_path.display()))?;
        emit::write_vcxproj(vcxproj_file, project, &build_root)
            .with_context(|| format!("Failed to write {}", vcxproj_path.display()))?;

        let filters_path = cli.output.join(format!("{}.vcxproj.filters", project.name));
        let filters_file = fs::File::create(&filters_path)
            .with_context(|| format!("Failed to create {}", filters_path.display()))?;
        emit::write_filters(filters_file, project, &build_root)
            .with_context(|| format!("Failed to write {}", filters_path.display()))?;
    }

    println!("Wrote solution:");
    println!("  Sln: {}", sln_path.display());
    for project in solution.projects.values() {
        println!("  Project: {} [{}]", project.name, project.kind.configuration_type());
    }

    Ok(())
}

/// Unknown-flag diagnostics are non-fatal by design: new compiler flags
/// must not break generation, only degrade fidelity of the project file.
fn report_diagnostics(target: &str, diagnostics: &[String]) {
    for flag in diagnostics {
        eprintln!("warning: unknown compiler option {flag} (target {target})");
    }
}
