//! Artifact emission.
//!
//! Serializes the assembled model into the three Visual Studio artifacts:
//! the solution file, one vcxproj per project, and one filters file per
//! project. Purely mechanical: the model guarantees stable iteration order
//! over projects, dependencies, and files, and cycles are assumed absent
//! (the builder cannot construct one).

use std::io::{self, Write};
use std::path::Path;

use crate::model::{self, Project, Solution, TranslatedOptions};

/// Project-type GUID Visual Studio uses for C++ projects.
pub const CXX_PROJECT_GUID: &str = "8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942";

/// Indentation-tracking line writer with an XML tag stack.
pub struct Printer<W: Write> {
    out: W,
    indentation: usize,
    newline: &'static str,
    stack: Vec<String>,
}

impl<W: Write> Printer<W> {
    /// LF line endings; used for the XML artifacts.
    pub fn new(out: W) -> Self {
        Self { out, indentation: 0, newline: "\n", stack: Vec::new() }
    }

    /// CRLF line endings; the solution format expects them.
    pub fn with_crlf(out: W) -> Self {
        Self { out, indentation: 0, newline: "\r\n", stack: Vec::new() }
    }

    pub fn indent(&mut self) {
        self.indentation += 4;
    }

    pub fn dedent(&mut self) {
        self.indentation = self.indentation.saturating_sub(4);
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(" ".repeat(self.indentation).as_bytes())?;
        self.out.write_all(text.as_bytes())?;
        self.out.write_all(self.newline.as_bytes())
    }

    /// Write `<tag attrs...>`, indent, and remember the tag for
    /// [`close_tag`](Self::close_tag).
    pub fn open_tag(&mut self, tag: &str, attrs: &str) -> io::Result<()> {
        if attrs.is_empty() {
            self.line(&format!("<{tag}>"))?;
        } else {
            self.line(&format!("<{tag} {attrs}>"))?;
        }
        self.indent();
        self.stack.push(tag.to_string());
        Ok(())
    }

    pub fn close_tag(&mut self) -> io::Result<()> {
        let tag = self.stack.pop().expect("close_tag without matching open_tag");
        self.dedent();
        self.line(&format!("</{tag}>"))
    }

    /// `<name>value</name>` on one line, value escaped.
    pub fn element(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.line(&format!("<{name}>{}</{name}>", xml_escape(value)))
    }
}

/// Escape the characters XML cannot carry verbatim.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Logical grouping of a source file, keyed by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileGroup {
    Source,
    Header,
    Other,
}

pub fn file_group(path: &str) -> FileGroup {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("cpp") | Some("c") | Some("cxx") => FileGroup::Source,
        Some("h") | Some("hpp") => FileGroup::Header,
        _ => FileGroup::Other,
    }
}

fn absolutize(root: &Path, path: &str) -> String {
    let p = Path::new(path);
    if p.is_absolute() {
        path.to_string()
    } else {
        root.join(p).display().to_string()
    }
}

/// Write the solution descriptor.
pub fn write_sln<W: Write>(out: W, solution: &Solution) -> io::Result<()> {
    let mut p = Printer::with_crlf(out);

    p.line("Microsoft Visual Studio Solution File, Format Version 12.00")?;
    p.line("# Visual Studio Version 17")?;

    for project in solution.projects.values() {
        p.line(&format!(
            "Project(\"{{{CXX_PROJECT_GUID}}}\") = \"{name}\", \"{name}.vcxproj\", \"{{{id}}}\"",
            name = project.name,
            id = project.id,
        ))?;
        p.indent();
        p.line("ProjectSection(ProjectDependencies) = postProject")?;
        p.indent();
        for dependency in &project.dependencies {
            if let Some(dep) = solution.projects.get(dependency) {
                p.line(&format!("{{{id}}} = {{{id}}}", id = dep.id))?;
            }
        }
        p.dedent();
        p.line("EndProjectSection")?;
        p.dedent();
        p.line("EndProject")?;
    }

    p.line("Global")?;
    p.indent();
    p.line("GlobalSection(SolutionConfigurationPlatforms) = preSolution")?;
    p.indent();
    p.line("Release|x64 = Release|x64")?;
    p.dedent();
    p.line("EndGlobalSection")?;
    p.line("GlobalSection(ProjectConfigurationPlatforms) = postSolution")?;
    p.indent();
    for project in solution.projects.values() {
        p.line(&format!("{{{}}}.Release|x64 = Release|x64", project.id))?;
    }
    p.dedent();
    p.line("EndGlobalSection")?;
    p.line("GlobalSection(ExtensibilityGlobals) = postSolution")?;
    p.indent();
    p.line(&format!("SolutionGuid = {{{}}}", solution.id))?;
    p.dedent();
    p.line("EndGlobalSection")?;
    p.line("GlobalSection(ExtensibilityAddIns) = postSolution")?;
    p.line("EndGlobalSection")?;
    p.dedent();
    p.line("EndGlobal")?;

    Ok(())
}

/// Write the project descriptor.
///
/// `build_root` is the directory the NMake build command changes into and
/// the base for absolutizing relative source paths.
pub fn write_vcxproj<W: Write>(out: W, project: &Project, build_root: &Path) -> io::Result<()> {
    let mut p = Printer::new(out);

    p.line("<?xml version=\"1.0\"  encoding=\"utf-8\"?>")?;
    p.open_tag(
        "Project",
        "DefaultTargets=\"Build\" ToolsVersion=\"17.0\" \
         xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\"",
    )?;

    p.open_tag("PropertyGroup", "")?;
    p.element("PreferredToolArchitecture", "x64")?;
    p.close_tag()?;

    p.open_tag("ItemGroup", "Label=\"ProjectConfigurations\"")?;
    p.open_tag("ProjectConfiguration", "Include=\"Release|x64\"")?;
    p.element("Configuration", "Release")?;
    p.element("Platform", "x64")?;
    p.close_tag()?;
    p.close_tag()?;

    p.open_tag("PropertyGroup", "Label=\"Globals\"")?;
    p.element("ProjectGuid", &format!("{{{}}}", project.id))?;
    p.element("Keyword", "Win32Proj")?;
    p.element("WindowsTargetPlatformVersion", "10.0.19041.0")?;
    p.element("Platform", "x64")?;
    p.element("ProjectName", &project.name)?;
    p.element("VCProjectUpgraderObjectName", "NoUpgrade")?;
    p.close_tag()?;

    p.line("<Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.Default.props\" />")?;

    p.open_tag("PropertyGroup", "Label=\"Configuration\"")?;
    p.element("ConfigurationType", project.kind.configuration_type())?;
    p.element("UseDebugLibraries", "false")?;
    p.element("PlatformToolset", "v143")?;
    p.close_tag()?;

    p.line("<Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.props\" />")?;
    p.open_tag("ImportGroup", "Label=\"ExtensionSettings\"")?;
    p.close_tag()?;
    p.open_tag("ImportGroup", "Label=\"PropertySheets\"")?;
    p.line(
        "<Import Project=\"$(UserRootDir)\\Microsoft.Cpp.$(Platform).user.props\" \
         Condition=\"exists('$(UserRootDir)\\Microsoft.Cpp.$(Platform).user.props')\" \
         Label=\"LocalAppDataPlatform\" />",
    )?;
    p.close_tag()?;
    p.line("<PropertyGroup Label=\"UserMacros\" />")?;

    p.open_tag("PropertyGroup", "")?;
    p.element(
        "NMakeBuildCommandLine",
        &format!("cd {} && buck2 build :{}", build_root.display(), project.name),
    )?;
    p.element("NMakeOutput", &format!("{}.exe", project.name))?;
    p.element("NMakePreprocessorDefinitions", "NDEBUG;$(NMakePreprocessorDefinitions)")?;
    p.close_tag()?;

    p.open_tag("ItemGroup", "")?;
    for (source, options) in &project.files {
        let include = xml_escape(&absolutize(build_root, source));
        match file_group(source) {
            FileGroup::Source => {
                p.open_tag("ClCompile", &format!("Include=\"{include}\""))?;
                write_cl_options(&mut p, options, build_root)?;
                p.close_tag()?;
            }
            FileGroup::Header => {
                p.line(&format!("<ClInclude Include=\"{include}\" />"))?;
            }
            FileGroup::Other => {}
        }
    }
    p.close_tag()?;

    p.line("<Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.targets\" />")?;
    p.open_tag("ImportGroup", "Label=\"ExtensionTargets\"")?;
    p.close_tag()?;

    p.close_tag()?;
    Ok(())
}

fn write_cl_options<W: Write>(
    p: &mut Printer<W>,
    options: &TranslatedOptions,
    build_root: &Path,
) -> io::Result<()> {
    if !options.include_paths.is_empty() {
        let joined = options
            .include_paths
            .iter()
            .map(|path| absolutize(build_root, path))
            .collect::<Vec<_>>()
            .join(";");
        p.element("AdditionalIncludeDirectories", &joined)?;
    }
    for (name, value) in &options.settings {
        p.element(name, value)?;
    }
    if !options.passthrough.is_empty() {
        p.element("AdditionalOptions", &options.passthrough.join(" "))?;
    }
    Ok(())
}

/// Write the file-grouping descriptor.
pub fn write_filters<W: Write>(out: W, project: &Project, build_root: &Path) -> io::Result<()> {
    let mut p = Printer::new(out);

    p.line("<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
    p.open_tag(
        "Project",
        "ToolsVersion=\"17.0\" xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\"",
    )?;

    p.open_tag("ItemGroup", "")?;
    for source in project.files.keys() {
        let include = xml_escape(&absolutize(build_root, source));
        match file_group(source) {
            FileGroup::Source => {
                p.open_tag("ClCompile", &format!("Include=\"{include}\""))?;
                p.element("Filter", "Source Files")?;
                p.close_tag()?;
            }
            FileGroup::Header => {
                p.open_tag("ClInclude", &format!("Include=\"{include}\""))?;
                p.element("Filter", "Header Files")?;
                p.close_tag()?;
            }
            FileGroup::Other => {}
        }
    }
    p.close_tag()?;

    p.open_tag("ItemGroup", "")?;
    p.open_tag("Filter", "Include=\"Header Files\"")?;
    p.element(
        "UniqueIdentifier",
        &format!("{{{}}}", model::header_filter_id(&project.name)),
    )?;
    p.close_tag()?;
    p.open_tag("Filter", "Include=\"Source Files\"")?;
    p.element(
        "UniqueIdentifier",
        &format!("{{{}}}", model::source_filter_id(&project.name)),
    )?;
    p.close_tag()?;
    p.close_tag()?;

    p.close_tag()?;
    Ok(())
}
