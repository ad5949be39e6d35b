//! Compiler command-line translation.
//!
//! Turns one cl.exe-style argument vector into the structured settings a
//! vcxproj can carry: include search paths, recognized semantic options
//! mapped to their MSBuild element names, and a verbatim passthrough list
//! for everything the table does not know.
//!
//! [`translate`] is a pure function of its inputs; nothing survives across
//! calls, so compile entries can be translated independently (and in
//! parallel if a frontend wants to).

use indexmap::IndexMap;
use thiserror::Error;

use crate::model::{ArgumentFile, TranslatedOptions};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("compile command is empty; expected the compiler executable as the first token")]
    MissingCompiler,
    #[error("unknown argument file referenced: @{0}")]
    UnknownArgumentFile(String),
    #[error("malformed compiler option {0:?}: expected a leading '-' or '/'")]
    BadMarker(String),
    #[error("compiler option {0} expects a value but no token followed")]
    MissingValue(String),
}

/// Translated options plus the non-fatal diagnostics produced on the way.
///
/// Diagnostics are returned as data rather than printed: the core never
/// writes to stderr, frontends decide how to surface warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    pub options: TranslatedOptions,
    /// One entry per unrecognized flag, verbatim with its marker character.
    pub diagnostics: Vec<String>,
}

/// Translate one compile command line.
///
/// `arguments` is the raw vector with the compiler executable first;
/// `argument_files` resolves `@file` indirections (looked up by base name).
/// Unrecognized flags are never fatal: they land in
/// `options.passthrough` and `diagnostics`. Malformed input (missing
/// executable, a token without a `-`/`/` marker, a value flag at the end of
/// the line) is fatal for this entry.
pub fn translate(
    arguments: &[String],
    argument_files: &IndexMap<String, ArgumentFile>,
) -> Result<Translation, OptionError> {
    let (_compiler, rest) = arguments.split_first().ok_or(OptionError::MissingCompiler)?;

    let tokens = expand_argument_files(rest, argument_files)?;
    let tokens: Vec<String> = tokens.iter().map(|t| unquote(t)).collect();

    let mut include_paths = Vec::new();
    let mut settings: IndexMap<String, String> = IndexMap::new();
    let mut passthrough = Vec::new();
    let mut diagnostics = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        let marker = match token.chars().next() {
            Some(c @ ('-' | '/')) => c,
            _ => return Err(OptionError::BadMarker(token.clone())),
        };
        let opt = &token[1..];

        if opt == "c" {
            // The source file is already known from the compile entry.
            if i >= tokens.len() {
                return Err(OptionError::MissingValue(token.clone()));
            }
            i += 1;
        } else if let Some(path) = opt.strip_prefix('I') {
            // /Ipath and /I path are interchangeable for the flag author
            // but must be disambiguated positionally.
            if path.is_empty() {
                let next =
                    tokens.get(i).ok_or_else(|| OptionError::MissingValue(token.clone()))?;
                include_paths.push(next.clone());
                i += 1;
            } else {
                include_paths.push(path.to_string());
            }
        } else if let Some(obj) = opt.strip_prefix("Fo") {
            // Object output path; the IDE does not need it.
            if obj.is_empty() {
                if i >= tokens.len() {
                    return Err(OptionError::MissingValue(token.clone()));
                }
                i += 1;
            }
        } else if let Some(sym) = opt.strip_prefix('D') {
            accumulate(&mut settings, "PreprocessorDefinitions", sym);
        } else if let Some(num) = opt.strip_prefix("we") {
            accumulate(&mut settings, "TreatSpecificWarningsAsErrors", num);
        } else if is_dropped(opt) {
            // Known flags with no vcxproj equivalent and no effect on the
            // described build.
        } else if let Some((name, value)) = lookup(opt) {
            settings.insert(name.to_string(), value.to_string());
        } else {
            let flag = format!("{marker}{opt}");
            diagnostics.push(flag.clone());
            passthrough.push(flag);
        }
    }

    Ok(Translation {
        options: TranslatedOptions { include_paths, settings, passthrough },
        diagnostics,
    })
}

/// Replace `@file` tokens by the referenced argument file's tokens.
///
/// Expansion is exactly one level deep: inserted tokens are not re-scanned
/// for further `@` markers.
fn expand_argument_files(
    tokens: &[String],
    argument_files: &IndexMap<String, ArgumentFile>,
) -> Result<Vec<String>, OptionError> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token.strip_prefix('@') {
            Some(reference) => {
                let name = base_name(reference);
                let file = argument_files
                    .get(name)
                    .ok_or_else(|| OptionError::UnknownArgumentFile(reference.to_string()))?;
                out.extend(file.tokens.iter().cloned());
            }
            None => out.push(token.clone()),
        }
    }
    Ok(out)
}

/// Strip one layer of surrounding quotes and collapse doubled backslashes
/// inside quoted tokens.
fn unquote(token: &str) -> String {
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        token[1..token.len() - 1].replace("\\\\", "\\")
    } else {
        token.to_string()
    }
}

/// Final path component of a possibly slash- or backslash-separated path.
fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Append `value` to a `;`-joined accumulating setting, keeping the entry at
/// its first-occurrence position.
fn accumulate(settings: &mut IndexMap<String, String>, name: &str, value: &str) {
    settings
        .entry(name.to_string())
        .and_modify(|joined| {
            joined.push(';');
            joined.push_str(value);
        })
        .or_insert_with(|| value.to_string());
}

/// Flags that are understood but have nothing to say in a vcxproj.
fn is_dropped(opt: &str) -> bool {
    // experimental:external only mattered prior to VS2019.
    matches!(opt, "nologo" | "experimental:external")
}

/// Closed one-to-one recognition table: flag literal -> (element, value).
///
/// Values are the exact strings MSBuild expects, not computed.
fn lookup(opt: &str) -> Option<(&'static str, &'static str)> {
    let pair = match opt {
        "WX" => ("TreatWarningAsError", "true"),
        "WX-" => ("TreatWarningAsError", "false"),

        "W0" => ("WarningLevel", "TurnOffAllWarnings"),
        "W1" => ("WarningLevel", "Level1"),
        "W2" => ("WarningLevel", "Level2"),
        "W3" => ("WarningLevel", "Level3"),
        "W4" => ("WarningLevel", "Level4"),
        "Wall" => ("WarningLevel", "EnableAllWarnings"),

        "std:c++14" => ("LanguageStandard", "stdcpp14"),
        "std:c++17" => ("LanguageStandard", "stdcpp17"),
        "std:c++20" => ("LanguageStandard", "stdcpp20"),
        "std:c++latest" => ("LanguageStandard", "stdcpplatest"),

        "Od" => ("Optimization", "Disabled"),
        "O1" => ("Optimization", "MinSpace"),
        "O2" => ("Optimization", "MaxSpeed"),
        "Ox" => ("Optimization", "Full"),

        "Zc:wchar_t" => ("TreatWChar_tAsBuiltInType", "true"),
        "Zc:inline" => ("RemoveUnreferencedCodeData", "true"),

        "fp:precise" => ("FloatingPointModel", "precise"),
        "fp:strict" => ("FloatingPointModel", "strict"),
        "fp:fast" => ("FloatingPointModel", "fast"),
        "fp:except" => ("FloatingPointExceptions", "true"),

        "MT" => ("RuntimeLibrary", "MultiThreaded"),
        "MTd" => ("RuntimeLibrary", "MultiThreadedDebug"),
        "MD" => ("RuntimeLibrary", "MultiThreadedDLL"),
        "MDd" => ("RuntimeLibrary", "MultiThreadedDebugDLL"),

        "EHa" => ("ExceptionHandling", "Async"),
        "EHs" => ("ExceptionHandling", "SyncCThrow"),
        "EHsc" => ("ExceptionHandling", "Sync"),

        "Gd" => ("CallingConvention", "Cdecl"),
        "Gr" => ("CallingConvention", "FastCall"),
        "Gz" => ("CallingConvention", "StdCall"),

        "GS" => ("BufferSecurityCheck", "true"),

        _ => return None,
    };
    Some(pair)
}
