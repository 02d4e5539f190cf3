//! Mod applicator - applies mod definitions to a native project
//!
//! Mods are grouped by target file. Each file is read once, its mods run in
//! declaration order against the in-memory text, and the result is written
//! back atomically once. A failing mod aborts its whole file.

use crate::config::schema::{ModConfig, ModDefinition, Operation};
use crate::edit::write_atomic;
use crate::merge::{merge_contents, remove_contents, Anchor, MergeError, MergeRequest};
use crate::safety::{ProjectGuard, SafetyError};
use crate::xml::{
    ensure_resources_root, format_xml, parse_xml, remove_resource_item, set_resource_item,
    unescape_string_resources, FormatOptions, ResourceItem, XmlError, XmlSource,
    EMPTY_RESOURCES,
};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Whether [`apply_mods`] writes its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Write,
    /// Compute results and changes without touching the filesystem.
    Check,
}

/// Result of applying a single mod
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "ModResult should be checked for success/failure"]
pub enum ModResult {
    /// Mod changed the file; `replaced` when an outdated block was swapped out
    Applied { file: PathBuf, replaced: bool },
    /// The file already holds exactly this mod's output
    AlreadyApplied { file: PathBuf },
    /// A block or resource was removed
    Removed { file: PathBuf },
    /// Nothing to remove
    NotPresent { file: PathBuf },
}

impl ModResult {
    pub fn file(&self) -> &Path {
        match self {
            ModResult::Applied { file, .. }
            | ModResult::AlreadyApplied { file }
            | ModResult::Removed { file }
            | ModResult::NotPresent { file } => file,
        }
    }

    /// The mod would not change anything if applied again.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            ModResult::AlreadyApplied { .. } | ModResult::NotPresent { .. }
        )
    }
}

impl fmt::Display for ModResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModResult::Applied {
                file,
                replaced: false,
            } => write!(f, "Applied to {}", file.display()),
            ModResult::Applied {
                file,
                replaced: true,
            } => write!(f, "Updated in {}", file.display()),
            ModResult::AlreadyApplied { file } => {
                write!(f, "Already applied to {}", file.display())
            }
            ModResult::Removed { file } => write!(f, "Removed from {}", file.display()),
            ModResult::NotPresent { file } => write!(f, "Not present in {}", file.display()),
        }
    }
}

/// Errors during mod application
#[derive(Debug)]
pub enum ApplicationError {
    /// Target path failed the project guard
    Safety(SafetyError),
    /// File I/O error
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Text mods need an existing file
    MissingFile { file: PathBuf },
    /// Merge or anchor error
    Merge { file: PathBuf, source: MergeError },
    /// XML parse or format error
    Xml { file: PathBuf, source: XmlError },
    /// Another mod on the same file failed, so the file was left untouched
    FileAborted { file: PathBuf, failed_mod: String },
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::Safety(e) => write!(f, "unsafe target path: {}", e),
            ApplicationError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            ApplicationError::MissingFile { file } => {
                write!(f, "target file does not exist: {}", file.display())
            }
            ApplicationError::Merge { file, source } => {
                write!(f, "merge failed on {}: {}", file.display(), source)
            }
            ApplicationError::Xml { file, source } => {
                write!(f, "XML error on {}: {}", file.display(), source)
            }
            ApplicationError::FileAborted { file, failed_mod } => write!(
                f,
                "{} left unchanged because mod '{}' failed",
                file.display(),
                failed_mod
            ),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::Safety(e) => Some(e),
            ApplicationError::Io { source, .. } => Some(source),
            ApplicationError::Merge { source, .. } => Some(source),
            ApplicationError::Xml { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<SafetyError> for ApplicationError {
    fn from(e: SafetyError) -> Self {
        ApplicationError::Safety(e)
    }
}

/// A file whose contents change (or would change, in check mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    /// Previous contents; `None` when the file is created.
    pub before: Option<String>,
    pub after: String,
}

/// Everything [`apply_mods`] produced for one mod file.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// One entry per mod, in declaration order
    pub results: Vec<(String, Result<ModResult, ApplicationError>)>,
    pub changes: Vec<FileChange>,
}

impl ApplyReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }
}

/// Apply a mod configuration to a project
///
/// # Arguments
///
/// * `config` - The mod configuration to apply
/// * `project_root` - Root directory of the native project
/// * `mode` - Write the results, or only compute them
pub fn apply_mods(config: &ModConfig, project_root: &Path, mode: ApplyMode) -> ApplyReport {
    let mut report = ApplyReport::default();

    let guard = match ProjectGuard::new(project_root) {
        Ok(guard) => guard,
        Err(e) => {
            let reason = e.to_string();
            for def in &config.mods {
                report.results.push((
                    def.id.clone(),
                    Err(ApplicationError::Io {
                        path: project_root.to_path_buf(),
                        source: std::io::Error::other(reason.clone()),
                    }),
                ));
            }
            return report;
        }
    };

    for (file, mods) in group_by_file(config, project_root) {
        apply_file(&guard, &file, &mods, mode, &mut report);
    }

    // Restore config.mods order; files were processed group by group.
    let order: std::collections::HashMap<&str, usize> = config
        .mods
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id.as_str(), i))
        .collect();
    report
        .results
        .sort_by_key(|(id, _)| order.get(id.as_str()).copied().unwrap_or(usize::MAX));

    report
}

/// Group mods by resolved target path, keeping first-seen file order.
fn group_by_file<'a>(
    config: &'a ModConfig,
    project_root: &Path,
) -> Vec<(PathBuf, Vec<&'a ModDefinition>)> {
    let mut groups: Vec<(PathBuf, Vec<&ModDefinition>)> = Vec::new();
    for def in &config.mods {
        let path = if config.meta.project_relative {
            project_root.join(&def.file)
        } else {
            PathBuf::from(&def.file)
        };
        match groups.iter_mut().find(|(file, _)| *file == path) {
            Some((_, mods)) => mods.push(def),
            None => groups.push((path, vec![def])),
        }
    }
    groups
}

fn apply_file(
    guard: &ProjectGuard,
    file: &Path,
    mods: &[&ModDefinition],
    mode: ApplyMode,
    report: &mut ApplyReport,
) {
    let outcome = validate_and_read(guard, file).and_then(|(path, original)| {
        run_mods(&path, original.as_deref(), mods).map(|run| (path, original, run))
    });

    let (path, original, (results, contents)) = match outcome {
        Ok(done) => done,
        Err((index, error)) => {
            tracing::warn!(file = %file.display(), mod_id = %mods[index].id, %error, "aborting file");
            abort_file(file, mods, index, error, report);
            return;
        }
    };

    // Unchanged text, or a file that is still absent, has nothing to write.
    let changed = match contents {
        Some(contents) if original.as_deref() != Some(contents.as_str()) => Some(contents),
        _ => None,
    };
    if let (Some(contents), ApplyMode::Write) = (&changed, mode) {
        if let Err(source) = write_atomic(&path, contents.as_bytes()) {
            abort_file(file, mods, 0, ApplicationError::Io { path, source }, report);
            return;
        }
        tracing::info!(file = %path.display(), mods = mods.len(), "wrote file");
    }

    if let Some(after) = changed {
        report.changes.push(FileChange {
            path,
            before: original,
            after,
        });
    }
    for (def, result) in mods.iter().zip(results) {
        report.results.push((def.id.clone(), Ok(result)));
    }
}

/// Resolve `file` through the guard and read it; `None` when it is missing.
fn validate_and_read(
    guard: &ProjectGuard,
    file: &Path,
) -> Result<(PathBuf, Option<String>), (usize, ApplicationError)> {
    let path = guard.validate_path(file).map_err(|e| (0, e.into()))?;
    match fs::read_to_string(&path) {
        Ok(contents) => Ok((path, Some(contents))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok((path, None)),
        Err(source) => Err((0, ApplicationError::Io { path, source })),
    }
}

/// Run `mods` in order over the file text, returning every result and the
/// final text (`None` while the file is still absent), or the index of the
/// first failing mod.
fn run_mods(
    path: &Path,
    original: Option<&str>,
    mods: &[&ModDefinition],
) -> Result<(Vec<ModResult>, Option<String>), (usize, ApplicationError)> {
    let mut current = original.map(str::to_string);
    let mut results = Vec::with_capacity(mods.len());

    for (index, def) in mods.iter().enumerate() {
        let (result, contents) =
            apply_operation(path, current.as_deref(), &def.operation).map_err(|e| (index, e))?;
        tracing::debug!(mod_id = %def.id, %result, "mod evaluated");
        current = contents;
        results.push(result);
    }

    Ok((results, current))
}

fn abort_file(
    file: &Path,
    mods: &[&ModDefinition],
    failed: usize,
    error: ApplicationError,
    report: &mut ApplyReport,
) {
    let failed_mod = mods[failed].id.clone();
    let mut error = Some(error);
    for (index, def) in mods.iter().enumerate() {
        let result = if index == failed { error.take() } else { None }.unwrap_or_else(|| {
            ApplicationError::FileAborted {
                file: file.to_path_buf(),
                failed_mod: failed_mod.clone(),
            }
        });
        report.results.push((def.id.clone(), Err(result)));
    }
}

/// Apply one operation to the current text of `path`.
///
/// The returned text is `None` only when the file is missing and the
/// operation left it that way.
fn apply_operation(
    path: &Path,
    current: Option<&str>,
    operation: &Operation,
) -> Result<(ModResult, Option<String>), ApplicationError> {
    let file = path.to_path_buf();
    let merge_err = |source| ApplicationError::Merge {
        file: path.to_path_buf(),
        source,
    };

    match operation {
        Operation::Merge {
            tag,
            anchor,
            offset,
            comment,
            contents,
        } => {
            let src = current.ok_or_else(|| ApplicationError::MissingFile { file: file.clone() })?;
            let anchor = Anchor::new(anchor).map_err(merge_err)?;
            let merged = merge_contents(&MergeRequest {
                src,
                new_src: contents,
                tag,
                anchor: &anchor,
                offset: *offset,
                comment,
            })
            .map_err(merge_err)?;

            let result = if merged.did_merge {
                ModResult::Applied {
                    file,
                    replaced: merged.did_clear,
                }
            } else {
                ModResult::AlreadyApplied { file }
            };
            Ok((result, Some(merged.contents)))
        }
        Operation::Remove { tag } => {
            let src = current.ok_or_else(|| ApplicationError::MissingFile { file: file.clone() })?;
            let removed = remove_contents(src, tag);
            let result = if removed.did_clear {
                ModResult::Removed { file }
            } else {
                ModResult::NotPresent { file }
            };
            Ok((result, Some(removed.contents)))
        }
        Operation::SetResource {
            kind,
            name,
            value,
            translatable,
        } => {
            let item = ResourceItem {
                name: name.clone(),
                value: value.clone(),
                translatable: *translatable,
            };
            edit_resources(path, current, |doc| set_resource_item(doc, *kind, &item)).map(
                |(changed, contents)| {
                    let result = if changed {
                        ModResult::Applied {
                            file,
                            replaced: false,
                        }
                    } else {
                        ModResult::AlreadyApplied { file }
                    };
                    (result, contents)
                },
            )
        }
        Operation::RemoveResource { kind, name } => {
            edit_resources(path, current, |doc| remove_resource_item(doc, *kind, name)).map(
                |(changed, contents)| {
                    let result = if changed {
                        ModResult::Removed { file }
                    } else {
                        ModResult::NotPresent { file }
                    };
                    (result, contents)
                },
            )
        }
    }
}

/// Parse a resources file (or the empty fallback), run `edit`, and
/// reformat only when `edit` reports a change. An unchanged file keeps its
/// text, and a missing one stays missing.
fn edit_resources(
    path: &Path,
    current: Option<&str>,
    edit: impl FnOnce(&mut crate::xml::XmlDocument) -> bool,
) -> Result<(bool, Option<String>), ApplicationError> {
    let xml_err = |source| ApplicationError::Xml {
        file: path.to_path_buf(),
        source,
    };
    let text = current.unwrap_or(EMPTY_RESOURCES);

    let mut doc = parse_xml(text).map_err(xml_err)?;
    ensure_resources_root(&doc).map_err(xml_err)?;
    unescape_string_resources(&mut doc);

    if !edit(&mut doc) {
        return Ok((false, current.map(str::to_string)));
    }
    let formatted =
        format_xml(XmlSource::Tree(&doc), &FormatOptions::default()).map_err(xml_err)?;
    Ok((true, Some(formatted)))
}
