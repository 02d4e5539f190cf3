use crate::xml::ResourceKind;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ModConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub mods: Vec<ModDefinition>,
}

impl ModConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.mods.is_empty() {
            issues.push(ValidationIssue::EmptyModList);
        }

        let mut seen = HashSet::new();
        for def in &self.mods {
            let mod_id = || Some(def.id.clone());

            if def.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    mod_id: None,
                    field: "id",
                });
            } else if !seen.insert(def.id.as_str()) {
                issues.push(ValidationIssue::InvalidCombo {
                    mod_id: mod_id(),
                    message: "duplicate mod id".to_string(),
                });
            }
            if def.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    mod_id: mod_id(),
                    field: "file",
                });
            }

            match &def.operation {
                Operation::Merge {
                    tag,
                    anchor,
                    comment,
                    contents,
                    ..
                } => {
                    check_tag(tag, mod_id(), &mut issues);
                    if anchor.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            mod_id: mod_id(),
                            field: "operation.anchor",
                        });
                    } else if let Err(err) = Regex::new(anchor) {
                        issues.push(ValidationIssue::InvalidCombo {
                            mod_id: mod_id(),
                            message: format!("anchor is not a valid regex: {err}"),
                        });
                    }
                    if comment.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            mod_id: mod_id(),
                            field: "operation.comment",
                        });
                    }
                    if contents.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            mod_id: mod_id(),
                            field: "operation.contents",
                        });
                    }
                }
                Operation::Remove { tag } => check_tag(tag, mod_id(), &mut issues),
                Operation::SetResource { name, .. } | Operation::RemoveResource { name, .. } => {
                    if name.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            mod_id: mod_id(),
                            field: "operation.name",
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn check_tag(tag: &str, mod_id: Option<String>, issues: &mut Vec<ValidationIssue>) {
    if tag.trim().is_empty() {
        issues.push(ValidationIssue::MissingField {
            mod_id,
            field: "operation.tag",
        });
    } else if tag.chars().any(char::is_whitespace) {
        issues.push(ValidationIssue::InvalidCombo {
            mod_id,
            message: format!("tag '{tag}' must not contain whitespace"),
        });
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Resolve `file` against the project root rather than the working
    /// directory.
    #[serde(default = "default_true")]
    pub project_relative: bool,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            project_relative: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModDefinition {
    pub id: String,
    pub file: String,
    pub operation: Operation,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    /// Insert or refresh a generated block next to an anchor line.
    Merge {
        tag: String,
        anchor: String,
        #[serde(default)]
        offset: isize,
        #[serde(default = "default_comment")]
        comment: String,
        contents: String,
    },
    /// Delete a generated block.
    Remove { tag: String },
    SetResource {
        kind: ResourceKind,
        name: String,
        value: String,
        #[serde(default)]
        translatable: Option<bool>,
    },
    RemoveResource {
        kind: ResourceKind,
        name: String,
    },
}

fn default_comment() -> String {
    "//".to_string()
}

impl Operation {
    /// Resource operations edit XML and may create their file.
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            Operation::SetResource { .. } | Operation::RemoveResource { .. }
        )
    }

    /// Short human label, e.g. `merge maps-init` or `set-resource string/app_name`.
    pub fn describe(&self) -> String {
        match self {
            Operation::Merge { tag, .. } => format!("merge {tag}"),
            Operation::Remove { tag } => format!("remove {tag}"),
            Operation::SetResource { kind, name, .. } => format!("set-resource {kind}/{name}"),
            Operation::RemoveResource { kind, name } => format!("remove-resource {kind}/{name}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Distinct ids of the mods that have issues, in file order.
    pub fn failing_mods(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for id in self.issues.iter().filter_map(ValidationIssue::mod_id) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyModList,
    MissingField {
        mod_id: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        mod_id: Option<String>,
        message: String,
    },
}

impl ValidationIssue {
    pub fn mod_id(&self) -> Option<&str> {
        match self {
            ValidationIssue::EmptyModList => None,
            ValidationIssue::MissingField { mod_id, .. }
            | ValidationIssue::InvalidCombo { mod_id, .. } => mod_id.as_deref(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyModList => write!(f, "mod file contains no mods"),
            ValidationIssue::MissingField { mod_id, field } => match mod_id {
                Some(id) => write!(f, "mod '{id}' missing required field '{field}'"),
                None => write!(f, "mod missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { mod_id, message } => match mod_id {
                Some(id) => write!(f, "mod '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid mod configuration: {message}"),
            },
        }
    }
}
