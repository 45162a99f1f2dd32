//! Configuration validation utilities.
//!
//! Detects referential problems in a config:
//! - roles, views and looks naming unknown color spaces
//! - views naming unknown looks
//! - duplicate or empty color space names
//! - search path directories that do not exist
//!
//! [`Config::sanity_check`](crate::Config::sanity_check) turns the first
//! error-level issue into a [`MalformedConfig`](crate::OcioError::MalformedConfig).
//!
//! # Example
//!
//! ```
//! use vfx_colorconfig::{validate, Config};
//!
//! let config = Config::new();
//! let issues = validate::check(&config);
//! assert!(!validate::has_errors(&issues));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::config::Config;
use crate::look::parse_looks;
use crate::role::names;
use crate::transform::Transform;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational message.
    Info,
    /// Warning - config works but may have issues.
    Warning,
    /// Error - resolution against this config will fail.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A validation issue found in the config.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    /// Severity level.
    pub severity: Severity,
    /// Issue category.
    pub category: IssueCategory,
    /// Human-readable message.
    pub message: String,
    /// Related element (color space name, role, etc.).
    pub context: Option<String>,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Categories of validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCategory {
    /// Missing color space reference.
    MissingColorSpace,
    /// Missing role definition.
    MissingRole,
    /// Missing display/view.
    MissingDisplay,
    /// Missing look reference.
    MissingLook,
    /// Missing LUT/transform file or directory.
    MissingFile,
    /// Invalid transform configuration.
    InvalidTransform,
    /// Duplicate or empty name.
    Duplicate,
}

/// Validates a config and returns all issues found.
pub fn check(config: &Config) -> Vec<Issue> {
    let mut issues = Vec::new();

    check_colorspaces(config, &mut issues);
    check_roles(config, &mut issues);
    check_displays(config, &mut issues);
    check_looks(config, &mut issues);
    check_files(config, &mut issues);

    issues
}

fn missing_colorspace(message: String, context: String) -> Issue {
    Issue {
        severity: Severity::Error,
        category: IssueCategory::MissingColorSpace,
        message,
        context: Some(context),
    }
}

/// Checks role definitions.
fn check_roles(config: &Config, issues: &mut Vec<Issue>) {
    if config.num_colorspaces() > 0 {
        for role in [names::REFERENCE, names::DEFAULT] {
            if !config.has_role(role) {
                issues.push(Issue {
                    severity: Severity::Warning,
                    category: IssueCategory::MissingRole,
                    message: format!("recommended role '{}' is not defined", role),
                    context: Some(role.to_string()),
                });
            }
        }
    }

    for (role, cs_name) in config.roles().iter() {
        if config.colorspace_by_name(cs_name).is_none() {
            issues.push(missing_colorspace(
                format!("role '{}' references non-existent color space '{}'", role, cs_name),
                role.to_string(),
            ));
        }
    }
}

/// Checks display/view definitions.
fn check_displays(config: &Config, issues: &mut Vec<Issue>) {
    let displays = config.displays();
    if displays.num_displays() == 0 {
        if config.num_colorspaces() > 0 {
            issues.push(Issue {
                severity: Severity::Warning,
                category: IssueCategory::MissingDisplay,
                message: "no displays defined".to_string(),
                context: None,
            });
        }
        return;
    }

    for display in displays.displays() {
        for view in display.views() {
            let context = format!("{}:{}", display.name(), view.name());
            if config.colorspace(view.colorspace()).is_none() {
                issues.push(missing_colorspace(
                    format!(
                        "view '{}' in display '{}' references non-existent color space '{}'",
                        view.name(),
                        display.name(),
                        view.colorspace()
                    ),
                    context.clone(),
                ));
            }
            for (look, _) in parse_looks(view.looks()) {
                if config.look(look).is_none() {
                    issues.push(Issue {
                        severity: Severity::Error,
                        category: IssueCategory::MissingLook,
                        message: format!(
                            "view '{}' in display '{}' references non-existent look '{}'",
                            view.name(),
                            display.name(),
                            look
                        ),
                        context: Some(context.clone()),
                    });
                }
            }
        }
    }

    for name in displays.active_display_list() {
        if displays.display(name).is_none() {
            issues.push(Issue {
                severity: Severity::Warning,
                category: IssueCategory::MissingDisplay,
                message: format!("active display '{}' is not defined", name),
                context: Some(name.clone()),
            });
        }
    }
}

/// Checks look definitions.
fn check_looks(config: &Config, issues: &mut Vec<Issue>) {
    for look in config.looks().all() {
        let space = look.get_process_space();
        if !space.is_empty() && config.colorspace(space).is_none() {
            issues.push(missing_colorspace(
                format!(
                    "look '{}' references non-existent process space '{}'",
                    look.name(),
                    space
                ),
                look.name().to_string(),
            ));
        }
    }
}

/// Checks color space definitions.
fn check_colorspaces(config: &Config, issues: &mut Vec<Issue>) {
    let mut names: HashSet<String> = HashSet::new();

    for (index, cs) in config.colorspaces().iter().enumerate() {
        if cs.name().is_empty() {
            issues.push(Issue {
                severity: Severity::Error,
                category: IssueCategory::Duplicate,
                message: format!("color space at index {} has no name", index),
                context: None,
            });
        } else if !names.insert(cs.name().to_lowercase()) {
            issues.push(Issue {
                severity: Severity::Error,
                category: IssueCategory::Duplicate,
                message: format!("duplicate color space name: '{}'", cs.name()),
                context: Some(cs.name().to_string()),
            });
        }

        if cs.is_data() && (cs.to_reference().is_some() || cs.from_reference().is_some()) {
            issues.push(Issue {
                severity: Severity::Warning,
                category: IssueCategory::InvalidTransform,
                message: format!(
                    "data color space '{}' has transforms defined (will be ignored)",
                    cs.name()
                ),
                context: Some(cs.name().to_string()),
            });
        }

        for t in cs.to_reference().into_iter().chain(cs.from_reference()) {
            check_transform_refs(config, cs.name(), t, issues);
        }
    }
}

/// Checks color space names used inside a transform tree.
fn check_transform_refs(config: &Config, owner: &str, t: &Transform, issues: &mut Vec<Issue>) {
    let mut refs: Vec<&str> = Vec::new();
    match t {
        Transform::ColorSpace(c) => refs.extend([c.src.as_str(), c.dst.as_str()]),
        Transform::Look(l) => refs.extend([l.src.as_str(), l.dst.as_str()]),
        Transform::Display(d) => refs.push(d.input_colorspace.as_str()),
        Transform::Group(g) => {
            for child in &g.transforms {
                check_transform_refs(config, owner, child, issues);
            }
        }
        _ => {}
    }
    for name in refs {
        if config.colorspace(name).is_none() {
            issues.push(missing_colorspace(
                format!(
                    "color space '{}' has a transform referencing non-existent color space '{}'",
                    owner, name
                ),
                owner.to_string(),
            ));
        }
    }
}

/// Checks that literal search path directories exist.
fn check_files(config: &Config, issues: &mut Vec<Issue>) {
    let context = config.current_context();
    for entry in context.search_paths() {
        // Entries with variables depend on the context at resolution time.
        if entry.contains('$') {
            continue;
        }
        let path = Path::new(entry);
        let dir = if path.is_absolute() {
            path.to_path_buf()
        } else {
            context.working_dir().join(path)
        };
        if !dir.is_dir() {
            issues.push(Issue {
                severity: Severity::Warning,
                category: IssueCategory::MissingFile,
                message: format!("search path does not exist: {}", dir.display()),
                context: Some(entry.clone()),
            });
        }
    }
}

/// Returns true if there are any errors.
pub fn has_errors(issues: &[Issue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

/// Returns true if there are any warnings or errors.
pub fn has_warnings(issues: &[Issue]) -> bool {
    issues.iter().any(|i| i.severity >= Severity::Warning)
}
