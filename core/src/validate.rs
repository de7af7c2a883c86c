//! Command tree validation.
//!
//! Validates structural invariants of an extracted [`CommandSpec`] tree,
//! catching problems such as duplicate flags, malformed names and invalid
//! environment variable names before the tree is handed to the parser.
//!
//! # Examples
//!
//! ```
//! use decli_core::*;
//!
//! let root = CommandSpec::new("app").with_flag(FlagSpec::new("verbose", ValueKind::Bool));
//! assert!(validate_command(&root).is_empty());
//!
//! // Invalid: two flags answer to the same name
//! let bad = CommandSpec::new("app")
//!     .with_flag(FlagSpec::new("port", ValueKind::Uint64))
//!     .with_flag(FlagSpec::new("listen", ValueKind::String).with_aliases(["port"]));
//! assert!(!validate_command(&bad).is_empty());
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::{CommandSpec, FlagSpec};

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("static regex must compile")
});
static ENV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex must compile")
});

/// Names the parser claims on every command.
pub const DEFAULT_RESERVED: &[&str] = &["help", "h"];

/// Command tree validation errors.
///
/// Each variant carries the space-separated path of the command it was
/// found in (e.g. `app remote add`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A command name is empty or whitespace-only.
    #[error("{command}: command name cannot be empty")]
    EmptyCommandName { command: String },
    /// A command name cannot be typed as a single argument.
    #[error("{command}: invalid subcommand name {name:?}")]
    InvalidCommandName { command: String, name: String },
    /// A flag derived from `field` has an empty name.
    #[error("{command}: flag for field `{field}` has an empty name")]
    EmptyFlagName { command: String, field: String },
    /// A flag name or alias cannot be used as `--name`.
    #[error("{command}: invalid flag name {name:?}")]
    InvalidFlagName { command: String, name: String },
    /// Two flags in the same command share a name or alias.
    #[error("{command}: duplicate flag name or alias {name:?}")]
    DuplicateFlag { command: String, name: String },
    /// A flag name or alias collides with a parser builtin.
    #[error("{command}: flag name {name:?} is reserved")]
    ReservedFlag { command: String, name: String },
    /// Two subcommands in the same scope share a name or alias.
    #[error("{command}: duplicate subcommand name or alias {name:?}")]
    DuplicateSubcommand { command: String, name: String },
    /// An environment variable name is not a valid identifier.
    #[error("{command}: invalid environment variable {name:?} for flag --{flag}")]
    InvalidEnvVar {
        command: String,
        flag: String,
        name: String,
    },
}

/// Validates a command tree, reserving the parser's `help` flags.
pub fn validate_command(spec: &CommandSpec) -> Vec<ValidationError> {
    validate_command_with(spec, DEFAULT_RESERVED)
}

/// Validates a command tree with an explicit list of reserved flag names.
///
/// Returns every problem found, in tree order.
///
/// # Examples
///
/// ```
/// use decli_core::*;
///
/// let root = CommandSpec::new("app").with_flag(FlagSpec::new("version", ValueKind::Bool));
/// assert!(validate_command_with(&root, &["help", "h"]).is_empty());
///
/// let errors = validate_command_with(&root, &["help", "h", "version", "V"]);
/// assert!(matches!(errors[0], ValidationError::ReservedFlag { .. }));
/// ```
pub fn validate_command_with(spec: &CommandSpec, reserved: &[&str]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut path = Vec::new();
    validate_node(spec, reserved, &mut path, &mut errors);
    errors
}

fn validate_node(
    spec: &CommandSpec,
    reserved: &[&str],
    path: &mut Vec<String>,
    errors: &mut Vec<ValidationError>,
) {
    let name = spec.name.trim();
    if name.is_empty() {
        errors.push(ValidationError::EmptyCommandName {
            command: display_path(path, "<empty>"),
        });
        return;
    }
    path.push(name.to_string());
    let command = path.join(" ");

    validate_flags(&spec.flags, &command, reserved, errors);

    let mut seen: HashSet<&str> = HashSet::new();
    for sub in &spec.subcommands {
        for alias in std::iter::once(&sub.name).chain(&sub.aliases) {
            let alias = alias.trim();
            if alias.is_empty() {
                continue;
            }
            if !NAME_RE.is_match(alias) {
                errors.push(ValidationError::InvalidCommandName {
                    command: command.clone(),
                    name: alias.to_string(),
                });
            }
            if alias == "help" || !seen.insert(alias) {
                errors.push(ValidationError::DuplicateSubcommand {
                    command: command.clone(),
                    name: alias.to_string(),
                });
            }
        }
        validate_node(sub, reserved, path, errors);
    }

    path.pop();
}

fn validate_flags(
    flags: &[FlagSpec],
    command: &str,
    reserved: &[&str],
    errors: &mut Vec<ValidationError>,
) {
    let mut seen: HashSet<&str> = HashSet::new();

    for flag in flags {
        if flag.name.trim().is_empty() {
            errors.push(ValidationError::EmptyFlagName {
                command: command.to_string(),
                field: flag.field.clone(),
            });
            continue;
        }

        for name in flag.names() {
            if !NAME_RE.is_match(name) {
                errors.push(ValidationError::InvalidFlagName {
                    command: command.to_string(),
                    name: name.to_string(),
                });
            } else if reserved.contains(&name) {
                errors.push(ValidationError::ReservedFlag {
                    command: command.to_string(),
                    name: name.to_string(),
                });
            } else if !seen.insert(name) {
                errors.push(ValidationError::DuplicateFlag {
                    command: command.to_string(),
                    name: name.to_string(),
                });
            }
        }

        for var in &flag.env_vars {
            if !ENV_RE.is_match(var) {
                errors.push(ValidationError::InvalidEnvVar {
                    command: command.to_string(),
                    flag: flag.name.clone(),
                    name: var.clone(),
                });
            }
        }
    }
}

fn display_path(path: &[String], last: &str) -> String {
    path.iter()
        .map(String::as_str)
        .chain(std::iter::once(last))
        .collect::<Vec<_>>()
        .join(" ")
}
