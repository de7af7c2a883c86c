//! Error types for extraction, binding and dispatch.
//!
//! Configuration errors are deterministic functions of a described struct's
//! shape and are raised before any argument is parsed. Parse errors come from
//! the parser or from environment values, and run errors from user
//! callbacks; both pass through unchanged.

use thiserror::Error;

use crate::ValueKind;
use crate::validate::ValidationError;

/// Error returned by [`Runnable::run`](crate::Runnable::run) and
/// [`PreRunnable::before_run`](crate::PreRunnable::before_run).
pub type RunError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while binding a struct to a command line.
#[derive(Debug, Error)]
pub enum DecliError {
    /// A field's type is not one of the bindable [`ValueKind`]s.
    #[error("field `{field}`: unsupported field kind {type_name}")]
    UnsupportedFieldKind {
        field: String,
        type_name: &'static str,
    },

    /// A nested struct registered as a subcommand does not expose a run
    /// callback.
    #[error("field `{field}`: {type_name} is not runnable and cannot be a subcommand")]
    NotRunnable {
        field: String,
        type_name: &'static str,
    },

    /// A field's tag could not be parsed.
    #[error("field `{field}`: invalid tag: {reason}")]
    InvalidTag { field: String, reason: String },

    /// Explicit naming is configured but a field has no `name` tag.
    #[error("field `{field}`: no `name` tag and name derivation is disabled")]
    MissingName { field: String },

    /// A field slot does not hold the type its kind was resolved from.
    #[error("field `{field}` does not hold a {kind} value")]
    KindMismatch { field: String, kind: ValueKind },

    /// The extracted command tree failed structural validation.
    #[error("invalid command definition: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    /// A configuration error raised while extracting `command`.
    #[error("while configuring command {command}: {source}")]
    Configuring {
        command: String,
        #[source]
        source: Box<DecliError>,
    },

    /// The parser rejected the arguments, or help/version output was
    /// requested.
    #[error(transparent)]
    Parse(#[from] clap::Error),

    /// An environment variable holds a value the flag's kind cannot parse.
    #[error("invalid value {value:?} in ${var} for flag --{flag}: {reason}")]
    InvalidEnvValue {
        flag: String,
        var: String,
        value: String,
        reason: String,
    },

    /// A required flag was neither on the command line nor in the
    /// environment.
    #[error("required flag --{flag} of command {command} was not provided")]
    MissingRequired { command: String, flag: String },

    /// Writing help output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A run or before-run callback failed.
    #[error("{0}")]
    Run(#[source] RunError),
}

impl DecliError {
    /// Returns `true` for errors raised from the described struct's shape,
    /// before any argument is parsed.
    pub fn is_config_error(&self) -> bool {
        match self {
            DecliError::UnsupportedFieldKind { .. }
            | DecliError::NotRunnable { .. }
            | DecliError::InvalidTag { .. }
            | DecliError::MissingName { .. }
            | DecliError::KindMismatch { .. }
            | DecliError::Invalid(_) => true,
            DecliError::Configuring { source, .. } => source.is_config_error(),
            _ => false,
        }
    }

    /// Strips [`Configuring`](DecliError::Configuring) context and returns the
    /// underlying error.
    pub fn innermost(&self) -> &DecliError {
        match self {
            DecliError::Configuring { source, .. } => source.innermost(),
            other => other,
        }
    }

    /// Attaches the path of the command being extracted, unless the error
    /// already carries one from a deeper command.
    pub(crate) fn configuring(self, path: &[String]) -> DecliError {
        match self {
            err @ DecliError::Configuring { .. } => err,
            err => DecliError::Configuring {
                command: path.join(" "),
                source: Box::new(err),
            },
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`DecliError`].
pub type Result<T> = std::result::Result<T, DecliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuring_wraps_once() {
        let err = DecliError::MissingName {
            field: "Foo".to_string(),
        }
        .configuring(&["app".to_string(), "sub".to_string()])
        .configuring(&["app".to_string()]);

        assert_eq!(
            err.to_string(),
            "while configuring command app sub: field `Foo`: no `name` tag and name derivation is disabled"
        );
        assert!(err.is_config_error());
        assert!(matches!(err.innermost(), DecliError::MissingName { .. }));
    }

    #[test]
    fn test_run_errors_are_not_config_errors() {
        let err = DecliError::Run("boom".into());
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_invalid_lists_every_problem() {
        let err = DecliError::Invalid(vec![
            ValidationError::DuplicateFlag {
                command: "app".to_string(),
                name: "a".to_string(),
            },
            ValidationError::ReservedFlag {
                command: "app".to_string(),
                name: "h".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "invalid command definition: app: duplicate flag name or alias \"a\"; app: flag name \"h\" is reserved"
        );
    }
}
