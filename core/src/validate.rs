//! Registration-time validation of flag declarations.
//!
//! Catches malformed spellings, duplicate flags, duplicate destinations and
//! clashes with the reserved help flags before a parser is ever built, so
//! misconfiguration surfaces when commands are registered rather than when a
//! user runs them.
//!
//! # Examples
//!
//! ```
//! use manage_script_core::*;
//!
//! let flags = vec![FlagDescriptor::optional(["-n", "--name"])];
//! assert!(validate_flags(&flags).is_empty());
//!
//! // Invalid: short flag missing leading dash
//! let bad = vec![FlagDescriptor::optional(["n", "--name"])];
//! assert!(!validate_flags(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::flag::{FlagAction, FlagDescriptor, FlagKind};

/// Spellings owned by the help flag on every parser.
pub const HELP_FLAGS: &[&str] = &["-h", "--help", "-?"];

/// Flag validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Command name is empty, starts with a dash, or contains whitespace.
    #[error("invalid command name: {0:?}")]
    InvalidCommandName(String),
    /// A flag has no spelling at all.
    #[error("flag must define at least one name")]
    MissingFlagName,
    /// Short flag is not a dash followed by one character.
    #[error("invalid short flag format: {0}")]
    InvalidShortFlag(String),
    /// Long flag does not start with `--` or is too short.
    #[error("invalid long flag format: {0}")]
    InvalidLongFlag(String),
    /// Positional flag declared with several names or a dashed name.
    #[error("invalid positional flag: {0}")]
    InvalidPositional(String),
    /// Positional flag declared with a toggle or count action.
    #[error("positional flag {0} must store a value")]
    InvalidPositionalAction(String),
    /// Two flags in the same scope share a spelling.
    #[error("duplicate flag in scope: {0}")]
    DuplicateFlag(String),
    /// Two flags in the same scope store into the same key.
    #[error("duplicate destination in scope: {0}")]
    DuplicateDest(String),
    /// A flag reuses one of the help spellings.
    #[error("flag {0} is reserved for help")]
    ReservedFlag(String),
}

/// Validates a command or namespace name.
pub fn validate_command_name(name: &str) -> Vec<ValidationError> {
    if name.trim().is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace)
    {
        return vec![ValidationError::InvalidCommandName(name.to_string())];
    }
    Vec::new()
}

/// Validates the flags declared in one parser scope.
///
/// Stops at the first problem, the same way the rest of registration does.
///
/// # Examples
///
/// ```
/// use manage_script_core::*;
///
/// let flags = vec![
///     FlagDescriptor::optional(["-n", "--name"]),
///     FlagDescriptor::optional(["-n", "--number"]),
/// ];
/// assert_eq!(
///     validate_flags(&flags),
///     vec![ValidationError::DuplicateFlag("-n".to_string())]
/// );
/// ```
pub fn validate_flags(flags: &[FlagDescriptor]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    let mut dests = HashSet::new();

    for flag in flags {
        if flag.names.is_empty() {
            errors.push(ValidationError::MissingFlagName);
            return errors;
        }

        if !dests.insert(flag.dest.as_str()) {
            errors.push(ValidationError::DuplicateDest(flag.dest.clone()));
            return errors;
        }

        if flag.kind == FlagKind::Positional {
            let name = &flag.names[0];
            if flag.names.len() > 1 || name.is_empty() || name.starts_with('-') {
                errors.push(ValidationError::InvalidPositional(flag.names.join(", ")));
                return errors;
            }
            if !matches!(flag.action, FlagAction::Store | FlagAction::Append) {
                errors.push(ValidationError::InvalidPositionalAction(name.clone()));
                return errors;
            }
            continue;
        }

        for name in &flag.names {
            if HELP_FLAGS.contains(&name.as_str()) {
                errors.push(ValidationError::ReservedFlag(name.clone()));
                return errors;
            }

            if name.starts_with("--") {
                if name.len() < 3 || name.contains('=') {
                    errors.push(ValidationError::InvalidLongFlag(name.clone()));
                    return errors;
                }
            } else if !name.starts_with('-') || name.chars().count() != 2 {
                errors.push(ValidationError::InvalidShortFlag(name.clone()));
                return errors;
            }

            if !seen.insert(name.as_str()) {
                errors.push(ValidationError::DuplicateFlag(name.clone()));
                return errors;
            }
        }
    }

    errors
}
