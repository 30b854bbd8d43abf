//! Error types for command registration and dispatch.
//!
//! Registration problems (bad flags, colliding names, bad groups) are caught
//! when commands are added. Dispatch problems (bad flags on the command line,
//! unknown commands) carry the exit code the entry point reports. Errors
//! raised by a command body or the application factory are passed through
//! untouched.

use thiserror::Error;

use crate::validate::ValidationError;

/// Exit code for command-line usage problems, including unknown commands.
pub const USAGE_EXIT_CODE: i32 = 2;

/// Exit code for failures raised by the application or a command body.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Errors that can occur while registering or dispatching commands.
#[derive(Debug, Error)]
pub enum Error {
    /// Flag parsing failed: unknown flag, missing value, bad type.
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// No command was named and no default command is configured.
    #[error("no command given\n\n{usage}")]
    NoCommand {
        /// Usage summary of the manager that was reached.
        usage: String,
    },

    /// The named command is not registered.
    #[error("unknown command `{name}` (available: {})", .available.join(", "))]
    CommandNotFound {
        /// The token that failed to resolve.
        name: String,
        /// Names registered in the namespace that was searched.
        available: Vec<String>,
    },

    /// Two derived flags collide on the same spelling.
    #[error("command `{command}`: derived flag {flag} is already taken")]
    FlagConflict {
        /// Command being registered.
        command: String,
        /// Colliding spelling.
        flag: String,
    },

    /// A name is registered twice in one namespace.
    #[error("command `{0}` is already registered")]
    DuplicateCommand(String),

    /// Invalid flag declaration.
    #[error("invalid flag declaration: {0}")]
    Validation(#[from] ValidationError),

    /// Structurally invalid setup (bad group, orphan sub-manager options, ...).
    #[error("misconfigured: {0}")]
    Misconfigured(String),

    /// The application factory failed.
    #[error("failed to create application: {0:#}")]
    AppFactory(#[source] anyhow::Error),

    /// The command body returned an error.
    #[error(transparent)]
    Command(anyhow::Error),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Help output is not an error, so clap errors report their own code (`2`
    /// for usage problems).
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(err) => err.exit_code(),
            Error::NoCommand { .. } | Error::CommandNotFound { .. } => USAGE_EXIT_CODE,
            Error::FlagConflict { .. }
            | Error::DuplicateCommand(_)
            | Error::Validation(_)
            | Error::Misconfigured(_) => USAGE_EXIT_CODE,
            Error::AppFactory(_) | Error::Command(_) => FAILURE_EXIT_CODE,
        }
    }

    /// Whether the error comes from how the program was invoked rather than
    /// from the application itself.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::Usage(_) | Error::NoCommand { .. } | Error::CommandNotFound { .. }
        )
    }

    pub(crate) fn from_validation(errors: Vec<ValidationError>) -> Result<()> {
        match errors.into_iter().next() {
            Some(err) => Err(Error::Validation(err)),
            None => Ok(()),
        }
    }
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
