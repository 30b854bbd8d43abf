//! Command registration and dispatch for `manage`-style entry points.
//!
//! This crate turns plain functions into subcommands of a single program:
//!
//! - [`FlagDescriptor`]: a positional or optional input with its parser
//!   settings (action, type, default, help).
//! - [`Signature`] and [`derive_flags`]: flags synthesized from a function's
//!   declared parameters and defaults.
//! - [`Command`]: a named body plus derived, declared, or dynamically computed
//!   flags.
//! - [`Manager`]: a registry of commands and nested managers that owns the
//!   global flags and resolves a command line into a single invocation.
//! - [`driver::run`]: the process entry point mapping the outcome to an exit
//!   code.
//! - [`prompt()`], [`prompt_pass`], [`prompt_bool`] and [`prompt_choices`]:
//!   interactive questions for command bodies.
//!
//! Registration problems ([`validate_flags`], flag collisions, bad groups) are
//! reported when commands are added, not when a user runs them.
//!
//! # Example
//!
//! ```
//! use manage_script_core::*;
//!
//! let mut manager: Manager<()> = Manager::new(|_| Ok(()));
//! manager
//!     .command(
//!         "verify",
//!         &Signature::new().arg_with_default("verified", false),
//!         |_, flags| {
//!             println!("{}", if flags.bool("verified") { "YES" } else { "NO" });
//!             Ok(None)
//!         },
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     manager.dispatch("manage", ["verify", "--verified"]).unwrap(),
//!     Outcome::Completed(0)
//! );
//! assert!(matches!(
//!     manager.dispatch("manage", ["bogus"]),
//!     Err(Error::CommandNotFound { .. })
//! ));
//! ```

mod app;
mod command;
mod derive;
pub mod driver;
mod error;
mod flag;
mod group;
mod manager;
mod prompt;
mod split;
mod validate;
mod values;

pub use app::{AppFactory, Application, ScopedContext};
pub use command::{Body, Command, FlagSource};
pub use derive::{Param, Signature, derive_flags};
pub use error::{Error, FAILURE_EXIT_CODE, Result, USAGE_EXIT_CODE};
pub use flag::{FlagAction, FlagDescriptor, FlagKind, ValueType};
pub use group::{CommandOption, FlagGroup, descriptors};
pub use manager::{Manager, Outcome};
pub use prompt::{
    Choice, NO_CHOICES, YES_CHOICES, prompt, prompt_bool, prompt_choices, prompt_pass,
};
pub use validate::{HELP_FLAGS, ValidationError, validate_command_name, validate_flags};
pub use values::ParsedFlags;
