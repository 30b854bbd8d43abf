//! Commands: a named body plus the flags it is invoked with.
//!
//! A command's flags come from one of three places, captured by
//! [`FlagSource`]: derived from a [`Signature`], declared explicitly, or
//! computed on demand each time the parser is built. Whatever the source, the
//! body is a single function taking the application handle and the parsed
//! values.
//!
//! # Example
//!
//! ```
//! use manage_script_core::*;
//!
//! let hello: Command<()> = Command::from_signature(
//!     "hello",
//!     &Signature::new().arg_with_default("name", "fred"),
//!     |_app, flags| {
//!         println!("hello {}", flags.str("name").unwrap_or_default());
//!         Ok(None)
//!     },
//! )
//! .unwrap()
//! .with_description("Prints your name");
//!
//! let parser = hello.build_parser("manage hello").unwrap();
//! assert_eq!(parser.get_name(), "hello");
//! ```

use std::fmt;

use clap::{ArgGroup, ColorChoice};
use tracing::debug;

use crate::app::{Application, ScopedContext};
use crate::derive::{Signature, derive_flags};
use crate::error::{Error, Result};
use crate::flag::{FlagDescriptor, help_arg};
use crate::group::{CommandOption, FlagGroup, descriptors};
use crate::validate::{validate_command_name, validate_flags};
use crate::values::ParsedFlags;

/// Function run when a command is invoked.
///
/// `Ok(None)` means success; `Ok(Some(code))` becomes the exit code.
pub type Body<A> = Box<dyn Fn(&mut A, &ParsedFlags) -> anyhow::Result<Option<i32>>>;

/// Where a command's flags come from.
pub enum FlagSource {
    /// Derived from a function signature at registration.
    Derived(Vec<CommandOption>),
    /// Declared explicitly; may grow while the command is being registered.
    Declared(Vec<CommandOption>),
    /// Computed each time the parser is built.
    Dynamic(Box<dyn Fn() -> Vec<CommandOption>>),
}

impl fmt::Debug for FlagSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagSource::Derived(options) => f.debug_tuple("Derived").field(options).finish(),
            FlagSource::Declared(options) => f.debug_tuple("Declared").field(options).finish(),
            FlagSource::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// A named, invocable unit of work.
pub struct Command<A> {
    name: String,
    description: Option<String>,
    usage: Option<String>,
    help: Option<String>,
    namespace: Option<String>,
    capture_all: bool,
    scoped: bool,
    flags: FlagSource,
    rejected: Option<String>,
    body: Body<A>,
}

impl<A> fmt::Debug for Command<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("namespace", &self.namespace)
            .field("capture_all", &self.capture_all)
            .field("scoped", &self.scoped)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl<A> Command<A> {
    /// Creates a command with no flags yet.
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&mut A, &ParsedFlags) -> anyhow::Result<Option<i32>> + 'static,
    {
        Self::with_source(name, FlagSource::Declared(Vec::new()), Box::new(body))
    }

    /// Creates a command whose flags are derived from `signature`.
    ///
    /// Fails with [`Error::FlagConflict`] when two derived short flags
    /// collide.
    pub fn from_signature<F>(name: &str, signature: &Signature, body: F) -> Result<Self>
    where
        F: Fn(&mut A, &ParsedFlags) -> anyhow::Result<Option<i32>> + 'static,
    {
        let options = derive_flags(name, signature)?
            .into_iter()
            .map(CommandOption::Flag)
            .collect();
        Ok(Self::with_source(
            name,
            FlagSource::Derived(options),
            Box::new(body),
        ))
    }

    /// Creates a command whose flags are computed each time it is parsed.
    pub fn dynamic<G, F>(name: &str, flags: G, body: F) -> Self
    where
        G: Fn() -> Vec<CommandOption> + 'static,
        F: Fn(&mut A, &ParsedFlags) -> anyhow::Result<Option<i32>> + 'static,
    {
        Self::with_source(name, FlagSource::Dynamic(Box::new(flags)), Box::new(body))
    }

    fn with_source(name: &str, flags: FlagSource, body: Body<A>) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            usage: None,
            help: None,
            namespace: None,
            capture_all: false,
            scoped: true,
            flags,
            rejected: None,
            body,
        }
    }

    /// Sets the full description shown in the command's help.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.trim().to_string());
        self
    }

    /// Overrides the usage line.
    pub fn with_usage(mut self, usage: &str) -> Self {
        self.usage = Some(usage.to_string());
        self
    }

    /// Overrides the one-line summary shown in command listings.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Registers the command under a namespace sub-manager.
    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Collects undeclared tokens instead of rejecting them.
    pub fn capture_all_args(mut self) -> Self {
        self.capture_all = true;
        self
    }

    /// Runs the body without activating the application's work context.
    pub fn unscoped(mut self) -> Self {
        self.scoped = false;
        self
    }

    /// Adds a flag. Checked when the command is registered.
    ///
    /// A dynamic command computes its own flags, so registering it after this
    /// fails with [`Error::Misconfigured`].
    pub fn option(self, flag: FlagDescriptor) -> Self {
        self.push_option(CommandOption::Flag(flag))
    }

    /// Adds a flag group. Checked like [`option`](Self::option).
    pub fn group(self, group: FlagGroup) -> Self {
        self.push_option(CommandOption::Group(group))
    }

    fn push_option(mut self, option: CommandOption) -> Self {
        match &mut self.flags {
            FlagSource::Derived(options) | FlagSource::Declared(options) => options.push(option),
            FlagSource::Dynamic(_) => {
                let flag = match &option {
                    CommandOption::Flag(flag) => flag.canonical_name().to_string(),
                    CommandOption::Group(group) => group
                        .flags
                        .iter()
                        .map(|flag| flag.canonical_name())
                        .collect::<Vec<_>>()
                        .join(", "),
                };
                self.rejected.get_or_insert(flag);
            }
        }
        self
    }

    /// Appends a flag during registration, leaving the command unchanged if
    /// the flag clashes with the ones already declared.
    pub fn add_option(&mut self, flag: FlagDescriptor) -> Result<()> {
        match &mut self.flags {
            FlagSource::Derived(options) | FlagSource::Declared(options) => {
                options.push(CommandOption::Flag(flag));
                if let Err(err) = check_options(options) {
                    options.pop();
                    return Err(err);
                }
                Ok(())
            }
            FlagSource::Dynamic(_) => Err(dynamic_flags_error(
                &self.name,
                flag.canonical_name(),
            )),
        }
    }

    /// Command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Namespace the command registers under, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub(crate) fn take_namespace(&mut self) -> Option<String> {
        self.namespace.take()
    }

    /// Whether undeclared tokens are captured.
    pub fn captures_all_args(&self) -> bool {
        self.capture_all
    }

    /// One-line summary: the explicit help text, else the description's first
    /// line.
    pub fn summary(&self) -> Option<&str> {
        self.help
            .as_deref()
            .or_else(|| self.description.as_deref().and_then(|d| d.lines().next()))
    }

    /// Current flag list.
    pub fn get_flags(&self) -> Vec<CommandOption> {
        match &self.flags {
            FlagSource::Derived(options) | FlagSource::Declared(options) => options.clone(),
            FlagSource::Dynamic(compute) => compute(),
        }
    }

    /// Checks the name and the flag list for registration errors.
    pub(crate) fn check(&self) -> Result<()> {
        Error::from_validation(validate_command_name(&self.name))?;
        if let Some(flag) = &self.rejected {
            return Err(dynamic_flags_error(&self.name, flag));
        }
        if let FlagSource::Derived(options) | FlagSource::Declared(options) = &self.flags {
            check_options(options)?;
        }
        Ok(())
    }

    /// Builds the parser for this command's flags.
    pub fn build_parser(&self, program: &str) -> Result<clap::Command> {
        self.parser_for(program, &self.get_flags())
    }

    /// Builds the parser from an already computed option list.
    pub(crate) fn parser_for(
        &self,
        program: &str,
        options: &[CommandOption],
    ) -> Result<clap::Command> {
        check_options(options)?;

        let mut parser = clap::Command::new(self.name.clone())
            .bin_name(program.to_string())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .color(ColorChoice::Never)
            .arg(help_arg());
        if let Some(description) = &self.description {
            parser = parser.about(description.clone());
        }
        if let Some(usage) = &self.usage {
            parser = parser.override_usage(usage.clone());
        }

        for (index, option) in options.iter().enumerate() {
            match option {
                CommandOption::Flag(flag) => parser = parser.arg(flag.to_arg()),
                CommandOption::Group(group) => {
                    let heading = group.heading();
                    for flag in &group.flags {
                        let mut arg = flag.to_arg();
                        if let Some(heading) = &heading {
                            arg = arg.help_heading(heading.clone());
                        }
                        parser = parser.arg(arg);
                    }
                    if group.exclusive {
                        let ids: Vec<String> =
                            group.flags.iter().map(|flag| flag.dest.clone()).collect();
                        parser = parser.group(
                            ArgGroup::new(format!("__group_{index}"))
                                .args(ids)
                                .multiple(false)
                                .required(group.required),
                        );
                    }
                }
            }
        }

        Ok(parser)
    }
}

impl<A: Application> Command<A> {
    /// Runs the body with `app`, inside the app's work context unless the
    /// command is unscoped.
    ///
    /// Errors from the body come back as [`Error::Command`], unchanged.
    pub fn invoke(&self, app: &mut A, flags: &ParsedFlags) -> Result<i32> {
        debug!(command = %self.name, scoped = self.scoped, "invoking command");
        let result = if self.scoped {
            let mut scope = ScopedContext::enter(app);
            (self.body)(&mut *scope, flags)
        } else {
            (self.body)(app, flags)
        };
        match result {
            Ok(code) => Ok(code.unwrap_or(0)),
            Err(err) => Err(Error::Command(err)),
        }
    }
}

fn dynamic_flags_error(command: &str, flag: &str) -> Error {
    Error::Misconfigured(format!(
        "command `{command}` computes its flags dynamically; cannot add {flag}"
    ))
}

/// Validates an option list: flag spellings across groups, then each group.
pub(crate) fn check_options(options: &[CommandOption]) -> Result<()> {
    let flags: Vec<FlagDescriptor> = descriptors(options).into_iter().cloned().collect();
    Error::from_validation(validate_flags(&flags))?;
    for option in options {
        if let CommandOption::Group(group) = option {
            group.check()?;
        }
    }
    Ok(())
}
