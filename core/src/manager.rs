//! Command registry and dispatch.
//!
//! A [`Manager`] maps names to commands or nested managers, owns the
//! manager-wide flags, and resolves one command line into global flag values,
//! a target command and that command's own flag values.

use std::collections::BTreeMap;
use std::fmt;

use clap::ColorChoice;
use clap::error::ErrorKind;
use tracing::{debug, warn};

use crate::app::{AppFactory, Application};
use crate::command::Command;
use crate::derive::Signature;
use crate::error::{Error, Result};
use crate::flag::{FlagDescriptor, FlagKind, help_arg};
use crate::group::descriptors;
use crate::split::{is_help_token, requests_help, split_catch_all, split_known};
use crate::validate::{validate_command_name, validate_flags};
use crate::values::ParsedFlags;

/// Result of a dispatch that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A command ran and returned this exit code.
    Completed(i32),
    /// Help was requested; the rendered text goes to stdout.
    Help(String),
}

impl Outcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Completed(code) => *code,
            Outcome::Help(_) => 0,
        }
    }
}

enum Entry<A> {
    Command(Command<A>),
    Manager(Manager<A>),
}

/// Where resolution of the command tokens ended up.
enum Resolution<'a, A> {
    Help(String),
    Command {
        command: &'a Command<A>,
        program: String,
        args: Vec<String>,
    },
}

/// Registry and dispatcher for one namespace of commands.
///
/// Only the root manager owns global flags and the application factory;
/// sub-managers added with [`add_manager`](Self::add_manager) or created for a
/// command namespace defer both to it.
///
/// # Examples
///
/// ```
/// use manage_script_core::*;
///
/// let mut manager: Manager<()> = Manager::new(|_| Ok(()));
/// manager
///     .command("hello", &Signature::new().arg("name"), |_, flags| {
///         println!("hello {}", flags.str("name").unwrap_or_default());
///         Ok(None)
///     })
///     .unwrap();
///
/// let outcome = manager.dispatch("manage", ["hello", "joe"]).unwrap();
/// assert_eq!(outcome, Outcome::Completed(0));
/// ```
pub struct Manager<A> {
    commands: BTreeMap<String, Entry<A>>,
    global_flags: Vec<FlagDescriptor>,
    app_factory: Option<AppFactory<A>>,
    usage: Option<String>,
    help: Option<String>,
    description: Option<String>,
    default_command: Option<String>,
}

impl<A> fmt::Debug for Manager<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("global_flags", &self.global_flags)
            .field("has_factory", &self.app_factory.is_some())
            .field("usage", &self.usage)
            .field("default_command", &self.default_command)
            .finish_non_exhaustive()
    }
}

impl<A> Manager<A> {
    /// Creates a root manager that builds the application with `factory`.
    ///
    /// The factory receives the values of the manager's global flags.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&ParsedFlags) -> anyhow::Result<A> + 'static,
    {
        Self {
            app_factory: Some(Box::new(factory)),
            ..Self::group()
        }
    }

    /// Creates a sub-manager for nesting under a root.
    pub fn group() -> Self {
        Self {
            commands: BTreeMap::new(),
            global_flags: Vec::new(),
            app_factory: None,
            usage: None,
            help: None,
            description: None,
            default_command: None,
        }
    }

    /// Sets the usage line; help and description fall back to it.
    pub fn with_usage(mut self, usage: &str) -> Self {
        self.usage = Some(usage.to_string());
        self.help.get_or_insert_with(|| usage.to_string());
        self.description.get_or_insert_with(|| usage.to_string());
        self
    }

    /// Sets the one-line text shown when this manager is listed under a parent.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Sets the description shown at the top of this manager's help.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Runs `name` when no command token is given.
    pub fn with_default_command(mut self, name: &str) -> Self {
        self.default_command = Some(name.to_string());
        self
    }

    /// Adds a manager-wide flag, parsed before the command is chosen.
    pub fn add_option(&mut self, flag: FlagDescriptor) -> Result<()> {
        if flag.kind != FlagKind::Optional {
            return Err(Error::Misconfigured(format!(
                "global flag `{}` must be optional",
                flag.canonical_name()
            )));
        }
        let name = flag.canonical_name().to_string();
        let mut flags = self.global_flags.clone();
        flags.push(flag);
        Error::from_validation(validate_flags(&flags))?;
        self.global_flags = flags;
        debug!(flag = %name, "added global flag");
        Ok(())
    }

    /// Global flags in declaration order.
    pub fn options(&self) -> &[FlagDescriptor] {
        &self.global_flags
    }

    /// Registers a command.
    ///
    /// A command with a namespace goes into the sub-manager of that name,
    /// which is created on first use.
    pub fn add_command(&mut self, mut command: Command<A>) -> Result<()> {
        command.check()?;

        if let Some(namespace) = command.take_namespace() {
            Error::from_validation(validate_command_name(&namespace))?;
            let entry = self
                .commands
                .entry(namespace.clone())
                .or_insert_with(|| Entry::Manager(Manager::group()));
            return match entry {
                Entry::Manager(sub) => sub.add_command(command),
                Entry::Command(_) => Err(Error::DuplicateCommand(namespace)),
            };
        }

        let name = command.name().to_string();
        if self.commands.contains_key(&name) {
            return Err(Error::DuplicateCommand(name));
        }
        debug!(command = %name, "registered command");
        self.commands.insert(name, Entry::Command(command));
        Ok(())
    }

    /// Registers a command whose flags are derived from `signature`.
    pub fn command<F>(&mut self, name: &str, signature: &Signature, body: F) -> Result<()>
    where
        F: Fn(&mut A, &ParsedFlags) -> anyhow::Result<Option<i32>> + 'static,
    {
        self.add_command(Command::from_signature(name, signature, body)?)
    }

    /// Appends a flag to an already registered command.
    pub fn option(&mut self, command: &str, flag: FlagDescriptor) -> Result<()> {
        let available = self.command_names();
        let Some(target) = self.command_mut(command) else {
            return Err(Error::CommandNotFound {
                name: command.to_string(),
                available,
            });
        };
        target.add_option(flag)
    }

    /// Nests `manager` under `name`.
    pub fn add_manager(&mut self, name: &str, manager: Manager<A>) -> Result<()> {
        Error::from_validation(validate_command_name(name))?;
        if manager.app_factory.is_some() || !manager.global_flags.is_empty() {
            return Err(Error::Misconfigured(format!(
                "sub-manager `{name}` cannot own global flags or an application factory"
            )));
        }
        if self.commands.contains_key(name) {
            return Err(Error::DuplicateCommand(name.to_string()));
        }
        debug!(manager = %name, "registered sub-manager");
        self.commands
            .insert(name.to_string(), Entry::Manager(manager));
        Ok(())
    }

    /// Looks up a directly registered command.
    pub fn get_command(&self, name: &str) -> Option<&Command<A>> {
        match self.commands.get(name)? {
            Entry::Command(command) => Some(command),
            Entry::Manager(_) => None,
        }
    }

    /// Mutable access to a directly registered command during registration.
    pub fn command_mut(&mut self, name: &str) -> Option<&mut Command<A>> {
        match self.commands.get_mut(name)? {
            Entry::Command(command) => Some(command),
            Entry::Manager(_) => None,
        }
    }

    /// Looks up a nested manager.
    pub fn get_manager(&self, name: &str) -> Option<&Manager<A>> {
        match self.commands.get(name)? {
            Entry::Manager(manager) => Some(manager),
            Entry::Command(_) => None,
        }
    }

    /// Names registered directly in this manager, sorted.
    pub fn command_names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    /// Usage summary: banner, global flags, and every entry with its one-line
    /// description.
    pub fn get_usage(&self, program: &str) -> String {
        self.listing_parser(program).render_help().to_string()
    }

    /// Parser used to render this manager's help; commands appear as stub
    /// subcommands.
    fn listing_parser(&self, program: &str) -> clap::Command {
        let mut parser = clap::Command::new(program.to_string())
            .bin_name(program.to_string())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .disable_help_subcommand(true)
            .color(ColorChoice::Never)
            .arg(help_arg())
            .args(self.global_flags.iter().map(FlagDescriptor::to_arg));
        if let Some(description) = &self.description {
            parser = parser.about(description.clone());
        }
        if let Some(usage) = &self.usage {
            parser = parser.override_usage(usage.clone());
        }
        for (name, entry) in &self.commands {
            let summary = match entry {
                Entry::Command(command) => command.summary().map(str::to_string),
                Entry::Manager(manager) => manager.help.clone(),
            };
            let mut stub = clap::Command::new(name.clone());
            if let Some(summary) = summary {
                stub = stub.about(summary);
            }
            parser = parser.subcommand(stub);
        }
        parser
    }

    fn resolve<'a>(&'a self, program: &str, args: &[String]) -> Result<Resolution<'a, A>> {
        let Some((first, tail)) = args.split_first() else {
            if let Some(default) = &self.default_command {
                debug!(command = %default, "running default command");
                return self.resolve(program, std::slice::from_ref(default));
            }
            return Err(Error::NoCommand {
                usage: self.get_usage(program),
            });
        };

        if is_help_token(first) {
            return Ok(Resolution::Help(self.get_usage(program)));
        }

        match self.commands.get(first) {
            Some(Entry::Manager(sub)) => {
                debug!(manager = %first, "descending into sub-manager");
                sub.resolve(&format!("{program} {first}"), tail)
            }
            Some(Entry::Command(command)) => Ok(Resolution::Command {
                command,
                program: format!("{program} {first}"),
                args: tail.to_vec(),
            }),
            None if requests_help(args) => {
                Ok(Resolution::Help(self.get_usage(program)))
            }
            None if first.starts_with('-') && first != "-" => Err(Error::Usage(
                self.listing_parser(program).error(
                    ErrorKind::UnknownArgument,
                    format!("unexpected argument '{first}' found"),
                ),
            )),
            None => {
                warn!(command = %first, "command not found");
                Err(Error::CommandNotFound {
                    name: first.clone(),
                    available: self.command_names(),
                })
            }
        }
    }
}

impl<A: Application> Manager<A> {
    /// Resolves `args` (without the program name) and runs the chosen command.
    ///
    /// Global flags may appear before or after the command token. Their values
    /// are handed to the application factory only; the command never sees
    /// them.
    pub fn dispatch<I, S>(&self, program: &str, args: I) -> Result<Outcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let Some(factory) = &self.app_factory else {
            return Err(Error::Misconfigured(
                "dispatch requires a root manager with an application factory".to_string(),
            ));
        };

        let globals: Vec<&FlagDescriptor> = self.global_flags.iter().collect();
        let split = split_known(&args, &globals);

        // Global values are only checked once help is ruled out, so a
        // required global never blocks `--help`.
        debug!(remaining = ?split.rest, "resolving command");
        let (command, command_program, command_args) = match self.resolve(program, &split.rest)? {
            Resolution::Help(text) => return Ok(Outcome::Help(text)),
            Resolution::Command {
                command,
                program,
                args,
            } => (command, program, args),
        };

        debug!(command = %command.name(), "parsing command flags");
        let options = command.get_flags();
        let flags = descriptors(&options);
        let mut parser = command.parser_for(&command_program, &options)?;
        let (tokens, remaining) = if command.captures_all_args() {
            let split = split_catch_all(&command_args, &flags);
            (split.known, split.rest)
        } else {
            (command_args, Vec::new())
        };
        if requests_help(&tokens) {
            return Ok(Outcome::Help(parser.render_help().to_string()));
        }
        let matches = match parser.try_get_matches_from(&tokens) {
            Ok(matches) => matches,
            Err(err) if err.kind() == ErrorKind::DisplayHelp => {
                return Ok(Outcome::Help(err.render().to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        let mut values = ParsedFlags::from_matches(&matches, flags.iter().copied());
        values.set_remaining(remaining);

        debug!(known = ?split.known, "parsing global flags");
        let global_values = self.parse_globals(program, &split.known)?;

        debug!(command = %command.name(), "creating application");
        let mut app = factory(&global_values).map_err(Error::AppFactory)?;
        let code = command.invoke(&mut app, &values)?;
        debug!(command = %command.name(), code, "command finished");
        Ok(Outcome::Completed(code))
    }

    fn parse_globals(&self, program: &str, known: &[String]) -> Result<ParsedFlags> {
        if self.global_flags.is_empty() {
            return Ok(ParsedFlags::new());
        }
        let matches = clap::Command::new(program.to_string())
            .bin_name(program.to_string())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .color(ColorChoice::Never)
            .args(self.global_flags.iter().map(FlagDescriptor::to_arg))
            .try_get_matches_from(known)?;
        Ok(ParsedFlags::from_matches(&matches, &self.global_flags))
    }

    /// Dispatches the process arguments and exits; see [`crate::driver::run`].
    pub fn run(&self) -> ! {
        crate::driver::run(self)
    }
}
