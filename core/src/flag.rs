//! Flag descriptor definitions.
//!
//! A [`FlagDescriptor`] pairs the spellings of a command-line input with the
//! parser settings needed to turn it into a value: action, value type,
//! default, whether it is required, and help text. Descriptors are plain data;
//! [`Command::build_parser`](crate::Command::build_parser) turns them into
//! `clap` arguments.

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, value_parser};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a flag is matched by position or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Bound by position (e.g. `NAME` in `hello NAME`).
    Positional,
    /// Bound by name (e.g. `-n/--name`).
    Optional,
}

/// What the parser does when it sees a flag.
///
/// Every variant is a value-producing action, so every declared flag is safe
/// to hand to an application factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlagAction {
    /// Store the following value (the default).
    #[default]
    Store,
    /// Store `true` when present.
    StoreTrue,
    /// Store `false` when present.
    StoreFalse,
    /// Collect every occurrence's value into a list.
    Append,
    /// Count occurrences.
    Count,
}

/// Semantic type of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Free-form text (the default).
    #[default]
    Text,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Float,
    /// `true` or `false`.
    Bool,
}

/// Declaration of one command-line input.
///
/// # Examples
///
/// ```
/// use manage_script_core::{FlagAction, FlagDescriptor, FlagKind};
///
/// let name = FlagDescriptor::optional(["-n", "--name"]).with_help("name to pass in");
/// assert_eq!(name.kind, FlagKind::Optional);
/// assert_eq!(name.dest, "name");
/// assert!(name.matches("-n"));
/// assert!(name.takes_value());
///
/// let verbose = FlagDescriptor::optional(["-v", "--verbose"]).with_action(FlagAction::StoreTrue);
/// assert!(!verbose.takes_value());
///
/// let file = FlagDescriptor::positional("file");
/// assert_eq!(file.kind, FlagKind::Positional);
/// assert!(file.required);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDescriptor {
    /// Spellings, e.g. `["-n", "--name"]`, or a single bare positional name.
    pub names: Vec<String>,
    /// Positional or optional, inferred from `names`.
    pub kind: FlagKind,
    /// Type the raw token is converted to.
    pub value_type: ValueType,
    /// Value used when the flag is absent.
    pub default: Option<Value>,
    /// Whether parsing fails when the flag is absent.
    pub required: bool,
    /// Parser action.
    pub action: FlagAction,
    /// Help text.
    pub help: Option<String>,
    /// Key the parsed value is stored under.
    pub dest: String,
    /// Placeholder shown in usage output.
    pub metavar: Option<String>,
    /// Allowed values; empty means unrestricted.
    pub choices: Vec<String>,
}

impl FlagDescriptor {
    /// Creates a required positional flag.
    pub fn positional(name: &str) -> Self {
        Self {
            names: vec![name.to_string()],
            kind: FlagKind::Positional,
            value_type: ValueType::Text,
            default: None,
            required: true,
            action: FlagAction::Store,
            help: None,
            dest: name.to_string(),
            metavar: None,
            choices: Vec::new(),
        }
    }

    /// Creates an optional flag from its spellings (`-n`, `--name`, ...).
    ///
    /// The destination defaults to the first long spelling without its dashes,
    /// falling back to the first short spelling.
    pub fn optional<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let dest = infer_dest(&names);
        Self {
            names,
            kind: FlagKind::Optional,
            value_type: ValueType::Text,
            default: None,
            required: false,
            action: FlagAction::Store,
            help: None,
            dest,
            metavar: None,
            choices: Vec::new(),
        }
    }

    /// Overrides the destination key.
    pub fn with_dest(mut self, dest: &str) -> Self {
        self.dest = dest.to_string();
        self
    }

    /// Sets the value used when the flag is absent.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the value type.
    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Sets the parser action.
    pub fn with_action(mut self, action: FlagAction) -> Self {
        self.action = action;
        self
    }

    /// Marks the flag as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks a positional flag as optional (`nargs='?'`).
    pub fn optional_value(mut self) -> Self {
        self.required = false;
        self
    }

    /// Adds help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Sets the usage placeholder.
    pub fn with_metavar(mut self, metavar: &str) -> Self {
        self.metavar = Some(metavar.to_string());
        self
    }

    /// Restricts the accepted values.
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Adds another spelling.
    pub fn with_alias(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// First short spelling, without the dash.
    pub fn short(&self) -> Option<char> {
        self.shorts().next()
    }

    /// First long spelling, without the dashes.
    pub fn long(&self) -> Option<&str> {
        self.longs().next()
    }

    pub(crate) fn shorts(&self) -> impl Iterator<Item = char> + '_ {
        self.names.iter().filter_map(|name| {
            let rest = name.strip_prefix('-')?;
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c != '-' => Some(c),
                _ => None,
            }
        })
    }

    pub(crate) fn longs(&self) -> impl Iterator<Item = &str> + '_ {
        self.names
            .iter()
            .filter_map(|name| name.strip_prefix("--"))
            .filter(|rest| !rest.is_empty())
    }

    /// Returns the name used in diagnostics (long form preferred).
    pub fn canonical_name(&self) -> &str {
        self.names
            .iter()
            .find(|name| name.starts_with("--"))
            .or_else(|| self.names.first())
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    /// Checks whether `token` is one of this flag's spellings.
    pub fn matches(&self, token: &str) -> bool {
        self.kind == FlagKind::Optional && self.names.iter().any(|name| name == token)
    }

    /// Whether the flag consumes a value token.
    pub fn takes_value(&self) -> bool {
        matches!(self.action, FlagAction::Store | FlagAction::Append)
    }

    /// Type values are stored as; restricted choices are always text.
    pub(crate) fn effective_type(&self) -> ValueType {
        if self.choices.is_empty() {
            self.value_type
        } else {
            ValueType::Text
        }
    }

    /// Builds the clap argument for this flag, keyed by `dest`.
    pub(crate) fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.dest.clone()).required(self.required);

        match self.kind {
            FlagKind::Positional => {
                let name = self.names.first().cloned().unwrap_or_default();
                arg = arg.value_name(self.metavar.clone().unwrap_or(name));
                arg = match self.action {
                    FlagAction::Append if self.required => {
                        arg.action(ArgAction::Append).num_args(1..)
                    }
                    FlagAction::Append => arg.action(ArgAction::Append).num_args(0..),
                    _ => arg.action(ArgAction::Set),
                };
            }
            FlagKind::Optional => {
                let mut shorts = self.shorts();
                if let Some(short) = shorts.next() {
                    arg = arg.short(short);
                }
                for short in shorts {
                    arg = arg.short_alias(short);
                }
                let mut longs = self.longs();
                if let Some(long) = longs.next() {
                    arg = arg.long(long.to_string());
                }
                for long in longs {
                    arg = arg.alias(long.to_string());
                }
                if let Some(metavar) = &self.metavar {
                    arg = arg.value_name(metavar.clone());
                }
                arg = arg.action(match self.action {
                    FlagAction::Store => ArgAction::Set,
                    FlagAction::StoreTrue => ArgAction::SetTrue,
                    FlagAction::StoreFalse => ArgAction::SetFalse,
                    FlagAction::Append => ArgAction::Append,
                    FlagAction::Count => ArgAction::Count,
                });
            }
        }

        if self.takes_value() {
            arg = if self.choices.is_empty() {
                match self.value_type {
                    ValueType::Text => arg.value_parser(value_parser!(String)),
                    ValueType::Integer => arg
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true),
                    ValueType::Float => arg
                        .value_parser(value_parser!(f64))
                        .allow_negative_numbers(true),
                    ValueType::Bool => arg.value_parser(value_parser!(bool)),
                }
            } else {
                arg.value_parser(PossibleValuesParser::new(self.choices.clone()))
            };
        }

        if let Some(help) = &self.help {
            arg = arg.help(help.clone());
        }
        arg
    }
}

/// The `-h/--help/-?` argument every parser carries.
pub(crate) fn help_arg() -> Arg {
    Arg::new("__help")
        .short('h')
        .long("help")
        .short_alias('?')
        .action(ArgAction::Help)
        .help("Print help")
}

fn infer_dest(names: &[String]) -> String {
    let long = names.iter().find_map(|name| name.strip_prefix("--"));
    let short = names
        .iter()
        .find_map(|name| name.strip_prefix('-').filter(|rest| !rest.starts_with('-')));
    long.or(short)
        .or_else(|| names.first().map(String::as_str))
        .unwrap_or_default()
        .replace('-', "_")
}
