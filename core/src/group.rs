//! Flag groups: titled sections in help output, or mutually exclusive sets.

use crate::error::{Error, Result};
use crate::flag::FlagDescriptor;

/// A set of flags rendered together.
///
/// A group is either *titled* (a help section with an optional description)
/// or *exclusive* (at most one member may be given, optionally exactly one).
/// Mixing the two is a registration error.
///
/// # Examples
///
/// ```
/// use manage_script_core::{FlagAction, FlagDescriptor, FlagGroup};
///
/// let output = FlagGroup::new([
///     FlagDescriptor::optional(["--json"]).with_action(FlagAction::StoreTrue),
///     FlagDescriptor::optional(["--yaml"]).with_action(FlagAction::StoreTrue),
/// ])
/// .exclusive()
/// .required();
/// assert!(output.check().is_ok());
///
/// let bad = FlagGroup::new([FlagDescriptor::optional(["--json"])])
///     .with_title("Output")
///     .exclusive();
/// assert!(bad.check().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagGroup {
    /// Member flags in declaration order.
    pub flags: Vec<FlagDescriptor>,
    /// Help section title.
    pub title: Option<String>,
    /// Help section description.
    pub description: Option<String>,
    /// At most one member may be given.
    pub exclusive: bool,
    /// Exactly one member must be given (exclusive groups only).
    pub required: bool,
}

impl FlagGroup {
    /// Creates a plain group.
    pub fn new(flags: impl IntoIterator<Item = FlagDescriptor>) -> Self {
        Self {
            flags: flags.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Sets the help section title.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Sets the help section description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Makes members mutually exclusive.
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    /// Requires one member to be given.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Checks the group's settings are consistent.
    pub fn check(&self) -> Result<()> {
        if (self.title.is_some() || self.description.is_some())
            && (self.exclusive || self.required)
        {
            return Err(Error::Misconfigured(
                "title and/or description cannot be used with required and/or exclusive"
                    .to_string(),
            ));
        }
        if self.required && !self.exclusive {
            return Err(Error::Misconfigured(
                "required is only supported on exclusive groups".to_string(),
            ));
        }
        Ok(())
    }

    /// Help heading used for members of a titled group.
    pub(crate) fn heading(&self) -> Option<String> {
        match (&self.title, &self.description) {
            (Some(title), Some(description)) => Some(format!("{title} ({description})")),
            (Some(title), None) => Some(title.clone()),
            (None, Some(description)) => Some(description.clone()),
            (None, None) => None,
        }
    }
}

/// One entry in a command's flag list.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOption {
    /// A standalone flag.
    Flag(FlagDescriptor),
    /// A group of flags.
    Group(FlagGroup),
}

impl From<FlagDescriptor> for CommandOption {
    fn from(flag: FlagDescriptor) -> Self {
        CommandOption::Flag(flag)
    }
}

impl From<FlagGroup> for CommandOption {
    fn from(group: FlagGroup) -> Self {
        CommandOption::Group(group)
    }
}

/// Flattens options into their descriptors, in declaration order.
pub fn descriptors(options: &[CommandOption]) -> Vec<&FlagDescriptor> {
    options
        .iter()
        .flat_map(|option| match option {
            CommandOption::Flag(flag) => std::slice::from_ref(flag),
            CommandOption::Group(group) => group.flags.as_slice(),
        })
        .collect()
}
