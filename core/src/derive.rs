//! Flag derivation from a function's declared parameter list.
//!
//! A [`Signature`] lists a command function's parameters (excluding the
//! application handle, which every body receives explicitly) with their
//! optional defaults. [`derive_flags`] turns it into flag descriptors:
//!
//! - a parameter without a default becomes a positional flag;
//! - a boolean default becomes a toggle (`-x/--name`) that flips the default;
//! - any other default becomes `-x/--name VALUE`, typed after the default.
//!
//! # Example
//!
//! ```
//! use manage_script_core::*;
//!
//! let sig = Signature::new()
//!     .arg("name")
//!     .arg_with_default("url", None::<String>)
//!     .arg_with_default("verbose", false);
//! let flags = derive_flags("hello", &sig).unwrap();
//!
//! assert_eq!(flags[0].kind, FlagKind::Positional);
//! assert_eq!(flags[1].names, vec!["-u", "--url"]);
//! assert_eq!(flags[2].action, FlagAction::StoreTrue);
//! ```

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::flag::{FlagAction, FlagDescriptor, ValueType};

/// One declared parameter of a command function.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name; also the flag's destination key.
    pub name: String,
    /// Default value, if the parameter is optional.
    pub default: Option<Value>,
}

/// Ordered parameter list of a command function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    /// Creates an empty signature.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a required parameter.
    pub fn arg(mut self, name: &str) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            default: None,
        });
        self
    }

    /// Appends a parameter with a default value.
    pub fn arg_with_default(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            default: Some(default.into()),
        });
        self
    }

    /// Declared parameters in order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }
}

/// Derives flag descriptors for `command` from its signature.
///
/// Output order matches parameter order. Two defaulted parameters sharing a
/// first letter, or a derived spelling that shadows `-h`/`--help`, fail with
/// [`Error::FlagConflict`].
pub fn derive_flags(command: &str, signature: &Signature) -> Result<Vec<FlagDescriptor>> {
    let mut flags = Vec::with_capacity(signature.params.len());
    let mut shorts: HashMap<char, &str> = HashMap::from([('h', "help")]);

    for param in &signature.params {
        let Some(default) = &param.default else {
            flags.push(FlagDescriptor::positional(&param.name));
            continue;
        };

        let Some(first) = param.name.chars().next() else {
            return Err(Error::Misconfigured(format!(
                "command `{command}` declares a parameter with an empty name"
            )));
        };

        if shorts.insert(first, &param.name).is_some() {
            return Err(Error::FlagConflict {
                command: command.to_string(),
                flag: format!("-{first}"),
            });
        }

        let long = format!("--{}", param.name.replace('_', "-"));
        if long == "--help" {
            return Err(Error::FlagConflict {
                command: command.to_string(),
                flag: long,
            });
        }

        let mut flag = FlagDescriptor::optional([format!("-{first}"), long.clone()])
            .with_dest(&param.name)
            .with_default(default.clone());
        if long != format!("--{}", param.name) {
            flag = flag.with_alias(format!("--{}", param.name));
        }

        flag = match default {
            Value::Bool(false) => flag.with_action(FlagAction::StoreTrue),
            Value::Bool(true) => flag.with_action(FlagAction::StoreFalse),
            Value::Number(n) if n.is_f64() => flag.with_type(ValueType::Float),
            Value::Number(_) => flag.with_type(ValueType::Integer),
            _ => flag.with_type(ValueType::Text),
        };
        flags.push(flag);
    }

    debug!(command, count = flags.len(), "derived flags from signature");
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::FlagKind;

    #[test]
    fn test_required_params_become_positionals() {
        let sig = Signature::new().arg("source").arg("dest");
        let flags = derive_flags("copy", &sig).unwrap();

        assert_eq!(flags.len(), 2);
        assert!(flags.iter().all(|f| f.kind == FlagKind::Positional && f.required));
        assert_eq!(flags[0].dest, "source");
        assert_eq!(flags[1].dest, "dest");
    }

    #[test]
    fn test_defaults_pick_type_and_action() {
        let sig = Signature::new()
            .arg_with_default("name", "fred")
            .arg_with_default("port", 5000)
            .arg_with_default("ratio", 0.5)
            .arg_with_default("debug", true)
            .arg_with_default("verified", false);
        let flags = derive_flags("run", &sig).unwrap();

        assert_eq!(flags[0].value_type, ValueType::Text);
        assert_eq!(flags[0].default, Some(Value::from("fred")));
        assert_eq!(flags[1].value_type, ValueType::Integer);
        assert_eq!(flags[2].value_type, ValueType::Float);
        assert_eq!(flags[3].action, FlagAction::StoreFalse);
        assert_eq!(flags[4].action, FlagAction::StoreTrue);
        assert_eq!(flags[4].names, vec!["-v", "--verified"]);
    }

    #[test]
    fn test_underscore_names_get_dashed_long_flag() {
        let sig = Signature::new().arg_with_default("dry_run", false);
        let flags = derive_flags("deploy", &sig).unwrap();

        assert_eq!(flags[0].names, vec!["-d", "--dry-run", "--dry_run"]);
        assert_eq!(flags[0].dest, "dry_run");
    }

    #[test]
    fn test_short_flag_collision_fails() {
        let sig = Signature::new()
            .arg_with_default("name", "fred")
            .arg_with_default("number", 1);
        let err = derive_flags("hello", &sig).unwrap_err();

        assert!(matches!(
            err,
            Error::FlagConflict { ref command, ref flag } if command == "hello" && flag == "-n"
        ));
    }

    #[test]
    fn test_help_short_is_reserved() {
        let sig = Signature::new().arg_with_default("host", "127.0.0.1");
        let err = derive_flags("serve", &sig).unwrap_err();

        assert!(matches!(err, Error::FlagConflict { ref flag, .. } if flag == "-h"));
    }
}
