//! Parsed flag values handed to application factories and command bodies.

use std::collections::BTreeMap;

use clap::ArgMatches;
use clap::parser::ValueSource;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::flag::{FlagAction, FlagDescriptor, ValueType};

/// Values resolved for one parser scope, keyed by each flag's `dest`.
///
/// Only declared flags contribute values. Catch-all commands also get the
/// undeclared tail of the command line through [`remaining`](Self::remaining).
///
/// # Examples
///
/// ```
/// use manage_script_core::ParsedFlags;
///
/// let flags = ParsedFlags::from_pairs([("name", "joe".into()), ("verbose", true.into())]);
/// assert_eq!(flags.str("name"), Some("joe"));
/// assert!(flags.bool("verbose"));
/// assert!(flags.remaining().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFlags {
    values: BTreeMap<String, Value>,
    remaining: Vec<String>,
}

impl ParsedFlags {
    /// Creates an empty set of values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds values directly from `(dest, value)` pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            remaining: Vec::new(),
        }
    }

    /// Reads the values of `flags` out of clap matches, applying defaults for
    /// absent flags.
    pub(crate) fn from_matches<'a, I>(matches: &ArgMatches, flags: I) -> Self
    where
        I: IntoIterator<Item = &'a FlagDescriptor>,
    {
        let values = flags
            .into_iter()
            .map(|flag| (flag.dest.clone(), extract_value(matches, flag)))
            .collect();
        Self {
            values,
            remaining: Vec::new(),
        }
    }

    pub(crate) fn set_remaining(&mut self, remaining: Vec<String>) {
        self.remaining = remaining;
    }

    /// Raw value for `dest`.
    pub fn get(&self, dest: &str) -> Option<&Value> {
        self.values.get(dest)
    }

    /// Whether `dest` has a non-null value.
    pub fn contains(&self, dest: &str) -> bool {
        self.get(dest).is_some_and(|v| !v.is_null())
    }

    /// Text value for `dest`.
    pub fn str(&self, dest: &str) -> Option<&str> {
        self.get(dest).and_then(Value::as_str)
    }

    /// Owned text value for `dest`, rendering numbers and booleans as text.
    pub fn string(&self, dest: &str) -> Option<String> {
        match self.get(dest)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Boolean value for `dest`; absent or non-boolean reads as `false`.
    pub fn bool(&self, dest: &str) -> bool {
        self.get(dest).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Integer value for `dest`.
    pub fn i64(&self, dest: &str) -> Option<i64> {
        self.get(dest).and_then(Value::as_i64)
    }

    /// Float value for `dest` (integers are widened).
    pub fn f64(&self, dest: &str) -> Option<f64> {
        self.get(dest).and_then(Value::as_f64)
    }

    /// Occurrence count for a counting flag.
    pub fn count(&self, dest: &str) -> u64 {
        self.get(dest).and_then(Value::as_u64).unwrap_or(0)
    }

    /// List value for `dest` (appending flags and multi-value positionals).
    pub fn list(&self, dest: &str) -> Vec<String> {
        match self.get(dest) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Undeclared tokens collected by a catch-all command, in original order.
    pub fn remaining(&self) -> &[String] {
        &self.remaining
    }

    /// Number of resolved values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values were resolved.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(dest, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Deserializes the values into a typed struct.
    ///
    /// # Examples
    ///
    /// ```
    /// use manage_script_core::ParsedFlags;
    ///
    /// #[derive(serde::Deserialize)]
    /// struct Options {
    ///     config: Option<String>,
    /// }
    ///
    /// let flags = ParsedFlags::from_pairs([("config", "dev.yml".into())]);
    /// let options: Options = flags.deserialize().unwrap();
    /// assert_eq!(options.config.as_deref(), Some("dev.yml"));
    /// ```
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(Value::Object(map))
    }
}

fn extract_value(matches: &ArgMatches, flag: &FlagDescriptor) -> Value {
    let id = flag.dest.as_str();
    let present = matches.value_source(id) == Some(ValueSource::CommandLine);

    match flag.action {
        FlagAction::StoreTrue => {
            if present {
                Value::Bool(true)
            } else {
                flag.default.clone().unwrap_or(Value::Bool(false))
            }
        }
        FlagAction::StoreFalse => {
            if present {
                Value::Bool(false)
            } else {
                flag.default.clone().unwrap_or(Value::Bool(true))
            }
        }
        FlagAction::Count => {
            if present {
                Value::from(matches.get_count(id))
            } else {
                flag.default.clone().unwrap_or(Value::from(0))
            }
        }
        FlagAction::Append => {
            if present {
                Value::Array(many_values(matches, id, flag.effective_type()))
            } else {
                flag.default
                    .clone()
                    .unwrap_or_else(|| Value::Array(Vec::new()))
            }
        }
        FlagAction::Store => {
            if present {
                one_value(matches, id, flag.effective_type())
            } else {
                flag.default.clone().unwrap_or(Value::Null)
            }
        }
    }
}

fn one_value(matches: &ArgMatches, id: &str, value_type: ValueType) -> Value {
    let value = match value_type {
        ValueType::Text => matches
            .try_get_one::<String>(id)
            .ok()
            .flatten()
            .map(|v| Value::from(v.clone())),
        ValueType::Integer => matches
            .try_get_one::<i64>(id)
            .ok()
            .flatten()
            .map(|v| Value::from(*v)),
        ValueType::Float => matches
            .try_get_one::<f64>(id)
            .ok()
            .flatten()
            .map(|v| Value::from(*v)),
        ValueType::Bool => matches
            .try_get_one::<bool>(id)
            .ok()
            .flatten()
            .map(|v| Value::from(*v)),
    };
    value.unwrap_or(Value::Null)
}

fn many_values(matches: &ArgMatches, id: &str, value_type: ValueType) -> Vec<Value> {
    fn collect<T>(matches: &ArgMatches, id: &str) -> Vec<Value>
    where
        T: Clone + Send + Sync + 'static + Into<Value>,
    {
        matches
            .try_get_many::<T>(id)
            .ok()
            .flatten()
            .map(|values| values.cloned().map(Into::into).collect())
            .unwrap_or_default()
    }

    match value_type {
        ValueType::Text => collect::<String>(matches, id),
        ValueType::Integer => collect::<i64>(matches, id),
        ValueType::Float => collect::<f64>(matches, id),
        ValueType::Bool => collect::<bool>(matches, id),
    }
}
