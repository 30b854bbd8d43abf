//! Partitioning of raw tokens between parser scopes.
//!
//! Manager-wide flags may appear anywhere on the command line, and catch-all
//! commands accept tokens they never declared. Both cases need to pull the
//! tokens a scope knows about out of the argument vector before clap sees it,
//! keeping everything else in its original order.

use std::iter::Peekable;
use std::slice::Iter;

use crate::flag::{FlagAction, FlagDescriptor, FlagKind};
use crate::validate::HELP_FLAGS;

/// Tokens claimed by a scope and the ones left over.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Split {
    pub(crate) known: Vec<String>,
    pub(crate) rest: Vec<String>,
}

pub(crate) fn is_help_token(token: &str) -> bool {
    HELP_FLAGS.contains(&token)
}

/// Whether a help token appears before any `--` separator.
pub(crate) fn requests_help(args: &[String]) -> bool {
    args.iter()
        .take_while(|arg| *arg != "--")
        .any(|arg| is_help_token(arg))
}

/// Pulls the tokens of optional `flags` (and their values) out of `args`.
///
/// Help tokens and everything from `--` on are left in `rest`.
pub(crate) fn split_known(args: &[String], flags: &[&FlagDescriptor]) -> Split {
    let mut split = Split::default();
    let mut tokens = args.iter().peekable();

    while let Some(token) = tokens.next() {
        if token == "--" {
            split.rest.push(token.clone());
            split.rest.extend(tokens.by_ref().cloned());
            break;
        }
        if !claim(token, flags, &mut tokens, &mut split.known) {
            split.rest.push(token.clone());
        }
    }

    split
}

/// Splits a catch-all command's tokens into the ones its parser handles and
/// the verbatim tail.
///
/// Declared flags, help tokens and the first positional tokens (one per
/// declared positional) are kept for the parser; everything else lands in
/// `rest`. A `--` separator is dropped and everything after it goes to `rest`.
pub(crate) fn split_catch_all(args: &[String], flags: &[&FlagDescriptor]) -> Split {
    let mut split = Split::default();
    let positionals: Vec<_> = flags
        .iter()
        .filter(|flag| flag.kind == FlagKind::Positional)
        .collect();
    let unbounded = positionals
        .iter()
        .any(|flag| flag.action == FlagAction::Append);
    let mut slots = positionals.len();
    let mut tokens = args.iter().peekable();

    while let Some(token) = tokens.next() {
        if token == "--" {
            split.rest.extend(tokens.by_ref().cloned());
            break;
        }
        if is_help_token(token) {
            split.known.push(token.clone());
            continue;
        }
        if claim(token, flags, &mut tokens, &mut split.known) {
            continue;
        }
        if !looks_like_flag(token) && (unbounded || slots > 0) {
            slots = slots.saturating_sub(1);
            split.known.push(token.clone());
        } else {
            split.rest.push(token.clone());
        }
    }

    split
}

/// Moves `token` (and its separate value, if any) into `known` when it is one
/// of `flags`' spellings.
fn claim(
    token: &str,
    flags: &[&FlagDescriptor],
    tokens: &mut Peekable<Iter<'_, String>>,
    known: &mut Vec<String>,
) -> bool {
    if !looks_like_flag(token) {
        return false;
    }

    if let Some(flag) = flags.iter().find(|flag| flag.matches(token)) {
        known.push(token.to_string());
        if flag.takes_value() {
            if let Some(value) = tokens.next_if(|next| !looks_like_flag(next)) {
                known.push(value.clone());
            }
        }
        return true;
    }

    // `--name=value` and `-nvalue` carry their own value.
    let name = if token.starts_with("--") {
        token.split_once('=').map(|(name, _)| name.to_string())
    } else {
        token.chars().nth(1).map(|short| format!("-{short}"))
    };
    let inline = name.is_some_and(|name| {
        flags
            .iter()
            .any(|flag| flag.takes_value() && flag.matches(&name))
    });
    if inline {
        known.push(token.to_string());
    }
    inline
}

fn looks_like_flag(token: &str) -> bool {
    token.starts_with('-') && token != "-"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_requests_help_stops_at_separator() {
        assert!(requests_help(&args(&["joe", "--bogus", "-?"])));
        assert!(!requests_help(&args(&["joe", "--", "-h"])));
        assert!(!requests_help(&args(&["joe", "--helpful"])));
    }

    #[test]
    fn test_split_known_pulls_flags_from_anywhere() {
        let config = FlagDescriptor::optional(["-c", "--config"]);
        let split = split_known(
            &args(&["hello", "joe", "-c", "dev.yml", "--url=x"]),
            &[&config],
        );

        assert_eq!(split.known, args(&["-c", "dev.yml"]));
        assert_eq!(split.rest, args(&["hello", "joe", "--url=x"]));
    }

    #[test]
    fn test_split_known_handles_inline_values_and_help() {
        let config = FlagDescriptor::optional(["-c", "--config"]);
        let split = split_known(
            &args(&["--config=a.yml", "hello", "-cb.yml", "-h"]),
            &[&config],
        );

        assert_eq!(split.known, args(&["--config=a.yml", "-cb.yml"]));
        assert_eq!(split.rest, args(&["hello", "-h"]));
    }

    #[test]
    fn test_split_known_stops_at_separator() {
        let config = FlagDescriptor::optional(["-c", "--config"]);
        let split = split_known(&args(&["run", "--", "-c", "x"]), &[&config]);

        assert!(split.known.is_empty());
        assert_eq!(split.rest, args(&["run", "--", "-c", "x"]));
    }

    #[test]
    fn test_split_known_leaves_flag_like_value_alone() {
        let config = FlagDescriptor::optional(["-c", "--config"]);
        let split = split_known(&args(&["-c", "--verbose"]), &[&config]);

        assert_eq!(split.known, args(&["-c"]));
        assert_eq!(split.rest, args(&["--verbose"]));
    }

    #[test]
    fn test_split_catch_all_keeps_tail_in_order() {
        let foo = FlagDescriptor::optional(["--foo"]).with_action(FlagAction::StoreTrue);
        let split = split_catch_all(&args(&["pos1", "--foo", "pos2", "--bar"]), &[&foo]);

        assert_eq!(split.known, args(&["--foo"]));
        assert_eq!(split.rest, args(&["pos1", "pos2", "--bar"]));
    }

    #[test]
    fn test_split_catch_all_fills_declared_positionals_first() {
        let target = FlagDescriptor::positional("target");
        let split = split_catch_all(&args(&["web", "-x", "extra", "--", "--foo"]), &[&target]);

        assert_eq!(split.known, args(&["web"]));
        assert_eq!(split.rest, args(&["-x", "extra", "--foo"]));
    }
}
