//! Interactive prompts for command bodies.
//!
//! Each prompt writes its question to `out`, reads one line from `input` and
//! asks again until the answer is acceptable. A blank answer takes the default
//! when there is one. Running out of input is an
//! [`io::ErrorKind::UnexpectedEof`] error, so a closed stdin never loops.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//!
//! use manage_script_core::prompt_bool;
//!
//! let mut input = Cursor::new("maybe\nyes\n");
//! let mut out = Vec::new();
//! assert!(prompt_bool(&mut input, &mut out, "Drop database?", false).unwrap());
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "Drop database? [y/N]: Drop database? [y/N]: "
//! );
//! ```

use std::io::{self, BufRead, Write};

use console::Term;

/// Answers [`prompt_bool`] reads as `true`, compared case-insensitively.
pub const YES_CHOICES: [&str; 6] = ["y", "yes", "1", "on", "true", "t"];

/// Answers [`prompt_bool`] reads as `false`, compared case-insensitively.
pub const NO_CHOICES: [&str; 6] = ["n", "no", "0", "off", "false", "f"];

/// Answer that makes [`prompt_choices`] return `None`.
const NO_CHOICE: &str = "none";

/// One selectable answer for [`prompt_choices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// What the user types and what the prompt returns.
    pub value: String,
    /// Longer text shown next to the value.
    pub label: Option<String>,
}

impl Choice {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    fn display(&self) -> String {
        match &self.label {
            Some(label) => format!("{label} [{}]", self.value),
            None => self.value.clone(),
        }
    }
}

impl From<&str> for Choice {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Asks for a line of text.
pub fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    name: &str,
    default: Option<&str>,
) -> io::Result<String> {
    let question = match default {
        Some(default) => format!("{name} [{default}]"),
        None => name.to_string(),
    };
    loop {
        let answer = ask(input, out, &question)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
        if let Some(default) = default {
            return Ok(default.to_string());
        }
    }
}

/// Asks for a secret on the terminal without echoing it.
///
/// The default is never shown.
pub fn prompt_pass(term: &Term, name: &str, default: Option<&str>) -> io::Result<String> {
    loop {
        term.write_str(&format!("{name}: "))?;
        let answer = term.read_secure_line()?;
        if !answer.is_empty() {
            return Ok(answer);
        }
        if let Some(default) = default {
            return Ok(default.to_string());
        }
    }
}

/// Asks a yes/no question; see [`YES_CHOICES`] and [`NO_CHOICES`].
pub fn prompt_bool<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    name: &str,
    default: bool,
) -> io::Result<bool> {
    let question = format!("{name} [{}]", if default { "Y/n" } else { "y/N" });
    loop {
        let answer = ask(input, out, &question)?;
        if answer.is_empty() {
            return Ok(default);
        }
        if YES_CHOICES.iter().any(|yes| answer.eq_ignore_ascii_case(yes)) {
            return Ok(true);
        }
        if NO_CHOICES.iter().any(|no| answer.eq_ignore_ascii_case(no)) {
            return Ok(false);
        }
    }
}

/// Asks for one of `choices`, matched case-insensitively.
///
/// Returns the matching choice's value, `None` for the answer `none`, or
/// `default` for a blank answer. Anything else asks again.
pub fn prompt_choices<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    name: &str,
    choices: &[Choice],
    default: Option<&str>,
) -> io::Result<Option<String>> {
    let options: Vec<String> = choices.iter().map(Choice::display).collect();
    let mut question = format!("{name} - ({})", options.join(", "));
    if let Some(default) = default {
        question.push_str(&format!(" [{default}]"));
    }
    loop {
        let answer = ask(input, out, &question)?;
        if answer.is_empty() {
            return Ok(default.map(str::to_string));
        }
        if answer.eq_ignore_ascii_case(NO_CHOICE) {
            return Ok(None);
        }
        if let Some(choice) = choices
            .iter()
            .find(|choice| choice.value.eq_ignore_ascii_case(&answer))
        {
            return Ok(Some(choice.value.clone()));
        }
    }
}

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> io::Result<String> {
    write!(out, "{question}: ")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("no answer to `{question}`"),
        ));
    }
    Ok(line.trim().to_string())
}
