//! Process entry point: dispatch `argv`, report, exit.

use std::path::Path;

use tracing::debug;

use crate::app::Application;
use crate::error::Error;
use crate::manager::{Manager, Outcome};

/// Dispatches the process arguments through `manager` and exits with the
/// resolved code.
pub fn run<A: Application>(manager: &Manager<A>) -> ! {
    let code = run_from(manager, std::env::args());
    std::process::exit(code)
}

/// Dispatches `argv` (program name first) and returns the exit code.
///
/// Help goes to stdout; errors go to stderr, with parse errors rendered by
/// clap.
pub fn run_from<A, I, S>(manager: &Manager<A>, argv: I) -> i32
where
    A: Application,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut argv = argv.into_iter().map(Into::into);
    let program = argv
        .next()
        .map(|arg0| program_name(&arg0))
        .unwrap_or_else(|| "manage".to_string());

    match manager.dispatch(&program, argv) {
        Ok(Outcome::Help(text)) => {
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
            0
        }
        Ok(Outcome::Completed(code)) => {
            debug!(code, "dispatch completed");
            code
        }
        Err(err) => report(err),
    }
}

fn report(err: Error) -> i32 {
    let code = err.exit_code();
    match &err {
        Error::Usage(clap_err) => {
            if let Err(io_err) = clap_err.print() {
                debug!(error = %io_err, "clap could not print the usage error");
                eprintln!("{clap_err}");
            }
        }
        Error::Command(source) => eprintln!("error: {source:#}"),
        _ => eprintln!("error: {err}"),
    }
    code
}

fn program_name(arg0: &str) -> String {
    Path::new(arg0)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(arg0)
        .to_string()
}
