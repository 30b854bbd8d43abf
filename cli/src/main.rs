mod app;
mod commands;
mod config;

use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr; stdout carries command output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();

    let manager = match commands::build_manager() {
        Ok(manager) => manager,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.exit_code());
        }
    };

    manager.run()
}
