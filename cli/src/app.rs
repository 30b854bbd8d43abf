//! The application handle demo commands run against.

use std::path::PathBuf;

use anyhow::Context;
use manage_script_core::{Application, ParsedFlags};
use serde::Deserialize;
use tracing::debug;

use crate::config::AppConfig;

/// Values of the root manager's global flags.
#[derive(Debug, Default, Deserialize)]
struct GlobalOptions {
    config: Option<String>,
}

/// Demo application: its configuration plus an active-context counter.
#[derive(Debug)]
pub struct DemoApp {
    pub config: AppConfig,
    pub config_path: Option<PathBuf>,
    contexts: usize,
}

impl DemoApp {
    /// Builds the application from the global flag values.
    pub fn from_flags(flags: &ParsedFlags) -> anyhow::Result<Self> {
        let options: GlobalOptions = flags
            .deserialize()
            .context("invalid global options")?;
        let (config, config_path) = AppConfig::resolve(options.config.as_deref())?;
        Ok(Self {
            config,
            config_path,
            contexts: 0,
        })
    }

    /// Whether a command context is currently active.
    pub fn in_context(&self) -> bool {
        self.contexts > 0
    }
}

impl Application for DemoApp {
    fn push_context(&mut self) {
        self.contexts += 1;
        debug!(app = %self.config.name, depth = self.contexts, "pushed app context");
    }

    fn pop_context(&mut self) {
        self.contexts = self.contexts.saturating_sub(1);
        debug!(app = %self.config.name, depth = self.contexts, "popped app context");
    }
}
