//! CLI module for Vulnscope.
//!
//! Subcommands:
//! - `ingest`: Rebuild the function index from a source tree
//! - `search`: Contextual retrieval for a topic
//! - `audit`: Run the security audit over the current index
//! - `ci`: Ingest then audit, with a pass/fail exit code

mod audit;
mod ci;
mod ingest;
mod search;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;

/// Vulnscope - security review index
#[derive(Parser)]
#[command(name = "vulnscope")]
#[command(about = "Function call graph and semantic retrieval for security review")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Rebuild the index from a source tree (full rebuild)
    Ingest {
        /// Root directory to scan (defaults to `source.root`)
        path: Option<PathBuf>,
    },

    /// Show the functions most relevant to a topic, with their callers
    Search {
        /// Free-text topic, e.g. "raw sql query"
        topic: String,

        /// Number of results
        #[arg(short, default_value_t = 5)]
        k: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Audit the current index and write the Markdown report
    Audit {
        /// Report path (defaults to `audit.report_path`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ingest, audit, write the report; exit 1 on any high-severity finding
    Ci {
        /// Root directory to scan (defaults to `source.root`)
        path: Option<PathBuf>,

        /// Report path (defaults to `audit.report_path`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> Result<ExitCode> {
        match self.command {
            Command::Ingest { ref path } => self.run_ingest(path.clone()).await,
            Command::Search { ref topic, k, json } => self.run_search(topic, k, json).await,
            Command::Audit { ref output } => self.run_audit(output.clone()).await,
            Command::Ci {
                ref path,
                ref output,
            } => self.run_ci(path.clone(), output.clone()).await,
        }
    }

    /// Loads configuration and opens every service handle.
    async fn open_context(&self) -> Result<Context> {
        let config = Config::load()?;
        tracing::debug!(backend = ?config.store.backend, "Loaded configuration");
        Ok(Context::from_config(config).await?)
    }
}
