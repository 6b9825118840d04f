//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// SkillPlan - LLM-driven skill planner
#[derive(Parser)]
#[command(
    name = "sp",
    about = "Plan and run skill calls for natural-language questions",
    version = env!("CARGO_PKG_VERSION"),
    after_help = generate_after_help()
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a question: synthesize a plan and run it
    Ask {
        /// The question to answer
        question: String,

        #[command(flatten)]
        request: RequestArgs,

        /// Print every executed step, not only the answer
        #[arg(short, long)]
        trace: bool,
    },

    /// Synthesize a plan and print it as JSON without running it
    Plan {
        /// The question to plan for
        question: String,
    },

    /// List registered skills and their functions
    Skills,

    /// Run the bundled sample questions
    Demo {
        /// Run only the sample with this index (0-based)
        #[arg(short, long)]
        only: Option<usize>,
    },
}

/// How the request context for a question is built
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RequestArgs {
    /// JSON file holding the request context (user/chat ids, plugin blocks)
    #[arg(short, long, value_name = "FILE")]
    pub request: Option<PathBuf>,

    /// Transport header passed to skills, as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    #[arg(long)]
    pub user_id: Option<i64>,

    #[arg(long)]
    pub chat_id: Option<i64>,

    #[arg(long)]
    pub message_id: Option<i64>,

    #[arg(long)]
    pub domain_id: Option<i64>,

    /// Also pass the serialized request to skills as `request_body`
    #[arg(long)]
    pub request_body: bool,
}

/// Split a "Name: value" header argument
pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    debug!(%raw, "parse_header: called");
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("header must look like 'Name: value', got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        debug!("parse_header: empty name");
        return Err(format!("header name is empty in '{}'", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skillplan")
        .join("logs")
        .join("skillplan.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text
fn generate_after_help() -> String {
    format!(
        "The API key is read from the variable named by llm.api-key-env (default OPENAI_API_KEY).\n\
         Logs are written to: {}",
        get_log_path().display()
    )
}
