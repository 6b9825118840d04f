//! SkillPlan - LLM-driven skill planner
//!
//! CLI entry point for asking questions, inspecting plans and listing skills.

use std::fs;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use serde_json::Map;
use tracing::{debug, info, warn};

use skillplan::cli::{Cli, Command, RequestArgs, get_log_path, parse_header};
use skillplan::config::Config;
use skillplan::domain::{PluginConfig, RequestContext};
use skillplan::llm::create_client;
use skillplan::planner::{ExecutionReport, Overrides, Planner, PlannerError};
use skillplan::skills::SkillRegistry;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(model = %config.llm.model, "SkillPlan loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Ask {
            question,
            request,
            trace,
        } => {
            debug!(%question, trace, "main: matched Ask command");
            cmd_ask(&config, &question, &request, trace).await
        }
        Command::Plan { question } => {
            debug!(%question, "main: matched Plan command");
            cmd_plan(&config, &question).await
        }
        Command::Skills => {
            debug!("main: matched Skills command");
            cmd_skills(&config)
        }
        Command::Demo { only } => {
            debug!(?only, "main: matched Demo command");
            cmd_demo(&config, only).await
        }
    }
}

/// Build the planner with the configured client and the built-in skills
fn build_planner(config: &Config) -> Result<Planner> {
    debug!("build_planner: called");
    config.validate()?;
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let registry = SkillRegistry::standard(&config.skills).context("Failed to register skills")?;
    Ok(Planner::from_config(config, llm, Arc::new(registry)))
}

/// Build the request context from the CLI flags
fn build_request(question: &str, args: &RequestArgs) -> Result<RequestContext> {
    debug!(request = ?args.request, "build_request: called");
    let mut request = match &args.request {
        Some(path) => {
            let content = fs::read_to_string(path).context(format!("Failed to read request {}", path.display()))?;
            let loaded: RequestContext =
                serde_json::from_str(&content).context(format!("Failed to parse request {}", path.display()))?;
            loaded.with_question(question)
        }
        None => RequestContext::new(question),
    };

    if let Some(id) = args.user_id {
        request.user_id = id;
    }
    if let Some(id) = args.chat_id {
        request.chat_id = id;
    }
    if let Some(id) = args.message_id {
        request.message_id = id;
    }
    if let Some(id) = args.domain_id {
        request.domain_id = id;
    }
    Ok(request)
}

/// Configured headers first, then the ones given on the command line
fn build_overrides(config: &Config, args: &RequestArgs) -> Result<Overrides> {
    debug!(count = args.headers.len(), "build_overrides: called");
    let mut overrides = Overrides::new().with_headers(config.headers.clone());
    for raw in &args.headers {
        let (name, value) = parse_header(raw).map_err(|e| eyre!(e))?;
        overrides = overrides.with_header(name, value);
    }
    if args.request_body {
        overrides = overrides.with_request_body();
    }
    Ok(overrides)
}

async fn cmd_ask(config: &Config, question: &str, args: &RequestArgs, trace: bool) -> Result<()> {
    debug!(%question, trace, "cmd_ask: called");
    let request = build_request(question, args)?;
    let overrides = build_overrides(config, args)?;
    let planner = build_planner(config)?;

    let report = planner
        .run_traced(question, &request, &overrides)
        .await
        .map_err(|e| with_hint(e, config))?;
    if trace {
        print_trace(&report);
    }
    println!("{}", report.output);
    Ok(())
}

async fn cmd_plan(config: &Config, question: &str) -> Result<()> {
    debug!(%question, "cmd_plan: called");
    let planner = build_planner(config)?;
    let plan = planner.plan(question).await.map_err(|e| with_hint(e, config))?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn cmd_skills(config: &Config) -> Result<()> {
    debug!("cmd_skills: called");
    let registry = SkillRegistry::standard(&config.skills).context("Failed to register skills")?;

    println!("Available skills:");
    println!();
    for skill in registry.skills() {
        println!("  {}", skill.name.bold());
        println!("    {}", skill.description);
        for (function, description) in &skill.functions {
            println!("    - {}.{}: {}", skill.name, function, description);
        }
        println!();
    }
    Ok(())
}

async fn cmd_demo(config: &Config, only: Option<usize>) -> Result<()> {
    debug!(?only, "cmd_demo: called");
    let planner = build_planner(config)?;
    let overrides = Overrides::new().with_headers(config.headers.clone());

    let samples = demo_requests();
    let selected: Vec<&RequestContext> = match only {
        Some(index) => vec![
            samples
                .get(index)
                .ok_or_else(|| eyre!("No sample {}, there are {}", index, samples.len()))?,
        ],
        None => samples.iter().collect(),
    };

    for request in selected {
        println!("{}", "-------------------------------".dimmed());
        println!("{} {}", "Question:".bold(), request.question);
        match planner.run_traced(&request.question, request, &overrides).await {
            Ok(report) => {
                print_trace(&report);
                println!("{}", "Plan results:".bold());
                println!("{}", report.output);
            }
            Err(e) => {
                warn!(error = %e, "cmd_demo: sample failed");
                println!("{} {}", "Failed:".red().bold(), e);
            }
        }
    }
    println!("{}", "-------------------------------".dimmed());
    Ok(())
}

/// Point at the API key when the completion service rejected it
fn with_hint(err: PlannerError, config: &Config) -> eyre::Report {
    let auth_failed = matches!(&err, PlannerError::CompletionService { source, .. } if source.is_auth());
    let report = eyre::Report::new(err);
    if auth_failed {
        debug!("with_hint: authentication failure");
        report.wrap_err(format!(
            "The completion service rejected the API key from {}",
            config.llm.api_key_env
        ))
    } else {
        report
    }
}

fn print_trace(report: &ExecutionReport) {
    debug!(run_id = %report.run_id, "print_trace: called");
    if report.steps.is_empty() {
        println!("{}", "(empty plan, answering with its input)".dimmed());
    }
    for step in &report.steps {
        println!("{} {}", format!("[{}]", step.index).cyan(), step.reference.to_string().bold());
        if let Some(goal) = &step.rewritten_goal {
            println!("    {} {}", "goal:".dimmed(), goal);
        }
        println!("    {} {}", "output:".dimmed(), step.output);
    }
}

/// Sample questions exercising each built-in skill
fn demo_requests() -> Vec<RequestContext> {
    let service_desk = PluginConfig {
        name: "ServiceDesk".to_string(),
        url: "http://localhost:9001/query".to_string(),
        configuration: Map::from_iter([(
            "url".to_string(),
            serde_json::Value::String("https://desk.example.com/api/v3".to_string()),
        )]),
    };

    [
        "List the wifi incidents",
        "List all the invoices of the user with id 5",
        "Update the following invoice: {id=1, paid=true, user_id=5}",
        "What is life cycle analysis?",
        "Tell me some facts about the most populated city in the world.",
    ]
    .into_iter()
    .map(|question| {
        let mut request = RequestContext::new(question).with_plugin(service_desk.clone());
        request.user_id = 7;
        request.message_id = 7;
        request.chat_id = 4;
        request.domain_id = 1;
        request
    })
    .collect()
}
