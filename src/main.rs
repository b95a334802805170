// Copyright (c) 2024 Reach. All rights reserved.

mod accumulator;
mod backend;
mod classifier;
mod config;
mod consts;
mod environment;
mod events;
mod gal;
mod job;
mod pretty;
mod scheduler;
mod search;
mod session;
mod submitter;

use crate::backend::{Backend, BackendClient};
use crate::config::{get_config_path, Config};
use crate::consts::polling::EVENT_QUEUE_SIZE;
use crate::events::Event;
use crate::search::{MatchPolicy, SearchOutcome, SearchRequest};
use crate::session::Session;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use crossterm::style::Stylize;
use log::{debug, warn};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Command-line arguments
struct Args {
    /// Path to the config file (defaults to ./reach.config or ~/.reach/config.json)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Base URL of the safety checker backend
    #[arg(long, value_name = "URL", global = true)]
    url: Option<String>,

    /// Base URL of the GAL synthesis and simulation backend
    #[arg(long = "simulator-url", value_name = "URL", global = true)]
    simulator_url: Option<String>,

    /// Enable debug logging
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs)]
struct Input {
    /// Plain-text system description to read
    #[arg(long, value_name = "FILE", conflicts_with = "text", required_unless_present = "text")]
    file: Option<PathBuf>,

    /// System description given inline
    #[arg(long, value_name = "TEXT")]
    text: Option<String>,
}

impl Input {
    fn read(&self) -> Result<String, Box<dyn Error>> {
        match (&self.file, &self.text) {
            (Some(path), _) => {
                let text = std::fs::read_to_string(path)?;
                debug!("File loaded: {}", path.display());
                Ok(text)
            }
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err("Please enter input text or upload a file".into()),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Verify that no unsafe marking of the system is reachable
    Check {
        #[command(flatten)]
        input: Input,
    },
    /// Show whether a submitted job has completed
    Status {
        /// Request ID returned on submission
        request_id: String,
    },
    /// Mark a submitted job as completed
    Complete {
        /// Request ID returned on submission
        request_id: String,
    },
    /// Generate the GAL model of the system and save it
    Generate {
        #[command(flatten)]
        input: Input,

        /// Where to write the model
        #[arg(long, short, value_name = "PATH", default_value = "generated.gal")]
        output: PathBuf,
    },
    /// Search random executions for a state matching the target values
    Search {
        #[command(flatten)]
        input: Input,

        /// Target value of a variable, as NAME=VALUE (repeatable)
        #[arg(long = "target", value_name = "NAME=VALUE", value_parser = parse_assignment, required = true)]
        targets: Vec<(String, i64)>,

        /// Random-walk length per epoch
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        branches: Option<u32>,

        /// Maximum number of simulations to try
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        epochs: Option<u32>,

        /// Only accept the target in the last state of a trace
        #[arg(long = "final-state", action = ArgAction::SetTrue)]
        final_state: bool,
    },
}

fn parse_assignment(s: &str) -> Result<(String, i64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in `{}`", s));
    }
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid value for `{}`: {}", name, e))?;
    Ok((name.to_string(), value))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

/// Settings from the config file, with command-line overrides applied.
fn load_config(args: &Args) -> Result<Config, Box<dyn Error>> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };
    let mut config = Config::load_or_default(&path)?;
    debug!("Using config {}", path.display());

    let env = std::env::var("REACH_ENVIRONMENT").unwrap_or_default();
    if !env.is_empty() {
        config.environment = env;
    }
    if let Some(url) = &args.url {
        config.checker_url = url.clone();
    }
    if let Some(url) = &args.simulator_url {
        config.simulator_url = url.clone();
    }
    Ok(config)
}

fn checker_client(config: &Config) -> Result<Arc<dyn Backend>, Box<dyn Error>> {
    let client = BackendClient::new(config.resolved_checker_url()?)?
        .with_submit_timeout(Duration::from_secs(config.submit_timeout_secs));
    Ok(Arc::new(client))
}

fn simulator_client(config: &Config) -> Result<Arc<dyn Backend>, Box<dyn Error>> {
    let client = BackendClient::new(config.resolved_simulator_url()?)?
        .with_submit_timeout(Duration::from_secs(config.submit_timeout_secs));
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<ExitCode, Box<dyn Error>> {
    let config = load_config(args)?;

    match &args.command {
        Command::Check { input } => check(&config, &input.read()?).await,
        Command::Status { request_id } => {
            let status = checker_client(&config)?.status(request_id).await?;
            if status.completed {
                println!("Request {} has completed.", request_id);
            } else {
                println!("Request {} is still processing.", request_id);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Complete { request_id } => {
            checker_client(&config)?.complete(request_id).await?;
            println!("Processing of request {} marked as completed.", request_id);
            Ok(ExitCode::SUCCESS)
        }
        Command::Generate { input, output } => generate(&config, &input.read()?, output).await,
        Command::Search {
            input,
            targets,
            branches,
            epochs,
            final_state,
        } => {
            let request = SearchRequest {
                input_text: input.read()?,
                target: targets.iter().cloned().collect(),
                branch_count: branches.unwrap_or(config.branches),
                epoch_limit: epochs.unwrap_or(config.epochs).max(1),
            };
            let policy = if *final_state {
                MatchPolicy::FinalState
            } else {
                config.match_policy
            };
            search(&config, &request, policy).await
        }
    }
}

/// Submit a safety check and follow its log until it completes.
async fn check(config: &Config, input_text: &str) -> Result<ExitCode, Box<dyn Error>> {
    let (event_sender, mut event_receiver) = mpsc::channel::<Event>(EVENT_QUEUE_SIZE);
    let mut session = Session::new(
        checker_client(config)?,
        simulator_client(config)?,
        event_sender,
        Duration::from_millis(config.poll_interval_ms),
    );

    let job_id = session.submit_job(input_text).await?;
    println!("Processing started (request {}). Updates will appear below.", job_id);

    let mut printed = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                session.clear();
                println!("Cancelled; the terminal was cleared.");
                return Ok(ExitCode::from(130));
            }
            event = event_receiver.recv() => match event {
                Some(event) if event.job_id().is_some_and(|id| *id != job_id) => {
                    debug!("Ignoring event for stale job {:?}", event.job_id());
                }
                Some(Event::LogUpdated { entries, .. }) => {
                    // The log is cumulative; only print what has not been shown yet.
                    if entries.len() < printed {
                        printed = 0;
                    }
                    for entry in &entries[printed..] {
                        println!("{}", pretty::render_entry(entry));
                    }
                    printed = entries.len();
                }
                Some(Event::PollFailed { message, .. }) => {
                    debug!("Poll failed, retrying on next tick: {}", message);
                }
                Some(Event::Completed { outcome, unsafe_markings, .. }) => {
                    println!("{}", pretty::render_outcome(&outcome, unsafe_markings));
                    session.wait().await;
                    debug!(
                        "Job finished as {:?} with {} log entries",
                        session.job_status(),
                        session.snapshot().entries.len()
                    );
                    return Ok(match outcome {
                        classifier::Outcome::Safe => ExitCode::SUCCESS,
                        classifier::Outcome::Unsafe => ExitCode::from(2),
                        classifier::Outcome::Error(_) => ExitCode::FAILURE,
                    });
                }
                Some(Event::EpochFinished { .. }) => {}
                None => return Ok(ExitCode::FAILURE),
            }
        }
    }
}

/// Synthesise the GAL model and write it to `output`.
async fn generate(config: &Config, input_text: &str, output: &Path) -> Result<ExitCode, Box<dyn Error>> {
    if input_text.trim().is_empty() {
        return Err("Please input your system description first".into());
    }
    let response = simulator_client(config)?.process(input_text).await?;
    let Some(gal_code) = response.gal_code else {
        return Err("Invalid response from server: missing gal_code".into());
    };

    gal::save(&gal_code, output)?;
    println!("GAL code has been generated and saved to {}.", output.display());

    let target = gal::default_target(&gal_code);
    if target.is_empty() {
        warn!("The generated model declares no variables");
    } else {
        let names: Vec<&str> = target.keys().map(String::as_str).collect();
        println!("Variables available as search targets: {}", names.join(", "));
        println!("Example: reach search --file <FILE> --target {}=0", names[0]);
    }
    Ok(ExitCode::SUCCESS)
}

/// Run the epochic reachability search and show the retained trace.
async fn search(config: &Config, request: &SearchRequest, policy: MatchPolicy) -> Result<ExitCode, Box<dyn Error>> {
    let (event_sender, mut event_receiver) = mpsc::channel::<Event>(EVENT_QUEUE_SIZE);
    let session = Session::new(
        checker_client(config)?,
        simulator_client(config)?,
        event_sender,
        Duration::from_millis(config.poll_interval_ms),
    )
    .with_match_policy(policy);

    let epoch_limit = request.epoch_limit;
    let printer = tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            if let Event::EpochFinished { epoch, matched, steps } = event {
                if matched {
                    println!("Epoch {}/{}: target reached ({} steps).", epoch, epoch_limit, steps);
                } else {
                    println!(
                        "Epoch {}/{}: reachability property does not hold in this run.",
                        epoch, epoch_limit
                    );
                }
            }
        }
    });

    let result = session.run_search(request).await;
    drop(session);
    let _ = printer.await;

    let outcome = result?;
    if let Some(trace) = outcome.trace() {
        println!("{}", pretty::render_trace(trace));
    }
    match outcome {
        SearchOutcome::Matched { epoch, .. } => {
            println!("Reachability property holds (witnessed in epoch {}).", epoch);
            Ok(ExitCode::SUCCESS)
        }
        SearchOutcome::Exhausted { epoch_limit, .. } => {
            println!(
                "Target not reached within {} sampled executions; this does not prove it unreachable.",
                epoch_limit
            );
            Ok(ExitCode::from(2))
        }
    }
}
