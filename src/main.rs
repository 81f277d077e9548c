//! deep-research - run a Gemini Deep Research task from the command line.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use deep_research::{
    Config, GeminiClient, PollOptions, Poller, ResearchError, SystemClock, TokioSleeper,
};

const DEFAULT_QUERY: &str =
    "What are the latest developments in AI agents and autonomous systems in 2025?";

/// Run a deep research task using Gemini's Deep Research API
#[derive(Parser)]
#[command(name = "deep-research", version)]
struct Args {
    /// The research query or topic
    #[arg(default_value = DEFAULT_QUERY)]
    query: String,

    /// Agent to run (overrides DEEP_RESEARCH_AGENT)
    #[arg(long)]
    agent: Option<String>,

    /// API base URL (overrides GEMINI_API_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Seconds between status checks
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,

    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("deep_research=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let client = match args.base_url.as_deref().or(config.base_url.as_deref()) {
        Some(url) => GeminiClient::new_with_url(&config.credential, url)?,
        None => GeminiClient::new(&config.credential)?,
    };

    let mut spec = config.task_spec(args.query);
    if let Some(agent) = args.agent {
        spec = spec.with_agent(agent);
    }

    let options = PollOptions {
        poll_interval: Duration::from_secs(args.poll_interval),
        timeout: args.timeout.map(Duration::from_secs),
        ..PollOptions::default()
    };

    let cancel = options.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, abandoning the research task");
            cancel.cancel();
        }
    });

    println!("\nStarting deep research on: {}", spec.input);
    println!("{}", "-".repeat(50));

    let poller = Poller::with_options(client, options);
    match poller.run(&spec, &SystemClock, &TokioSleeper).await {
        Ok(completion) => {
            println!("\nResearch completed in {} seconds!", completion.elapsed.as_secs());
            println!("\n{}", "=".repeat(50));
            println!("RESEARCH RESULTS");
            println!("{}\n", "=".repeat(50));
            println!("{}", completion.text);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("\n{}: {}", failure_layer(&e), e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Names the layer an operator should look at.
fn failure_layer(error: &ResearchError) -> &'static str {
    match error {
        ResearchError::SubmissionFailed(_) | ResearchError::PollingFailed { .. } => {
            "Transport error"
        }
        ResearchError::RemoteTaskFailed { .. } | ResearchError::EmptyOutput { .. } => {
            "Remote task error"
        }
        ResearchError::Timeout { .. } | ResearchError::Cancelled { .. } => "Aborted",
    }
}
