use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use intent_explain::config::settings_io::load_settings;
use intent_explain::{explain_log_file, LlmClient};

/// Explains what the system did in response to each intent in a log
#[derive(Parser)]
#[command(name = "intent-explain")]
#[command(version)]
struct Cli {
    /// Log file to explain
    #[arg(required_unless_present = "check")]
    log: Option<PathBuf>,

    /// Where to write the report (stdout when omitted)
    output: Option<PathBuf>,

    /// Settings file path
    #[arg(short, long, env = "INTENT_EXPLAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Emit the report as JSON instead of HTML
    #[arg(long)]
    json: bool,

    /// Only check that the generation backend is reachable
    #[arg(long)]
    check: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = load_settings(cli.config.as_deref()).context("loading settings")?;
    let client = LlmClient::from_settings(&settings).context("initializing generation backend")?;

    if cli.check {
        let status = client
            .check_connection()
            .context("checking generation backend")?;
        info!(%status, "generation backend reachable");
        println!("{status}");
        return Ok(());
    }

    let Some(log) = cli.log else {
        anyhow::bail!("a log file is required");
    };

    let explanation = explain_log_file(&settings, &log, &client)
        .with_context(|| format!("explaining {}", log.display()))?;

    let document = if cli.json {
        serde_json::to_string_pretty(&explanation.report)?
    } else {
        explanation.html
    };

    match cli.output {
        Some(path) => fs::write(&path, document)
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => println!("{document}"),
    }

    Ok(())
}
