#![forbid(unsafe_code)]

//! `opsmith-master` — controller node.
//!
//! Sends command batches to a slave and prints the per-command results.
//! Batches come from the command line, a JSON file, or a language model.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use opsmith::client::send_batch;
use opsmith::llm::{extract_batch, load_openai_key, planning_prompt, LlmClient, Model};
use opsmith::models::{Batch, BatchResponse, Command as WireCommand, STATUS_OK};
use opsmith::telemetry::{init_tracing, LogFormat};
use opsmith::{AppError, GlobalConfig, Registry, Result};

#[derive(Debug, Parser)]
#[command(
    name = "opsmith-master",
    about = "Send command batches to an opsmith slave",
    version,
    long_about = None
)]
struct Cli {
    /// Slave address as `host:port`.
    #[arg(long, default_value = "127.0.0.1:7878")]
    slave: String,

    /// Path to the TOML configuration file (LLM settings, frame limit).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a single primitive on the slave.
    Exec {
        /// Primitive name, e.g. `ReadFile`.
        name: String,
        /// Positional arguments.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Send a batch JSON document read from a file (`-` for stdin).
    Send {
        /// Batch file path.
        file: String,
    },

    /// Ask a language model to plan a batch from plain text, then send it.
    Run {
        /// What you want done on the slave.
        message: String,
        /// Model to ask (defaults to `llm.default_model`).
        #[arg(long, value_enum)]
        model: Option<Model>,
        /// Print the planned batch without sending it.
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let args = Cli::parse();
    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }

    let outcome = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))
        .and_then(|runtime| runtime.block_on(run(args)));

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

/// Returns whether every command succeeded.
async fn run(args: Cli) -> Result<bool> {
    let mut config = match args.config {
        Some(ref path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };

    let batch = match args.command {
        Command::Exec { name, args } => Batch::new(vec![WireCommand::new(name, args)]),
        Command::Send { file } => read_batch(&file)?,
        Command::Run {
            message,
            model,
            dry_run,
        } => {
            config.llm.openai_api_key = load_openai_key().await?;
            let batch = plan_batch(&config, &message, model).await?;
            println!("{}", to_pretty(&batch)?);
            if dry_run {
                return Ok(true);
            }
            batch
        }
    };

    info!(slave = %args.slave, commands = batch.len(), "sending batch");
    let response = send_batch(&args.slave, &batch).await?;
    print_response(&batch, &response)?;
    Ok(response.status == STATUS_OK)
}

async fn plan_batch(config: &GlobalConfig, message: &str, model: Option<Model>) -> Result<Batch> {
    let client = LlmClient::new(config.llm.clone())?;
    let model = model.unwrap_or_else(|| client.default_model());

    // The prompt lists what a stock slave offers.
    let registry = Registry::builtin(&config.shell);
    let prompt = planning_prompt(message, &registry.names());

    let reply = client.generate(&prompt, model).await?;
    extract_batch(&reply)
}

fn read_batch(file: &str) -> Result<Batch> {
    let raw = if file == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .map_err(|err| AppError::Io(format!("failed to read stdin: {err}")))?;
        raw
    } else {
        std::fs::read_to_string(file)
            .map_err(|err| AppError::Io(format!("failed to read {file}: {err}")))?
    };
    Ok(serde_json::from_str(&raw)?)
}

fn print_response(batch: &Batch, response: &BatchResponse) -> Result<()> {
    for (command, result) in batch.commands.iter().zip(&response.results) {
        if result.is_ok() {
            println!("[ok]    {}", command.name);
        } else {
            println!("[error] {}: {}", command.name, result.error);
        }
    }
    println!("{}", to_pretty(response)?);
    Ok(())
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
