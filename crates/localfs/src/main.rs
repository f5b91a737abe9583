//! Run the filesystem tools from the command line.
//!
//! Roots come from `--root` (repeatable) or the `LOCALFS_ROOTS` environment
//! variable. Logs go to stderr, filtered by `LOCALFS_LOG` (default `info`).
//!
//! # Examples
//!
//! ```sh
//! # Print every tool definition as JSON
//! localfs --root ~/Documents tools
//!
//! # Index, then run one query
//! localfs --root ~/Documents call find_by_extension '{"ext": "pdf"}' --refresh
//!
//! # Drive a session from stdin, one `name {json}` request per line
//! printf 'build_file_index\ntop_extensions {"n": 3}\n' | localfs --root ~/Documents session
//! ```

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use localfs::tools::names;
use localfs::{FsConfig, ToolSet};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Root-confined file index and filesystem tools for LLM agents.
#[derive(Parser)]
#[command(name = "localfs", version)]
struct Cli {
    /// Directory the tools may access (repeatable). Overrides LOCALFS_ROOTS.
    #[arg(long = "root", value_name = "DIR", global = true)]
    roots: Vec<PathBuf>,

    /// Per-call timeout in seconds (0 disables it).
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Register mutation tools as disabled.
    #[arg(long, global = true)]
    read_only: bool,

    /// Truncate tool results beyond this many bytes.
    #[arg(long, global = true)]
    max_result_bytes: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every tool definition as JSON.
    Tools,
    /// Run one tool and print its result.
    Call {
        /// Tool name, e.g. `search_file_by_name`.
        name: String,
        /// JSON arguments.
        #[arg(default_value = "{}")]
        arguments: String,
        /// Build the index before the call.
        #[arg(long)]
        refresh: bool,
    },
    /// Read `name {json}` requests from stdin and print one result per line.
    Session,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("LOCALFS_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<FsConfig, String> {
    let mut config = FsConfig::from_env().map_err(|e| e.to_string())?;
    if !cli.roots.is_empty() {
        config.roots = cli.roots.clone();
    }
    if cli.read_only {
        config.read_only = true;
    }
    if let Some(secs) = cli.timeout_secs {
        config.tool_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if let Some(max) = cli.max_result_bytes {
        config.max_result_bytes = max;
    }
    if config.roots.is_empty() {
        return Err("no roots configured: pass --root DIR or set LOCALFS_ROOTS".into());
    }
    Ok(config)
}

/// Split a session line into a tool name and its (possibly empty) arguments.
fn split_request(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(match line.split_once(char::is_whitespace) {
        Some((name, arguments)) => (name, arguments.trim()),
        None => (line, ""),
    })
}

async fn run_session(tools: &ToolSet) -> Result<(), String> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut served = 0usize;
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| format!("failed to read stdin: {e}"))?
    {
        let Some((name, arguments)) = split_request(&line) else {
            continue;
        };
        println!("{}", tools.execute(name, arguments).await);
        served += 1;
    }
    debug!("Session ended after {served} request(s)");
    Ok(())
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = load_config(&cli)?;
    let session = config.build_session().map_err(|e| e.to_string())?;
    let tools = config.build_tool_set(&session);
    info!(
        "{} tool(s) over {} root(s){}",
        tools.len(),
        session.roots().len(),
        if config.read_only { ", read-only" } else { "" }
    );

    match cli.command {
        Command::Tools => {
            let json = serde_json::to_string_pretty(&tools.definitions())
                .map_err(|e| format!("failed to serialize tool definitions: {e}"))?;
            println!("{json}");
        }
        Command::Call {
            name,
            arguments,
            refresh,
        } => {
            if refresh {
                let report = tools.execute(names::BUILD_FILE_INDEX, "{}").await;
                if report.starts_with("Error") {
                    return Err(report);
                }
                info!("Index built: {report}");
            }
            let result = tools.execute(&name, &arguments).await;
            println!("{result}");
            if result.starts_with("Error") {
                process::exit(2);
            }
        }
        Command::Session => run_session(&tools).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
