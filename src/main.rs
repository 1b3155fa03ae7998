//! # News Dashboard CLI (`newsdash`)
//!
//! ## Usage
//!
//! ```bash
//! newsdash --config ./config/newsdash.toml <command>
//! newsdash --base-url http://localhost:8000 <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `newsdash groups` | List groups and their document counts |
//! | `newsdash summarize` | Print the summary for one group (or the unscoped one) |
//! | `newsdash interactive` | Explore groups and summaries from a prompt |

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use news_dashboard::backend::HttpBackend;
use news_dashboard::config::{self, Config, ViewConfig};
use news_dashboard::excerpt::excerpt;
use news_dashboard::models::GroupField;
use news_dashboard::orchestrator::Orchestrator;
use news_dashboard::repl;
use news_dashboard::state::Applied;
use news_dashboard::view::{view_model, EMPTY_SUMMARY_TEXT};

/// News Dashboard: group news documents and read generated summaries.
#[derive(Parser)]
#[command(name = "newsdash", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/newsdash.toml")]
    config: PathBuf,

    /// Backend origin; overrides `[api].base_url` and makes the config
    /// file optional.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` wins when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List groups for a field with their document counts.
    Groups {
        /// `source`, `publishedAt`, or `unknown`. Defaults to `[view].default_group_field`.
        #[arg(long)]
        field: Option<GroupField>,
    },

    /// Print a generated summary.
    ///
    /// With both `--field` and `--value` the summary is scoped to that
    /// group; otherwise the backend's unscoped summary is printed.
    Summarize {
        #[arg(long)]
        field: Option<GroupField>,

        #[arg(long)]
        value: Option<String>,

        /// Print full text instead of excerpts.
        #[arg(long)]
        full: bool,
    },

    /// Interactive prompt (type `help` for commands).
    Interactive,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    match &cli.base_url {
        Some(url) => {
            let mut cfg = if cli.config.exists() {
                config::load_config(&cli.config)?
            } else {
                Config::minimal(url)
            };
            cfg.api.base_url = url.trim().trim_end_matches('/').to_string();
            cfg.validate()?;
            Ok(cfg)
        }
        None => config::load_config(&cli.config),
    }
}

fn one_shot(cfg: &Config) -> Result<Orchestrator> {
    let backend = Arc::new(HttpBackend::new(&cfg.api)?);
    let view = ViewConfig {
        require_search: false,
        ..cfg.view.clone()
    };
    Ok(Orchestrator::new(backend, &view))
}

async fn run_groups(cfg: &Config, field: Option<GroupField>) -> Result<()> {
    let field = field.unwrap_or(cfg.view.default_group_field);
    let orch = one_shot(cfg)?;

    if let Applied::Failed(kind) = orch.fetch_groups(field).await {
        bail!("failed to fetch groups for '{}': {}", field, kind);
    }

    let model = view_model(&orch.snapshot().await);
    let lines = model.groups.unwrap_or_default();
    println!("Groups by {} ({})", field.label(), lines.len());
    for line in lines {
        println!("  {}", line.label());
    }
    Ok(())
}

async fn run_summarize(
    cfg: &Config,
    field: Option<GroupField>,
    value: Option<String>,
    full: bool,
) -> Result<()> {
    let orch = one_shot(cfg)?;

    if let Applied::Failed(kind) = orch.fetch_summary(field, value.as_deref()).await {
        bail!("failed to fetch summary: {}", kind);
    }

    let state = orch.snapshot().await;
    match (field, value.as_deref(), state.summary_count()) {
        (Some(f), Some(v), Some(n)) if !v.is_empty() => {
            println!("Summary for {} = {} ({} matching documents)", f, v, n)
        }
        (Some(f), Some(v), None) if !v.is_empty() => println!("Summary for {} = {}", f, v),
        (_, _, Some(n)) => println!("Summary ({} documents)", n),
        _ => println!("Summary"),
    }

    let summary = state.summary().filter(|s| !s.is_empty());
    let Some(summary) = summary else {
        println!("{}", EMPTY_SUMMARY_TEXT);
        return Ok(());
    };
    for (i, item) in summary.iter().enumerate() {
        let text = if full {
            item.text.clone()
        } else {
            excerpt(Some(&item.text))
        };
        println!("{:>3}. {}", i + 1, text);
    }
    Ok(())
}

async fn run_interactive(cfg: &Config) -> Result<()> {
    let backend = Arc::new(HttpBackend::new(&cfg.api)?);
    let orch = Orchestrator::new(backend, &cfg.view);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut out = BufWriter::new(std::io::stdout());
    repl::run(orch, stdin, &mut out).await?;
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = resolve_config(&cli)?;

    match cli.command {
        Commands::Groups { field } => run_groups(&cfg, field).await?,
        Commands::Summarize { field, value, full } => {
            run_summarize(&cfg, field, value, full).await?
        }
        Commands::Interactive => run_interactive(&cfg).await?,
    }

    Ok(())
}
