//! CLI binary for scout.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use scout::{ResearchSession, ScoutConfig};
use scout_search::config::split_names;
use scout_search::{RateLimiter, RequestHeaders, ScrapedDocument, SearchResult};
use tracing::{info, warn};

/// Scout: concurrent multi-source research retrieval.
#[derive(Parser)]
#[command(name = "scout", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true, env = "SCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Retriever name or comma-separated list, overriding the config.
    #[arg(short, long, global = true)]
    retriever: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Search the configured backends and print the merged results.
    Search {
        /// Query text.
        query: String,
        /// Restrict results to these domains (repeatable).
        #[arg(long = "domain")]
        domains: Vec<String>,
    },

    /// Scrape pages and print their extracted text.
    Scrape {
        /// Page URLs.
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Research a query through sub-queries and print the gathered context.
    Research {
        /// Main research query.
        query: String,
        /// Sub-query to research (repeatable). Defaults to the main query.
        #[arg(short, long = "sub-query")]
        sub_queries: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ScoutConfig::load(cli.config.as_deref())?;
    if let Some(ref raw) = cli.retriever {
        config.retrieval.retrievers = split_names(raw);
    }
    let _log_guard = scout::logging::init(&config.logging)?;

    let limiter = Arc::new(RateLimiter::new());
    let session = ResearchSession::new(&config, limiter)?;

    let cancel = session.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, stopping scrapes...");
            cancel.cancel();
        }
    });

    let outcome = run(&session, cli.command, cli.json).await;
    for (retriever, state, failures) in session.degraded_retrievers() {
        warn!(retriever = %retriever, ?state, failures, "retriever unhealthy");
    }
    outcome
}

async fn run(session: &ResearchSession, command: Command, json: bool) -> anyhow::Result<()> {
    match command {
        Command::Search { query, domains } => {
            let results = session
                .orchestrator()
                .search(&query, &RequestHeaders::new(), &domains)
                .await?;
            print_results(&results, json)
        }
        Command::Scrape { urls } => {
            let documents = session.scrape_urls(&urls).await;
            print_documents(&documents, json)
        }
        Command::Research { query, sub_queries } => {
            let report = session
                .conduct(&query, &sub_queries, &RequestHeaders::new())
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.combined_context());
                println!("\n{} sources visited", report.visited_urls.len());
            }
            Ok(())
        }
    }
}

fn print_results(results: &[SearchResult], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("No results.");
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{}. {}\n   {}",
            rank + 1,
            result.title.as_deref().unwrap_or("(untitled)"),
            result.href
        );
        if !result.body.is_empty() {
            println!("   {}", snippet(&result.body, 200));
        }
    }
    Ok(())
}

fn print_documents(documents: &[ScrapedDocument], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(documents)?);
        return Ok(());
    }
    for document in documents {
        match (&document.raw_content, document.success) {
            (Some(content), true) => {
                println!("== {} ({})", document.url, document.title);
                println!("{}\n", snippet(content, 2000));
            }
            _ => println!("== {} (failed)\n", document.url),
        }
    }
    Ok(())
}

/// At most `max_chars` characters of `text`, with an ellipsis when cut.
fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_owned(),
    }
}
