//! lw entry point.

use std::process::ExitCode;

use clap::Parser;
use lwkit_cache::TtlCache;
use lwkit_cli::cli::{joined, CacheCommand, Cli, Command};
use lwkit_cli::commands::{self, Services};
use lwkit_cli::error::CliResult;
use lwkit_cli::launcher::LauncherOutput;
use lwkit_cli::{save_arg, telemetry};
use lwkit_core::{cache_dir_from_lookup, CacheTtls, ClientConfig, CollectionId};
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    telemetry::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Search { query } => {
            let result = search(&joined(&query)).await;
            emit_launcher("Search Error", result)
        }
        Command::Collections { filter } => {
            let result = collections(&joined(&filter)).await;
            emit_launcher("Collections Error", result)
        }
        Command::Browse { collection_id } => {
            let result = browse(CollectionId(collection_id)).await;
            emit_launcher("Error loading collection", result)
        }
        Command::SaveFilter { input } => {
            emit_launcher("Save Link Error", commands::save_filter(&joined(&input)))
        }
        Command::Save { arg } => {
            let message = save(&arg).await.unwrap_or_else(|err| {
                error!(error = %err, "save failed");
                format!("Unexpected Error\nSave failed\n{err}")
            });
            println!("{message}");
            ExitCode::SUCCESS
        }
        Command::Cache { action } => match cache(action) {
            Ok(report) => {
                println!("{report}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!(error = %err, "cache command failed");
                eprintln!("Error: {err}");
                ExitCode::FAILURE
            }
        },
    }
}

/// Print launcher JSON. Failures become a single error item so the
/// launcher always has something to show.
fn emit_launcher(error_title: &str, result: CliResult<LauncherOutput>) -> ExitCode {
    let output = result.unwrap_or_else(|err| {
        error!(error = %err, "command failed");
        LauncherOutput::error(error_title, err)
    });
    match output.to_json() {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn services() -> CliResult<Services<lwkit_client::RemoteClient>> {
    Services::from_config(&ClientConfig::from_env()?)
}

async fn search(query: &str) -> CliResult<LauncherOutput> {
    Ok(services()?.search(query).await?)
}

async fn collections(filter: &str) -> CliResult<LauncherOutput> {
    Ok(services()?.collections(filter).await?)
}

async fn browse(collection_id: CollectionId) -> CliResult<LauncherOutput> {
    Ok(services()?.browse(collection_id).await?)
}

async fn save(arg: &str) -> CliResult<String> {
    let data = save_arg::decode(arg)?;
    Ok(services()?.save(&data).await)
}

fn cache(action: CacheCommand) -> CliResult<String> {
    let lookup = |key: &str| std::env::var(key).ok();
    let cache = TtlCache::open(cache_dir_from_lookup(lookup))?;
    Ok(match action {
        CacheCommand::Stats => commands::cache_stats(&cache, &CacheTtls::from_lookup(lookup)),
        CacheCommand::Info => commands::cache_info(&cache),
        CacheCommand::Clear => commands::cache_clear(&cache),
        CacheCommand::Cleanup => commands::cache_cleanup(&cache),
    })
}
