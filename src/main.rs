use clixaw::cli::{Invocation, build_cli};
use clixaw::config::{CacheSettings, EffectiveConfig, config_dir};
use clixaw::confirm::{Confirmation, ConfirmPrompt};
use clixaw::controller::Controller;
use clixaw::error::{XawError, exit_code};
use clixaw::history::{History, format_timestamp};
use clixaw::providers::ProcessEnv;
use clixaw::response_cache::ResponseCache;
use clixaw::translator::join_query;
use std::io;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout carries only the translated command.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let matches = build_cli().get_matches();
    let invocation = Invocation::from_matches(&matches);

    let code = match dispatch(invocation).await {
        Ok(code) => code,
        Err(e) => {
            report(&e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn dispatch(invocation: Invocation) -> Result<i32, XawError> {
    match invocation {
        Invocation::Help => {
            build_cli().print_help()?;
            println!();
            Ok(exit_code::SUCCESS)
        }
        Invocation::Translate { words, overrides } => {
            let query = join_query(&words);
            info!("Processing query: {:?}", query);

            let config = EffectiveConfig::load(&overrides, &ProcessEnv)?;
            let mut controller = Controller::system(config, &ProcessEnv)?;
            controller.run(&query).await
        }
        Invocation::Repeat { index, overrides } => {
            let config = EffectiveConfig::load(&overrides, &ProcessEnv)?;
            let mut controller = Controller::system(config, &ProcessEnv)?;
            controller.repeat(index)
        }
        Invocation::History { limit } => {
            history()?.write_listing(limit, &mut io::stdout()).map_err(storage_error)?;
            Ok(exit_code::SUCCESS)
        }
        Invocation::ClearHistory { yes } => {
            if !confirmed(yes, "Are you sure you want to clear all command history?") {
                eprintln!("Aborted.");
                return Err(XawError::UserCancelled);
            }
            history()?.clear().map_err(storage_error)?;
            println!("✓ Command history cleared");
            Ok(exit_code::SUCCESS)
        }
        Invocation::ClearCache { yes } => {
            if !confirmed(yes, "Are you sure you want to clear all cached API responses?") {
                eprintln!("Aborted.");
                return Err(XawError::UserCancelled);
            }
            cache()?.clear().map_err(storage_error)?;
            println!("✓ Cache cleared");
            Ok(exit_code::SUCCESS)
        }
        Invocation::CacheStats => {
            let stats = cache()?.stats();
            println!("Cache Statistics:");
            println!("  Size: {} entries", stats.size);
            if let Some(oldest) = stats.oldest_entry {
                println!("  Oldest entry: {}", format_timestamp(oldest));
            }
            if let Some(newest) = stats.newest_entry {
                println!("  Newest entry: {}", format_timestamp(newest));
            }
            if stats.size == 0 {
                println!("  Cache is empty");
            }
            Ok(exit_code::SUCCESS)
        }
        Invocation::ShowConfig { overrides } => {
            let config = EffectiveConfig::load(&overrides, &ProcessEnv)?;
            config.write_summary(&mut io::stdout())?;
            Ok(exit_code::SUCCESS)
        }
    }
}

fn report(error: &XawError) {
    match error {
        XawError::UserCancelled => {}
        XawError::Translate(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("{}", hint);
            }
        }
        other => eprintln!("Error: {}", other),
    }
}

fn storage_dir() -> Result<std::path::PathBuf, XawError> {
    config_dir(&ProcessEnv)
        .ok_or_else(|| XawError::History("Could not determine config directory".to_string()))
}

fn history() -> Result<History, XawError> {
    Ok(History::new(&storage_dir()?))
}

fn cache() -> Result<ResponseCache, XawError> {
    Ok(ResponseCache::open(&storage_dir()?, CacheSettings::default()))
}

fn storage_error(e: anyhow::Error) -> XawError {
    XawError::History(e.to_string())
}

fn confirmed(yes: bool, question: &str) -> bool {
    yes || matches!(ConfirmPrompt::new().ask(question), Ok(Confirmation::Proceed))
}
