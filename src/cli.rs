//! Command-line surface of `xaw`.

use crate::config::CliOverrides;
use clap::{Arg, ArgAction, ArgMatches, Command, crate_version, value_parser};
use std::path::PathBuf;

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// What the user asked `xaw` to do.
#[derive(Debug, Clone)]
pub enum Invocation {
    /// Translate the query words, then print or execute.
    Translate {
        words: Vec<String>,
        overrides: CliOverrides,
    },
    /// No query and no subcommand.
    Help,
    History {
        limit: Option<usize>,
    },
    Repeat {
        index: usize,
        overrides: CliOverrides,
    },
    ClearHistory {
        yes: bool,
    },
    ClearCache {
        yes: bool,
    },
    CacheStats,
    ShowConfig {
        overrides: CliOverrides,
    },
}

fn execute_arg() -> Arg {
    Arg::new("execute")
        .short('e')
        .long("execute")
        .help("Execute the translated command instead of just printing it")
        .action(ArgAction::SetTrue)
}

fn no_confirm_arg() -> Arg {
    Arg::new("no-confirm")
        .short('y')
        .long("no-confirm")
        .help("Skip confirmation for dangerous commands (use with caution)")
        .action(ArgAction::SetTrue)
}

fn yes_arg() -> Arg {
    Arg::new("yes")
        .long("yes")
        .help("Do not ask for confirmation")
        .action(ArgAction::SetTrue)
}

pub fn build_cli() -> Command {
    Command::new("xaw")
        .version(crate_version!())
        .about("Translate natural language queries to shell commands")
        .long_about(
            "Translate natural language queries to shell commands.\n\n\
             Examples:\n  xaw show me big files\n  xaw \"git push new branch\"\n  xaw --execute list files in current directory\n\n\
             Options may appear anywhere among the query words. Put the query after `--`\n\
             when it contains words starting with a dash:\n  xaw -- find files with -name",
        )
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::new("query")
                .help("Natural language query describing the desired command")
                .num_args(1..)
                .action(ArgAction::Append),
        )
        .arg(execute_arg())
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .value_name("URL")
                .help("API URL (overrides XAW_API_URL and the config file)"),
        )
        .arg(
            Arg::new("provider")
                .long("provider")
                .value_name("NAME")
                .help("Provider name, e.g. openai or gemini (overrides XAW_PROVIDER and the config file)"),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .value_name("KEY")
                .help("API key for a custom provider (overrides XAW_API_KEY and the config file)"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("MODEL")
                .help("Model override, e.g. gpt-4 (overrides XAW_MODEL and the config file)"),
        )
        .arg(no_confirm_arg())
        .arg(
            Arg::new("copy")
                .short('c')
                .long("copy")
                .help("Copy the translated command to the clipboard")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-cache")
                .long("no-cache")
                .help("Bypass the response cache for this request")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Read configuration from PATH instead of the default location")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("show-config")
                .long("show-config")
                .help("Show the effective configuration and exit")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("history")
                .about("Show command history")
                .arg(
                    Arg::new("limit")
                        .short('n')
                        .long("limit")
                        .value_name("N")
                        .help("Number of history entries to show")
                        .value_parser(value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    Arg::new("all")
                        .short('a')
                        .long("all")
                        .help("Show all history entries")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("repeat")
                .about("Repeat a command from history by index (0 is the most recent)")
                .arg(
                    Arg::new("index")
                        .required(true)
                        .value_parser(value_parser!(usize)),
                )
                .arg(execute_arg())
                .arg(no_confirm_arg()),
        )
        .subcommand(
            Command::new("clear-history")
                .about("Clear all command history")
                .arg(yes_arg()),
        )
        .subcommand(
            Command::new("clear-cache")
                .about("Clear all cached API responses")
                .arg(yes_arg()),
        )
        .subcommand(Command::new("cache-stats").about("Show cache statistics"))
}

fn string_arg(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}

fn config_path(matches: &ArgMatches) -> Option<PathBuf> {
    matches.get_one::<PathBuf>("config").cloned()
}

impl Invocation {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        match matches.subcommand() {
            Some(("history", sub)) => Self::History {
                limit: if sub.get_flag("all") {
                    None
                } else {
                    Some(sub.get_one::<usize>("limit").copied().unwrap_or(DEFAULT_HISTORY_LIMIT))
                },
            },
            Some(("repeat", sub)) => Self::Repeat {
                index: sub.get_one::<usize>("index").copied().unwrap_or_default(),
                overrides: CliOverrides {
                    execute: sub.get_flag("execute"),
                    skip_confirm: sub.get_flag("no-confirm"),
                    config_path: config_path(sub).or_else(|| config_path(matches)),
                    ..Default::default()
                },
            },
            Some(("clear-history", sub)) => Self::ClearHistory {
                yes: sub.get_flag("yes"),
            },
            Some(("clear-cache", sub)) => Self::ClearCache {
                yes: sub.get_flag("yes"),
            },
            Some(("cache-stats", _)) => Self::CacheStats,
            _ if matches.get_flag("show-config") => Self::ShowConfig {
                overrides: Self::overrides(matches),
            },
            _ => {
                let words: Vec<String> = matches
                    .get_many::<String>("query")
                    .unwrap_or_default()
                    .cloned()
                    .collect();
                if words.is_empty() {
                    return Self::Help;
                }
                Self::Translate {
                    words,
                    overrides: Self::overrides(matches),
                }
            }
        }
    }

    fn overrides(matches: &ArgMatches) -> CliOverrides {
        CliOverrides {
            api_url: string_arg(matches, "api-url"),
            provider: string_arg(matches, "provider"),
            api_key: string_arg(matches, "api-key"),
            model: string_arg(matches, "model"),
            execute: matches.get_flag("execute"),
            skip_confirm: matches.get_flag("no-confirm"),
            no_cache: matches.get_flag("no-cache"),
            copy: matches.get_flag("copy"),
            config_path: config_path(matches),
        }
    }
}
