// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - reply suggestions for inbound chat messages.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod dedup;
mod serve;
mod services;
mod shutdown;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};
use parley_config::{ConfigError, ParleyConfig};
use parley_core::types::{ChatType, Feedback};
use tracing::error;

/// Parley - reply suggestions for inbound chat messages.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read JSONL ingest events from stdin and print generated responses.
    Serve,
    /// Generate suggestions for one message.
    Suggest(SuggestArgs),
    /// Print a user's analytics summary as JSON.
    Analytics {
        #[arg(long)]
        user: String,
        /// Inclusive lower bound, RFC 3339.
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Exclusive upper bound, RFC 3339.
        #[arg(long)]
        until: Option<DateTime<Utc>>,
    },
    /// Attach caller feedback to a recorded generation.
    #[command(group(
        ArgGroup::new("update")
            .required(true)
            .multiple(true)
            .args(["selected", "feedback", "custom"])
    ))]
    Feedback {
        #[arg(long)]
        request: String,
        #[arg(long)]
        user: String,
        /// Index of the suggestion the user picked.
        #[arg(long)]
        selected: Option<u32>,
        /// positive, negative or neutral.
        #[arg(long)]
        feedback: Option<Feedback>,
        /// Text the user sent instead of a suggestion.
        #[arg(long)]
        custom: Option<String>,
    },
    /// Manage Parley configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug)]
struct SuggestArgs {
    #[arg(long)]
    user: String,
    #[arg(long, default_value = "individual")]
    chat_type: ChatType,
    /// Request id to record under. Defaults to a fresh UUID.
    #[arg(long)]
    request: Option<String>,
    /// Echo tokens to stderr as they arrive.
    #[arg(long)]
    stream: bool,
    /// Message text to answer.
    text: String,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate configuration and report every problem found.
    Check,
}

fn load_config(path: Option<&Path>) -> Result<ParleyConfig, Vec<ConfigError>> {
    match path {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Suggest(args) => {
            commands::suggest(
                &config,
                &args.user,
                args.chat_type,
                args.request,
                args.stream,
                &args.text,
            )
            .await
        }
        Commands::Analytics { user, since, until } => {
            commands::analytics(&config, &user, since, until).await
        }
        Commands::Feedback {
            request,
            user,
            selected,
            feedback,
            custom,
        } => commands::feedback(&config, &request, &user, selected, feedback, custom).await,
        Commands::Config {
            action: ConfigAction::Check,
        } => {
            commands::config_check(&config);
            Ok(())
        }
    };

    let code = match result {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("parley: {e}");
            1
        }
    };
    // A pending blocking stdin read would otherwise keep the runtime alive.
    std::process::exit(code);
}

/// Logs go to stderr so stdout carries only JSON output. `RUST_LOG` wins.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn suggest_parses_chat_type_and_text() {
        let cli = Cli::try_parse_from([
            "parley",
            "suggest",
            "--user",
            "u-1",
            "--chat-type",
            "group",
            "--stream",
            "are we still on?",
        ])
        .unwrap();
        let Commands::Suggest(args) = cli.command else {
            panic!("expected suggest");
        };
        assert_eq!(args.chat_type, ChatType::Group);
        assert!(args.stream);
        assert_eq!(args.text, "are we still on?");
        assert_eq!(args.request, None);
    }

    #[test]
    fn unknown_chat_type_is_rejected() {
        let parsed = Cli::try_parse_from([
            "parley",
            "suggest",
            "--user",
            "u-1",
            "--chat-type",
            "channel",
            "hi",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn feedback_and_analytics_arguments() {
        let cli = Cli::try_parse_from([
            "parley",
            "feedback",
            "--request",
            "r-1",
            "--user",
            "u-1",
            "--selected",
            "2",
            "--feedback",
            "positive",
        ])
        .unwrap();
        let Commands::Feedback {
            selected, feedback, custom, ..
        } = cli.command
        else {
            panic!("expected feedback");
        };
        assert_eq!(selected, Some(2));
        assert_eq!(feedback, Some(Feedback::Positive));
        assert_eq!(custom, None);

        let cli = Cli::try_parse_from([
            "parley",
            "analytics",
            "--user",
            "u-1",
            "--since",
            "2026-01-01T00:00:00Z",
        ])
        .unwrap();
        let Commands::Analytics { since, until, .. } = cli.command else {
            panic!("expected analytics");
        };
        assert_eq!(since.map(|s| s.to_rfc3339()).as_deref(), Some("2026-01-01T00:00:00+00:00"));
        assert_eq!(until, None);
    }

    #[test]
    fn feedback_needs_at_least_one_field() {
        let parsed = Cli::try_parse_from(["parley", "feedback", "--request", "r-1", "--user", "u-1"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn config_path_is_global() {
        let cli = Cli::try_parse_from(["parley", "config", "check", "--config", "/tmp/p.toml"])
            .unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/p.toml")));
    }

    #[test]
    fn default_config_is_valid() {
        let config = parley_config::load_and_validate_str("").expect("defaults should validate");
        assert_eq!(config.generator.suggestion_count, 3);
    }
}
