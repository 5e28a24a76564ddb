// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keepsake - a memory-augmented personal question-answering assistant.
//!
//! This is the binary entry point. The actual pipeline lives in
//! `keepsake-agent`.

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use keepsake_agent::Orchestrator;
use keepsake_config::KeepsakeConfig;
use keepsake_repo::RepoSync;

/// Keepsake - a memory-augmented personal question-answering assistant.
#[derive(Parser, Debug)]
#[command(name = "keepsake", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask the assistant a question.
    Ask {
        /// The question to answer.
        question: String,
        /// Identifier of the person asking.
        #[arg(long, default_value = "default")]
        user: String,
    },
    /// Clone or update the memory repository.
    Sync {
        /// Delete the working copy and re-clone.
        #[arg(long)]
        force: bool,
    },
    /// Print the resolved configuration.
    Config,
}

fn init_tracing(config: &KeepsakeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.agent.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match keepsake_config::load_and_validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("keepsake: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    match cli.command {
        Some(Commands::Ask { question, user }) => {
            let orchestrator = match Orchestrator::from_config(&config).await {
                Ok(orchestrator) => orchestrator,
                Err(e) => {
                    error!(error = %e, "failed to initialize pipeline");
                    eprintln!("keepsake: {e}");
                    std::process::exit(1);
                }
            };
            let time = Utc::now().to_rfc3339();
            match orchestrator.process_question(&question, &user, &time).await {
                Ok(reply) => {
                    println!("{}", reply.answer);
                    eprintln!(
                        "keepsake: {} memories used, search {}",
                        reply.memories_used,
                        if reply.search_used { "used" } else { "not used" }
                    );
                }
                Err(e) => {
                    error!(error = %e, "question processing failed");
                    eprintln!("keepsake: {e}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Sync { force }) => {
            let Some(url) = &config.memory.repo_url else {
                eprintln!("keepsake: no [memory].repo_url configured");
                std::process::exit(1);
            };
            let sync = RepoSync::new(
                url,
                &config.memory.repo_path,
                config.memory.repo_token.as_deref(),
            );
            if let Err(e) = sync.clone_or_update(force) {
                eprintln!("keepsake: {e}");
                std::process::exit(1);
            }
            println!(
                "keepsake: memory repository synced to {}",
                config.memory.repo_path
            );
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                eprintln!("keepsake: failed to render config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("keepsake: use --help for available commands");
        }
    }
}
