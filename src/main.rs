use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod context;
mod credentials;
mod ingest;
mod llm;
mod render;

use commands::ask::AskOptions;
use ingest::UnsupportedPolicy;
use llm::ProviderKind;

/// ASCII art banner for the application
const BANNER: &str = r#"
      _
   __| | ___   ___ __ _  __ _
  / _` |/ _ \ / __/ _` |/ _` |
 | (_| | (_) | (_| (_| | (_| |
  \__,_|\___/ \___\__, |\__,_|
                     |_|
"#;

/// Print the application banner
fn print_banner() {
    println!("{}", BANNER.cyan().bold());
}

/// Print a styled status line
fn print_status(label: &str, value: &str, icon: &str) {
    println!(
        "  {} {} {}",
        icon,
        format!("{}:", label).dimmed(),
        value.cyan()
    );
}

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask an LLM questions about your documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question, optionally with documents as context
    Ask {
        /// The question (prompts interactively if omitted)
        question: Option<String>,
        /// Document to use as context (.txt, .pdf, .docx, .html, .htm); repeatable
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,
        /// Model identifier, e.g. meta-llama/llama-3.1-8b-instruct
        #[arg(short, long)]
        model: Option<String>,
        /// Provider to send the question to
        #[arg(short, long, value_enum)]
        provider: Option<ProviderKind>,
        /// How to treat files with an unknown extension
        #[arg(long, value_enum)]
        unsupported: Option<UnsupportedPolicy>,
    },
    /// List the models offered for a provider
    Models {
        /// Provider to list (defaults to the configured one)
        #[arg(short, long, value_enum)]
        provider: Option<ProviderKind>,
    },
    /// Configure settings (provider, API keys, model)
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Logs go to stderr so they never mix with the rendered answer
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Ask {
            question,
            files,
            model,
            provider,
            unsupported,
        }) => {
            commands::ask::run(AskOptions {
                question,
                files,
                model,
                provider,
                unsupported,
            })
            .await?;
        }
        Some(Commands::Models { provider }) => {
            commands::models::list(provider).await?;
        }
        Some(Commands::Config) => {
            commands::config::run().await?;
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
        None => {
            // No subcommand - show interactive menu
            run_interactive().await?;
        }
    }

    Ok(())
}

async fn run_interactive() -> Result<()> {
    use inquire::Select;

    print_banner();

    println!(
        "  {} {}\n",
        "Version:".dimmed(),
        env!("CARGO_PKG_VERSION").cyan()
    );

    println!("{}", "─".repeat(50).dimmed());

    let config = config::Config::load().unwrap_or_default();

    print_status("Provider", &config.provider.to_string(), "🌐");
    print_status("Model", &config.model(), "🤖");

    let api_status = if config.has_api_key() {
        "Configured".green().to_string()
    } else {
        "Not set (run 'config')".red().to_string()
    };
    print_status("API Key", &api_status, "🔑");

    println!("{}\n", "─".repeat(50).dimmed());

    let options = vec![
        "💬  Ask a question about documents",
        "🤖  List models",
        "⚙️   Configure settings",
        "🚪  Exit",
    ];

    let selection = Select::new("What would you like to do?", options)
        .with_help_message("Use arrow keys to navigate, Enter to select")
        .prompt()?;

    println!();

    match selection {
        s if s.contains("Ask a question") => commands::ask::run(AskOptions::default()).await?,
        s if s.contains("List models") => commands::models::list(None).await?,
        s if s.contains("Configure") => commands::config::run().await?,
        s if s.contains("Exit") => {
            println!("{}", "👋 Bye!".cyan());
        }
        _ => unreachable!(),
    }

    Ok(())
}
