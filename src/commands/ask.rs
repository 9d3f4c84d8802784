use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Select, Text};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::context::{UploadedFile, build_context};
use crate::ingest::{ContentType, UnsupportedPolicy};
use crate::llm::{Asker, ProviderKind};
use crate::render;

/// Options collected from the command line
#[derive(Debug, Default)]
pub struct AskOptions {
    pub question: Option<String>,
    pub files: Vec<PathBuf>,
    pub model: Option<String>,
    pub provider: Option<ProviderKind>,
    pub unsupported: Option<UnsupportedPolicy>,
}

pub async fn run(options: AskOptions) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(provider) = options.provider {
        config.provider = provider;
        // A model saved for another provider would not exist here
        if options.model.is_none() {
            config.default_model = None;
        }
    }

    if let Some(policy) = options.unsupported {
        config.unsupported_files = policy;
    }

    let interactive = options.question.is_none();

    let question = match options.question {
        Some(q) => q,
        None => prompt_for_question()?,
    };

    if question.trim().is_empty() {
        println!(
            "{} Please enter a question before asking.",
            "Warning:".yellow().bold()
        );
        return Ok(());
    }

    let paths = if interactive && options.files.is_empty() {
        prompt_for_files()?
    } else {
        options.files
    };

    let model = match options.model {
        Some(m) => m,
        None if interactive => prompt_for_model(&config)?,
        None => config.model(),
    };

    let files = read_files(&paths).await?;
    print_attachments(&files);

    let asker = Asker::new(
        config.provider.adapter(config.endpoint.as_deref()),
        config.credential_sources()?,
        config.timeout(),
    )?;
    let provider_name = asker.provider().name().to_string();

    let spinner = create_spinner(&format!(
        "Reading documents and contacting {}...",
        provider_name
    ));

    let context = build_context(&files, &config.context_options());
    let result = if interactive {
        asker.try_ask(&model, &question, &context).await
    } else {
        // Questions from the command line get the plain answer-or-error string
        Ok(asker.ask(&model, &question, &context).await)
    };

    spinner.finish_and_clear();

    println!("{}", "─".repeat(50).dimmed());
    println!("{} {}", "Question:".bold(), question);
    println!("{} {}", "Model:".bold(), model.yellow());
    println!("{}", "─".repeat(50).dimmed());

    match result {
        Ok(answer) => {
            println!("{}\n", "Answer".bold().green());
            render::render_markdown(&answer);
        }
        Err(e) => {
            eprintln!("{}", e.render(&provider_name).red());
        }
    }

    Ok(())
}

fn prompt_for_question() -> Result<String> {
    let question = Text::new("Your question:")
        .with_help_message("Ask anything about the documents you attach")
        .prompt()?;
    Ok(question)
}

fn prompt_for_files() -> Result<Vec<PathBuf>> {
    let input = Text::new("Attach files:")
        .with_help_message("Comma separated .txt, .pdf, .docx, .html paths (leave blank for none)")
        .prompt()?;

    Ok(parse_file_list(&input))
}

fn prompt_for_model(config: &Config) -> Result<String> {
    let default = config.model();
    let mut options: Vec<String> = config
        .provider
        .models()
        .iter()
        .map(|(id, desc)| format!("{} - {}", id, desc))
        .collect();

    // Keep a custom saved model selectable
    if !config.provider.models().iter().any(|(id, _)| *id == default) {
        options.insert(0, format!("{} - saved default", default));
    }

    let start = options
        .iter()
        .position(|o| o.starts_with(&format!("{} - ", default)))
        .unwrap_or(0);

    let selection = Select::new("Model:", options)
        .with_starting_cursor(start)
        .prompt()?;

    Ok(selection
        .split(" - ")
        .next()
        .unwrap_or(default.as_str())
        .to_string())
}

/// Split a comma separated list of paths, ignoring blanks
fn parse_file_list(input: &str) -> Vec<PathBuf> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Read every file fully into memory, keeping the order given
async fn read_files(paths: &[PathBuf]) -> Result<Vec<UploadedFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {:?}", path))?;
        files.push(UploadedFile::new(file_name(path), bytes));
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_attachments(files: &[UploadedFile]) {
    if files.is_empty() {
        return;
    }

    println!("{}", "Files selected:".dimmed());
    for file in files {
        let note = if ContentType::from_name(&file.name).is_supported() {
            String::new()
        } else {
            " (unsupported type)".yellow().to_string()
        };
        println!("  - {}{}", file.name.cyan(), note);
    }
}

/// Create a spinner for indeterminate progress
fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
