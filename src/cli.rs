use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use crate::assistant::{Answer, AskError, Assistant, validate_query};
use crate::config::{self, Config};
use crate::diagnostics::DiagnosticLog;
use crate::history::InteractionStore;
use crate::prompt::EnvironmentSnapshot;
use crate::providers::{ChatCompletionsProvider, LlmProvider};

/// Width of the separator lines framing the answer
const RULE_WIDTH: usize = 80;
/// Printed in place of a section the model did not provide
const MISSING_PLACEHOLDER: &str = "(none)";

#[derive(Parser, Debug)]
#[command(name = "askcmd")]
#[command(about = "askcmd - turn plain language into shell commands")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(after_help = "Piped input is appended to the query:\n  ps aux | askcmd \"which process uses the most memory\"")]
pub struct Cli {
    /// What you want to do, in plain language. Read from stdin when omitted
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,

    /// Enable verbose output (DEBUG level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Model to use instead of the configured one
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Path to an alternative config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Interactively create or update the config file
    #[arg(long)]
    pub setup: bool,
}

/// Joins the arguments into a query, appending piped input when present
pub fn compose_query(args: &[String], piped: Option<&str>) -> String {
    let query = args.join(" ");
    match piped {
        Some(input) => format!("{} \n\nInput: {}", query, input.trim()),
        None => query,
    }
}

/// Normalizes text typed interactively: lines joined by `\n`, no trailing newline
pub fn normalize_interactive(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join("\n")
}

/// Reads the query from argv and stdin. `None` means nothing was entered.
fn read_query(args: &[String]) -> Result<Option<String>> {
    let stdin = io::stdin();

    if args.is_empty() {
        println!("Enter your query (press Ctrl+D when finished):");
        let mut text = String::new();
        stdin
            .lock()
            .read_to_string(&mut text)
            .context("Failed to read query from stdin")?;

        let query = normalize_interactive(&text);
        return Ok((!query.trim().is_empty()).then_some(query));
    }

    if stdin.is_terminal() {
        return Ok(Some(compose_query(args, None)));
    }

    let mut piped = String::new();
    stdin
        .lock()
        .read_to_string(&mut piped)
        .context("Failed to read piped input")?;
    Ok(Some(compose_query(args, Some(&piped))))
}

/// Formats the explanation and command blocks printed to stdout
pub fn format_answer(answer: &Answer) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let section = |field: &Option<String>| {
        field
            .clone()
            .unwrap_or_else(|| MISSING_PLACEHOLDER.to_string())
    };

    format!(
        "\n{heavy}\nEXPLANATION:\n{light}\n{}\n\n{heavy}\nCOMMAND:\n{light}\n{}\n{heavy}\n",
        section(&answer.explanation),
        section(&answer.command),
    )
}

/// Runs one invocation and returns the process exit code
pub async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.setup {
        let existing = config::load_config(None, cli.config.clone()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unreadable configuration during setup");
            Config::default()
        });
        config::run_setup(&existing, cli.config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(query) = read_query(&cli.query)? else {
        println!("No query provided. Exiting.");
        return Ok(ExitCode::FAILURE);
    };

    validate_query(&query)?;

    let config = config::load_config(cli.model, cli.config)?;
    let provider: Arc<dyn LlmProvider> = Arc::new(
        ChatCompletionsProvider::from_config(&config)
            .context("Failed to create the completion client")?,
    );

    let history_path = config
        .history_path()
        .context("Could not determine home directory for the history file")?;
    let mut assistant = Assistant::new(provider, InteractionStore::new(history_path))
        .with_max_tokens(config.max_tokens())
        .with_model(config.model());
    if let Some(log_path) = config.log_path() {
        assistant = assistant.with_log(DiagnosticLog::new(log_path));
    }

    println!("\nProcessing your query...");

    let environment = EnvironmentSnapshot::collect().await.render();

    match assistant.ask(&query, &environment).await {
        Ok(answer) => {
            print!("{}", format_answer(&answer));
            println!();
            Ok(ExitCode::SUCCESS)
        }
        Err(AskError::Provider(e)) => {
            eprintln!("Error: {}", e);
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::LlmResponse;

    #[test]
    fn test_version_string_format() {
        let version = env!("CARGO_PKG_VERSION");
        let parts: Vec<&str> = version.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.parse::<u32>().is_ok()));
    }

    #[test]
    fn test_parse_query_words_and_flags() {
        let cli = Cli::try_parse_from(["askcmd", "-v", "--model", "m", "find", "big", "files"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.model.as_deref(), Some("m"));
        assert_eq!(cli.query, vec!["find", "big", "files"]);
        assert!(!cli.setup);
    }

    #[test]
    fn test_parse_no_arguments() {
        let cli = Cli::try_parse_from(["askcmd"]).unwrap();
        assert!(cli.query.is_empty());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_compose_query() {
        let args = vec!["explain".to_string(), "this".to_string()];
        assert_eq!(compose_query(&args, None), "explain this");
        assert_eq!(
            compose_query(&args, Some("  pid 1 init\n")),
            "explain this \n\nInput: pid 1 init"
        );
    }

    #[test]
    fn test_normalize_interactive() {
        assert_eq!(normalize_interactive("line one\nline two\n"), "line one\nline two");
        assert_eq!(normalize_interactive(""), "");
    }

    #[test]
    fn test_format_answer() {
        let answer = Answer {
            explanation: Some("Lists files".to_string()),
            command: Some("ls -la".to_string()),
            thinking: None,
            response: LlmResponse::new("raw"),
        };

        let out = format_answer(&answer);
        let heavy = "=".repeat(80);
        let light = "-".repeat(80);
        assert_eq!(
            out,
            format!("\n{heavy}\nEXPLANATION:\n{light}\nLists files\n\n{heavy}\nCOMMAND:\n{light}\nls -la\n{heavy}\n")
        );
    }

    #[test]
    fn test_format_answer_missing_sections() {
        let answer = Answer {
            explanation: None,
            command: None,
            thinking: Some("hidden".to_string()),
            response: LlmResponse::new("raw"),
        };

        let out = format_answer(&answer);
        assert_eq!(out.matches("(none)").count(), 2);
        assert!(!out.contains("hidden"));
    }
}
