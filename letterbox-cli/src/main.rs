//! Letterbox CLI
//!
//! Runs the delivery scheduler and manages its jobs from the command line.
//! Every command except `serve` prints its result as JSON on stdout.

mod commands;
mod error;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use error::CliResult;
use letterbox::config::Settings;
use letterbox_log::LogConfig;
use serde_json::Value;
use std::path::PathBuf;

/// Letterbox - scheduled, templated email delivery
#[derive(Parser)]
#[command(name = "letterbox")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file (.toml, .json or .env)
    #[arg(short, long, global = true, env = "LETTERBOX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler until interrupted
    Serve,

    /// Inspect and manage scheduled jobs
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },

    /// Send a message immediately
    Send(SendArgs),

    /// List the available templates and their input fields
    Templates,
}

#[derive(Subcommand)]
enum JobsCommand {
    /// List all jobs
    #[command(visible_alias = "ls")]
    List,

    /// Show one job
    Get {
        /// Job id
        id: String,
    },

    /// Remove a job
    #[command(visible_alias = "rm")]
    Cancel {
        /// Job id
        id: String,
    },

    /// Schedule a single delivery
    Once(OnceArgs),

    /// Schedule a recurring delivery
    Cron(CronArgs),

    /// Change fields of an existing job
    Update(UpdateArgs),
}

/// What to send.
#[derive(Args)]
struct ContentArgs {
    /// Template key
    #[arg(short, long)]
    template: String,

    /// Template input as a JSON object
    #[arg(short, long, value_parser = parse_object)]
    data: Option<Value>,

    /// Subject replacing the one the template produces
    #[arg(short, long)]
    subject: Option<String>,

    /// Run the template without sending anything
    #[arg(long)]
    silent: bool,
}

#[derive(Args)]
struct OnceArgs {
    /// Recipient address
    #[arg(long)]
    to: String,

    /// Local run time, `YYYY-MM-DD HH:MM`
    #[arg(long)]
    at: String,

    #[command(flatten)]
    content: ContentArgs,

    /// File to attach; copied into the upload directory and removed after the run
    #[arg(long = "attach", value_name = "PATH")]
    attachments: Vec<PathBuf>,

    /// Replace the job with this id
    #[arg(long)]
    id: Option<String>,
}

#[derive(Args)]
struct CronArgs {
    /// Job name
    #[arg(long)]
    name: String,

    /// Five-field cron expression, e.g. "0 9 * * 1"
    #[arg(long = "expr")]
    expression: String,

    /// Recipient address; repeat for several
    #[arg(long, required = true)]
    to: Vec<String>,

    #[command(flatten)]
    content: ContentArgs,

    /// Replace the job with this id
    #[arg(long)]
    id: Option<String>,
}

#[derive(Args)]
struct UpdateArgs {
    /// Job id
    id: String,

    #[arg(long)]
    name: Option<String>,

    /// New local run time (one-shot jobs)
    #[arg(long)]
    at: Option<String>,

    /// New cron expression (cron jobs)
    #[arg(long = "expr")]
    expression: Option<String>,

    /// Recipient; one for one-shot jobs, repeatable for cron jobs
    #[arg(long)]
    to: Vec<String>,

    #[arg(short, long)]
    template: Option<String>,

    #[arg(short, long, value_parser = parse_object)]
    data: Option<Value>,

    /// New subject; an empty string clears it
    #[arg(short, long)]
    subject: Option<String>,

    #[arg(long)]
    silent: Option<bool>,
}

#[derive(Args)]
struct SendArgs {
    /// Recipient address
    #[arg(long)]
    to: String,

    #[command(flatten)]
    content: ContentArgs,

    /// File to attach; removed after sending
    #[arg(long = "attach", value_name = "PATH")]
    attachments: Vec<PathBuf>,
}

fn parse_object(raw: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("\n  {} {}\n", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let _guard = LogConfig::from_env().init()?;
    let settings = Settings::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => commands::serve::run(&settings).await,
        Commands::Jobs { command } => commands::jobs::run(&settings, command).await,
        Commands::Send(args) => commands::send::run(&settings, args).await,
        Commands::Templates => commands::templates::run(&settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_once_job() {
        let cli = Cli::try_parse_from([
            "letterbox",
            "jobs",
            "once",
            "--to",
            "a@example.com",
            "--at",
            "2026-10-20 09:00",
            "--template",
            "daily_summary",
            "--data",
            r#"{"level": 3}"#,
            "--attach",
            "notes.txt",
        ])
        .unwrap();

        match cli.command {
            Commands::Jobs {
                command: JobsCommand::Once(args),
            } => {
                assert_eq!(args.to, "a@example.com");
                assert_eq!(args.at, "2026-10-20 09:00");
                assert_eq!(args.content.template, "daily_summary");
                assert_eq!(args.content.data.unwrap()["level"], 3);
                assert_eq!(args.attachments, vec![PathBuf::from("notes.txt")]);
                assert!(!args.content.silent);
            }
            _ => panic!("expected jobs once"),
        }
    }

    #[test]
    fn test_parse_cron_job_with_many_recipients() {
        let cli = Cli::try_parse_from([
            "letterbox",
            "jobs",
            "cron",
            "--name",
            "weekly",
            "--expr",
            "0 9 * * 1",
            "--to",
            "a@example.com",
            "--to",
            "b@example.com",
            "-t",
            "weekly_report",
            "--silent",
        ])
        .unwrap();

        match cli.command {
            Commands::Jobs {
                command: JobsCommand::Cron(args),
            } => {
                assert_eq!(args.expression, "0 9 * * 1");
                assert_eq!(args.to.len(), 2);
                assert!(args.content.silent);
            }
            _ => panic!("expected jobs cron"),
        }
    }

    #[test]
    fn test_data_must_be_an_object() {
        let result = Cli::try_parse_from([
            "letterbox", "send", "--to", "a@example.com", "-t", "x", "--data", "[1, 2]",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_send_requires_recipient() {
        assert!(Cli::try_parse_from(["letterbox", "send", "-t", "x"]).is_err());
    }

    #[test]
    fn test_update_silent_takes_a_value() {
        let cli =
            Cli::try_parse_from(["letterbox", "jobs", "update", "job-1", "--silent", "false"])
                .unwrap();
        match cli.command {
            Commands::Jobs {
                command: JobsCommand::Update(args),
            } => {
                assert_eq!(args.silent, Some(false));
                assert!(args.to.is_empty());
            }
            _ => panic!("expected jobs update"),
        }
    }
}
