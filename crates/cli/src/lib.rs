pub mod commands;

use clap::{error::ErrorKind, Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "membership",
    about = "Membership operator CLI",
    long_about = "Apply migrations, inspect configuration, check readiness and classify tiers.",
    after_help = concat!(
        "Examples:\n",
        "  membership doctor --json\n",
        "  membership config\n",
        "  membership tier --annual-spend 12000 --last-purchase 2026-07-18",
    )
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, DB connectivity, and schema readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Classify a loyalty tier from annual spend and last purchase date")]
    Tier {
        #[arg(long, allow_hyphen_values = true, help = "Annual spend, e.g. 12000 or 999.99")]
        annual_spend: String,
        #[arg(long, help = "Last purchase date (YYYY-MM-DD)")]
        last_purchase: String,
        #[arg(long, help = "Evaluation date (YYYY-MM-DD); defaults to today in UTC")]
        today: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(commands::EXIT_INVALID_ARGUMENTS),
            };
        }
    };

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Tier { annual_spend, last_purchase, today } => {
            commands::tier::run(&annual_spend, &last_purchase, today.as_deref())
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
