pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "dockbook",
    about = "Dockbook operator CLI",
    long_about = "Operate dockbook migrations, seed data, config inspection, and readiness checks.",
    after_help = "Examples:\n  dockbook doctor --json\n  dockbook config\n  dockbook seed --admin-secret s3cret"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic development dataset of purchase orders")]
    Seed {
        #[arg(long, help = "Also store this administrator password in the settings table")]
        admin_secret: Option<String>,
    },
    #[command(about = "Store the administrator password used by the maintenance-block flow")]
    SetAdminSecret {
        #[arg(help = "The password administrators will type in the chat")]
        value: String,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database connectivity, and admin secret readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed { admin_secret } => commands::seed::run(admin_secret.as_deref()),
        Command::SetAdminSecret { value } => commands::secret::run(&value),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
