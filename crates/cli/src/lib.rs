pub mod commands;

use clap::{ArgGroup, Parser, Subcommand};
use fruitlink_core::directory::{BuyerFilter, SupplierFilter};
use fruitlink_core::domain::buyer::Volume;
use std::process::ExitCode;

use crate::commands::matches::MatchTarget;

#[derive(Debug, Parser)]
#[command(
    name = "fruitlink",
    about = "FruitLink operator CLI",
    long_about = "Inspect configuration, browse the seeded directory, run price forecasts and route chat messages.",
    after_help = "Examples:\n  fruitlink config\n  fruitlink forecast mango\n  fruitlink matches --buyer 1\n  fruitlink suppliers --fruit banana\n  fruitlink certifications \"Truong Ton\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Predict the price of a fruit from its market history")]
    Forecast { fruit: String },
    #[command(about = "List seeded suppliers, optionally filtered")]
    Suppliers {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        fruit: Option<String>,
        #[arg(long)]
        certification: Option<String>,
    },
    #[command(about = "List seeded buyers, optionally filtered")]
    Buyers {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        fruit: Option<String>,
        #[arg(long, help = "Small, Medium or Large")]
        volume: Option<Volume>,
    },
    #[command(about = "Show trade matches for a seeded buyer or supplier")]
    #[command(group(ArgGroup::new("target").required(true).args(["buyer", "supplier"])))]
    Matches {
        #[arg(long)]
        buyer: Option<String>,
        #[arg(long)]
        supplier: Option<String>,
    },
    #[command(about = "Look up a company's certifications through a running server")]
    Certifications {
        name: String,
        #[arg(long, help = "Server base URL (defaults to collaborator.base_url)")]
        server: Option<String>,
    },
    #[command(about = "Route a chat message through a running server's collaborator endpoint")]
    Chat {
        message: String,
        #[arg(long, help = "Server base URL (defaults to collaborator.base_url)")]
        server: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Forecast { fruit } => commands::forecast::run(&fruit),
        Command::Suppliers { search, country, fruit, certification } => {
            commands::directory::suppliers(&SupplierFilter { search, country, fruit, certification })
        }
        Command::Buyers { search, country, fruit, volume } => {
            commands::directory::buyers(&BuyerFilter { search, country, fruit, volume })
        }
        Command::Matches { buyer, supplier } => match (buyer, supplier) {
            (Some(id), _) => commands::matches::run(&MatchTarget::Buyer(id)),
            (None, Some(id)) => commands::matches::run(&MatchTarget::Supplier(id)),
            (None, None) => commands::CommandResult::failure(
                "matches",
                "invalid_input",
                "--buyer or --supplier is required",
                2,
            ),
        },
        Command::Certifications { name, server } => {
            commands::certifications::run(&name, server.as_deref())
        }
        Command::Chat { message, server } => commands::chat::run(&message, server.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
