use clap::Parser;
use colored::Colorize;

use shellkeep::app::CommandFailed;
use shellkeep::{init_logging, Cli};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = shellkeep::run(cli).await {
        if !e.is::<CommandFailed>() {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
        }
        std::process::exit(1);
    }
}
