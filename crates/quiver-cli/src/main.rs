//! Quiver CLI
//!
//! Command-line interface for the arrow catalog

use clap::{Parser, Subcommand};
use quiver_core::logging_facility::{self, Profile};

mod commands;
mod settings;

use settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "quiver")]
#[command(about = "Quiver - Arrow catalog scraping and management", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Schema migrations
    Migrate(commands::migrate::MigrateArgs),
    /// Import processed manufacturer JSON files
    Import(commands::catalog::ImportArgs),
    /// Scrape manufacturer sites
    Scrape(commands::scrape::ScrapeArgs),
    /// Search the catalog
    Search(commands::catalog::SearchArgs),
    /// Show one arrow with its spine specifications
    Show(commands::catalog::ShowArgs),
    /// Catalog statistics
    Stats(commands::catalog::StatsArgs),
    /// Required spine for a bow setup
    Spine(commands::calc::SpineArgs),
    /// Front-of-center balance
    Foc(commands::calc::FocArgs),
    /// Recommend catalog arrows for a bow setup
    Match(commands::calc::MatchArgs),
    /// Data quality validation
    Validate(commands::validate::ValidateArgs),
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    logging_facility::init(
        settings
            .log_format
            .parse()
            .unwrap_or(Profile::Development),
    );

    let result = match cli.command {
        Commands::Migrate(args) => commands::migrate::execute(args, &settings),
        Commands::Import(args) => commands::catalog::execute_import(args, &settings),
        Commands::Scrape(args) => commands::scrape::execute(args, &settings),
        Commands::Search(args) => commands::catalog::execute_search(args, &settings),
        Commands::Show(args) => commands::catalog::execute_show(args, &settings),
        Commands::Stats(args) => commands::catalog::execute_stats(args, &settings),
        Commands::Spine(args) => commands::calc::execute_spine(args),
        Commands::Foc(args) => commands::calc::execute_foc(args),
        Commands::Match(args) => commands::calc::execute_match(args, &settings),
        Commands::Validate(args) => commands::validate::execute(args, &settings),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
