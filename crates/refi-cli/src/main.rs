mod commands;
mod fred;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analyze::{AnalyzeArgs, SensitivityArgs};
use commands::payoff::PayoffArgs;
use commands::rates::RatesArgs;
use commands::schedule::ScheduleArgs;

/// Mortgage refinance analytics with decimal precision
#[derive(Parser)]
#[command(
    name = "refi",
    version,
    about = "Mortgage refinance analytics with decimal precision",
    long_about = "Compares a current mortgage against a proposed refinance: amortization \
                  schedules, nominal and after-tax savings, NPV breakeven, holding-period \
                  verdicts, accelerated payoff plans, and cached market-rate history."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the amortization schedule for one loan
    Schedule(ScheduleArgs),
    /// Compare a current loan against a proposed refinance
    Analyze(AnalyzeArgs),
    /// Sweep the proposed rate over candidate steps
    Sensitivity(SensitivityArgs),
    /// Re-amortize the proposed loan at a fixed target payment
    Payoff(PayoffArgs),
    /// Fetch cached historical mortgage rates
    Rates(RatesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Analyze(args) => commands::analyze::run_analyze(args),
        Commands::Sensitivity(args) => commands::analyze::run_sensitivity(args),
        Commands::Payoff(args) => commands::payoff::run_payoff(args),
        Commands::Rates(args) => commands::rates::run_rates(args),
        Commands::Version => {
            println!("refi {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
