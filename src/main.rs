use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use markup::cli::set::{SettingsUpdate, parse_coefficient};
use markup::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration and pricing settings
    Setup,
    /// Quote the final price for an item
    Quote {
        /// Price in the source currency
        #[arg(allow_hyphen_values = true)]
        price: String,
        /// Product category, "-" for none
        #[arg(short = 'k', long)]
        category: Option<String>,
    },
    /// Display category coefficients and current pricing settings
    Categories,
    /// Re-quote whenever the pricing settings change
    Watch {
        /// Price in the source currency
        #[arg(allow_hyphen_values = true)]
        price: String,
        /// Product category, "-" for none
        #[arg(short = 'k', long)]
        category: Option<String>,
        /// Stop after this many quotes
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Update the pricing settings
    Set {
        /// Exchange rate, target currency units per source unit
        #[arg(long, value_parser = non_negative)]
        exchange_rate: Option<f64>,
        /// Flat service fee added to every quote
        #[arg(long, value_parser = non_negative)]
        service_fee: Option<f64>,
        /// Base delivery fee before category scaling
        #[arg(long, value_parser = non_negative)]
        delivery_fee: Option<f64>,
        /// Category coefficient as NAME=COEFFICIENT, repeatable
        #[arg(long = "coefficient", value_parser = coefficient)]
        coefficients: Vec<(String, f64)>,
    },
}

impl From<Commands> for markup::AppCommand {
    fn from(cmd: Commands) -> markup::AppCommand {
        match cmd {
            Commands::Quote { price, category } => markup::AppCommand::Quote { price, category },
            Commands::Categories => markup::AppCommand::Categories,
            Commands::Watch {
                price,
                category,
                count,
            } => markup::AppCommand::Watch {
                price,
                category,
                count,
            },
            Commands::Set {
                exchange_rate,
                service_fee,
                delivery_fee,
                coefficients,
            } => markup::AppCommand::Set(SettingsUpdate {
                exchange_rate,
                service_fee,
                base_delivery_fee: delivery_fee,
                coefficients,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

fn non_negative(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(format!("'{s}' is not a non-negative number")),
    }
}

fn coefficient(s: &str) -> Result<(String, f64), String> {
    parse_coefficient(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => markup::cli::setup::setup().await,
        Some(cmd) => markup::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
