mod find;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "buyspy")]
#[command(about = "Find where to buy a product, cheapest first")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search stores in a country and print ranked offers as JSON
    Find {
        /// Product name, e.g. "Philips TAH9505"
        product: String,
        /// ISO 3166-1 alpha-2 country code
        #[arg(long, default_value = "FI")]
        country: String,
        /// Search results to consider (defaults to `BUYSPY_MAX_CANDIDATES`)
        #[arg(long)]
        max_candidates: Option<usize>,
        /// Print single-line JSON instead of pretty-printed output
        #[arg(long)]
        compact: bool,
    },
    /// Print the tier of each store domain for a country as JSON
    Classify {
        /// Store domains or URLs
        #[arg(required = true)]
        domains: Vec<String>,
        #[arg(long, default_value = "FI")]
        country: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = buyspy_core::load_config_from_env()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Find {
            product,
            country,
            max_candidates,
            compact,
        }) => {
            let max_candidates = max_candidates.unwrap_or(config.max_candidates);
            find::run_find(&config, &product, &country, max_candidates, compact).await?;
        }
        Some(Commands::Classify { domains, country }) => {
            find::run_classify(&config, &domains, &country)?;
        }
        None => println!("buyspy: try `buyspy find \"<product>\" --country FI`"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
