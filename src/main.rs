use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::calc::multi_site::MultiSiteRequest;
use crate::calc::types::CalculationRequest;
use crate::catalog::Catalog;

mod error;
pub mod calc;
pub mod catalog;

pub use error::{Error, Result};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Cli::parse();

    let catalog = Catalog::load(&args.catalog)?;

    match args.command {
        Command::Calculate(request_args) => {
            info!("sizing deployment from {:?}", request_args.request);

            let raw = std::fs::read_to_string(&request_args.request)?;
            let request: CalculationRequest = serde_json::from_str(&raw)?;

            let result = calc::calculate(&request, &catalog)?;

            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::MultiSite(request_args) => {
            info!(
                "distributing deployment across sites from {:?}",
                request_args.request
            );

            let raw = std::fs::read_to_string(&request_args.request)?;
            let request: MultiSiteRequest = serde_json::from_str(&raw)?;

            let result = calc::multi_site::distribute(&request, &catalog)?;

            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Size a single-site deployment from a JSON request file
    Calculate(RequestArgs),
    /// Distribute a deployment across capacity-constrained sites
    MultiSite(RequestArgs),
}

#[derive(Debug, clap::Args)]
pub struct RequestArgs {
    /// JSON request file
    request: PathBuf,
}

#[derive(Debug, Parser)]
#[clap(name = "vms-sizer")]
#[clap(bin_name = "vms-sizer")]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Catalog overlay file (TOML or JSON), merged over the built-in tables
    #[clap(long, global = true)]
    catalog: Option<PathBuf>,
}
