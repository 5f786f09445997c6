mod cli;
mod engine;
mod logger;
mod metrics;
mod model;
mod storage;
mod text_summary;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logger::init_logging(args.verbose);

    match cli::run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Benchmark encountered an error: {e:#}");
            std::process::exit(1);
        }
    }
}
