use clap::Parser;

use datatable_helper::{adapters, cli::Args, error::AppResult, logging};

fn main() -> AppResult<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    // Configuration errors surface here, before any request is read.
    let registry = args.registry()?;
    if args.debug {
        tracing::warn!("debug mode: responses carry rendered SQL");
    }
    adapters::bridge::run(args, registry)
}
