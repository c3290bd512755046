use clap::Parser;
use tracing::error;

use rivals::utils::setup_logging;
use rivals::{run, Args};

fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(e) = run(&args) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
