mod cli;

use crate::cli::Cli;
use anyhow::Context;
use clap::Parser;
use lamport_ots::{Error, HashAlgorithm, Params};
use std::io;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const EXIT_INVALID_SIGNATURE: u8 = 1;
const EXIT_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            match err.downcast_ref::<Error>() {
                Some(e) if e.is_invalid_signature() => ExitCode::from(EXIT_INVALID_SIGNATURE),
                _ => ExitCode::from(EXIT_FAILURE),
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lamport_ots={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let Some(operation) = cli.operation()? else {
        list_hashes();
        return Ok(());
    };

    let params = Params::new(cli.hash)?;
    debug!(?params, "selected parameters");

    operation
        .run(&params)
        .with_context(|| format!("{} failed", operation.name()))?
        .into_result()?;
    Ok(())
}

fn list_hashes() {
    for alg in HashAlgorithm::ALL {
        println!("{:<12} {} bits", alg.name(), alg.digest_bytes() * 8);
    }
}
