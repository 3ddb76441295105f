//! `pupuk` binary entry point.
//!
//! Errors are printed to stderr (as JSON with `--json`) and mapped to an
//! exit code per error kind, so scripts can tell "not signed in" from
//! "backend down".

use clap::Parser;

use pupuk_storefront::cli::Cli;
use pupuk_storefront::{init_tracing, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose).map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let json = cli.json;
    if let Err(err) = run(cli).await {
        if json {
            eprintln!("{}", serde_json::to_string(&err)?);
        } else {
            eprintln!("error: {}", err.message);
        }
        std::process::exit(err.code.exit_code());
    }

    Ok(())
}
