use clap::Parser;

use notes_api::config::{Cli, Command};
use notes_api::{healthcheck, logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => {
            logging::init(cli.log_format, cli.verbose)?;
            server::run(args).await
        }
        Command::Healthcheck(args) => healthcheck::probe(&args).await,
    }
}
