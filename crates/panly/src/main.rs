mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use panly_api::XapiClient;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let cfg = panly_config::load_config()?;

    match cli.command {
        Command::Config(ref args) => commands::config_cmd::handle(args, &cfg),

        Command::Completions(ref args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "panly", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let xapi_config = config::build_xapi_config(&cli.global, &cfg)?;
            let url = xapi_config
                .api_url()
                .map(|u| u.to_string())
                .unwrap_or_default();
            let mut client =
                XapiClient::new(xapi_config).map_err(|e| CliError::from_api(e, &url))?;

            tracing::debug!(command = cmd.name(), url = %url, "dispatching command");
            commands::dispatch(cmd, &mut client, &cli.global).await
        }
    }
}
