//! konbikol CLI entry point.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::Level;

use konbikol_client::cli::{Cli, Command, ConfigAction};
use konbikol_client::commands::{self, server::ServerOverrides};
use konbikol_client::config::ClientConfig;
use konbikol_client::error::{ClientError, ClientResult};
use konbikol_client::socket::SocketClient;
use konbikol_core::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(tracing_config(&cli)) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn tracing_config(cli: &Cli) -> TracingConfig {
    match &cli.command {
        Command::Server { json_logs: true, .. } => TracingConfig::daemon(),
        Command::Server { .. } if cli.debug => {
            TracingConfig::cli_debug().with_format(TracingOutputFormat::Pretty)
        }
        Command::Server { .. } => TracingConfig::default().with_level(Level::INFO),
        _ if cli.debug => TracingConfig::cli_debug(),
        _ => TracingConfig::default(),
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path).map_err(ClientError::Config)?,
        None => ClientConfig::load().unwrap_or_default(),
    };

    let client = SocketClient::new(
        cli.socket_path
            .clone()
            .or_else(|| config.server.socket_path.clone())
            .unwrap_or_else(konbikol_server::default_socket_path),
        Duration::from_secs(cli.timeout.unwrap_or(config.server.timeout)),
    );

    match cli.command {
        Command::Parse { file, json } => commands::parse::run(&client, &file, json).await,
        Command::Event { event } => commands::event::download(&client, event.into_event()).await,
        Command::Ics { event, output } => {
            commands::event::write_ics(&event.into_event(), output.as_deref())
        }
        Command::Ping => {
            if client.ping().await {
                println!("pong");
                Ok(())
            } else {
                Err(ClientError::Connection(format!(
                    "no server at {}",
                    client.socket_path().display()
                )))
            }
        }
        Command::Server {
            download_dir,
            open,
            engine,
            ..
        } => {
            let overrides = ServerOverrides {
                socket_path: cli.socket_path,
                download_dir,
                open,
                engine,
            };
            commands::server::run(commands::server::server_config(&config, overrides)).await
        }
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
