use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use keygate_server::Config;

/// Keygate - PIN access-control server for networked keypads
#[derive(Parser)]
#[command(name = "keygate", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "KEYGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides server.bind_addr)
    #[arg(long, env = "KEYGATE_BIND")]
    bind: Option<String>,

    /// SQLite database file (overrides database.path)
    #[arg(long, env = "KEYGATE_DATABASE")]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("keygate: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = keygate_server::init_tracing(&config.logging) {
        eprintln!("keygate: {e:#}");
        return ExitCode::FAILURE;
    }

    match keygate_server::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(bind) = &cli.bind {
        config.server.bind_addr.clone_from(bind);
    }
    if let Some(database) = &cli.database {
        config.database.path.clone_from(database);
    }

    Ok(config)
}
