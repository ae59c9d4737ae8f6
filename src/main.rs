//! plazad - virtual-space presence server daemon

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use plazad::{Config, Server};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Virtual-space presence server
#[derive(Parser, Debug)]
#[command(name = "plazad", version, about = "Virtual-space presence server")]
struct Args {
    /// Address to listen on (overrides config file and env)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Path to the SQLite database file (in-memory when omitted)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long, default_value = "plazad.toml")]
    config: PathBuf,
}

/// File/env configuration layer, merged beneath the CLI flags.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind: Option<SocketAddr>,
    database: Option<String>,
}

fn load_config(args: &Args) -> Result<Config> {
    let file: FileConfig = Figment::new()
        .merge(Toml::file(&args.config))
        .merge(Env::prefixed("PLAZAD_"))
        .extract()?;

    let mut config = Config::default();
    if let Some(bind) = file.bind {
        config.bind_addr = bind;
    }
    if let Some(database) = file.database {
        config.db_path = Some(database);
    }
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(database) = &args.database {
        config.db_path = Some(database.display().to_string());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plazad=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
