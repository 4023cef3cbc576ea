//! Minimal bot front-end: load a config file, connect, run until the
//! server closes the stream or the process receives Ctrl-C.

use anyhow::Context as _;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ircbot::{Client, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "ircbot.toml".to_owned());
    let config = Config::load(&path).with_context(|| format!("loading {path}"))?;

    let mut client = Client::connect(&config).await?;
    let conn = client.connection();

    tokio::select! {
        result = client.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, quitting");
            conn.quit("interrupted");
        }
    }
    Ok(())
}
