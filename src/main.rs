use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tokio::{sync::mpsc, time::Duration};
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
#[command(about = "Terminal chat client running on mock data")]
struct Args {
    /// Seed for the mock data and simulated activity; random when omitted
    #[arg(long, env = "HIMMLE_SEED")]
    seed: Option<u64>,
    /// Where to write logs, since the terminal is taken by the UI
    #[arg(long, env = "HIMMLE_LOG", default_value = "himmle.log")]
    log_file: PathBuf,
    /// Don't simulate messages and presence changes from other participants
    #[arg(long)]
    no_activity: bool,
    /// How long to wait for the rest of a multi-key binding
    #[arg(long, default_value_t = 1000)]
    key_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let log_file = std::sync::Mutex::new(std::fs::File::create(&args.log_file)?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(log_file))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let store = himmle_fake_messages::seed_store(&mut rng, Utc::now());
    tracing::info!(
        seed = ?args.seed,
        users = store.users().len(),
        chats = store.chats().len(),
        "mock data ready"
    );

    let (tx, rx) = mpsc::unbounded_channel();
    if args.no_activity {
        drop(tx);
    } else {
        let chats = store.chats().to_vec();
        tokio::spawn(himmle_fake_messages::activity_sender(tx, chats, rng));
    }

    let config = himmle_tui::Config {
        key_timeout: Duration::from_millis(args.key_timeout_ms),
    };
    himmle_tui::run(store, rx, config).await?;
    Ok(())
}
