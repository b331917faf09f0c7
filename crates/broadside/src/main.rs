use std::path::PathBuf;

use broadside::prelude::*;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Battleship match server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// Score file, created on the first concluded match
    #[arg(short, long, default_value = "scores.json")]
    scores: PathBuf,

    /// Width and height of the board
    #[arg(long, default_value_t = 10)]
    board_size: u8,

    /// Ship lengths, one per boat
    #[arg(long, value_delimiter = ',', default_values_t = [5, 4, 3, 3, 2])]
    ships: Vec<u8>,
}

#[tokio::main]
async fn main() -> Result<(), BroadsideError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    let rules = FleetRules::new(args.board_size, args.ships)?;

    let server = Server::builder()
        .bind(&args.bind)
        .rules(rules)
        .scores_path(args.scores)
        .build()
        .await?;
    server.run().await
}
