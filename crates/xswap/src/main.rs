mod cli;

use clap::Parser;
use eyre::WrapErr;

use xswap_core::balance::JsonFileBalances;
use xswap_core::codec;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let params = args.offer_params();

    match &args.command {
        Command::Take {
            name,
            tx,
            references,
        } => {
            let source = JsonFileBalances::new(&args.wallet_dir);
            tracing::debug!(
                wallet = %name,
                dir = %source.dir().display(),
                network_id = params.network_id,
                "taking offer"
            );
            let result = xswap_core::offer_take(&source, name, tx, references, &params)
                .await
                .with_context(|| format!("take offer with wallet `{name}`"))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("serialize take result")?
            );
        }
        Command::Decode { tx } => {
            let decoded = codec::decode(tx).context("decode transaction")?;
            println!(
                "{}",
                serde_json::to_string_pretty(&decoded).context("serialize transaction")?
            );
        }
    }

    Ok(())
}
