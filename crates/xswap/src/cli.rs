use std::path::PathBuf;

use clap::{Parser, Subcommand};

use xswap_core::OfferParams;

/// xswap: take two-party atomic swap offers on the Avalanche X-chain.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Directory holding `<wallet>.json` balance snapshots.
    #[arg(long, default_value = ".", env = "XSWAP_WALLET_DIR", global = true)]
    pub wallet_dir: PathBuf,

    /// Network id offers must be built for (1 = mainnet, 5 = fuji).
    #[arg(long, default_value = "1", env = "XSWAP_NETWORK_ID", global = true)]
    pub network_id: u32,

    /// Flat transaction fee paid by the taker, in nAVAX.
    #[arg(long, default_value = "1000000", env = "XSWAP_TX_FEE", global = true)]
    pub tx_fee: u64,

    /// Symbol of the native asset, used in error messages.
    #[arg(long, default_value = "AVAX", env = "XSWAP_NATIVE_SYMBOL", global = true)]
    pub native_symbol: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Take an offer: fund it from a wallet and print the combined
    /// transaction with its address references.
    Take {
        /// Wallet to take the offer with.
        #[arg(short = 'n', long = "name")]
        name: String,

        /// Maker's partial transaction, hex encoded.
        #[arg(short = 't', long = "tx")]
        tx: String,

        /// Maker's address references, as a JSON object.
        #[arg(short = 'r', long = "references")]
        references: String,
    },

    /// Decode a transaction and print it as JSON.
    Decode {
        /// Transaction, hex encoded.
        #[arg(short = 't', long = "tx")]
        tx: String,
    },
}

impl Cli {
    pub fn offer_params(&self) -> OfferParams {
        OfferParams {
            network_id: self.network_id,
            tx_fee: self.tx_fee,
            native_symbol: self.native_symbol.clone(),
        }
    }
}
