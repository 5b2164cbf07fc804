//! Ethereum wallet CLI
//!
//! Command-line front end for a wallet session: gas prices, key creation,
//! balances and history.

use clap::{Parser, Subcommand};
use eth_wallet_session::wallet::{backup_address, Direction, HistoryEntry};
use eth_wallet_session::{
    Backends, Config, Error, GasPriceClient, HistoryQuery, Network, Result, WalletSession,
};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Passphrase for encrypted wallet backups
const PASSPHRASE_ENV: &str = "WALLET_PASSPHRASE";
/// Raw private key, used when no backup file is given
const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

#[derive(Parser)]
#[command(name = "eth-wallet")]
#[command(about = "Ethereum wallet session tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Encrypted wallet backup (passphrase from WALLET_PASSPHRASE).
    /// Falls back to PRIVATE_KEY when omitted.
    #[arg(short, long, global = true)]
    wallet: Option<PathBuf>,

    /// Network (homestead, goerli, sepolia, holesky or a chain id)
    #[arg(short, long, global = true)]
    network: Option<Network>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the gas oracle's current report
    GasPrice,

    /// Create a new wallet and write its encrypted backup
    New {
        /// Where to write the backup
        #[arg(short, long)]
        out: PathBuf,

        /// Also print the recovery phrase
        #[arg(long)]
        show_mnemonic: bool,
    },

    /// Print the wallet address
    Address,

    /// Print the ether balance
    Balance,

    /// Print a whole-token ERC-20 balance
    TokenBalance {
        /// Token contract address
        #[arg(long)]
        token: String,

        /// Display symbol
        #[arg(long, default_value = "TOKEN")]
        symbol: String,
    },

    /// Print transaction history (ether, or a token with --token)
    History {
        /// Token contract address
        #[arg(long)]
        token: Option<String>,

        /// First block to include
        #[arg(long)]
        start_block: Option<u64>,

        /// Last block to include
        #[arg(long)]
        end_block: Option<u64>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(network) = cli.network {
        config.network = network;
    }

    match cli.command {
        Commands::GasPrice => {
            let report = GasPriceClient::from_config(&config.gas_oracle)
                .fetch_gas_price()
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::New { out, show_mnemonic } => {
            run_new(&config, &out, show_mnemonic).await?;
        }
        Commands::Address => {
            let wallet = load_wallet(&config, cli.wallet.as_deref()).await?;
            println!("{}", wallet.address()?);
        }
        Commands::Balance => {
            let mut wallet = load_wallet(&config, cli.wallet.as_deref()).await?;
            wallet.connect_network(config.network)?;
            println!("{} ETH", wallet.ether_balance().await?);
        }
        Commands::TokenBalance { token, symbol } => {
            let mut wallet = load_wallet(&config, cli.wallet.as_deref()).await?;
            wallet.connect_network(config.network)?;
            wallet.add_token(&symbol, &token).await?;
            println!("{} {}", wallet.token_balance(&token).await?, symbol);
        }
        Commands::History {
            token,
            start_block,
            end_block,
            json,
        } => {
            let mut wallet = load_wallet(&config, cli.wallet.as_deref()).await?;
            wallet.connect_network(config.network)?;
            let entries = match token {
                Some(token) => {
                    wallet.add_token("TOKEN", &token).await?;
                    wallet.token_history(&token).await?
                }
                None => {
                    wallet
                        .ether_history(HistoryQuery {
                            start_block,
                            end_block,
                            ..HistoryQuery::default()
                        })
                        .await?
                }
            };
            print_history(&entries, json)?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn passphrase() -> Result<SecretString> {
    std::env::var(PASSPHRASE_ENV)
        .map(SecretString::from)
        .map_err(|_| Error::Config(format!("{} is not set", PASSPHRASE_ENV)))
}

async fn run_new(config: &Config, out: &Path, show_mnemonic: bool) -> Result<()> {
    if out.exists() {
        return Err(Error::Config(format!(
            "{} already exists, refusing to overwrite",
            out.display()
        )));
    }

    let passphrase = passphrase()?;
    let mut wallet = WalletSession::random(Backends::from_config(config))?;
    let address = wallet.address()?;
    let mnemonic = wallet.mnemonic()?;

    let backup = wallet.lock(&passphrase).await?;
    std::fs::write(out, &backup)
        .map_err(|e| Error::Config(format!("{}: {}", out.display(), e)))?;

    tracing::info!(%address, path = %out.display(), "Wallet backup written");
    println!("{}", address);
    if let (true, Some(phrase)) = (show_mnemonic, mnemonic) {
        println!("{}", phrase.expose_secret());
    }
    Ok(())
}

async fn load_wallet(config: &Config, backup: Option<&Path>) -> Result<WalletSession> {
    let backends = Backends::from_config(config);

    if let Some(path) = backup {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let contents = contents.trim();
        tracing::debug!(address = %backup_address(contents)?, "Decrypting wallet backup");
        return WalletSession::from_encrypted_backup(contents, &passphrase()?, backends).await;
    }

    match std::env::var(PRIVATE_KEY_ENV) {
        Ok(private_key) => {
            let wallet = WalletSession::from_private_key(&private_key, backends)?;
            tracing::info!(address = %wallet.address()?, "Loaded wallet from PRIVATE_KEY");
            Ok(wallet)
        }
        Err(_) => Err(Error::Config(format!(
            "no wallet: pass --wallet or set {}",
            PRIVATE_KEY_ENV
        ))),
    }
}

fn print_history(entries: &[HistoryEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No transactions found");
        return Ok(());
    }

    for entry in entries {
        let block = entry
            .block_number
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string());
        let counterparty = match entry.direction {
            Direction::In => entry.from.to_string(),
            _ => entry
                .to
                .map(|to| to.to_string())
                .unwrap_or_else(|| "(contract creation)".to_string()),
        };
        println!(
            "{:>10}  {:<4}  {:>24}  {}",
            block,
            entry.direction.as_str(),
            entry.amount,
            counterparty
        );
    }
    Ok(())
}
