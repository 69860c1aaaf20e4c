//! Transfer dapp CLI
//!
//! Command-line shell around the transaction session: connect a local-key
//! wallet, send recorded transfers and read the contract's history.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use transfer_dapp::provider::{Approval, LocalKeyProvider, WalletProvider};
use transfer_dapp::session::TransferField;
use transfer_dapp::storage::WALLET_AUTHORIZED_KEY;
use transfer_dapp::wallet::SecureWallet;
use transfer_dapp::{Config, Gateway, LocalStorage, Result, TransactionSession};

#[derive(Parser)]
#[command(name = "txdapp")]
#[command(about = "Send ether transfers recorded on the Transactions contract")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Approve wallet prompts without asking
    #[arg(short, long, global = true)]
    yes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the session after a silent account check
    Status,

    /// Authorize the wallet for this application
    Connect,

    /// Withdraw the wallet authorization
    Disconnect,

    /// Send ether and record the transfer on the contract
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount in ether (e.g. 0.5)
        #[arg(long)]
        amount: String,

        /// Keyword stored with the transfer
        #[arg(short, long, default_value = "")]
        keyword: String,

        /// Message stored with the transfer
        #[arg(short, long, default_value = "")]
        message: String,
    },

    /// Print the recorded transfers
    History,

    /// Follow account changes until Ctrl-C
    Watch,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    let json_layer = cli
        .json_logs
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!cli.json_logs).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(json_layer)
        .with(text_layer)
        .with(filter)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.yes {
        config.wallet.approval = Approval::Always;
    }

    if let Commands::Config = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let storage = match config.storage_path {
        Some(ref path) => LocalStorage::open(path).await,
        None => LocalStorage::in_memory(),
    };
    let wallet = load_wallet(&config, &storage)?;
    let gateway = Gateway::new(
        wallet.clone().map(|w| w as Arc<dyn WalletProvider>),
        config.contract.clone(),
    );
    let mut session = TransactionSession::new(gateway, storage);

    tracing::info!(
        network = config.network.name(),
        contract = %config.contract.address,
        "Starting session"
    );

    match cli.command {
        Commands::Status => {
            session.initialize().await;
            print_state(&session)?;
        }
        Commands::Connect => {
            session.initialize().await;
            if session.connect().await {
                session
                    .storage_mut()
                    .set(WALLET_AUTHORIZED_KEY, "true")
                    .await?;
            }
            print_state(&session)?;
        }
        Commands::Disconnect => {
            session.initialize().await;
            if let Some(wallet) = wallet.filter(|w| w.is_authorized()) {
                wallet.revoke();
                session.process_account_change().await;
            }
            session.storage_mut().remove(WALLET_AUTHORIZED_KEY).await?;
            print_state(&session)?;
        }
        Commands::Send {
            to,
            amount,
            keyword,
            message,
        } => {
            if !session.initialize().await && session.gateway().resolve_provider().is_ok() {
                session.connect().await;
            }
            session.set_field(TransferField::Recipient, to);
            session.set_field(TransferField::Amount, amount);
            session.set_field(TransferField::Keyword, keyword);
            session.set_field(TransferField::Message, message);

            let sent = session.submit().await;
            print_state(&session)?;
            if !sent {
                std::process::exit(1);
            }
        }
        Commands::History => {
            session.initialize().await;
            println!(
                "{}",
                serde_json::to_string_pretty(&session.state().history)?
            );
        }
        Commands::Watch => {
            session.initialize().await;
            print_state(&session)?;
            watch(&mut session, wallet, config.wallet.watch_poll_interval()).await?;
        }
        Commands::Config => {}
    }

    session.teardown();
    Ok(())
}

/// Build the local-key wallet, or `None` when no key is configured
fn load_wallet(config: &Config, storage: &LocalStorage) -> Result<Option<Arc<LocalKeyProvider>>> {
    let key_env = &config.wallet.private_key_env;
    if std::env::var(key_env).is_err() {
        tracing::warn!(env = %key_env, "No signing key set - running without a wallet");
        return Ok(None);
    }

    let signer = SecureWallet::from_env(key_env)?;
    tracing::info!(address = %signer.address(), "Loaded wallet from {}", key_env);

    let rpc_url = config.resolve_rpc_url()?;
    let authorized = storage.get(WALLET_AUTHORIZED_KEY) == Some("true");
    let provider = LocalKeyProvider::connect(signer, &rpc_url, config.wallet.approval)?
        .with_authorized(authorized);

    Ok(Some(Arc::new(provider)))
}

/// Follow authorization changes made by other `txdapp` runs
///
/// The stored `walletAuthorized` flag is polled and mirrored onto the wallet,
/// whose `accountsChanged` notifications then drive the session.
async fn watch(
    session: &mut TransactionSession,
    wallet: Option<Arc<LocalKeyProvider>>,
    poll_interval: Duration,
) -> Result<()> {
    let Some(wallet) = wallet.filter(|_| session.is_subscribed()) else {
        tracing::warn!("No wallet to watch");
        return Ok(());
    };

    tracing::info!("Watching for account changes (Ctrl-C to stop)");
    let mut ticker = tokio::time::interval(poll_interval.max(Duration::from_millis(1)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping");
                break;
            }
            _ = ticker.tick() => {
                session.storage_mut().reload().await;
                let authorized = session.storage().get(WALLET_AUTHORIZED_KEY) == Some("true");
                wallet.sync_authorization(authorized);
            }
            accounts = session.next_account_change() => match accounts {
                Some(accounts) => {
                    session.apply_account_change(accounts).await;
                    print_state(session)?;
                }
                None => break,
            },
        }
    }
    Ok(())
}

fn print_state(session: &TransactionSession) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(session.state())?);
    Ok(())
}
