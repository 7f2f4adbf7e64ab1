//! spigot-cli — Command-line front end for the devnet funding pool.
//!
//! Generates pool accounts, keeps them funded through the airdrop
//! acquirer, reports balances, and sends transfers from whichever funded
//! account the selector picks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::warn;

use spigot_core::constants::{
    coins_to_motes, motes_to_coins, DEFAULT_AIRDROP_MOTES, TOP_UP_THRESHOLD_MOTES,
};
use spigot_core::Address;
use spigot_funding::{
    await_confirmation, transfer, Acquirer, EndpointPool, Funder, FunderStore, HttpTransport,
    ResilientClient, RetryPolicy, Selector, WebFaucet,
};

/// Devnet RPC endpoints tried in rotation order.
const DEFAULT_ENDPOINTS: [&str; 3] = [
    "https://rpc.devnet.spigot.dev",
    "https://devnet.spigot.dev",
    "https://devnet.spigot-rpc.net",
];

/// Pause between pool accounts (and between back-to-back airdrops for the
/// same account) to stay clear of faucet rate limits.
const RATE_LIMIT_PAUSE: Duration = Duration::from_secs(5);

/// Devnet funding pool front end.
#[derive(Parser)]
#[command(name = "spigot-cli")]
#[command(version, about = "Keep a pool of devnet accounts funded and pour from it.")]
struct Cli {
    /// Directory holding primary.json and the pool/ of key files
    /// (default: ~/.spigot).
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Comma-separated devnet RPC endpoints, tried in order with failover.
    #[arg(long, global = true, value_delimiter = ',')]
    endpoints: Vec<String>,

    /// Base URL of the public web faucet (default: the first endpoint).
    #[arg(long, global = true)]
    web_faucet: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate pool accounts and fund each with an initial airdrop.
    Generate(GenerateArgs),
    /// Top up every pool account holding less than one coin.
    Init,
    /// Show fresh balances for the primary account and the pool.
    Balance,
    /// Send coins from whichever funded account is available.
    Send(SendArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Number of accounts to generate.
    #[arg(long, default_value_t = 1)]
    count: u32,
}

#[derive(Args)]
struct SendArgs {
    /// Destination address (base58).
    #[arg(long)]
    to: String,

    /// Amount in coins.
    #[arg(long)]
    amount: f64,

    /// Poll for confirmation after submitting.
    #[arg(long)]
    wait: bool,
}

/// Everything the subcommands share.
struct Toolkit {
    store: FunderStore,
    client: ResilientClient<HttpTransport>,
    faucet: WebFaucet,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let endpoints = if cli.endpoints.is_empty() {
        DEFAULT_ENDPOINTS.map(String::from).to_vec()
    } else {
        cli.endpoints.clone()
    };
    let store_dir = match cli.store_dir {
        Some(dir) => dir,
        None => dirs::home_dir()
            .context("cannot determine home directory; pass --store-dir")?
            .join(".spigot"),
    };
    let web_faucet_url = cli.web_faucet.unwrap_or_else(|| endpoints[0].clone());

    let transport = HttpTransport::new(&endpoints).context("building RPC clients")?;
    let pool = EndpointPool::new(endpoints).context("building endpoint pool")?;
    let kit = Toolkit {
        store: FunderStore::open(store_dir),
        client: ResilientClient::new(Arc::new(pool), transport),
        faucet: WebFaucet::new(web_faucet_url),
    };

    match cli.command {
        Commands::Generate(args) => cmd_generate(&kit, args.count).await,
        Commands::Init => cmd_init(&kit).await,
        Commands::Balance => cmd_balance(&kit).await,
        Commands::Send(args) => cmd_send(&kit, &args.to, args.amount, args.wait).await,
    }
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

async fn cmd_generate(kit: &Toolkit, count: u32) -> Result<()> {
    if count == 0 {
        bail!("--count must be at least 1");
    }
    println!("Generating {count} pool account(s) under {}", kit.store.dir().display());
    for i in 0..count {
        if let Err(e) = generate_one(kit).await {
            warn!(account = i + 1, error = %e, "account generation failed, continuing");
        }
        if i + 1 < count {
            tokio::time::sleep(RATE_LIMIT_PAUSE).await;
        }
    }
    println!("Done. Promote one key file to primary.json to designate a primary funder.");
    Ok(())
}

async fn generate_one(kit: &Toolkit) -> Result<()> {
    let funder = kit.store.create_pool_account()?;
    println!("Generated {} ({})", funder.label, funder.address());
    fund_to_target(kit, &funder, DEFAULT_AIRDROP_MOTES).await
}

/// One airdrop/confirm/re-check cycle, with a single extra airdrop if the
/// balance still falls short of `target_motes`.
async fn fund_to_target(kit: &Toolkit, funder: &Funder, target_motes: u64) -> Result<()> {
    let acquirer = Acquirer::new(&kit.client, &kit.faucet, RetryPolicy::airdrop());

    let reference = acquirer
        .acquire(&funder.address(), DEFAULT_AIRDROP_MOTES)
        .await?;
    if !await_confirmation(&kit.client, &reference, &RetryPolicy::confirmation()).await {
        bail!("airdrop {reference} was not confirmed");
    }

    let balance = kit.client.get_balance(&funder.address()).await?;
    println!("  {} balance: {} coins", funder.label, motes_to_coins(balance));
    if balance >= target_motes {
        return Ok(());
    }

    println!("  balance below target, requesting one more airdrop...");
    tokio::time::sleep(RATE_LIMIT_PAUSE).await;
    let reference = acquirer
        .acquire(&funder.address(), DEFAULT_AIRDROP_MOTES)
        .await?;
    if await_confirmation(&kit.client, &reference, &RetryPolicy::confirmation()).await {
        let balance = kit.client.get_balance(&funder.address()).await?;
        println!("  {} balance: {} coins", funder.label, motes_to_coins(balance));
    } else {
        warn!(%reference, "follow-up airdrop was not confirmed");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

async fn cmd_init(kit: &Toolkit) -> Result<()> {
    let pool = kit.store.pool()?;
    if pool.is_empty() {
        bail!(
            "no pool accounts under {}; run `spigot-cli generate` first",
            kit.store.pool_dir().display()
        );
    }

    for (i, funder) in pool.iter().enumerate() {
        let balance = match kit.client.get_balance(&funder.address()).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(label = %funder.label, error = %e, "balance query failed, skipping");
                continue;
            }
        };
        println!("{}: {} coins", funder.label, motes_to_coins(balance));
        if balance < TOP_UP_THRESHOLD_MOTES {
            if let Err(e) = fund_to_target(kit, funder, TOP_UP_THRESHOLD_MOTES).await {
                warn!(label = %funder.label, error = %e, "top-up failed, continuing");
            }
        }
        if i + 1 < pool.len() {
            tokio::time::sleep(RATE_LIMIT_PAUSE).await;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// balance
// ---------------------------------------------------------------------------

async fn cmd_balance(kit: &Toolkit) -> Result<()> {
    match kit.store.primary()? {
        Some(primary) => {
            let balance = kit.client.get_balance(&primary.address()).await?;
            println!("primary ({}): {} coins", primary.address(), motes_to_coins(balance));
        }
        None => println!("primary: none (no {})", kit.store.primary_path().display()),
    }

    let pool = kit.store.pool()?;
    if pool.is_empty() {
        println!("pool: empty");
        return Ok(());
    }
    for funder in pool {
        match kit.client.get_balance(&funder.address()).await {
            Ok(balance) => println!(
                "{} ({}): {} coins",
                funder.label,
                funder.address(),
                motes_to_coins(balance)
            ),
            Err(e) => println!("{}: balance unavailable ({e})", funder.label),
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// send
// ---------------------------------------------------------------------------

async fn cmd_send(kit: &Toolkit, to: &str, amount: f64, wait: bool) -> Result<()> {
    let destination: Address = to.parse().context("invalid destination address")?;
    let motes = coins_to_motes(amount).context("invalid amount")?;

    let acquirer = Acquirer::new(&kit.client, &kit.faucet, RetryPolicy::airdrop());
    let selector = Selector::new(&kit.store, &kit.client, &acquirer, RetryPolicy::confirmation());

    let reference = transfer::send(&selector, &kit.client, &destination, motes).await?;
    println!("Transaction submitted: {reference}");

    if wait {
        if await_confirmation(&kit.client, &reference, &RetryPolicy::confirmation()).await {
            println!("Transaction confirmed.");
        } else {
            bail!("transaction {reference} was not confirmed in time");
        }
    }
    Ok(())
}
