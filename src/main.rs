use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stableroute::blockchain::LiveChainClient;
use stableroute::config::Config;
use stableroute::constants::CELO_MAINNET;
use stableroute::registry::TokenRegistry;
use stableroute::swap::{ExecutorSettings, SwapExecutor, SwapProposal};
use stableroute::types::{RemittanceStatus, SwapState};

#[derive(Parser)]
#[command(name = "stableroute", version, about = "Stable-asset swap routing over the on-chain broker")]
struct Cli {
    /// Path to a TOML config file; defaults to built-in Celo mainnet settings.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// RPC endpoint (overrides the config file).
    #[arg(long, global = true, env = "STABLEROUTE_RPC_URL")]
    rpc_url: Option<String>,

    /// Chain id when no config file is given.
    #[arg(long, global = true, default_value_t = CELO_MAINNET)]
    chain_id: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a route and print the simulated quote. Nothing is broadcast.
    Quote {
        /// Source token symbol (e.g. cUSD)
        from: String,
        /// Destination token symbol (e.g. USDC)
        to: String,
        /// Amount in human units of the source token
        amount: Decimal,
        /// Slippage tolerance in basis points
        #[arg(long)]
        slippage_bps: Option<u32>,
        /// Print the quote as JSON instead of the human summary.
        #[arg(long)]
        json: bool,
    },
    /// Quote, confirm, and execute a swap leg by leg.
    Swap {
        from: String,
        to: String,
        amount: Decimal,
        #[arg(long)]
        slippage_bps: Option<u32>,
        /// Print the final result as JSON instead of the human summary.
        #[arg(long)]
        json: bool,
        /// Send the settled output to this address instead of the signer.
        #[arg(long)]
        recipient: Option<Address>,
        /// Skip the interactive confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Quote {
            from,
            to,
            amount,
            slippage_bps,
            json,
        } => {
            let executor = build_executor(&config, false).await?;
            let proposal = executor
                .prepare(&from, &to, amount, slippage_bps, None)
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&proposal)?);
            } else {
                print_proposal(&proposal)?;
            }
        }
        Commands::Swap {
            from,
            to,
            amount,
            slippage_bps,
            json,
            recipient,
            yes,
        } => {
            let executor = build_executor(&config, true).await?;
            let proposal = executor
                .prepare(&from, &to, amount, slippage_bps, recipient)
                .await?;
            print_proposal(&proposal)?;

            if !yes && !confirm_with_user()? {
                println!("aborted, nothing was broadcast");
                return Ok(());
            }

            let result = executor.execute(proposal).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                if result.state != SwapState::Completed {
                    anyhow::bail!("swap did not complete");
                }
                return Ok(());
            }
            for (i, leg) in result.legs.iter().enumerate() {
                println!(
                    "leg {}: {} -> {} [{}]{}",
                    i,
                    leg.token_in.symbol,
                    leg.token_out.symbol,
                    leg.status,
                    leg.tx_hash
                        .map(|h| format!(" tx {h}"))
                        .unwrap_or_default()
                );
            }
            match &result.remittance {
                RemittanceStatus::NotRequired => {}
                RemittanceStatus::Skipped => println!("remittance: skipped (swap ended early)"),
                RemittanceStatus::Completed { tx_hash } => {
                    println!("remittance: sent to {} (tx {tx_hash})", result.recipient)
                }
                RemittanceStatus::Failed { reason } => println!(
                    "remittance to {} failed: {reason}; the signer still holds the output",
                    result.recipient
                ),
            }

            match result.state {
                SwapState::Completed => {
                    if let Some(out) = result.amount_out {
                        println!("completed: received {out}");
                    } else {
                        println!("completed");
                    }
                }
                SwapState::PartiallyCompleted => {
                    if let Some((token, amount)) = result.stranded_asset() {
                        println!(
                            "partially completed: holding {amount} base units of {}",
                            token.symbol
                        );
                    }
                    anyhow::bail!(
                        "swap stopped short: {}",
                        result
                            .error
                            .map(|e| e.to_string())
                            .unwrap_or_else(|| "unknown".to_string())
                    );
                }
                SwapState::Failed => anyhow::bail!(
                    "swap failed, nothing settled: {}",
                    result
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                ),
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => {
            let rpc_url = cli
                .rpc_url
                .clone()
                .context("--rpc-url (or STABLEROUTE_RPC_URL) is required without --config")?;
            Config::for_chain(cli.chain_id, rpc_url)?
        }
    };
    if let Some(rpc_url) = &cli.rpc_url {
        config.network.rpc_url = rpc_url.clone();
    }
    Ok(config)
}

/// Quote-only paths run without a key; write paths require one.
async fn build_executor(config: &Config, require_key: bool) -> Result<SwapExecutor> {
    let broker = config.broker_address()?;
    let registry = Arc::new(TokenRegistry::for_network(config.network.chain_id)?);
    let poll = Duration::from_millis(config.swap.receipt_poll_ms);

    let (provider, signer_address) = match env::var("STABLEROUTE_PRIVATE_KEY") {
        Ok(raw) => {
            let signer: PrivateKeySigner = raw
                .trim()
                .parse()
                .context("STABLEROUTE_PRIVATE_KEY is not a valid private key")?;
            let address = signer.address();
            let provider = ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect(&config.network.rpc_url)
                .await
                .context("failed to connect to RPC endpoint")?
                .erased();
            (provider, address)
        }
        Err(_) if require_key => {
            anyhow::bail!("STABLEROUTE_PRIVATE_KEY must be set to execute swaps")
        }
        Err(_) => {
            let provider = ProviderBuilder::new()
                .connect(&config.network.rpc_url)
                .await
                .context("failed to connect to RPC endpoint")?
                .erased();
            (provider, Address::ZERO)
        }
    };

    info!(
        chain_id = config.network.chain_id,
        %broker,
        signer = %signer_address,
        "connected"
    );

    let client = Arc::new(LiveChainClient::new(provider, broker, signer_address, poll));
    Ok(SwapExecutor::new(
        client,
        registry,
        ExecutorSettings {
            default_slippage_bps: config.swap.default_slippage_bps,
            confirm_timeout: Duration::from_secs(config.swap.confirm_timeout_secs),
            quote_ttl_secs: config.swap.quote_ttl_secs,
        },
    ))
}

fn print_proposal(proposal: &SwapProposal) -> Result<()> {
    let route = std::iter::once(proposal.pair.source.symbol.clone())
        .chain(
            proposal
                .pair
                .intermediate()
                .map(|t| t.symbol.clone()),
        )
        .chain(std::iter::once(proposal.pair.dest.symbol.clone()))
        .collect::<Vec<_>>()
        .join(" -> ");
    let min_out = TokenRegistry::from_base_units(proposal.quotes.min_final_out, &proposal.pair.dest)?;

    println!("route:        {route} ({} hop{})", proposal.pair.path.len(), if proposal.pair.is_direct() { "" } else { "s" });
    println!("amount in:    {} {}", proposal.amount_in, proposal.pair.source.symbol);
    println!("expected out: {} {}", proposal.expected_out, proposal.pair.dest.symbol);
    println!("minimum out:  {min_out} {} ({} bps slippage)", proposal.pair.dest.symbol, proposal.slippage_bps);
    if proposal.recipient != proposal.initiator {
        println!("recipient:    {}", proposal.recipient);
    }
    Ok(())
}

fn confirm_with_user() -> Result<bool> {
    print!("proceed with swap? [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
