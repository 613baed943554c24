//! Command line interface for cross-chain swap quoting.
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use crosspool_aggregator::{Aggregator, best_quote};
use crosspool_domain::{Asset, BaseAmount, Chain, CryptoAmount};
use crosspool_protocols::{
    MayachainProtocol, Protocol, ProtocolConfig, QuoteSwapParams, ThorchainProtocol,
};
use crosspool_query::{NodeSource, QueryEngine, SaversWithdraw, SwapTracker, ThornodeClient};
use dotenv::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_THORNODE_URL: &str = "https://thornode.ninerealms.com/thorchain";
const DEFAULT_MAYANODE_URL: &str = "https://mayanode.mayachain.info/mayachain";

#[derive(Parser)]
#[command(name = "crosspool")]
#[command(about = "Cross-chain swap quoting and position estimation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Venue {
    Thorchain,
    Mayachain,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a swap on every venue and rank the results
    Quote {
        /// Source asset (e.g., BTC.BTC)
        #[arg(long)]
        from: String,

        /// Destination asset (e.g., ETH.ETH)
        #[arg(long)]
        to: String,

        /// Input amount in 8-decimal base units
        #[arg(long)]
        amount: u64,

        /// Destination address on the target chain
        #[arg(long)]
        address: String,

        /// Maximum tolerated slip as a fraction (e.g., 0.03)
        #[arg(long)]
        slip_limit: Option<Decimal>,

        /// Affiliate fee in basis points
        #[arg(long, default_value_t = 0)]
        affiliate_bps: u32,

        /// Affiliate fee collection address
        #[arg(long)]
        affiliate_address: Option<String>,
    },
    /// Value a two-sided liquidity position
    Position {
        /// Pool asset (e.g., BTC.BTC)
        #[arg(long)]
        asset: String,

        /// Liquidity provider address
        #[arg(long)]
        address: String,

        #[arg(long, value_enum, default_value = "thorchain")]
        venue: Venue,
    },
    /// Value a single-sided saver position
    Saver {
        /// Vault asset (e.g., BTC.BTC)
        #[arg(long)]
        asset: String,

        /// Saver address
        #[arg(long)]
        address: String,

        /// Quote a deposit of this amount, in 8-decimal base units
        #[arg(long, conflicts_with = "withdraw_bps")]
        deposit: Option<u64>,

        /// Quote a withdrawal of this share, in basis points
        #[arg(long)]
        withdraw_bps: Option<u32>,

        #[arg(long, value_enum, default_value = "thorchain")]
        venue: Venue,
    },
    /// List swaps initiated from an address, newest first
    History {
        /// Source chain (e.g., BTC)
        #[arg(long)]
        chain: String,

        /// Source address on that chain
        #[arg(long)]
        address: String,
    },
    /// Check the status of one swap by its inbound hash
    Status {
        /// Inbound transaction hash
        #[arg(long)]
        hash: String,

        #[arg(long, value_enum, default_value = "thorchain")]
        venue: Venue,
    },
}

fn node_source(venue: Venue) -> Result<Arc<dyn NodeSource>> {
    let url = match venue {
        Venue::Thorchain => {
            env::var("THORNODE_URL").unwrap_or_else(|_| DEFAULT_THORNODE_URL.to_string())
        }
        Venue::Mayachain => {
            env::var("MAYANODE_URL").unwrap_or_else(|_| DEFAULT_MAYANODE_URL.to_string())
        }
    };
    Ok(Arc::new(ThornodeClient::new(url)?))
}

fn venue_engine(venue: Venue) -> Result<QueryEngine> {
    let native = match venue {
        Venue::Thorchain => Asset::rune(),
        Venue::Mayachain => Asset::cacao(),
    };
    Ok(QueryEngine::new(node_source(venue)?, native))
}

fn all_protocols(config: ProtocolConfig) -> Result<Vec<Arc<dyn Protocol>>> {
    Ok(vec![
        Arc::new(ThorchainProtocol::new(
            node_source(Venue::Thorchain)?,
            config.clone(),
        )),
        Arc::new(MayachainProtocol::new(
            node_source(Venue::Mayachain)?,
            config,
        )),
    ])
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Quote {
            from,
            to,
            amount,
            address,
            slip_limit,
            affiliate_bps,
            affiliate_address,
        } => {
            let aggregator = Aggregator::new(all_protocols(ProtocolConfig {
                affiliate_bps,
                affiliate_address,
            })?)?;
            let params = QuoteSwapParams {
                amount: CryptoAmount::new(BaseAmount::native(amount), Asset::from_str(&from)?),
                destination_asset: Asset::from_str(&to)?,
                destination_address: address,
                slip_limit,
            };

            println!("🔍 Quoting {} {} -> {}...", amount, from, to);
            let quotes = aggregator.estimate_swap(&params).await;
            if quotes.is_empty() {
                println!("❌ No venue lists this pair.");
                return Ok(());
            }

            println!(
                "{:<12} | {:<8} | {:<16} | {:<10} | {}",
                "Venue", "Can swap", "Expected out", "Slip (bps)", "Memo"
            );
            println!("{}", "-".repeat(80));
            for quote in &quotes {
                println!(
                    "{:<12} | {:<8} | {:<16} | {:<10} | {}",
                    quote.protocol,
                    quote.can_swap,
                    quote.expected_amount.amount.raw,
                    quote.slip_bps.round_dp(2),
                    quote.memo
                );
                for error in &quote.errors {
                    println!("    ⚠️  {error}");
                }
            }
            if let Some(best) = best_quote(&quotes) {
                if best.can_swap {
                    println!("\n✅ Best venue: {} (expires {})", best.protocol, best.expiry);
                    println!("   Send to:  {}", best.to_address);
                    println!("   Memo:     {}", best.memo);
                } else {
                    println!("\n❌ No swappable quote.");
                }
            }
        }
        Commands::Position {
            asset,
            address,
            venue,
        } => {
            let engine = venue_engine(venue)?;
            let asset = Asset::from_str(&asset)?;
            println!("🔍 Checking liquidity position for {address} in {asset}...");
            let position = engine.check_liquidity_position(&asset, &address).await?;

            println!("✅ Units:        {}", position.units);
            println!(
                "   Share:        {} {} + {} native",
                position.pool_share.asset_share, position.asset, position.pool_share.rune_share
            );
            println!(
                "   Deposited:    {} {} + {} native",
                position.deposit.asset, position.asset, position.deposit.rune
            );
            println!("   Growth:       {}", position.lp_growth.round_dp(6));
            println!(
                "   IL cover:     {} native ({}% accrued, {} days in)",
                position.impermanent_loss_protection.amount,
                (position.impermanent_loss_protection.progress * Decimal::from(100)).round_dp(2),
                position.impermanent_loss_protection.total_days.round_dp(1)
            );
        }
        Commands::Saver {
            asset,
            address,
            deposit,
            withdraw_bps,
            venue,
        } => {
            let engine = venue_engine(venue)?;
            let asset = Asset::from_str(&asset)?;
            if let Some(amount) = deposit {
                println!("🔍 Quoting {amount} deposit into the {asset} saver vault...");
                let estimate = engine
                    .estimate_add_saver(CryptoAmount::new(
                        BaseAmount::native(amount),
                        asset.clone(),
                    ))
                    .await?;
                println!("✅ Deposit value: {}", estimate.estimated_deposit_value.amount);
                println!("   Entry fee:     {}", estimate.fee.amount);
                println!("   Slip (bps):    {}", estimate.slip_bps.round_dp(2));
                println!("   Memo:          {}", estimate.memo);
                println!("   Send to:       {}", estimate.to_address);
                for error in &estimate.errors {
                    println!("    ⚠️  {error}");
                }
                return Ok(());
            }
            match withdraw_bps {
                None => {
                    println!("🔍 Checking saver position for {address} in {asset}...");
                    let position = engine.get_saver_position(&asset, &address).await?;
                    println!("✅ Deposited:   {}", position.deposit_value.amount);
                    println!("   Redeemable:  {}", position.redeemable_value.amount);
                    println!("   Growth:      {}%", position.growth_percent.round_dp(4));
                    println!("   Age:         {} days", position.age_days.round_dp(1));
                }
                Some(bps) => {
                    println!("🔍 Quoting {bps} bps saver withdrawal from {asset}...");
                    let estimate = engine
                        .estimate_withdraw_saver(&SaversWithdraw {
                            asset: asset.clone(),
                            address,
                            withdraw_bps: bps,
                        })
                        .await?;
                    println!("✅ Expected out: {}", estimate.expected_asset_amount.amount);
                    println!("   Fee:          {}", estimate.fee.amount);
                    println!("   Slip (bps):   {}", estimate.slip_bps.round_dp(2));
                    println!("   Memo:         {}", estimate.memo);
                    println!("   Send to:      {}", estimate.to_address);
                }
            }
        }
        Commands::History { chain, address } => {
            let aggregator = Aggregator::new(all_protocols(ProtocolConfig::default())?)?;
            let chain = Chain::from_str(&chain)?;
            println!("🔍 Fetching swap history for {address} on {chain}...");
            let history = aggregator
                .get_swap_history(&[(chain, address)])
                .await;

            println!("✅ {} swaps found.", history.count);
            for swap in &history.swaps {
                let outbound = swap
                    .outbound
                    .as_ref()
                    .map(|out| out.hash.clone())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} | {:<10} | {:<8?} | in {} | out {}",
                    swap.date.format("%Y-%m-%d %H:%M"),
                    swap.protocol,
                    swap.status,
                    swap.inbound.hash,
                    outbound
                );
            }
        }
        Commands::Status { hash, venue } => {
            let tracker = SwapTracker::new(node_source(venue)?);
            println!("🔍 Checking swap {hash}...");
            match tracker.check_tx_status(&hash).await? {
                None => println!("❌ Hash not observed yet."),
                Some(record) => {
                    println!("✅ Status: {:?}", record.status);
                    println!(
                        "   Inbound:  {} ({} {})",
                        record.inbound.hash,
                        record.inbound.amount.amount.raw,
                        record.inbound.amount.asset
                    );
                    match &record.outbound {
                        Some(out) => println!(
                            "   Outbound: {} ({} {})",
                            out.hash, out.amount.amount.raw, out.amount.asset
                        ),
                        None => println!("   Outbound: not yet settled"),
                    }
                }
            }
        }
    }

    Ok(())
}
