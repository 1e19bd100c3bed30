use anyhow::Context;
use bracketbot::api::BybitClient;
use bracketbot::config::{BotConfig, Credentials};
use bracketbot::execution::{Scheduler, TradingEngine};
use bracketbot::strategy::StrategyKind;
use clap::Parser;

/// Bracket-order trading bot for Bybit linear perpetuals
#[derive(Parser, Debug)]
#[command(name = "bracketbot", version, about)]
struct Args {
    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Override STRATEGY (ema_rsi, multi_indicator_confluence, scalping)
    #[arg(long)]
    strategy: Option<StrategyKind>,

    /// Override TRADING_SYMBOL
    #[arg(long)]
    symbol: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let args = Args::parse();

    let mut config = BotConfig::from_env().context("failed to load configuration")?;
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if let Some(symbol) = args.symbol {
        config.trading_symbol = symbol;
    }
    config.validate()?;

    let credentials = Credentials::from_env()?;

    tracing::info!("🚀 BracketBot starting");
    tracing::info!(
        symbol = %config.trading_symbol,
        interval = %config.trading_interval,
        quantity = config.trade_quantity,
        leverage = config.leverage,
        strategy = %config.strategy,
        poll_secs = config.poll_interval_secs,
        timeout_secs = config.position_timeout_secs,
        cooldown_secs = config.cooldown_secs,
        "Configuration loaded"
    );
    tracing::info!(base_url = %config.bybit_base_url, "Using Bybit endpoint");

    let client = BybitClient::new(credentials.api_key, credentials.api_secret)?
        .with_base_url(config.bybit_base_url.clone())
        .with_precision(config.price_decimals, config.qty_decimals);

    let period = config.poll_interval();
    let engine = TradingEngine::new(client, config);
    let mut scheduler = Scheduler::new(engine, period);

    if args.once {
        scheduler.tick().await;
        return Ok(());
    }

    tracing::info!("Press Ctrl+C to stop...");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("⚠️  Received Ctrl+C, shutting down...");
        }
        _ = scheduler.run() => {
            tracing::error!("Trading loop exited unexpectedly");
        }
    }

    tracing::info!("👋 BracketBot stopped");
    Ok(())
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bracketbot=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
