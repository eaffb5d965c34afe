//! Simulator trade client entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use simtrader::config::Config;
use simtrader::metrics;
use simtrader::session::SimulatorSession;
use simtrader::trading::{Instrument, OptionContract, TradeGateway, TradeRequest};

/// Build, validate and preview simulator trades.
#[derive(Parser, Debug)]
#[command(name = "simtrader")]
#[command(about = "Validate brokerage simulator trades and preview their form payload")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check configuration validity.
    CheckConfig,

    /// Build a trade, validate it and print the payload it would submit.
    Preview(PreviewArgs),
}

#[derive(clap::Args, Debug)]
struct PreviewArgs {
    /// Ticker (stock) or underlying symbol (option).
    #[arg(long)]
    symbol: String,

    /// Shares or contracts.
    #[arg(short, long)]
    quantity: u32,

    /// Direction, e.g. "buy", "sell short", "buy to open".
    #[arg(short, long)]
    direction: String,

    /// Order type, e.g. "MARKET", "LIMIT 10", "TRAILING_STOP 2%".
    #[arg(long)]
    order_type: Option<String>,

    /// Duration, e.g. "day order" or "good till cancelled".
    #[arg(long)]
    duration: Option<String>,

    /// Do not ask the simulator for a confirmation email.
    #[arg(long)]
    no_email: bool,

    /// Option contract name. Makes this an option trade.
    #[arg(long, requires_all = ["ask", "bid", "contract_type"])]
    contract: Option<String>,

    /// Option ask price.
    #[arg(long)]
    ask: Option<Decimal>,

    /// Option bid price.
    #[arg(long)]
    bid: Option<Decimal>,

    /// Option contract type code.
    #[arg(long)]
    contract_type: Option<String>,

    /// Also fetch the form token from the simulator (needs SIM_AUTH_COOKIE).
    #[arg(long)]
    fetch_token: bool,
}

impl PreviewArgs {
    fn into_request(self) -> TradeRequest {
        let instrument = match self.contract {
            Some(contract_name) => Instrument::Option(OptionContract {
                base_symbol: self.symbol,
                ask: self.ask.unwrap_or_default(),
                bid: self.bid.unwrap_or_default(),
                contract_name,
                contract_type: self.contract_type.unwrap_or_default(),
            }),
            None => Instrument::Stock {
                symbol: self.symbol,
            },
        };

        TradeRequest {
            instrument,
            quantity: self.quantity,
            direction: self.direction,
            order_type: self.order_type,
            duration: self.duration,
            send_email: !self.no_email,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging. Load errors are reported by the subcommand itself.
    let log_config = Config::load().unwrap_or_default();
    let filter = EnvFilter::try_new(log_config.log_directives(args.verbose))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    metrics::init_metrics();

    match args.command {
        Command::CheckConfig => cmd_check_config(),
        Command::Preview(preview) => cmd_preview(preview).await,
    }
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SIMTRADER - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    let quota = config.quota();
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Simulator: {}", config.sim_base_url);
    println!(
        "  Auth Cookie: {}",
        if config.has_auth_cookie() { "present" } else { "MISSING" }
    );
    println!("  HTTP Timeout: {}ms", config.http_timeout_ms);
    println!(
        "  Rate Limit: {} calls / {}s",
        quota.calls(),
        quota.period().as_secs()
    );
    match config.rate_limit_max_wait_ms {
        Some(ms) => println!("  Max Rate-Limit Wait: {}ms", ms),
        None => println!("  Max Rate-Limit Wait: unbounded"),
    }
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Build, validate and print a trade payload.
async fn cmd_preview(preview: PreviewArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let fetch_token = preview.fetch_token;
    let mut trade = preview.into_request().into_trade()?;

    let gateway = TradeGateway::new(
        SimulatorSession::new(&config)?,
        config.routes()?,
        Arc::new(config.rate_limiter()),
    );

    let outcome = if fetch_token {
        gateway.prepare(&mut trade).await
    } else {
        gateway.validate(&trade).await
    };
    if let Err(e) = outcome {
        error!(error = %e, "Trade is not ready to submit");
        return Err(e.into());
    }

    info!(
        symbol = %trade.symbol(),
        order_type = %trade.order_type(),
        duration = %trade.duration(),
        "Trade validated"
    );

    let preview = json!({
        "security_type": trade.security_type(),
        "direction": trade.direction(),
        "order_type": trade.order_type().to_string(),
        "form": trade.form_data(),
        "query": trade.query_params(),
    });
    println!("{}", serde_json::to_string_pretty(&preview)?);

    Ok(())
}
