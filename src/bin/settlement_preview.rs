//! Offline settlement calculator.
//!
//! Prints the payout or refund plan for given deal terms and quotes as JSON:
//!
//! ```text
//! settlement-preview payout --price 1000 --basis-a 20 --basis-b 50 --held 20000 --required 16000
//! settlement-preview refund --price 1000 --held 20000 --required 20000
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use data_deal_escrow::domain::services::settlement_calculator::{
    seller_commission, PayoutPlan, RefundPlan, SettlementPlan,
};
use data_deal_escrow::domain::value_objects::{Percent, TokenAmount};
use data_deal_escrow::telemetry::{init_tracing, LogFormat};
use rust_decimal::Decimal;
use tracing::debug;

/// Settlement preview CLI
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Settlement path to plan
    #[command(subcommand)]
    command: Command,
}

/// Settlement path
#[derive(Debug, Subcommand)]
enum Command {
    /// Plan for an accepted deal
    Payout {
        /// Stable-token price of the deal
        #[arg(long)]
        price: Decimal,
        /// Total staking+platform commission percent
        #[arg(long)]
        basis_a: u32,
        /// Staking share of the split, percent
        #[arg(long)]
        basis_b: u32,
        /// Utility tokens allocated at creation
        #[arg(long)]
        held: Decimal,
        /// Quoted utility tokens needed for the seller commission
        #[arg(long)]
        required: Decimal,
    },
    /// Plan for a declined deal
    Refund {
        /// Stable-token price of the deal
        #[arg(long)]
        price: Decimal,
        /// Utility tokens allocated at creation
        #[arg(long)]
        held: Decimal,
        /// Quoted utility tokens needed for the refund
        #[arg(long)]
        required: Decimal,
    },
}

fn amount(value: Decimal, name: &str) -> Result<TokenAmount> {
    TokenAmount::new(value).with_context(|| format!("invalid {name}"))
}

fn percent(value: u32, name: &str) -> Result<Percent> {
    Percent::new(value).with_context(|| format!("invalid {name}"))
}

fn plan(command: Command) -> Result<SettlementPlan> {
    match command {
        Command::Payout {
            price,
            basis_a,
            basis_b,
            held,
            required,
        } => {
            let commission = seller_commission(amount(price, "price")?, percent(basis_a, "basis-a")?)?;
            debug!(%commission, "seller commission");
            let plan = PayoutPlan::compute(
                commission,
                amount(held, "held")?,
                amount(required, "required")?,
                percent(basis_b, "basis-b")?,
            )?;
            Ok(SettlementPlan::Payout(plan))
        }
        Command::Refund {
            price,
            held,
            required,
        } => Ok(SettlementPlan::Refund(RefundPlan::compute(
            amount(price, "price")?,
            amount(held, "held")?,
            amount(required, "required")?,
        ))),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    let plan = plan(cli.command)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
