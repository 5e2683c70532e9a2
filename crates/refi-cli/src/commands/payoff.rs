use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use refi_core::loan::LoanParams;
use refi_core::payoff;
use refi_core::types::Money;

use crate::input;

/// Input document for accelerated payoff planning.
#[derive(Deserialize)]
pub struct PayoffInput {
    pub loan: LoanParams,
    pub target_payment: Money,
}

/// Arguments for accelerated payoff planning
#[derive(Args)]
pub struct PayoffArgs {
    /// Path to JSON input file ({loan, target_payment})
    #[arg(long)]
    pub input: Option<String>,

    /// Also write the per-period plan as CSV to this path
    #[arg(long)]
    pub csv: Option<String>,
}

pub fn run_payoff(args: PayoffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payoff_input: PayoffInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(doc) = input::stdin::read_json()? {
        doc
    } else {
        return Err("--input <file.json> or stdin required for payoff".into());
    };

    let result = payoff::plan_accelerated_payoff(&payoff_input.loan, payoff_input.target_payment)?;
    if let Some(ref path) = args.csv {
        super::write_csv(&result.result, path)?;
    }
    Ok(serde_json::to_value(result)?)
}
