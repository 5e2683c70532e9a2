use clap::Args;
use serde_json::Value;

use refi_core::amortization;
use refi_core::loan::LoanParams;

use crate::input;

/// Arguments for amortization schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (a LoanParams document)
    #[arg(long)]
    pub input: Option<String>,

    /// Also write the per-period schedule as CSV to this path
    #[arg(long)]
    pub csv: Option<String>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan: LoanParams = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(doc) = input::stdin::read_json()? {
        doc
    } else {
        return Err("--input <file.json> or stdin required for schedule".into());
    };

    let result = amortization::build_schedule(&loan)?;
    if let Some(ref path) = args.csv {
        super::write_csv(&result.result, path)?;
    }
    Ok(serde_json::to_value(result)?)
}
