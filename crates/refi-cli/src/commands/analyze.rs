use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use refi_core::analysis::{self, AnalysisSettings};
use refi_core::loan::LoanParams;
use refi_core::types::Rate;

use crate::input;

/// Input document for a refinance comparison.
#[derive(Deserialize)]
pub struct AnalyzeInput {
    pub current: LoanParams,
    pub proposed: LoanParams,
    pub settings: AnalysisSettings,
}

/// Input document for a rate sensitivity sweep.
#[derive(Deserialize)]
pub struct SensitivityInput {
    pub current: LoanParams,
    pub proposed: LoanParams,
    pub settings: AnalysisSettings,
    pub rate_steps: Vec<Rate>,
}

/// Arguments for refinance comparison
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON input file ({current, proposed, settings})
    #[arg(long)]
    pub input: Option<String>,

    /// Also write the per-period savings table as CSV to this path
    #[arg(long)]
    pub csv: Option<String>,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analyze_input: AnalyzeInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(doc) = input::stdin::read_json()? {
        doc
    } else {
        return Err("--input <file.json> or stdin required for analyze".into());
    };

    let result = analysis::analyze(
        &analyze_input.current,
        &analyze_input.proposed,
        &analyze_input.settings,
    )?;
    if let Some(ref path) = args.csv {
        super::write_csv(&result.result, path)?;
    }
    Ok(serde_json::to_value(result)?)
}

/// Arguments for rate sensitivity
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON input file ({current, proposed, settings, rate_steps})
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sens_input: SensitivityInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(doc) = input::stdin::read_json()? {
        doc
    } else {
        return Err("--input <file.json> or stdin required for sensitivity".into());
    };

    let result = analysis::rate_sensitivity(
        &sens_input.current,
        &sens_input.proposed,
        &sens_input.settings,
        &sens_input.rate_steps,
    )?;
    Ok(serde_json::to_value(result)?)
}
