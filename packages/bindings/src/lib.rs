use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use refi_core::analysis::AnalysisSettings;
use refi_core::loan::LoanParams;
use refi_core::types::{Money, Rate};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let loan: LoanParams = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = refi_core::amortization::build_schedule(&loan).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Refinance analysis
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AnalyzeInput {
    current: LoanParams,
    proposed: LoanParams,
    settings: AnalysisSettings,
}

#[napi]
pub fn analyze_refinance(input_json: String) -> NapiResult<String> {
    let input: AnalyzeInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = refi_core::analysis::analyze(&input.current, &input.proposed, &input.settings)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct SensitivityInput {
    current: LoanParams,
    proposed: LoanParams,
    settings: AnalysisSettings,
    rate_steps: Vec<Rate>,
}

#[napi]
pub fn rate_sensitivity(input_json: String) -> NapiResult<String> {
    let input: SensitivityInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = refi_core::analysis::rate_sensitivity(
        &input.current,
        &input.proposed,
        &input.settings,
        &input.rate_steps,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Accelerated payoff
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PayoffInput {
    loan: LoanParams,
    target_payment: Money,
}

#[napi]
pub fn plan_accelerated_payoff(input_json: String) -> NapiResult<String> {
    let input: PayoffInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = refi_core::payoff::plan_accelerated_payoff(&input.loan, input.target_payment)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
