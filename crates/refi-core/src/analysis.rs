//! Refinance comparison: payment deltas, NPV savings, breakeven, holding
//! periods, and rate sensitivity.
//!
//! Compares a current loan against a proposed refinance by aligning both
//! amortization schedules period by period. Closing costs on the proposed
//! loan enter the discounted savings stream at period 0. Breakeven uses a
//! sustained rule: the first period at which cumulative NPV savings turn
//! non-negative and remain non-negative through the horizon, so a savings
//! curve that dips back below zero never reports a false breakeven.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{compute_schedule, round_cents, AmortizationSchedule};
use crate::error::RefiError;
use crate::loan::{LoanParams, MONTHS_PER_YEAR};
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::RefiResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Holding-period horizons evaluated by default, in months (2/5/10/30 years).
const DEFAULT_HOLDING_MONTHS: [u32; 4] = [24, 60, 120, 360];

/// Half-width of the NPV band treated as a marginal verdict.
const DEFAULT_MARGINAL_TOLERANCE: Decimal = dec!(500);

/// Horizon used for the sensitivity table's NPV column (5 years).
const SENSITIVITY_NPV_MONTHS: u32 = 60;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Settings governing a refinance comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Annual discount rate for NPV (opportunity cost of cash).
    pub discount_rate: Rate,
    /// Overrides the loans' own marginal tax rate when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Rate>,
    /// Comparison horizon in months; defaults to the shorter payoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon_months: Option<u32>,
    /// Half-width of the NPV band reported as Marginal (default 500).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marginal_tolerance: Option<Money>,
}

impl AnalysisSettings {
    /// Flat comparison at the given annual discount rate.
    pub fn new(discount_rate: Rate) -> Self {
        AnalysisSettings {
            discount_rate,
            tax_rate: None,
            horizon_months: None,
            marginal_tolerance: None,
        }
    }

    fn validate(&self) -> RefiResult<()> {
        if self.discount_rate <= dec!(-1) {
            return Err(RefiError::InvalidSettings {
                field: "discount_rate".into(),
                reason: "Discount rate must be greater than -100%".into(),
            });
        }
        if self.horizon_months == Some(0) {
            return Err(RefiError::InvalidSettings {
                field: "horizon_months".into(),
                reason: "Horizon must be at least one month".into(),
            });
        }
        if let Some(tax) = self.tax_rate {
            if tax < Decimal::ZERO || tax >= Decimal::ONE {
                return Err(RefiError::InvalidSettings {
                    field: "tax_rate".into(),
                    reason: "Tax rate must be in [0, 1)".into(),
                });
            }
        }
        if let Some(tol) = self.marginal_tolerance {
            if tol < Decimal::ZERO {
                return Err(RefiError::InvalidSettings {
                    field: "marginal_tolerance".into(),
                    reason: "Tolerance must be non-negative".into(),
                });
            }
        }
        Ok(())
    }

    fn tolerance(&self) -> Money {
        self.marginal_tolerance.unwrap_or(DEFAULT_MARGINAL_TOLERANCE)
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Ternary verdict for one holding period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Favorable,
    Marginal,
    Unfavorable,
}

/// NPV savings if the borrower keeps the loan for a fixed horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingPeriodRow {
    /// Holding period in months.
    pub horizon_months: u32,
    /// Cumulative NPV savings at that horizon, net of closing costs.
    pub npv_savings: Money,
    pub verdict: Verdict,
}

/// Full refinance comparison result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceAnalysis {
    pub current_schedule: AmortizationSchedule,
    pub proposed_schedule: AmortizationSchedule,
    /// Months actually compared (shorter payoff, clamped by settings).
    pub horizon_months: u32,
    /// Current payment minus proposed payment, per period.
    pub nominal_deltas: Vec<Money>,
    /// Nominal deltas net of the lost/gained interest deduction.
    pub after_tax_deltas: Vec<Money>,
    /// Running total of nominal deltas (no discounting, no closing costs).
    pub cumulative_nominal: Vec<Money>,
    /// Running NPV of after-tax deltas, net of closing costs at period 0.
    pub cumulative_npv: Vec<Money>,
    /// First month at which cumulative NPV savings become and stay >= 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakeven_month: Option<u32>,
    /// Undiscounted closing costs / first-month savings, when positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simple_breakeven_months: Option<Decimal>,
    pub holding_periods: Vec<HoldingPeriodRow>,
    /// Discounted cost of every payment remaining on the current loan.
    pub current_total_cost_npv: Money,
    /// Discounted cost of every payment on the proposed loan.
    pub proposed_total_cost_npv: Money,
    /// Current minus proposed cost NPV, net of closing costs.
    pub total_cost_npv_advantage: Money,
    pub recommendation: String,
}

/// One calendar year of the side-by-side principal comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyComparisonRow {
    /// Loan year (1-indexed).
    pub year: u32,
    pub current_interest: Money,
    pub current_principal: Money,
    pub current_balance: Money,
    pub proposed_interest: Money,
    pub proposed_principal: Money,
    pub proposed_balance: Money,
    /// Proposed principal paid minus current principal paid, this year.
    pub principal_diff: Money,
}

/// One candidate rate in a sensitivity sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub proposed_rate: Rate,
    /// First-month nominal payment savings at this rate.
    pub monthly_savings: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakeven_month: Option<u32>,
    /// NPV savings at the 5-year mark (clipped to the horizon).
    pub five_year_npv: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare a current loan against a proposed refinance.
pub fn analyze(
    current: &LoanParams,
    proposed: &LoanParams,
    settings: &AnalysisSettings,
) -> RefiResult<ComputationOutput<RefinanceAnalysis>> {
    let start = Instant::now();

    let (analysis, warnings) = compute_analysis(current, proposed, settings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "After-Tax NPV Refinance Comparison",
        &(current, proposed, settings),
        warnings,
        elapsed,
        analysis,
    ))
}

/// Sweep the proposed rate over `rate_steps`, re-running the comparison.
pub fn rate_sensitivity(
    current: &LoanParams,
    proposed: &LoanParams,
    settings: &AnalysisSettings,
    rate_steps: &[Rate],
) -> RefiResult<ComputationOutput<Vec<SensitivityRow>>> {
    let start = Instant::now();

    let mut rows = Vec::with_capacity(rate_steps.len());
    for &rate in rate_steps {
        let mut candidate = proposed.clone();
        candidate.annual_rate = rate;
        let (analysis, _) = compute_analysis(current, &candidate, settings)?;

        let npv_month = SENSITIVITY_NPV_MONTHS.min(analysis.horizon_months);
        let five_year_npv = analysis
            .cumulative_npv
            .get(npv_month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or(Decimal::ZERO);

        rows.push(SensitivityRow {
            proposed_rate: rate,
            monthly_savings: analysis.nominal_deltas.first().copied().unwrap_or_default(),
            breakeven_month: analysis.breakeven_month,
            five_year_npv: round_cents(five_year_npv),
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Proposed-Rate Sensitivity Sweep",
        &(current, proposed, settings, rate_steps),
        Vec::new(),
        elapsed,
        rows,
    ))
}

/// Year-by-year principal/interest comparison of two schedules.
pub fn yearly_comparison(
    current: &AmortizationSchedule,
    proposed: &AmortizationSchedule,
) -> Vec<YearlyComparisonRow> {
    let max_months = current.payoff_months().max(proposed.payoff_months());
    let years = max_months.div_ceil(12);

    (1..=years)
        .map(|year| {
            let (cur_int, cur_prin, cur_bal) = year_totals(current, year);
            let (new_int, new_prin, new_bal) = year_totals(proposed, year);
            YearlyComparisonRow {
                year,
                current_interest: cur_int,
                current_principal: cur_prin,
                current_balance: cur_bal,
                proposed_interest: new_int,
                proposed_principal: new_prin,
                proposed_balance: new_bal,
                principal_diff: new_prin - cur_prin,
            }
        })
        .collect()
}

fn year_totals(schedule: &AmortizationSchedule, year: u32) -> (Money, Money, Money) {
    let first = (year - 1) * 12 + 1;
    let last = year * 12;

    let mut interest = Decimal::ZERO;
    let mut principal = Decimal::ZERO;
    // Paid-off loans stay at zero for the remaining comparison years.
    let mut balance = Decimal::ZERO;

    for entry in &schedule.entries {
        if entry.period > last {
            break;
        }
        if entry.period >= first {
            interest += entry.interest;
            principal += entry.principal;
            balance = entry.balance;
        }
    }

    (interest, principal, balance)
}

// ---------------------------------------------------------------------------
// Comparison core
// ---------------------------------------------------------------------------

fn compute_analysis(
    current: &LoanParams,
    proposed: &LoanParams,
    settings: &AnalysisSettings,
) -> RefiResult<(RefinanceAnalysis, Vec<String>)> {
    settings.validate()?;

    let current_schedule = compute_schedule(current)?;
    let proposed_schedule = compute_schedule(proposed)?;

    let mut warnings = Vec::new();

    let shorter = current_schedule
        .payoff_months()
        .min(proposed_schedule.payoff_months());
    let horizon = match settings.horizon_months {
        Some(h) if h > shorter => {
            warnings.push(format!(
                "Requested horizon of {h} months clamped to the shorter payoff of {shorter} months"
            ));
            shorter
        }
        Some(h) => h,
        None => shorter,
    };

    let tax_rate = settings
        .tax_rate
        .or(proposed.tax_rate)
        .or(current.tax_rate)
        .unwrap_or(Decimal::ZERO);
    let closing_costs = proposed.closing_costs_or_zero();
    let monthly_discount = settings.discount_rate / MONTHS_PER_YEAR;
    let one_plus_d = Decimal::ONE + monthly_discount;

    let mut nominal_deltas = Vec::with_capacity(horizon as usize);
    let mut after_tax_deltas = Vec::with_capacity(horizon as usize);
    let mut cumulative_nominal = Vec::with_capacity(horizon as usize);
    let mut cumulative_npv = Vec::with_capacity(horizon as usize);

    let mut nominal_running = Decimal::ZERO;
    let mut npv_running = -closing_costs;
    let mut discount = Decimal::ONE;

    for i in 0..horizon as usize {
        let cur = &current_schedule.entries[i];
        let prop = &proposed_schedule.entries[i];

        let nominal = cur.payment - prop.payment;
        // A tax rate shrinks each loan's effective cost by the deductible
        // interest; the delta loses the difference in deductions.
        let after_tax = nominal - tax_rate * (cur.interest - prop.interest);

        nominal_running += nominal;
        discount *= one_plus_d;
        if discount.is_zero() {
            return Err(RefiError::DivisionByZero {
                context: format!("discount factor at month {}", i + 1),
            });
        }
        npv_running += after_tax / discount;

        nominal_deltas.push(nominal);
        after_tax_deltas.push(after_tax);
        cumulative_nominal.push(nominal_running);
        cumulative_npv.push(npv_running);
    }

    let breakeven_month = sustained_breakeven(&cumulative_npv);
    let simple_breakeven_months = nominal_deltas
        .first()
        .filter(|&&d| d > Decimal::ZERO)
        .map(|&d| closing_costs / d);

    let holding_periods =
        holding_period_table(&after_tax_deltas, closing_costs, monthly_discount, settings)?;

    let current_total_cost_npv = round_cents(total_cost_npv(&current_schedule, one_plus_d)?);
    let proposed_total_cost_npv = round_cents(total_cost_npv(&proposed_schedule, one_plus_d)?);
    let total_cost_npv_advantage = current_total_cost_npv - proposed_total_cost_npv - closing_costs;

    let tolerance = settings.tolerance();
    let final_npv = cumulative_npv.last().copied().unwrap_or(-closing_costs);
    let recommendation = match breakeven_month {
        None => {
            warnings.push(format!(
                "Cumulative NPV savings never turn and stay non-negative within {horizon} months"
            ));
            "Does not break even within horizon".to_string()
        }
        Some(month) if final_npv > tolerance => {
            format!("Refinance favorable: breaks even at month {month}")
        }
        Some(month) => format!(
            "Marginal: breaks even at month {month} but the NPV advantage stays within tolerance"
        ),
    };

    Ok((
        RefinanceAnalysis {
            current_schedule,
            proposed_schedule,
            horizon_months: horizon,
            nominal_deltas,
            after_tax_deltas,
            cumulative_nominal,
            cumulative_npv,
            breakeven_month,
            simple_breakeven_months,
            holding_periods,
            current_total_cost_npv,
            proposed_total_cost_npv,
            total_cost_npv_advantage,
            recommendation,
        },
        warnings,
    ))
}

/// First month whose cumulative savings are non-negative and never dip
/// below zero again through the horizon. A plain first-crossing scan would
/// accept curves that recover briefly and then go back under water.
fn sustained_breakeven(cumulative_npv: &[Money]) -> Option<u32> {
    let mut suffix_min = Decimal::MAX;
    let mut breakeven = None;

    for (i, &value) in cumulative_npv.iter().enumerate().rev() {
        suffix_min = suffix_min.min(value);
        if suffix_min >= Decimal::ZERO {
            breakeven = Some(i as u32 + 1);
        }
    }
    breakeven
}

/// Discounted cost of a schedule's full payment stream.
fn total_cost_npv(schedule: &AmortizationSchedule, one_plus_d: Decimal) -> RefiResult<Money> {
    let mut npv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for entry in &schedule.entries {
        discount *= one_plus_d;
        if discount.is_zero() {
            return Err(RefiError::DivisionByZero {
                context: format!("discount factor at month {}", entry.period),
            });
        }
        npv += entry.payment / discount;
    }
    Ok(npv)
}

fn holding_period_table(
    after_tax_deltas: &[Money],
    closing_costs: Money,
    monthly_discount: Rate,
    settings: &AnalysisSettings,
) -> RefiResult<Vec<HoldingPeriodRow>> {
    let horizon = after_tax_deltas.len() as u32;
    let tolerance = settings.tolerance();

    let mut rows: Vec<HoldingPeriodRow> = Vec::new();
    for months in DEFAULT_HOLDING_MONTHS {
        let clipped = months.min(horizon);
        if clipped == 0 || rows.iter().any(|r| r.horizon_months == clipped) {
            continue;
        }

        let mut flows = Vec::with_capacity(clipped as usize + 1);
        flows.push(-closing_costs);
        flows.extend_from_slice(&after_tax_deltas[..clipped as usize]);
        let npv_savings = round_cents(time_value::npv(monthly_discount, &flows)?);

        let verdict = if npv_savings > tolerance {
            Verdict::Favorable
        } else if npv_savings < -tolerance {
            Verdict::Unfavorable
        } else {
            Verdict::Marginal
        };

        rows.push(HoldingPeriodRow {
            horizon_months: clipped,
            npv_savings,
            verdict,
        });
    }

    Ok(rows)
}
