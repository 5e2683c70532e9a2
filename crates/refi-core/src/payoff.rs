//! Accelerated payoff planning.
//!
//! Re-amortizes the proposed loan at a fixed payment above its own minimum,
//! typically the borrower's current payment, so a refinance can keep the
//! household budget unchanged while retiring the loan early.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{compute_schedule, round_cents};
use crate::error::RefiError;
use crate::loan::LoanParams;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::RefiResult;

/// One period of an accelerated payoff schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffEntry {
    /// Period number (1-indexed).
    pub period: u32,
    /// Payment made this period (the target, except possibly the last).
    pub payment: Money,
    /// Interest portion.
    pub interest: Money,
    /// Principal paid beyond the loan's own scheduled payment.
    pub extra_principal: Money,
    /// Remaining balance after this period.
    pub balance: Money,
}

/// Result of re-amortizing at a fixed target payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffPlan {
    /// The fixed payment applied each period.
    pub target_payment: Money,
    pub entries: Vec<PayoffEntry>,
    /// Month at which the balance reaches zero.
    pub payoff_month: u32,
    /// Total interest paid under the accelerated plan.
    pub total_interest: Money,
    /// Interest saved versus the loan's standard schedule.
    pub interest_saved: Money,
    /// Months shaved off the standard payoff.
    pub months_saved: u32,
}

/// Re-amortize `loan` at the fixed `target_payment`.
///
/// Fails with `InfeasiblePlan` when the target sits below the loan's own
/// scheduled payment: extra principal would be negative and the balance
/// would amortize slower than contracted (or grow outright).
pub fn plan_accelerated_payoff(
    loan: &LoanParams,
    target_payment: Money,
) -> RefiResult<ComputationOutput<PayoffPlan>> {
    let start = Instant::now();

    let standard = compute_schedule(loan)?;
    let minimum = standard.scheduled_payment;
    let target = round_cents(target_payment);

    if target < minimum {
        return Err(RefiError::InfeasiblePlan(format!(
            "Target payment {target} is below the minimum scheduled payment {minimum}"
        )));
    }

    let monthly_rate = loan.monthly_rate();
    let mut entries = Vec::new();
    let mut balance = round_cents(loan.principal);
    let mut total_interest = Decimal::ZERO;

    for period in 1..=loan.term_months {
        let interest = round_cents(balance * monthly_rate);

        let last = balance + interest <= target;
        let payment = if last { interest + balance } else { target };
        let principal = payment - interest;
        // The final short payment can fall below the scheduled minimum;
        // extra principal never goes negative.
        let extra_principal = (payment - minimum).max(Decimal::ZERO);

        balance -= principal;
        total_interest += interest;

        entries.push(PayoffEntry {
            period,
            payment,
            interest,
            extra_principal,
            balance,
        });

        if last {
            break;
        }
    }

    let payoff_month = entries.last().map(|e| e.period).unwrap_or(0);
    let plan = PayoffPlan {
        target_payment: target,
        payoff_month,
        interest_saved: standard.total_interest - total_interest,
        months_saved: standard.payoff_months() - payoff_month,
        total_interest,
        entries,
    };

    let mut warnings = Vec::new();
    if target == minimum {
        warnings.push(
            "Target payment equals the scheduled payment; the plan matches the standard schedule"
                .to_string(),
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-Payment Accelerated Amortization",
        &(loan, target_payment),
        warnings,
        elapsed,
        plan,
    ))
}
