//! Fixed-rate amortization schedules.
//!
//! Generates the per-period payment split for one `LoanParams`. All math in
//! `rust_decimal::Decimal`, rounded to cents with round-half-to-even. The
//! cent rounding of payment and interest can leave a residual balance after
//! the nominal final period; that residual is absorbed into the final
//! period's principal portion so every schedule terminates at exactly zero.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RefiError;
use crate::loan::LoanParams;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::RefiResult;

/// Cent places for all currency rounding.
const CENTS: u32 = 2;

/// Round to the currency minor unit, half-to-even.
pub(crate) fn round_cents(amount: Money) -> Money {
    amount.round_dp_with_strategy(CENTS, RoundingStrategy::MidpointNearestEven)
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One period of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodEntry {
    /// Period number (1-indexed).
    pub period: u32,
    /// Payment date, present only when the loan carries a start date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Total payment this period.
    pub payment: Money,
    /// Interest portion.
    pub interest: Money,
    /// Principal portion.
    pub principal: Money,
    /// Remaining balance after this period.
    pub balance: Money,
    /// Interest paid through this period.
    pub cumulative_interest: Money,
}

/// Complete amortization schedule for one loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    /// Per-period entries, terminating at zero balance.
    pub entries: Vec<PeriodEntry>,
    /// Level scheduled payment (the final period may differ).
    pub scheduled_payment: Money,
    /// Total interest over the life of the loan.
    pub total_interest: Money,
    /// Total of all payments made.
    pub total_paid: Money,
}

impl AmortizationSchedule {
    /// Number of periods until the balance reaches zero.
    pub fn payoff_months(&self) -> u32 {
        self.entries.last().map(|e| e.period).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the amortization schedule for a loan.
pub fn build_schedule(
    loan: &LoanParams,
) -> RefiResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();

    let schedule = compute_schedule(loan)?;

    let mut warnings = Vec::new();
    let payoff = schedule.payoff_months();
    if payoff < loan.term_months {
        warnings.push(format!(
            "Cent rounding retires the loan at month {payoff}, before the nominal term of {} months",
            loan.term_months
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-Rate Level-Payment Amortization",
        loan,
        warnings,
        elapsed,
        schedule,
    ))
}

/// Core schedule generation, shared with the analyzer and payoff planner.
pub(crate) fn compute_schedule(loan: &LoanParams) -> RefiResult<AmortizationSchedule> {
    loan.validate()
        .map_err(|e| RefiError::InvalidLoan(e.to_string()))?;

    let monthly_rate = loan.monthly_rate();
    let scheduled_payment = round_cents(loan.monthly_payment()?);

    let mut entries = Vec::with_capacity(loan.term_months as usize);
    let mut balance = round_cents(loan.principal);
    let mut cumulative_interest = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;

    for period in 1..=loan.term_months {
        let interest = round_cents(balance * monthly_rate);

        // Final period: the remaining balance, residual included, becomes
        // the principal portion so the schedule lands on exactly zero.
        let last = period == loan.term_months || balance + interest <= scheduled_payment;
        let (payment, principal) = if last {
            (interest + balance, balance)
        } else {
            (scheduled_payment, scheduled_payment - interest)
        };

        balance -= principal;
        cumulative_interest += interest;
        total_paid += payment;

        entries.push(PeriodEntry {
            period,
            date: period_date(loan.start_date, period),
            payment,
            interest,
            principal,
            balance,
            cumulative_interest,
        });

        if last {
            break;
        }
    }

    Ok(AmortizationSchedule {
        entries,
        scheduled_payment,
        total_interest: cumulative_interest,
        total_paid,
    })
}

/// Month-stepped payment date for a period, when the loan has a start date.
fn period_date(start_date: Option<NaiveDate>, period: u32) -> Option<NaiveDate> {
    start_date.and_then(|d| d.checked_add_months(Months::new(period - 1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loan(principal: Decimal, rate: Decimal, term: u32) -> LoanParams {
        LoanParams::new(principal, rate, term).unwrap()
    }

    #[test]
    fn test_round_cents_half_to_even() {
        assert_eq!(round_cents(dec!(1.005)), dec!(1.00));
        assert_eq!(round_cents(dec!(1.015)), dec!(1.02));
        assert_eq!(round_cents(dec!(1.0051)), dec!(1.01));
    }

    #[test]
    fn test_zero_rate_straight_line() {
        let schedule = compute_schedule(&loan(dec!(1200), dec!(0), 12)).unwrap();
        assert_eq!(schedule.scheduled_payment, dec!(100));
        assert_eq!(schedule.entries.len(), 12);
        assert_eq!(schedule.total_interest, dec!(0));
        assert_eq!(schedule.entries.last().unwrap().balance, dec!(0));
    }

    #[test]
    fn test_single_period_loan() {
        let schedule = compute_schedule(&loan(dec!(1000), dec!(0.12), 1)).unwrap();
        assert_eq!(schedule.entries.len(), 1);
        let entry = &schedule.entries[0];
        assert_eq!(entry.interest, dec!(10.00));
        assert_eq!(entry.principal, dec!(1000));
        assert_eq!(entry.balance, dec!(0));
    }

    #[test]
    fn test_invalid_loan_reported() {
        let mut bad = loan(dec!(1000), dec!(0.05), 12);
        bad.principal = dec!(-1);
        match compute_schedule(&bad).unwrap_err() {
            RefiError::InvalidLoan(msg) => assert!(msg.contains("principal")),
            other => panic!("expected InvalidLoan, got {other:?}"),
        }
    }

    #[test]
    fn test_period_dates_step_monthly() {
        let start = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        let l = loan(dec!(1200), dec!(0), 3).with_start_date(start);
        let schedule = compute_schedule(&l).unwrap();
        let dates: Vec<_> = schedule.entries.iter().filter_map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            ]
        );
    }
}
