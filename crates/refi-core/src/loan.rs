//! Loan terms and their validation.
//!
//! `LoanParams` is the immutable value object every analytics entry point
//! consumes. What-if edits clone into a new instance rather than mutating.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RefiError;
use crate::time_value;
use crate::types::{Money, Rate};
use crate::RefiResult;

/// Months per year as Decimal, for periodic-rate conversion.
pub(crate) const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Terms of a single fixed-rate, fixed-term loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParams {
    /// Outstanding principal (> 0).
    pub principal: Money,
    /// Annual interest rate as a decimal (0.065 = 6.5%, >= 0).
    pub annual_rate: Rate,
    /// Term in months (> 0).
    pub term_months: u32,
    /// One-off closing costs charged at origination (>= 0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_costs: Option<Money>,
    /// Marginal tax rate applied to deductible interest, in [0, 1).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Rate>,
    /// First payment date; period dates are only emitted when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl LoanParams {
    /// Construct a validated loan.
    pub fn new(principal: Money, annual_rate: Rate, term_months: u32) -> RefiResult<Self> {
        let loan = LoanParams {
            principal,
            annual_rate,
            term_months,
            closing_costs: None,
            tax_rate: None,
            start_date: None,
        };
        loan.validate()?;
        Ok(loan)
    }

    pub fn with_closing_costs(mut self, closing_costs: Money) -> Self {
        self.closing_costs = Some(closing_costs);
        self
    }

    pub fn with_tax_rate(mut self, tax_rate: Rate) -> Self {
        self.tax_rate = Some(tax_rate);
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Field-level validation. Reports the first offending field.
    pub fn validate(&self) -> RefiResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(RefiError::Validation {
                field: "principal".into(),
                reason: "Principal must be positive".into(),
            });
        }
        if self.annual_rate < Decimal::ZERO {
            return Err(RefiError::Validation {
                field: "annual_rate".into(),
                reason: "Annual rate must be non-negative".into(),
            });
        }
        if self.term_months == 0 {
            return Err(RefiError::Validation {
                field: "term_months".into(),
                reason: "Term must be at least one month".into(),
            });
        }
        if let Some(costs) = self.closing_costs {
            if costs < Decimal::ZERO {
                return Err(RefiError::Validation {
                    field: "closing_costs".into(),
                    reason: "Closing costs must be non-negative".into(),
                });
            }
        }
        if let Some(tax) = self.tax_rate {
            if tax < Decimal::ZERO || tax >= Decimal::ONE {
                return Err(RefiError::Validation {
                    field: "tax_rate".into(),
                    reason: "Tax rate must be in [0, 1)".into(),
                });
            }
        }
        Ok(())
    }

    /// Periodic (monthly) interest rate.
    pub fn monthly_rate(&self) -> Rate {
        self.annual_rate / MONTHS_PER_YEAR
    }

    /// Level monthly payment, unrounded. Straight-line when the rate is zero.
    pub fn monthly_payment(&self) -> RefiResult<Money> {
        time_value::pmt(self.monthly_rate(), self.term_months, self.principal)
    }

    /// Closing costs, defaulting to zero when unset.
    pub fn closing_costs_or_zero(&self) -> Money {
        self.closing_costs.unwrap_or(Decimal::ZERO)
    }
}
