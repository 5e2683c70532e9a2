use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::RefiError;
use crate::types::{Money, Rate};
use crate::RefiResult;

/// Net Present Value of a series of cash flows.
///
/// The first flow sits at period 0 (undiscounted); each subsequent flow is
/// discounted one further period at `rate`.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> RefiResult<Money> {
    if rate <= dec!(-1) {
        return Err(RefiError::InvalidSettings {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(RefiError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Level payment that amortises `principal` to zero over `nper` periods at
/// the periodic `rate`. Returned as a positive, unrounded amount.
pub fn pmt(rate: Rate, nper: u32, principal: Money) -> RefiResult<Money> {
    if nper == 0 {
        return Err(RefiError::Validation {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r.powi(nper as i64);
    let denom = factor - Decimal::ONE;

    if denom.is_zero() {
        return Err(RefiError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    Ok(principal * rate * factor / denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_at_floor() {
        let cfs = vec![dec!(-100), dec!(50)];
        assert!(npv(dec!(-1), &cfs).is_err());
    }

    #[test]
    fn test_pmt_reference_mortgage() {
        // 300k at 6%/12 over 360 months: classic 1798.65 payment
        let result = pmt(dec!(0.005), 360, dec!(300000)).unwrap();
        assert!((result - dec!(1798.65)).abs() < dec!(0.01));
    }

    #[test]
    fn test_pmt_zero_rate_straight_line() {
        let result = pmt(dec!(0), 120, dec!(12000)).unwrap();
        assert_eq!(result, dec!(100));
    }
}
