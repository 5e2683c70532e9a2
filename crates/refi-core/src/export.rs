//! Flat-record views for delimited-text export.
//!
//! Every schedule-shaped result can be rendered as a header row plus one
//! row per period, which is the only contract the export layers depend on.

use serde::Serialize;

use crate::amortization::AmortizationSchedule;
use crate::analysis::RefinanceAnalysis;
use crate::market::RateCacheEntry;
use crate::payoff::PayoffPlan;

/// Ordered columns and rows, ready for a delimited writer.
#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

/// Anything representable as one flat record per period.
pub trait Tabular {
    fn table_view(&self) -> TableView;
}

impl Tabular for AmortizationSchedule {
    fn table_view(&self) -> TableView {
        let has_dates = self.entries.first().is_some_and(|e| e.date.is_some());
        let mut columns = vec!["period"];
        if has_dates {
            columns.push("date");
        }
        columns.extend([
            "payment",
            "interest",
            "principal",
            "balance",
            "cumulative_interest",
        ]);

        let rows = self
            .entries
            .iter()
            .map(|e| {
                let mut row = vec![e.period.to_string()];
                if has_dates {
                    row.push(e.date.map(|d| d.to_string()).unwrap_or_default());
                }
                row.extend([
                    e.payment.to_string(),
                    e.interest.to_string(),
                    e.principal.to_string(),
                    e.balance.to_string(),
                    e.cumulative_interest.to_string(),
                ]);
                row
            })
            .collect();

        TableView { columns, rows }
    }
}

impl Tabular for RefinanceAnalysis {
    fn table_view(&self) -> TableView {
        let rows = (0..self.horizon_months as usize)
            .map(|i| {
                vec![
                    (i + 1).to_string(),
                    self.nominal_deltas[i].to_string(),
                    self.after_tax_deltas[i].to_string(),
                    self.cumulative_nominal[i].round_dp(2).to_string(),
                    self.cumulative_npv[i].round_dp(2).to_string(),
                ]
            })
            .collect();

        TableView {
            columns: vec![
                "period",
                "nominal_delta",
                "after_tax_delta",
                "cumulative_nominal",
                "cumulative_npv",
            ],
            rows,
        }
    }
}

impl Tabular for PayoffPlan {
    fn table_view(&self) -> TableView {
        let rows = self
            .entries
            .iter()
            .map(|e| {
                vec![
                    e.period.to_string(),
                    e.payment.to_string(),
                    e.interest.to_string(),
                    e.extra_principal.to_string(),
                    e.balance.to_string(),
                ]
            })
            .collect();

        TableView {
            columns: vec!["period", "payment", "interest", "extra_principal", "balance"],
            rows,
        }
    }
}

impl Tabular for RateCacheEntry {
    fn table_view(&self) -> TableView {
        let rows = self
            .observations
            .iter()
            .map(|o| vec![o.date.to_string(), o.rate.to_string()])
            .collect();

        TableView {
            columns: vec!["date", "rate"],
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::compute_schedule;
    use crate::loan::LoanParams;
    use rust_decimal_macros::dec;

    #[test]
    fn test_schedule_table_shape() {
        let loan = LoanParams::new(dec!(1200), dec!(0), 12).unwrap();
        let view = compute_schedule(&loan).unwrap().table_view();
        assert_eq!(
            view.columns,
            vec![
                "period",
                "payment",
                "interest",
                "principal",
                "balance",
                "cumulative_interest"
            ]
        );
        assert_eq!(view.rows.len(), 12);
        assert_eq!(view.rows[0][0], "1");
        assert_eq!(view.rows[11][4], "0");
    }

    #[test]
    fn test_schedule_table_includes_dates_when_present() {
        let start = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let loan = LoanParams::new(dec!(1200), dec!(0), 2)
            .unwrap()
            .with_start_date(start);
        let view = compute_schedule(&loan).unwrap().table_view();
        assert_eq!(view.columns[1], "date");
        assert_eq!(view.rows[0][1], "2026-01-01");
    }
}
