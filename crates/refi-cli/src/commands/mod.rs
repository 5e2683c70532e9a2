pub mod analyze;
pub mod payoff;
pub mod rates;
pub mod schedule;

use refi_core::export::Tabular;
use std::fs::File;

/// Write a core table view as CSV to the given path.
pub fn write_csv(view: &impl Tabular, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let view = view.table_view();
    let mut wtr = csv::Writer::from_writer(File::create(path)?);
    wtr.write_record(&view.columns)?;
    for row in &view.rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}
