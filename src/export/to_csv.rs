use csv::Writer;

use crate::errors::ExportResult;
use crate::models::Row;

/// Render rows as CSV: one header line of `columns`, then one line per row.
///
/// Values are looked up by column name; a column missing from a row renders empty.
pub fn render(columns: &[String], rows: &[Row]) -> ExportResult<Vec<u8>> {
    let mut wtr = Writer::from_writer(vec![]);

    wtr.write_record(columns)?;

    for row in rows {
        wtr.write_record(
            columns
                .iter()
                .map(|column| row.get(column).map(|v| v.to_string()).unwrap_or_default()),
        )?;
    }

    Ok(wtr.into_inner()?)
}
