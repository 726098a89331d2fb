use serde_json::{Map, Value};

use crate::errors::ExportResult;
use crate::models::Row;

/// Render rows as an indented JSON array. Each object carries exactly `columns`,
/// in order, with `null` for values the row does not have.
pub fn render(columns: &[String], rows: &[Row]) -> ExportResult<Vec<u8>> {
    let objects: Vec<Value> = rows
        .iter()
        .map(|row| -> ExportResult<Value> {
            let mut object = Map::with_capacity(columns.len());
            for column in columns {
                let value = match row.get(column) {
                    Some(v) => serde_json::to_value(v)?,
                    None => Value::Null,
                };
                object.insert(column.clone(), value);
            }
            Ok(Value::Object(object))
        })
        .collect::<ExportResult<_>>()?;

    let mut out = serde_json::to_vec_pretty(&objects)?;
    out.push(b'\n');
    Ok(out)
}
