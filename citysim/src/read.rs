use anyhow::{Context, Result};
use csv::StringRecord;
use serde::Deserialize;

use crate::{CarID, ColumnSelection, Field, FrameNum, Row, Table};

/// Reads a CitySim CSV, keeping only the selected columns. Rows come back in file order.
pub fn read_table<R: std::io::Read>(reader: R, selection: &ColumnSelection) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();

    // Check up-front, so a missing column is reported once instead of per record
    find_column(&headers, Field::CarId)?;
    find_column(&headers, Field::FrameNum)?;
    let mut payload_cols = Vec::new();
    for field in selection.payload() {
        payload_cols.push((*field, find_column(&headers, *field)?));
    }

    let mut table = Table::new(selection.payload().to_vec());
    for rec in reader.records() {
        let rec = rec?;
        let line = rec.position().map(|pos| pos.line()).unwrap_or(0);

        let identity: Identity = rec
            .deserialize(Some(&headers))
            .with_context(|| format!("line {line}, columns carId and frameNum"))?;
        let car_id =
            CarID::parse(&identity.car_id).with_context(|| format!("line {line}, column carId"))?;
        let mut values = Vec::with_capacity(payload_cols.len());
        for (field, idx) in &payload_cols {
            values.push(
                parse_value(cell(&rec, *idx))
                    .with_context(|| format!("line {line}, column {}", field.name()))?,
            );
        }
        table.push(Row::new(car_id, identity.frame, values))?;
    }

    if headers.len() > payload_cols.len() + 2 {
        debug!(
            "Skipped {} unselected columns",
            headers.len() - payload_cols.len() - 2
        );
    }
    info!(
        "Read {} CitySim rows with {} payload columns",
        table.len(),
        table.schema().len()
    );
    Ok(table)
}

#[derive(Deserialize)]
struct Identity {
    #[serde(rename = "carId")]
    car_id: String,
    #[serde(rename = "frameNum")]
    frame: FrameNum,
}

fn find_column(headers: &StringRecord, field: Field) -> Result<usize> {
    match headers.iter().position(|h| h == field.name()) {
        Some(idx) => Ok(idx),
        None => bail!("CitySim CSV is missing the {} column", field.name()),
    }
}

fn cell(rec: &StringRecord, idx: usize) -> &str {
    rec.get(idx).unwrap_or("")
}

fn parse_value(raw: &str) -> Result<f64> {
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    match raw.parse::<f64>() {
        Ok(x) => Ok(x),
        Err(err) => bail!("Bad value {raw:?}: {err}"),
    }
}
