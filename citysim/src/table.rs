use anyhow::Result;

use crate::{CarID, Field, FrameNum};

/// One vehicle observed in one frame
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub car_id: CarID,
    pub frame: FrameNum,
    /// One entry per payload column of the owning table. Empty cells are NaN.
    pub values: Vec<f64>,
}

impl Row {
    pub fn new(car_id: CarID, frame: FrameNum, values: Vec<f64>) -> Self {
        Self {
            car_id,
            frame,
            values,
        }
    }
}

/// Rows sharing one payload schema
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    schema: Vec<Field>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(schema: Vec<Field>) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(schema: Vec<Field>, rows: Vec<Row>) -> Result<Self> {
        let mut table = Self::new(schema);
        table.rows.reserve(rows.len());
        for row in rows {
            table.push(row)?;
        }
        Ok(table)
    }

    pub fn push(&mut self, row: Row) -> Result<()> {
        if row.values.len() != self.schema.len() {
            bail!(
                "Row for {} at {} has {} values, but the table has {} payload columns",
                row.car_id,
                row.frame,
                row.values.len(),
                self.schema.len()
            );
        }
        self.rows.push(row);
        Ok(())
    }

    /// The payload columns, not including carId and frameNum
    pub fn schema(&self) -> &[Field] {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, field: Field) -> Option<usize> {
        self.schema.iter().position(|f| *f == field)
    }

    /// None if the field isn't a loaded payload column, or the row is too short to have it
    pub fn value(&self, row: &Row, field: Field) -> Option<f64> {
        row.values.get(self.column_index(field)?).copied()
    }

    /// Stable sort by vehicle, then frame. Rows with the same vehicle and frame keep their input
    /// order.
    pub fn sort_by_identity(&mut self) {
        self.rows.sort_by(|a, b| {
            a.car_id
                .cmp(&b.car_id)
                .then_with(|| a.frame.cmp(&b.frame))
        });
    }

    /// Multiplies every value in one column. Returns false if the column isn't loaded.
    pub fn scale_column(&mut self, field: Field, factor: f64) -> bool {
        let idx = match self.column_index(field) {
            Some(idx) => idx,
            None => return false,
        };
        for row in &mut self.rows {
            row.values[idx] *= factor;
        }
        true
    }

    /// All rows of self, then all rows of other
    pub fn concat(&self, other: &Table) -> Result<Table> {
        if self.schema != other.schema {
            bail!(
                "Can't concatenate tables with different columns: {:?} vs {:?}",
                self.schema,
                other.schema
            );
        }
        let mut rows = Vec::with_capacity(self.len() + other.len());
        rows.extend_from_slice(&self.rows);
        rows.extend_from_slice(&other.rows);
        Ok(Table {
            schema: self.schema.clone(),
            rows,
        })
    }
}
