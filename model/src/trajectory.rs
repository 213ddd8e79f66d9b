use anyhow::Result;

use citysim::{CarID, Field, FrameNum, Row, Table};

/// A read-only view of one vehicle's rows, borrowed from the index's table.
#[derive(Clone, Copy, Debug)]
pub struct Trajectory<'a> {
    car_id: &'a CarID,
    table: &'a Table,
    rows: &'a [Row],
}

impl<'a> Trajectory<'a> {
    pub(crate) fn new(car_id: &'a CarID, table: &'a Table, rows: &'a [Row]) -> Self {
        Self {
            car_id,
            table,
            rows,
        }
    }

    pub fn car_id(&self) -> &'a CarID {
        self.car_id
    }

    /// Sorted by frame
    pub fn rows(&self) -> &'a [Row] {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn frames(&self) -> impl Iterator<Item = FrameNum> + 'a {
        self.rows.iter().map(|row| row.frame)
    }

    pub fn start_frame(&self) -> Option<FrameNum> {
        self.rows.first().map(|row| row.frame)
    }

    pub fn end_frame(&self) -> Option<FrameNum> {
        self.rows.last().map(|row| row.frame)
    }

    /// All values of one payload column, in row order
    pub fn column(&self, field: Field) -> Result<Vec<f64>> {
        match self.table.column_index(field) {
            Some(idx) => Ok(self.rows.iter().map(|row| row.values[idx]).collect()),
            None => bail!("{} wasn't loaded", field.name()),
        }
    }

    pub fn value(&self, row: usize, field: Field) -> Option<f64> {
        self.table.value(self.rows.get(row)?, field)
    }
}
