use serde::{Deserialize, Serialize};

use citysim::{CarID, Row};

/// How trajectory boundaries are computed when indexing and when concatenating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Compare every adjacent pair of rows. Concatenation offsets the right side by the left
    /// side's row count.
    #[default]
    Exact,
    /// Reproduce two quirks of older tooling: the last adjacent pair is never compared, so a
    /// vehicle change right at the end of the table goes unnoticed, and concatenation offsets the
    /// right side by the left side's row count plus one.
    Legacy,
}

impl BoundaryPolicy {
    fn pairs_to_compare(self, num_rows: usize) -> usize {
        match self {
            BoundaryPolicy::Exact => num_rows.saturating_sub(1),
            BoundaryPolicy::Legacy => num_rows.saturating_sub(2),
        }
    }

    /// Added to every boundary of the right operand when concatenating
    pub fn merge_offset(self, left_rows: usize) -> usize {
        match self {
            BoundaryPolicy::Exact => left_rows,
            BoundaryPolicy::Legacy => left_rows + 1,
        }
    }
}

/// Finds where each vehicle's run of rows begins. The rows must already be sorted by vehicle.
/// Returns the starting offsets and the vehicle of each run, in the same order. Empty input
/// produces nothing.
pub fn scan_boundaries(rows: &[Row], policy: BoundaryPolicy) -> (Vec<usize>, Vec<CarID>) {
    let mut starts = Vec::new();
    let mut ids = Vec::new();
    if rows.is_empty() {
        return (starts, ids);
    }

    starts.push(0);
    ids.push(rows[0].car_id.clone());
    for i in 0..policy.pairs_to_compare(rows.len()) {
        if rows[i].car_id != rows[i + 1].car_id {
            starts.push(i + 1);
            ids.push(rows[i + 1].car_id.clone());
        }
    }

    if policy == BoundaryPolicy::Legacy && rows.len() >= 2 {
        let last = rows.len() - 1;
        if rows[last - 1].car_id != rows[last].car_id {
            warn!(
                "Legacy boundary scan merges {} into the trajectory of {}",
                rows[last].car_id,
                rows[last - 1].car_id
            );
        }
    }

    (starts, ids)
}
