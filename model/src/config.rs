use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use citysim::{ColumnSelection, Field, Table, COLUMNS};

use crate::BoundaryPolicy;

/// Everything that controls how a CitySim file becomes a `TrajectoryIndex`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub columns: ColumnSelection,
    pub conversions: UnitConversions,
    pub policy: BoundaryPolicy,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            columns: ColumnSelection::all(),
            conversions: UnitConversions::default(),
            policy: BoundaryPolicy::Exact,
        }
    }
}

impl LoadConfig {
    pub fn with_columns(fields: Vec<Field>) -> Result<Self> {
        Ok(Self {
            columns: ColumnSelection::new(fields)?,
            ..Default::default()
        })
    }

    /// Reproduce the boundaries older tooling computed
    pub fn legacy() -> Self {
        Self {
            policy: BoundaryPolicy::Legacy,
            ..Default::default()
        }
    }
}

/// One scale factor per payload column, applied once after sorting. Serialized as a JSON object
/// like `{"speed": 0.44704}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Field, f64>", into = "BTreeMap<Field, f64>")]
pub struct UnitConversions {
    factors: BTreeMap<Field, f64>,
}

impl UnitConversions {
    /// Identity columns can't be scaled, and every factor must be finite.
    pub fn new(factors: BTreeMap<Field, f64>) -> Result<Self> {
        for (field, factor) in &factors {
            if field.is_identity() {
                bail!("Can't apply a unit conversion to {}", field.name());
            }
            if !factor.is_finite() {
                bail!("Conversion factor for {} is {factor}", field.name());
            }
        }
        Ok(Self { factors })
    }

    pub fn none() -> Self {
        Self {
            factors: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.factors.get(&field).copied()
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Conversions of columns that weren't loaded are skipped.
    pub fn apply(&self, table: &mut Table) {
        for (field, factor) in &self.factors {
            if !table.scale_column(*field, *factor) {
                debug!("{} isn't loaded, not converting it", field.name());
            }
        }
    }
}

/// Every field with a known unit scale
impl Default for UnitConversions {
    fn default() -> Self {
        Self {
            factors: COLUMNS
                .into_iter()
                .filter_map(|f| f.unit_scale().map(|scale| (f, scale)))
                .collect(),
        }
    }
}

impl TryFrom<BTreeMap<Field, f64>> for UnitConversions {
    type Error = anyhow::Error;

    fn try_from(factors: BTreeMap<Field, f64>) -> Result<Self> {
        Self::new(factors)
    }
}

impl From<UnitConversions> for BTreeMap<Field, f64> {
    fn from(conversions: UnitConversions) -> Self {
        conversions.factors
    }
}
