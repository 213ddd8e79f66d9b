//! Reading CitySim trajectory exports: one CSV row per vehicle per video frame.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod ids;
mod read;
mod schema;
mod table;

pub use ids::{CarID, FrameNum};
pub use read::read_table;
pub use schema::{ColumnSelection, Field, COLUMNS};
pub use table::{Row, Table};
