#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod boundary;
mod config;
mod index;
mod trajectory;

use abstutil::Timer;
use anyhow::Result;

pub use citysim::{CarID, ColumnSelection, Field, FrameNum, Row, Table, COLUMNS};

pub use self::boundary::{scan_boundaries, BoundaryPolicy};
pub use self::config::{LoadConfig, UnitConversions};
pub use self::index::TrajectoryIndex;
pub use self::trajectory::Trajectory;

/// Reads a CitySim CSV file and indexes its trajectories
pub fn load(path: &str, config: &LoadConfig, timer: &mut Timer) -> Result<TrajectoryIndex> {
    load_from_reader(fs_err::File::open(path)?, config, timer)
}

pub fn load_from_reader<R: std::io::Read>(
    reader: R,
    config: &LoadConfig,
    timer: &mut Timer,
) -> Result<TrajectoryIndex> {
    timer.start("read CitySim CSV");
    let table = citysim::read_table(reader, &config.columns);
    timer.stop("read CitySim CSV");
    TrajectoryIndex::new(table?, config, timer)
}
