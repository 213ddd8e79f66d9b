use std::sync::Arc;

use abstutil::{prettyprint_usize, Timer};
use anyhow::Result;

use citysim::{CarID, Table};

use crate::{scan_boundaries, BoundaryPolicy, LoadConfig, Trajectory};

/// Rows grouped into one trajectory per vehicle. Immutable once built; cloning is cheap.
#[derive(Clone, Debug)]
pub struct TrajectoryIndex {
    table: Arc<Table>,
    // Row offset where each trajectory begins. Strictly increasing, starting at 0.
    boundaries: Vec<usize>,
    // Parallel to boundaries
    identifiers: Vec<CarID>,
    policy: BoundaryPolicy,
}

impl TrajectoryIndex {
    /// Sorts the rows by vehicle and frame, applies unit conversions, then finds where each
    /// vehicle's trajectory begins.
    pub fn new(mut table: Table, config: &LoadConfig, timer: &mut Timer) -> Result<Self> {
        if table.is_empty() {
            bail!("Empty dataset, there are no trajectories to index");
        }

        timer.start("sort rows");
        table.sort_by_identity();
        timer.stop("sort rows");

        config.conversions.apply(&mut table);

        timer.start("scan boundaries");
        let (boundaries, identifiers) = scan_boundaries(table.rows(), config.policy);
        timer.stop("scan boundaries");

        info!(
            "Indexed {} rows into {} trajectories",
            prettyprint_usize(table.len()),
            prettyprint_usize(boundaries.len())
        );
        Ok(Self {
            table: Arc::new(table),
            boundaries,
            identifiers,
            policy: config.policy,
        })
    }

    /// The number of trajectories
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn get(&self, idx: usize) -> Result<Trajectory<'_>> {
        if idx >= self.len() {
            bail!(
                "Trajectory {idx} out of range; there are only {}",
                self.len()
            );
        }
        Ok(self.trajectory(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = Trajectory<'_>> + '_ {
        (0..self.len()).map(move |idx| self.trajectory(idx))
    }

    // Panics if idx is out of range
    fn trajectory(&self, idx: usize) -> Trajectory<'_> {
        let num_rows = self.table.len();
        // Legacy concatenation can leave boundaries past the end of the table
        let start = self.boundaries[idx].min(num_rows);
        let end = match self.boundaries.get(idx + 1) {
            Some(next) => (*next).min(num_rows),
            None => num_rows,
        };
        Trajectory::new(
            &self.identifiers[idx],
            &self.table,
            &self.table.rows()[start..end.max(start)],
        )
    }

    /// The vehicle of each trajectory, in trajectory order
    pub fn identifiers(&self) -> &[CarID] {
        &self.identifiers
    }

    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    /// All trajectories of `a` followed by all trajectories of `b`. Neither side is rescanned,
    /// and a vehicle present in both appears twice. `a`'s policy decides the offset applied to
    /// `b`'s boundaries.
    pub fn combine(a: &TrajectoryIndex, b: &TrajectoryIndex) -> Result<TrajectoryIndex> {
        let table = a.table.concat(&b.table)?;
        let offset = a.policy.merge_offset(a.table.len());

        let mut boundaries = Vec::with_capacity(a.len() + b.len());
        boundaries.extend_from_slice(&a.boundaries);
        boundaries.extend(b.boundaries.iter().map(|start| start + offset));

        let mut identifiers = Vec::with_capacity(a.len() + b.len());
        identifiers.extend_from_slice(&a.identifiers);
        identifiers.extend_from_slice(&b.identifiers);

        Ok(TrajectoryIndex {
            table: Arc::new(table),
            boundaries,
            identifiers,
            policy: a.policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnitConversions;
    use citysim::{Field, FrameNum, Row};

    fn table(rows: &[(&str, u64, f64)]) -> Table {
        Table::from_rows(
            vec![Field::Speed],
            rows.iter()
                .map(|(id, frame, speed)| {
                    Row::new(CarID::from(*id), FrameNum(*frame), vec![*speed])
                })
                .collect(),
        )
        .unwrap()
    }

    fn build(rows: &[(&str, u64, f64)], config: &LoadConfig) -> TrajectoryIndex {
        TrajectoryIndex::new(table(rows), config, &mut Timer::throwaway()).unwrap()
    }

    fn ids(raw: &[&str]) -> Vec<CarID> {
        raw.iter().map(|x| CarID::from(*x)).collect()
    }

    // Every row is covered exactly once, in order, and each trajectory holds one vehicle.
    fn check_partition(index: &TrajectoryIndex) {
        assert_eq!(index.len(), index.identifiers().len());
        assert_eq!(index.len(), index.boundaries().len());
        assert_eq!(index.boundaries()[0], 0);

        let mut covered = 0;
        for (idx, trajectory) in index.iter().enumerate() {
            assert_eq!(index.boundaries()[idx], covered);
            assert!(!trajectory.is_empty());
            for row in trajectory.rows() {
                assert_eq!(&row.car_id, &index.identifiers()[idx]);
            }
            covered += trajectory.len();
        }
        assert_eq!(covered, index.table().len());

        for pair in index.identifiers().windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn two_vehicles() {
        let index = build(
            &[("A", 1, 0.0), ("A", 2, 0.0), ("B", 1, 0.0), ("B", 2, 0.0), ("B", 3, 0.0)],
            &LoadConfig::default(),
        );
        assert_eq!(index.identifiers(), ids(&["A", "B"]).as_slice());
        assert_eq!(index.boundaries(), &[0, 2]);
        assert_eq!(index.get(0).unwrap().len(), 2);
        assert_eq!(index.get(1).unwrap().len(), 3);
        assert_eq!(index.get(1).unwrap().car_id(), &CarID::from("B"));
        check_partition(&index);
    }

    #[test]
    fn sorts_before_scanning() {
        let index = build(
            &[
                ("10", 2, 0.0),
                ("9", 5, 0.0),
                ("10", 1, 0.0),
                ("9", 4, 0.0),
                ("A", 1, 0.0),
            ],
            &LoadConfig::default(),
        );
        assert_eq!(index.identifiers(), ids(&["9", "10", "A"]).as_slice());
        let frames: Vec<u64> = index.get(1).unwrap().frames().map(|f| f.0).collect();
        assert_eq!(frames, vec![1, 2]);
        assert_eq!(index.get(0).unwrap().start_frame(), Some(FrameNum(4)));
        assert_eq!(index.get(0).unwrap().end_frame(), Some(FrameNum(5)));
        check_partition(&index);
    }

    #[test]
    fn converts_speed() {
        let index = build(&[("A", 1, 10.0)], &LoadConfig::default());
        let speed = index.get(0).unwrap().value(0, Field::Speed).unwrap();
        assert!((speed - 4.4704).abs() < 1e-9);

        let mut config = LoadConfig::default();
        config.conversions = UnitConversions::none();
        let index = build(&[("A", 1, 10.0)], &config);
        assert_eq!(index.get(0).unwrap().column(Field::Speed).unwrap(), vec![10.0]);
        assert!(index.get(0).unwrap().column(Field::Heading).is_err());
    }

    #[test]
    fn empty_dataset() {
        let err = TrajectoryIndex::new(
            Table::new(vec![Field::Speed]),
            &LoadConfig::default(),
            &mut Timer::throwaway(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Empty dataset"));
    }

    #[test]
    fn out_of_range() {
        let index = build(&[("A", 1, 0.0), ("B", 1, 0.0)], &LoadConfig::default());
        assert!(index.get(1).is_ok());
        assert!(index.get(2).is_err());
        assert!(index.get(usize::MAX).is_err());
    }

    #[test]
    fn legacy_scan_misses_final_change() {
        let rows = [("A", 1, 0.0), ("A", 2, 0.0), ("B", 1, 0.0)];

        let exact = build(&rows, &LoadConfig::default());
        assert_eq!(exact.boundaries(), &[0, 2]);
        check_partition(&exact);

        let legacy = build(&rows, &LoadConfig::legacy());
        assert_eq!(legacy.boundaries(), &[0]);
        assert_eq!(legacy.identifiers(), ids(&["A"]).as_slice());
        // The lone B row is swallowed by A's trajectory
        let swallowed = legacy.get(0).unwrap();
        assert_eq!(swallowed.len(), 3);
        assert_eq!(swallowed.rows()[2].car_id, CarID::from("B"));
    }

    #[test]
    fn rescan_is_idempotent() {
        let mut rows = Vec::new();
        for frame in (0..20).rev() {
            for id in ["7", "3", "12", "B", "A"] {
                if frame % 3 != 0 || id != "12" {
                    rows.push((id, frame, frame as f64));
                }
            }
        }
        let index = build(&rows, &LoadConfig::default());
        check_partition(&index);
        assert_eq!(index.len(), 5);

        let (boundaries, identifiers) =
            scan_boundaries(index.table().rows(), BoundaryPolicy::Exact);
        assert_eq!(boundaries, index.boundaries());
        assert_eq!(identifiers, index.identifiers());

        let rebuilt = TrajectoryIndex::new(
            index.table().clone(),
            &LoadConfig {
                conversions: UnitConversions::none(),
                ..Default::default()
            },
            &mut Timer::throwaway(),
        )
        .unwrap();
        assert_eq!(rebuilt.boundaries(), index.boundaries());
        assert_eq!(rebuilt.table(), index.table());
    }

    #[test]
    fn combine_exact() {
        let a = build(&[("A", 1, 0.0), ("A", 2, 0.0), ("A", 3, 0.0)], &LoadConfig::default());
        let b = build(&[("B", 1, 0.0), ("B", 2, 0.0)], &LoadConfig::default());
        let a_before = a.boundaries().to_vec();

        let both = TrajectoryIndex::combine(&a, &b).unwrap();
        assert_eq!(both.table().len(), 5);
        assert_eq!(both.len(), 2);
        assert_eq!(both.boundaries(), &[0, 3]);
        assert_eq!(both.identifiers(), ids(&["A", "B"]).as_slice());
        assert_eq!(both.get(0).unwrap().len(), 3);
        assert_eq!(both.get(1).unwrap().len(), 2);
        check_partition(&both);

        // Inputs untouched
        assert_eq!(a.boundaries(), a_before.as_slice());
        assert_eq!(a.table().len(), 3);
        assert_eq!(b.boundaries(), &[0]);
    }

    #[test]
    fn combine_legacy_offset() {
        let a = build(&[("A", 1, 0.0), ("A", 2, 0.0), ("A", 3, 0.0)], &LoadConfig::legacy());
        let b = build(&[("B", 1, 0.0), ("B", 2, 0.0)], &LoadConfig::legacy());

        let both = TrajectoryIndex::combine(&a, &b).unwrap();
        assert_eq!(both.table().len(), 5);
        assert_eq!(both.boundaries(), &[0, 4]);
        assert_eq!(both.policy(), BoundaryPolicy::Legacy);
        // The junction is off by one row
        assert_eq!(both.get(0).unwrap().len(), 4);
        assert_eq!(both.get(1).unwrap().len(), 1);
    }

    #[test]
    fn combine_legacy_past_the_end() {
        let a = build(&[("A", 1, 0.0)], &LoadConfig::legacy());
        let b = build(&[("B", 1, 0.0)], &LoadConfig::legacy());
        let both = TrajectoryIndex::combine(&a, &b).unwrap();
        assert_eq!(both.boundaries(), &[0, 2]);
        assert_eq!(both.get(0).unwrap().len(), 2);
        assert!(both.get(1).unwrap().is_empty());
    }

    #[test]
    fn iter_yields_every_trajectory() {
        let a = build(&[("A", 1, 0.0), ("B", 1, 0.0)], &LoadConfig::legacy());
        let b = build(&[("C", 1, 0.0)], &LoadConfig::legacy());
        let both = TrajectoryIndex::combine(&a, &b).unwrap();
        // The last legacy trajectory is empty, but it's still yielded
        assert_eq!(both.boundaries(), &[0, 3]);
        assert_eq!(both.iter().count(), both.len());
        for (idx, trajectory) in both.iter().enumerate() {
            let expected = both.get(idx).unwrap();
            assert_eq!(trajectory.car_id(), expected.car_id());
            assert_eq!(trajectory.rows(), expected.rows());
        }
        assert!(both.iter().last().unwrap().is_empty());
    }

    #[test]
    fn combine_keeps_duplicates() {
        let a = build(&[("A", 1, 0.0), ("B", 1, 0.0)], &LoadConfig::default());
        let b = build(&[("B", 2, 0.0), ("C", 1, 0.0)], &LoadConfig::default());
        let both = TrajectoryIndex::combine(&a, &b).unwrap();

        let mut expected = a.identifiers().to_vec();
        expected.extend(b.identifiers().iter().cloned());
        assert_eq!(both.identifiers(), expected.as_slice());
        assert_eq!(both.len(), 4);
        assert_eq!(both.table().len(), a.table().len() + b.table().len());
        assert_eq!(both.boundaries(), &[0, 1, 2, 3]);

        // Combining is repeatable
        let all = TrajectoryIndex::combine(&both, &a).unwrap();
        assert_eq!(all.boundaries(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn combine_mismatched_columns() {
        let a = build(&[("A", 1, 0.0)], &LoadConfig::default());
        let b = TrajectoryIndex::new(
            Table::from_rows(
                Vec::new(),
                vec![Row::new(CarID::from("B"), FrameNum(1), Vec::new())],
            )
            .unwrap(),
            &LoadConfig::default(),
            &mut Timer::throwaway(),
        )
        .unwrap();
        assert!(TrajectoryIndex::combine(&a, &b).is_err());
    }

    #[test]
    fn shared_across_threads() {
        let index = build(&[("A", 1, 0.0), ("B", 1, 0.0)], &LoadConfig::default());
        let copy = index.clone();
        let handle = std::thread::spawn(move || copy.get(1).unwrap().len());
        assert_eq!(handle.join().unwrap(), 1);
        assert_eq!(index.get(0).unwrap().len(), 1);
    }
}
