//! Held-out positions and the withheld truth.
//!
//! Applying a mask splits a series into two values of different types: the
//! series handed to the sampler (held-out values blanked) and a
//! [`HeldOutTruth`] that only the comparison step reads.

use serde::Serialize;
use ssm_config::HoldOutSettings;
use std::collections::BTreeSet;

use super::series::TimeSeries;
use super::DataError;

/// 0-based positions withheld from fitting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeldOutMask {
    positions: BTreeSet<usize>,
}

impl HeldOutMask {
    pub fn new(positions: impl IntoIterator<Item = usize>) -> Self {
        HeldOutMask {
            positions: positions.into_iter().collect(),
        }
    }

    /// The last `n` positions of a series of length `len`.
    pub fn last(n: usize, len: usize) -> Self {
        Self::new(len.saturating_sub(n)..len)
    }

    /// Union of `last` and explicit `indices`, checked against `len`.
    pub fn from_settings(settings: &HoldOutSettings, len: usize) -> Result<Self, DataError> {
        let mut mask = Self::new(settings.indices.iter().copied());
        if let Some(n) = settings.last {
            if n > len {
                return Err(DataError::HeldOutOutOfRange { index: n, len });
            }
            mask.positions.extend(len - n..len);
        }
        mask.check(len)?;
        Ok(mask)
    }

    /// Ascending positions.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().copied()
    }

    pub fn contains(&self, position: usize) -> bool {
        self.positions.contains(&position)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn check(&self, len: usize) -> Result<(), DataError> {
        match self.positions.iter().next_back() {
            Some(&index) if index >= len => Err(DataError::HeldOutOutOfRange { index, len }),
            _ => Ok(()),
        }
    }

    /// Split `series` into the fitting series and the withheld truth.
    pub fn apply(&self, series: &TimeSeries) -> Result<(TimeSeries, HeldOutTruth), DataError> {
        self.check(series.len())?;
        let mut fitting = series.clone();
        let mut points = Vec::with_capacity(self.len());
        for position in self.positions() {
            points.push(TruthPoint {
                position,
                time: series.labels[position].clone(),
                value: series.values[position],
            });
            fitting.values[position] = None;
        }
        Ok((fitting, HeldOutTruth { points }))
    }
}

/// One withheld observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TruthPoint {
    pub position: usize,
    pub time: String,
    /// `None` if the observation was already missing.
    pub value: Option<f64>,
}

/// Withheld observations, ordered by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeldOutTruth {
    points: Vec<TruthPoint>,
}

impl HeldOutTruth {
    pub fn from_points(mut points: Vec<TruthPoint>) -> Self {
        points.sort_by_key(|p| p.position);
        points.dedup_by_key(|p| p.position);
        HeldOutTruth { points }
    }

    pub fn get(&self, position: usize) -> Option<&TruthPoint> {
        self.points
            .binary_search_by_key(&position, |p| p.position)
            .ok()
            .map(|i| &self.points[i])
    }

    pub fn points(&self) -> &[TruthPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> TimeSeries {
        TimeSeries::new(
            "MA",
            (1..=6).map(|i| format!("w{i}")).collect(),
            vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0)],
        )
        .unwrap()
    }

    #[test]
    fn apply_blanks_fitting_and_keeps_truth() {
        let mask = HeldOutMask::new([4, 1, 2]);
        let (fitting, truth) = mask.apply(&series()).unwrap();
        assert_eq!(
            fitting.values,
            vec![Some(1.0), None, None, Some(4.0), None, Some(6.0)]
        );
        assert_eq!(truth.len(), 3);
        assert_eq!(truth.get(1).unwrap().value, Some(2.0));
        assert_eq!(truth.get(2).unwrap().value, None);
        assert_eq!(truth.get(4).unwrap().time, "w5");
        assert!(truth.get(0).is_none());
    }

    #[test]
    fn last_n() {
        let mask = HeldOutMask::last(2, 6);
        assert_eq!(mask.positions().collect::<Vec<_>>(), vec![4, 5]);
        assert!(HeldOutMask::last(0, 6).is_empty());
        assert_eq!(HeldOutMask::last(10, 3).len(), 3);
    }

    #[test]
    fn settings_union_and_range_check() {
        let settings = HoldOutSettings {
            last: Some(2),
            indices: vec![0, 5],
        };
        let mask = HeldOutMask::from_settings(&settings, 6).unwrap();
        assert_eq!(mask.positions().collect::<Vec<_>>(), vec![0, 4, 5]);

        let settings = HoldOutSettings {
            last: None,
            indices: vec![6],
        };
        let err = HeldOutMask::from_settings(&settings, 6).unwrap_err();
        assert!(matches!(err, DataError::HeldOutOutOfRange { index: 6, len: 6 }));
    }

    #[test]
    fn apply_out_of_range() {
        let err = HeldOutMask::new([9]).apply(&series()).unwrap_err();
        assert!(matches!(err, DataError::HeldOutOutOfRange { index: 9, len: 6 }));
    }
}
