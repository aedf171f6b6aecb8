//! Point-in-time views of the window buffers.
//!
//! A [`Snapshot`] is what consumers see: an immutable copy of every metric's
//! window as it stood at one instant, with the per-metric range precomputed.
//! Each metric's sequence is internally consistent (copied under that
//! metric's lock); strict cross-metric simultaneity is not promised, since
//! the sensors do not update in lockstep anyway.

use super::reading::Metric;

/// Ordered samples for one metric plus the range of its finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    /// Samples oldest first. May contain non-finite values.
    pub values: Vec<f64>,
    /// Smallest finite sample, or NaN if the window holds none.
    pub min: f64,
    /// Largest finite sample, or NaN if the window holds none.
    pub max: f64,
}

impl MetricSeries {
    /// Build a series from ordered samples. Returns `None` for an empty
    /// sequence, the "no data yet" marker.
    pub fn from_values(values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        // f64::min/max propagate the non-NaN operand, so starting from NaN
        // yields NaN only when no finite sample exists.
        let mut min = f64::NAN;
        let mut max = f64::NAN;
        for &v in values.iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }

        Some(Self { values, min, max })
    }

    /// Number of samples in the series.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// A series is never constructed empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recent sample. NaN for a series emptied by hand.
    pub fn latest(&self) -> f64 {
        self.values.last().copied().unwrap_or(f64::NAN)
    }

    /// Finite (min, max) range, or `None` when every sample is non-finite.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        if self.min.is_finite() && self.max.is_finite() {
            Some((self.min, self.max))
        } else {
            None
        }
    }
}

/// Immutable materialization of all window buffers for a consumer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    series: [Option<MetricSeries>; Metric::COUNT],
}

impl Snapshot {
    /// Assemble a snapshot from per-metric series in wire order.
    pub fn new(series: [Option<MetricSeries>; Metric::COUNT]) -> Self {
        Self { series }
    }

    /// Series for one metric, or `None` if that metric has no data yet.
    pub fn metric(&self, metric: Metric) -> Option<&MetricSeries> {
        self.series[metric.index()].as_ref()
    }

    /// True if no metric has received any data.
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(Option::is_none)
    }

    /// Total samples across all metrics.
    pub fn total_samples(&self) -> usize {
        self.series
            .iter()
            .flatten()
            .map(MetricSeries::len)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_min_max() {
        let series = MetricSeries::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.min, 1.0);
        assert_eq!(series.max, 3.0);
        assert_eq!(series.latest(), 3.0);
        assert_eq!(series.finite_range(), Some((1.0, 3.0)));
    }

    #[test]
    fn test_empty_series_is_none() {
        assert!(MetricSeries::from_values(Vec::new()).is_none());
    }

    #[test]
    fn test_range_skips_non_finite() {
        let series =
            MetricSeries::from_values(vec![f64::NAN, 5.0, f64::INFINITY, 2.0]).unwrap();
        assert_eq!(series.min, 2.0);
        assert_eq!(series.max, 5.0);
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn test_all_non_finite_has_no_range() {
        let series = MetricSeries::from_values(vec![f64::NAN, f64::NEG_INFINITY]).unwrap();
        assert!(series.finite_range().is_none());
        assert!(series.min.is_nan());
    }

    #[test]
    fn test_snapshot_accessors() {
        let snapshot = Snapshot::new([
            MetricSeries::from_values(vec![12.3, 13.1]),
            MetricSeries::from_values(vec![410.0]),
            None,
            None,
        ]);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.total_samples(), 3);
        assert_eq!(snapshot.metric(Metric::Pm25).unwrap().len(), 2);
        assert_eq!(snapshot.metric(Metric::Co2).unwrap().latest(), 410.0);
        assert!(snapshot.metric(Metric::Temperature).is_none());
    }

    #[test]
    fn test_default_snapshot_is_empty() {
        let snapshot = Snapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total_samples(), 0);
    }
}
