//! Running statistics for a single aggregation call.

/// Request-scoped running totals.
///
/// `min`/`max` stay `None` until the first value is pushed, so an empty
/// accumulator can never be mistaken for one that saw an extreme reading.
/// Accumulators are owned by one aggregation call and combined with
/// [`merge`](Self::merge) when subjects are folded separately.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AggregateAccumulator {
    count: u64,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl AggregateAccumulator {
    pub const fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: None,
            max: None,
        }
    }

    /// Folds one value in.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |min| min.min(value)));
        self.max = Some(self.max.map_or(value, |max| max.max(value)));
    }

    /// Combines another accumulator into this one.
    pub fn merge(&mut self, other: &Self) {
        self.count += other.count;
        self.sum += other.sum;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `sum / count`, defined only once a value has been pushed.
    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

impl Extend<f64> for AggregateAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_accumulator_is_unset() {
        let acc = AggregateAccumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.min(), None);
        assert_eq!(acc.max(), None);
        assert_eq!(acc.average(), None);
    }

    #[test]
    fn test_push_tracks_extrema() {
        let mut acc = AggregateAccumulator::new();
        acc.extend([20.0, 22.0, 18.0]);

        assert_eq!(acc.count(), 3);
        assert_eq!(acc.sum(), 60.0);
        assert_eq!(acc.min(), Some(18.0));
        assert_eq!(acc.max(), Some(22.0));
        assert_eq!(acc.average(), Some(20.0));
    }

    #[test]
    fn test_single_value_is_min_and_max() {
        let mut acc = AggregateAccumulator::new();
        acc.push(-1.0);
        assert_eq!(acc.min(), Some(-1.0));
        assert_eq!(acc.max(), Some(-1.0));
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let mut left = AggregateAccumulator::new();
        left.extend([1.0, 5.0]);
        let mut right = AggregateAccumulator::new();
        right.extend([-3.0, 2.0, 4.0]);

        let mut single = AggregateAccumulator::new();
        single.extend([1.0, 5.0, -3.0, 2.0, 4.0]);

        left.merge(&right);
        assert_eq!(left, single);
    }

    #[test]
    fn test_merge_with_empty() {
        let mut acc = AggregateAccumulator::new();
        acc.extend([3.0, 7.0]);
        let before = acc;

        acc.merge(&AggregateAccumulator::new());
        assert_eq!(acc, before);

        let mut empty = AggregateAccumulator::new();
        empty.merge(&before);
        assert_eq!(empty, before);
    }
}
