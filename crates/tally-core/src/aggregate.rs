//! Aggregation engine
//!
//! Reduces the readings of one or more subjects into a single summary of a
//! metric over a [`TimeWindow`]. All subjects are folded in one pass over the
//! concatenation of their readings, so a composite subject is summarised over
//! the union of its readings rather than as an average of averages.

use core::borrow::Borrow;

use log::debug;

use crate::accumulator::AggregateAccumulator;
use crate::metrics::{MetricKey, UnsupportedMetric, extract};
use crate::reading::Reading;
use crate::window::TimeWindow;

/// Finalized statistics for a metric over a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateResult {
    pub metric: MetricKey,
    pub sample_count: u64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Samples per second of the requested window
    pub rate: f64,
}

/// Outcome of an aggregation.
///
/// `NoData` is a successful, reportable outcome: no reading of any subject
/// fell inside the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregate {
    NoData,
    Stats(AggregateResult),
}

impl Aggregate {
    /// Builds the final outcome from a filled accumulator.
    pub fn finalize(metric: MetricKey, window: &TimeWindow, acc: &AggregateAccumulator) -> Self {
        match (acc.average(), acc.min(), acc.max()) {
            (Some(average), Some(min), Some(max)) => Self::Stats(AggregateResult {
                metric,
                sample_count: acc.count(),
                average,
                min,
                max,
                rate: acc.count() as f64 / window.requested_duration_secs(),
            }),
            _ => Self::NoData,
        }
    }

    pub fn stats(&self) -> Option<&AggregateResult> {
        match self {
            Self::NoData => None,
            Self::Stats(result) => Some(result),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

/// Folds the readings of a single sequence into `acc`.
///
/// Readings outside the window are skipped; a reading inside the window that
/// lacks the metric aborts the fold.
pub fn fold_into<I, R>(
    acc: &mut AggregateAccumulator,
    metric: MetricKey,
    window: &TimeWindow,
    readings: I,
) -> Result<(), UnsupportedMetric>
where
    I: IntoIterator<Item = R>,
    R: Borrow<Reading>,
{
    let mut skipped = 0usize;
    for reading in readings {
        let reading = reading.borrow();
        if !window.contains(reading.timestamp()) {
            skipped += 1;
            continue;
        }
        acc.push(extract(reading, metric)?);
    }

    if skipped > 0 {
        debug!("Skipped {} readings outside [{}, {})", skipped, window.start(), window.end());
    }
    Ok(())
}

/// Aggregates `metric` over every reading of every sequence in `sources`.
pub fn aggregate<S, I, R>(
    metric: MetricKey,
    window: &TimeWindow,
    sources: S,
) -> Result<Aggregate, UnsupportedMetric>
where
    S: IntoIterator<Item = I>,
    I: IntoIterator<Item = R>,
    R: Borrow<Reading>,
{
    let mut acc = AggregateAccumulator::new();
    for readings in sources {
        fold_into(&mut acc, metric, window, readings)?;
    }
    Ok(Aggregate::finalize(metric, window, &acc))
}
