//! Response payload rendering
//!
//! Turns an [`AggregateResult`] and its window into the payload returned to
//! the device. Field names follow the device protocol.

use alloc::format;
use alloc::string::String;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::aggregate::AggregateResult;
use crate::window::TimeWindow;

/// Layout of each end of the time-range label, e.g. `4/14/2025, 1:20:05 PM`.
const LABEL_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Zone used for labels when none is configured (US Pacific, DST aware).
pub const DEFAULT_LABEL_TIME_ZONE: Tz = Tz::America__Los_Angeles;

/// Externally visible summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPayload {
    pub data_type: String,
    pub average_data: f64,
    pub min_data: f64,
    pub max_data: f64,
    pub time_range: String,
    pub num_data_points: u64,
    pub rate_data_collect: f64,
}

/// Renders timestamps for the time-range label in an IANA time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryFormatter {
    zone: Tz,
}

impl Default for SummaryFormatter {
    fn default() -> Self {
        Self::with_zone(DEFAULT_LABEL_TIME_ZONE)
    }
}

impl SummaryFormatter {
    pub const fn with_zone(zone: Tz) -> Self {
        Self { zone }
    }

    /// Looks up an IANA zone name such as `"America/Los_Angeles"`.
    pub fn from_zone_name(name: &str) -> Option<Self> {
        name.parse::<Tz>().ok().map(Self::with_zone)
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Formats a single timestamp (seconds since the Unix epoch).
    pub fn timestamp_label(&self, timestamp: i64) -> String {
        match DateTime::from_timestamp(timestamp, 0) {
            Some(utc) => format!("{}", utc.with_timezone(&self.zone).format(LABEL_FORMAT)),
            None => format!("{}", timestamp),
        }
    }

    /// `"<start> - <end>"` label for a window.
    pub fn time_range(&self, window: &TimeWindow) -> String {
        format!(
            "{} - {}",
            self.timestamp_label(window.start()),
            self.timestamp_label(window.end())
        )
    }

    /// Builds the payload for a non-empty aggregate.
    pub fn format(&self, result: &AggregateResult, window: &TimeWindow) -> SummaryPayload {
        SummaryPayload {
            data_type: String::from(result.metric.name()),
            average_data: result.average,
            min_data: result.min,
            max_data: result.max,
            time_range: self.time_range(window),
            num_data_points: result.sample_count,
            rate_data_collect: result.rate,
        }
    }
}
