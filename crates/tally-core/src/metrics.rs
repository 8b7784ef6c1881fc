//! Metric definitions and extraction from readings
//!
//! Every requestable metric belongs to exactly one sensor group of the
//! device. The mapping lives in [`METRIC_TABLE`] and every lookup goes
//! through it.

use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use serde::Serialize;
use thiserror_no_std::Error;

use crate::reading::Reading;

/// Sensor group a metric is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SensorGroup {
    /// Built-in IMU (accelerometer axes)
    Motion,
    /// SHT40 temperature/humidity sensor
    Climate,
    /// VCNL4040 proximity/light sensor
    Light,
}

impl SensorGroup {
    /// Key of this group inside a device document.
    pub const fn document_key(self) -> &'static str {
        match self {
            Self::Motion => "m5Details",
            Self::Climate => "shtDetails",
            Self::Light => "vcnlDetails",
        }
    }
}

impl fmt::Display for SensorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.document_key())
    }
}

/// A requestable sensed quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MetricKey {
    AccelX,
    AccelY,
    AccelZ,
    Temperature,
    Humidity,
    AmbientLight,
    Proximity,
    WhiteLight,
}

/// One row of the metric table.
#[derive(Debug, Clone, Copy)]
pub struct MetricEntry {
    pub key: MetricKey,
    /// Name used in requests and responses
    pub name: &'static str,
    pub group: SensorGroup,
    /// Field name inside the group as uploaded by the device
    pub field: &'static str,
}

/// Fixed metric table, in `MetricKey` declaration order.
pub static METRIC_TABLE: [MetricEntry; 8] = [
    MetricEntry {
        key: MetricKey::AccelX,
        name: "ax",
        group: SensorGroup::Motion,
        field: "ax",
    },
    MetricEntry {
        key: MetricKey::AccelY,
        name: "ay",
        group: SensorGroup::Motion,
        field: "ay",
    },
    MetricEntry {
        key: MetricKey::AccelZ,
        name: "az",
        group: SensorGroup::Motion,
        field: "az",
    },
    MetricEntry {
        key: MetricKey::Temperature,
        name: "temp",
        group: SensorGroup::Climate,
        field: "temp",
    },
    MetricEntry {
        key: MetricKey::Humidity,
        name: "rHum",
        group: SensorGroup::Climate,
        field: "rHum",
    },
    MetricEntry {
        key: MetricKey::AmbientLight,
        name: "als",
        group: SensorGroup::Light,
        field: "al",
    },
    MetricEntry {
        key: MetricKey::Proximity,
        name: "prox",
        group: SensorGroup::Light,
        field: "prox",
    },
    MetricEntry {
        key: MetricKey::WhiteLight,
        name: "rwl",
        group: SensorGroup::Light,
        field: "rwl",
    },
];

/// Extra request names accepted for a metric.
///
/// The device uploads ambient light as `al` while the query protocol calls it
/// `als`; both resolve to the same metric.
const METRIC_ALIASES: [(&str, MetricKey); 1] = [("al", MetricKey::AmbientLight)];

/// Why a metric value could not be produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnsupportedMetric {
    /// The requested name is not in the metric table
    #[error("metric `{0}` is not supported")]
    Unknown(String),
    /// The reading does not carry the field the metric maps to
    #[error("reading at {timestamp} has no `{group}.{field}` value")]
    MissingField {
        timestamp: i64,
        group: &'static str,
        field: &'static str,
    },
}

impl MetricKey {
    /// All metrics in table order.
    pub const ALL: [MetricKey; 8] = [
        Self::AccelX,
        Self::AccelY,
        Self::AccelZ,
        Self::Temperature,
        Self::Humidity,
        Self::AmbientLight,
        Self::Proximity,
        Self::WhiteLight,
    ];

    /// Table row for this metric.
    pub fn entry(self) -> &'static MetricEntry {
        &METRIC_TABLE[self as usize]
    }

    /// Canonical request name, e.g. `"temp"`.
    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn group(self) -> SensorGroup {
        self.entry().group
    }

    pub fn field(self) -> &'static str {
        self.entry().field
    }

    /// Resolves a request name (or alias) through the table.
    pub fn from_name(name: &str) -> Result<Self, UnsupportedMetric> {
        METRIC_TABLE
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.key)
            .or_else(|| {
                METRIC_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == name)
                    .map(|(_, key)| *key)
            })
            .ok_or_else(|| UnsupportedMetric::Unknown(String::from(name)))
    }
}

impl FromStr for MetricKey {
    type Err = UnsupportedMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extracts the value of `key` from a reading.
///
/// A missing field is an error, never a placeholder value.
pub fn extract(reading: &Reading, key: MetricKey) -> Result<f64, UnsupportedMetric> {
    let group = key.group().document_key();
    let field = key.field();
    reading
        .value(group, field)
        .ok_or(UnsupportedMetric::MissingField {
            timestamp: reading.timestamp(),
            group,
            field,
        })
}
