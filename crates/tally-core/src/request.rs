//! Average request decoding and shape validation

use alloc::string::{String, ToString};

use serde::Deserialize;

use crate::error::QueryError;

/// Duration as sent on the wire: devices send either a number or a numeric
/// string such as `"6000"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Whole(i64),
    Fractional(f64),
    Text(String),
}

impl DurationValue {
    /// Duration in seconds, without checking the sign.
    ///
    /// Text that is not a number is a malformed request.
    pub fn seconds(&self) -> Result<f64, QueryError> {
        match self {
            Self::Whole(secs) => Ok(*secs as f64),
            Self::Fractional(secs) => Ok(*secs),
            Self::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                QueryError::MalformedRequest(alloc::format!(
                    "timeDuration `{}` is not a number",
                    text.trim()
                ))
            }),
        }
    }
}

/// Request as decoded from the `Req-Details` header, before validation.
///
/// Accepts the device field names (`userId`, `timeDuration`, `dataType`) and
/// the long-form names (`subjectId`, `timeDurationSeconds`, `metric`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRequest {
    #[serde(default, alias = "subjectId")]
    pub user_id: Option<String>,
    #[serde(default, alias = "timeDurationSeconds")]
    pub time_duration: Option<DurationValue>,
    #[serde(default, alias = "metric")]
    pub data_type: Option<String>,
}

/// A request with every required field present.
#[derive(Debug, Clone, PartialEq)]
pub struct AverageRequest {
    pub subject: String,
    /// Requested duration in seconds, not yet checked for sign
    pub duration_secs: f64,
    pub metric: String,
}

impl AverageRequest {
    pub fn new(subject: &str, duration_secs: f64, metric: &str) -> Self {
        Self {
            subject: subject.to_string(),
            duration_secs,
            metric: metric.to_string(),
        }
    }
}

impl RawRequest {
    /// Checks that all three fields are present.
    pub fn validate(self) -> Result<AverageRequest, QueryError> {
        let subject = self.user_id.ok_or_else(|| missing("userId"))?;
        let duration = self.time_duration.ok_or_else(|| missing("timeDuration"))?;
        let metric = self.data_type.ok_or_else(|| missing("dataType"))?;

        Ok(AverageRequest {
            subject,
            duration_secs: duration.seconds()?,
            metric,
        })
    }
}

fn missing(field: &str) -> QueryError {
    QueryError::MalformedRequest(alloc::format!("missing `{}`", field))
}
