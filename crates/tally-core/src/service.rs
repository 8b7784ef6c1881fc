//! Average request orchestration
//!
//! Validation runs in a fixed order before any store query is issued:
//! request shape, duration, subject, metric. Only then are the concrete
//! subjects queried, concurrently, and their readings folded into one
//! aggregate.

use futures::future::try_join_all;
use log::{debug, info};

use crate::aggregate::{Aggregate, aggregate};
use crate::error::QueryError;
use crate::metrics::MetricKey;
use crate::request::{AverageRequest, RawRequest};
use crate::source::ReadingSource;
use crate::subjects::SubjectRegistry;
use crate::summary::{SummaryFormatter, SummaryPayload};
use crate::window::TimeWindow;

/// Successful result of an average request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Summary(SummaryPayload),
    /// No reading of any resolved subject fell inside the window
    NoData,
}

/// Answers average requests against a reading source.
pub struct AverageService<S> {
    registry: SubjectRegistry,
    source: S,
    formatter: SummaryFormatter,
}

impl<S: ReadingSource> AverageService<S> {
    pub fn new(registry: SubjectRegistry, source: S, formatter: SummaryFormatter) -> Self {
        Self {
            registry,
            source,
            formatter,
        }
    }

    pub fn registry(&self) -> &SubjectRegistry {
        &self.registry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Validates a decoded request and answers it.
    pub async fn average_raw(&self, raw: RawRequest, now: i64) -> Result<Outcome, QueryError> {
        let request = raw.validate()?;
        self.average(&request, now).await
    }

    /// Answers a request whose fields are all present.
    ///
    /// Subject queries run concurrently and are joined fail-fast: the first
    /// failing query drops the ones still in flight and fails the request.
    pub async fn average(&self, request: &AverageRequest, now: i64) -> Result<Outcome, QueryError> {
        let window = TimeWindow::resolve(now, request.duration_secs)?;
        let subjects = self.registry.resolve(&request.subject)?;
        let metric = MetricKey::from_name(&request.metric)?;

        info!(
            "Average of {} for {} ({} subject(s)) over [{}, {})",
            metric,
            request.subject,
            subjects.len(),
            window.start(),
            window.end()
        );

        let batches = try_join_all(
            subjects
                .iter()
                .map(|subject| self.source.query(subject, window.start())),
        )
        .await?;

        match aggregate(metric, &window, batches)? {
            Aggregate::NoData => {
                debug!("No readings for {} in window", request.subject);
                Ok(Outcome::NoData)
            }
            Aggregate::Stats(result) => {
                debug!("Aggregated {} samples", result.sample_count);
                Ok(Outcome::Summary(self.formatter.format(&result, &window)))
            }
        }
    }
}
