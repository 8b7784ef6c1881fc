//! Header-level request handling
//!
//! Devices carry their payloads as JSON in a request header: average queries
//! in `Req-Details`, uploads in `M5-Details`. Each call produces exactly one
//! [`HttpResponse`].

use core::fmt;

use embassy_futures::block_on;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use tally_core::{AverageService, Outcome, QueryError, RawRequest, SubjectRegistry};

use crate::config::{Config, ConfigError};
use crate::store::{DocumentStore, StoreError};

pub const REQUEST_HEADER: &str = "Req-Details";
pub const UPLOAD_HEADER: &str = "M5-Details";

/// Body sent with a 204.
pub const NO_DATA_BODY: &str = "No matching documents";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NoContent,
    BadRequest,
    NotFound,
    InternalError,
    BadGateway,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NoContent => 204,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::InternalError => 500,
            Self::BadGateway => 502,
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok | Self::NoContent)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: Status,
    pub body: String,
}

impl HttpResponse {
    fn new(status: Status, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    fn json<T: Serialize>(status: Status, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::new(status, body),
            Err(e) => {
                warn!("Failed to serialize response: {}", e);
                Self::new(Status::InternalError, "Internal error")
            }
        }
    }

    fn error(status: Status, kind: &str, message: String) -> Self {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            error: &'a str,
            message: String,
        }

        Self::json(
            status,
            &ErrorBody {
                error: kind,
                message,
            },
        )
    }
}

/// Response status for a failed average request.
pub fn status_for(err: &QueryError) -> Status {
    match err {
        QueryError::MalformedRequest(_)
        | QueryError::InvalidDuration(_)
        | QueryError::UnsupportedMetric(_) => Status::BadRequest,
        QueryError::UnknownSubject(_) => Status::NotFound,
        QueryError::StoreUnavailable(_) | QueryError::StoreQuery(_) => Status::BadGateway,
    }
}

fn upload_status(err: &StoreError) -> Status {
    match err {
        StoreError::InvalidDocument(_) => Status::BadRequest,
        StoreError::UnknownSubject(_) => Status::NotFound,
        StoreError::Unavailable { .. } | StoreError::Corrupt { .. } => Status::BadGateway,
    }
}

fn upload_kind(err: &StoreError) -> &'static str {
    match err {
        StoreError::InvalidDocument(_) => "MalformedRequest",
        StoreError::UnknownSubject(_) => "UnknownSubject",
        StoreError::Unavailable { .. } => "StoreUnavailable",
        StoreError::Corrupt { .. } => "StoreQueryError",
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadReceipt {
    user_id: String,
}

/// Answers average and upload requests against a document store.
pub struct Handler<'a> {
    service: AverageService<&'a DocumentStore>,
}

impl<'a> Handler<'a> {
    pub fn new(config: &Config, store: &'a DocumentStore) -> Result<Self, ConfigError> {
        Ok(Self {
            service: AverageService::new(config.registry()?, store, config.formatter()?),
        })
    }

    pub fn registry(&self) -> &SubjectRegistry {
        self.service.registry()
    }

    /// Handles an average query whose `Req-Details` header is `header`.
    pub fn average(&self, header: Option<&str>, now: i64) -> HttpResponse {
        let result = decode_request(header)
            .and_then(|raw| block_on(self.service.average_raw(raw, now)));

        match result {
            Ok(Outcome::Summary(payload)) => HttpResponse::json(Status::Ok, &payload),
            Ok(Outcome::NoData) => HttpResponse::new(Status::NoContent, NO_DATA_BODY),
            Err(err) => {
                let status = status_for(&err);
                debug!("Average request failed with {}: {}", status, err);
                HttpResponse::error(status, err.kind(), err.to_string())
            }
        }
    }

    /// Handles a device upload whose `M5-Details` header is `header`.
    pub fn upload(&self, header: Option<&str>) -> HttpResponse {
        let Some(header) = header else {
            return HttpResponse::error(
                Status::BadRequest,
                "MalformedRequest",
                format!("missing {} header", UPLOAD_HEADER),
            );
        };

        let document: Value = match serde_json::from_str(header) {
            Ok(document) => document,
            Err(e) => {
                return HttpResponse::error(
                    Status::BadRequest,
                    "MalformedRequest",
                    format!("{} is not JSON: {}", UPLOAD_HEADER, e),
                );
            }
        };

        match self.service.source().upload(document, self.registry()) {
            Ok(user_id) => HttpResponse::json(Status::Ok, &UploadReceipt { user_id }),
            Err(err) => {
                let status = upload_status(&err);
                debug!("Upload failed with {}: {}", status, err);
                HttpResponse::error(status, upload_kind(&err), err.to_string())
            }
        }
    }
}

fn decode_request(header: Option<&str>) -> Result<RawRequest, QueryError> {
    let header = header.ok_or_else(|| {
        QueryError::MalformedRequest(format!("missing {} header", REQUEST_HEADER))
    })?;
    serde_json::from_str(header).map_err(|e| {
        QueryError::MalformedRequest(format!("{} is not valid JSON: {}", REQUEST_HEADER, e))
    })
}
