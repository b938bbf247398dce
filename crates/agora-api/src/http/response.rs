//! The JSON envelope around every API response.
//!
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "elapsed_ms": 5 },
//!   "errors": [{ "code": "PERSONA_EXISTS", "title": "...", "message": "...", "kind": "failure" }],
//!   "_links": { "self": "..." }
//! }
//! ```
//!
//! A failed request carries `data: null` and exactly one error, which is the
//! same notice the CLI prints plus a stable machine code.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use agora_types::notice::{Notice, NoticeField, NoticeKind};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub meta: ApiMeta,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiError>,
    #[serde(rename = "_links", skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    /// UUIDv7, so ids sort by arrival.
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl ApiMeta {
    fn new(started: Option<Instant>) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            elapsed_ms: started.map(|s| s.elapsed().as_millis() as u64),
        }
    }
}

/// A failure notice with its machine-readable code.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub title: String,
    pub message: String,
    pub kind: NoticeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<NoticeField>,
}

impl ApiError {
    pub fn from_notice(code: &'static str, notice: Notice) -> Self {
        Self {
            code,
            title: notice.title,
            message: notice.description,
            kind: notice.kind,
            fields: notice.fields,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful payload, timed from `started`.
    pub fn ok(data: T, started: Instant) -> Self {
        Self {
            data: Some(data),
            meta: ApiMeta::new(Some(started)),
            errors: Vec::new(),
            links: BTreeMap::new(),
        }
    }

    pub fn with_link(mut self, rel: &'static str, href: impl Into<String>) -> Self {
        self.links.insert(rel, href.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn failure(code: &'static str, notice: Notice) -> Self {
        Self {
            data: None,
            meta: ApiMeta::new(None),
            errors: vec![ApiError::from_notice(code, notice)],
            links: BTreeMap::new(),
        }
    }
}
