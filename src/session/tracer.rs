//! Clients for the external execution tracer
//!
//! The tracer takes program source and answers with either
//! `{"frames": [...], "complexity": "..."}` or `{"error": "...", "line": n}`.
//! [`HttpTracer`] posts to a running tracer service; [`FileTracer`] replays a
//! response saved to disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::errors::TracerError;
use crate::snapshot::Frame;

/// A successful tracer answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceResponse {
    #[serde(default)]
    pub frames: Vec<Frame>,
    /// Complexity label computed by the tracer, shown as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default, deserialize_with = "deserialize_error_line")]
    line: Option<u32>,
}

/// A line that is not a positive integer is dropped; the message still gets through
fn deserialize_error_line<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_u64)
        .and_then(|n| u32::try_from(n).ok()))
}

#[derive(Serialize)]
struct TraceRequest<'a> {
    code: &'a str,
}

/// Something that turns program source into a trace
pub trait Tracer: Send + Sync {
    fn trace(&self, source: &str) -> Result<TraceResponse, TracerError>;
}

/// Decode a tracer body. An `error` document wins regardless of status.
pub fn decode_response(success: bool, body: &str) -> Result<TraceResponse, TracerError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| TracerError::InvalidResponse {
            message: e.to_string(),
        })?;

    if value.get("error").is_some() {
        let err: ErrorBody =
            serde_json::from_value(value).map_err(|e| TracerError::InvalidResponse {
                message: e.to_string(),
            })?;
        return Err(TracerError::Execution {
            message: err.error,
            line: err.line.filter(|&n| n > 0),
        });
    }

    if !success {
        return Err(TracerError::InvalidResponse {
            message: "error status without an error message".to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| TracerError::InvalidResponse {
        message: e.to_string(),
    })
}

/// Tracer reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpTracer {
    client: Client,
    endpoint: String,
}

impl HttpTracer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TracerError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(timeout)
            .build()
            .map_err(|e| TracerError::Unreachable {
                message: e.to_string(),
            })?;

        Ok(HttpTracer {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl Tracer for HttpTracer {
    fn trace(&self, source: &str) -> Result<TraceResponse, TracerError> {
        debug!(endpoint = %self.endpoint, bytes = source.len(), "requesting trace");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&TraceRequest { code: source })
            .send()
            .map_err(|e| {
                warn!(error = %e, "tracer request failed");
                TracerError::Unreachable {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| TracerError::Unreachable {
            message: e.to_string(),
        })?;
        debug!(%status, bytes = body.len(), "tracer responded");

        decode_response(status.is_success(), &body)
    }
}

/// Tracer that replays a saved response document
#[derive(Debug, Clone)]
pub struct FileTracer {
    path: PathBuf,
}

impl FileTracer {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileTracer {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Tracer for FileTracer {
    fn trace(&self, _source: &str) -> Result<TraceResponse, TracerError> {
        let body = fs::read_to_string(&self.path).map_err(|e| TracerError::Unreachable {
            message: format!("{}: {}", self.path.display(), e),
        })?;
        decode_response(true, &body)
    }
}
