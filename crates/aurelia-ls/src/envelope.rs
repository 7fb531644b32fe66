//! The command-response envelope.
//!
//! Every session command answers with the same shape: schema version,
//! status, result, an epistemic block naming what the engine does not
//! know, and execution metadata. Host-contract violations surface as
//! `status: error` with a stable code; they are never panics.

use serde::Serialize;

/// Current envelope schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Overall command status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Fully answered.
    Ok,
    /// Answered, but with named gaps.
    Degraded,
    /// Not answered; see `errors`.
    Error,
}

/// How much the engine trusts the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Derived from complete information.
    Exact,
    /// Minor gaps that should not affect the answer.
    High,
    /// Known gaps; parts of the answer may be missing.
    Partial,
    /// Major gaps.
    Low,
    /// No basis for the answer.
    Unknown,
}

/// The epistemic block.
#[derive(Debug, Clone, Serialize)]
pub struct Epistemic {
    /// Trust level.
    pub confidence: Confidence,
    /// Named gaps (missing provenance, missing snapshots, …).
    pub gaps: Vec<String>,
}

/// Whether the answer came from a memoized artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// Served from a memoized compilation.
    Hit,
    /// Computed fresh.
    Miss,
    /// Caching does not apply to the command.
    None,
}

/// Execution metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    /// Wall time in microseconds.
    pub duration_us: u64,
    /// Cache behavior.
    pub cache: CacheState,
    /// Peak additional memory, when the host measures it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_bytes: Option<u64>,
    /// What invalidated the previous artifact, when a recompute happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalidation: Option<String>,
}

impl Meta {
    /// Metadata with just timing and cache state.
    pub fn timed(duration_us: u64, cache: CacheState) -> Self {
        Self {
            duration_us,
            cache,
            memory_bytes: None,
            invalidation: None,
        }
    }
}

/// A command error with a stable code.
#[derive(Debug, Clone, Serialize)]
pub struct CommandError {
    /// Stable error code (`unknown-session`, `missing-snapshot`,
    /// `cancelled`, …).
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// The envelope itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T: Serialize> {
    /// Envelope schema version.
    pub schema_version: u32,
    /// The command that was executed.
    pub command: String,
    /// Overall status.
    pub status: Status,
    /// The result, absent on error.
    pub result: Option<T>,
    /// Epistemic block.
    pub epistemic: Epistemic,
    /// Execution metadata.
    pub meta: Meta,
    /// Errors, empty unless `status` is `error`.
    pub errors: Vec<CommandError>,
}

impl<T: Serialize> Envelope<T> {
    /// A fully-answered envelope.
    pub fn ok(command: &str, result: T, meta: Meta) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            command: command.to_string(),
            status: Status::Ok,
            result: Some(result),
            epistemic: Epistemic {
                confidence: Confidence::Exact,
                gaps: Vec::new(),
            },
            meta,
            errors: Vec::new(),
        }
    }

    /// An answered envelope with named gaps.
    pub fn degraded(command: &str, result: T, gaps: Vec<String>, meta: Meta) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            command: command.to_string(),
            status: Status::Degraded,
            result: Some(result),
            epistemic: Epistemic {
                confidence: Confidence::Partial,
                gaps,
            },
            meta,
            errors: Vec::new(),
        }
    }

    /// A failed envelope.
    pub fn error(command: &str, code: &str, message: impl Into<String>, meta: Meta) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            command: command.to_string(),
            status: Status::Error,
            result: None,
            epistemic: Epistemic {
                confidence: Confidence::Unknown,
                gaps: Vec::new(),
            },
            meta,
            errors: vec![CommandError {
                code: code.to_string(),
                message: message.into(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_camel_case() {
        let envelope = Envelope::ok("diagnostics", 42u32, Meta::timed(10, CacheState::Miss));
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"schemaVersion\":1"));
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"confidence\":\"exact\""));
    }

    #[test]
    fn error_envelope_has_no_result() {
        let envelope: Envelope<u32> = Envelope::error(
            "rename",
            "missing-snapshot",
            "no snapshot for /a.html",
            Meta::timed(1, CacheState::None),
        );
        assert_eq!(envelope.status, Status::Error);
        assert!(envelope.result.is_none());
        assert_eq!(envelope.errors[0].code, "missing-snapshot");
    }
}
