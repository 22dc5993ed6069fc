//! Error types produced by the webhook pipeline.
//!
//! Two layers of errors exist:
//!
//! - [`NormalizeError`] is what a processor reports when it cannot walk the
//!   payload it was handed. Processors use it both for a whole call and for a
//!   single candidate lead inside a batch; in the latter case the error is
//!   logged and the candidate skipped.
//! - [`WebhookError`] is the surface the facade returns to callers. It names
//!   the provider that was requested so the caller can map it to a response.
//!
//! | Error | Category | Description |
//! |-------|----------|-------------|
//! | [`InvalidFormat`](WebhookError::InvalidFormat) | Rejected payload | `validate()` returned false |
//! | [`Processing`](WebhookError::Processing) | Normalization failure | processor could not traverse the payload |
//! | [`PayloadTooLarge`](WebhookError::PayloadTooLarge) | Rejected payload | configured size or batch limit exceeded |
//!
//! # HTTP Status Code Mapping
//!
//! ```rust
//! use leadhook::WebhookError;
//!
//! fn to_http_status(error: &WebhookError) -> u16 {
//!     error.http_status_code()
//! }
//!
//! let err = WebhookError::InvalidFormat { provider: "facebook".into() };
//! assert_eq!(to_http_status(&err), 400);
//! ```
use thiserror::Error;

/// Errors surfaced by [`WebhookPipeline`](crate::WebhookPipeline).
///
/// The enum is marked `#[non_exhaustive]`; callers should keep a catch-all arm.
///
/// ```rust
/// use leadhook::WebhookError;
///
/// let err = WebhookError::InvalidFormat { provider: "hubspot".into() };
/// assert_eq!(err.to_string(), "Invalid data format for hubspot webhook");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum WebhookError {
    /// The selected processor's `validate()` rejected the payload.
    ///
    /// `provider` is the type key the caller asked for, not the processor
    /// that ended up resolving it.
    #[error("Invalid data format for {provider} webhook")]
    InvalidFormat { provider: String },

    /// The processor accepted the payload but could not normalize it.
    #[error("Error processing {provider} webhook: {source}")]
    Processing {
        provider: String,
        #[source]
        source: NormalizeError,
    },

    /// Payload exceeds a configured limit
    /// ([`PipelineConfig::max_payload_bytes`](crate::PipelineConfig::max_payload_bytes)
    /// or [`PipelineConfig::max_batch_size`](crate::PipelineConfig::max_batch_size)).
    #[error("payload exceeds size limit: {0}")]
    PayloadTooLarge(String),
}

impl WebhookError {
    /// True when the payload was turned away before any processor ran
    /// (`validate()` or a configured limit); false when normalization started
    /// and failed.
    pub fn is_rejection(&self) -> bool {
        match self {
            WebhookError::InvalidFormat { .. } | WebhookError::PayloadTooLarge(_) => true,
            WebhookError::Processing { .. } => false,
        }
    }

    /// Suggested HTTP status code for this error.
    ///
    /// - `InvalidFormat`: 400
    /// - `Processing`: 422
    /// - `PayloadTooLarge`: 413
    ///
    /// ```rust
    /// use leadhook::{NormalizeError, WebhookError};
    ///
    /// let err = WebhookError::Processing {
    ///     provider: "facebook".into(),
    ///     source: NormalizeError::Malformed("entry is not an array".into()),
    /// };
    /// assert_eq!(err.http_status_code(), 422);
    /// ```
    pub fn http_status_code(&self) -> u16 {
        match self {
            WebhookError::InvalidFormat { .. } => 400,
            WebhookError::Processing { .. } => 422,
            WebhookError::PayloadTooLarge(_) => 413,
        }
    }

    /// Provider named by the error, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            WebhookError::InvalidFormat { provider } | WebhookError::Processing { provider, .. } => {
                Some(provider)
            }
            WebhookError::PayloadTooLarge(_) => None,
        }
    }
}

/// Failure raised by a processor while walking a payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NormalizeError {
    /// A node had a different JSON type than the processor needs.
    #[error("expected {expected} at `{path}`, found {found}")]
    UnexpectedShape {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Structure is present but unusable.
    #[error("{0}")]
    Malformed(String),
}

impl NormalizeError {
    pub(crate) fn shape(path: impl Into<String>, expected: &'static str, found: &serde_json::Value) -> Self {
        NormalizeError::UnexpectedShape {
            path: path.into(),
            expected,
            found: json_kind(found),
        }
    }
}

/// Short JSON type name used in error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
