//! Core data model for the webhook pipeline.
//!
//! Every processor converges on these shapes; they are the only integration
//! point between the normalizers and the rest of the application.
//!
//! # Type Hierarchy
//!
//! ```text
//! (raw payload: serde_json::Value, RequestContext)
//!
//!         ↓ WebhookPipeline::process_webhook()
//!
//! ProcessedWebhookData
//! ├── leads: Vec<ProcessedLead>
//! │   ├── name: String (never empty)
//! │   ├── email / phone / company: Option<String>
//! │   ├── source: LeadSource
//! │   ├── value: Option<f64> (non-negative)
//! │   ├── notes: Option<String>
//! │   ├── custom_fields: Map<String, Value>
//! │   ├── tags: BTreeSet<String>
//! │   └── priority: Option<LeadPriority>
//! ├── source: String
//! ├── provider: String
//! └── metadata: Map<String, Value>
//!     ├── originalData
//!     ├── processedAt
//!     └── payloadId, leadCount, skippedCount, ...
//! ```
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Namespace for [`ProcessedWebhookData`] payload ids.
const PAYLOAD_ID_NAMESPACE: Uuid = Uuid::NAMESPACE_OID;

/// Classification of where a lead came from.
///
/// The seven named variants are the closed set the application understands.
/// [`LeadSource::Custom`] carries provider labels outside that set (for example
/// a landing page's `utm_source=google`); it serializes as the bare label.
///
/// ```rust
/// use leadhook::LeadSource;
///
/// assert_eq!(LeadSource::from_label("Social_Media"), LeadSource::SocialMedia);
/// assert_eq!(LeadSource::from_label("google"), LeadSource::Custom("google".into()));
/// assert_eq!(LeadSource::parse_known("google"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LeadSource {
    Manual,
    Website,
    Referral,
    SocialMedia,
    Email,
    Phone,
    #[default]
    Other,
    Custom(String),
}

impl LeadSource {
    /// Parses one of the known labels, case-insensitively.
    pub fn parse_known(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "manual" => Some(LeadSource::Manual),
            "website" => Some(LeadSource::Website),
            "referral" => Some(LeadSource::Referral),
            "social_media" => Some(LeadSource::SocialMedia),
            "email" => Some(LeadSource::Email),
            "phone" => Some(LeadSource::Phone),
            "other" => Some(LeadSource::Other),
            _ => None,
        }
    }

    /// Parses a known label or keeps the trimmed input as [`LeadSource::Custom`].
    pub fn from_label(label: &str) -> Self {
        Self::parse_known(label).unwrap_or_else(|| LeadSource::Custom(label.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            LeadSource::Manual => "manual",
            LeadSource::Website => "website",
            LeadSource::Referral => "referral",
            LeadSource::SocialMedia => "social_media",
            LeadSource::Email => "email",
            LeadSource::Phone => "phone",
            LeadSource::Other => "other",
            LeadSource::Custom(label) => label.as_str(),
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LeadSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LeadSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(LeadSource::from_label(&label))
    }
}

/// Derived lead priority. Never read from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadPriority {
    Low,
    Medium,
    High,
}

/// The canonical lead record every processor produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedLead {
    /// Never empty in emitted leads.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub source: LeadSource,
    /// Estimated monetary value; never negative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Every source field that was not mapped to a named attribute, keyed by
    /// the provider's own field name.
    #[serde(default)]
    pub custom_fields: Map<String, Value>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<LeadPriority>,
}

/// Result of one normalization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedWebhookData {
    pub leads: Vec<ProcessedLead>,
    /// Dominant source classification for the call.
    pub source: String,
    /// Key of the processor that produced this result.
    pub provider: String,
    /// Always carries `originalData` and `processedAt`.
    pub metadata: Map<String, Value>,
}

impl ProcessedWebhookData {
    /// Assembles the result and stamps the standard metadata keys.
    ///
    /// `extra` entries are inserted after the standard keys and never
    /// overwrite `originalData` or `processedAt`.
    pub fn new(
        leads: Vec<ProcessedLead>,
        source: impl Into<String>,
        provider: impl Into<String>,
        raw: &Value,
        skipped: usize,
        extra: Map<String, Value>,
    ) -> Self {
        let mut metadata = Map::new();
        metadata.insert("originalData".into(), raw.clone());
        metadata.insert(
            "processedAt".into(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        metadata.insert("payloadId".into(), Value::String(payload_id(raw).to_string()));
        metadata.insert("leadCount".into(), Value::from(leads.len()));
        metadata.insert("skippedCount".into(), Value::from(skipped));
        for (key, value) in extra {
            if key != "originalData" && key != "processedAt" {
                metadata.insert(key, value);
            }
        }

        Self {
            leads,
            source: source.into(),
            provider: provider.into(),
            metadata,
        }
    }

    /// The raw payload this result was produced from.
    pub fn original_data(&self) -> Option<&Value> {
        self.metadata.get("originalData")
    }

    pub fn processed_at(&self) -> Option<&str> {
        self.metadata.get("processedAt").and_then(Value::as_str)
    }

    /// Candidates skipped because they were malformed.
    pub fn skipped_count(&self) -> u64 {
        self.metadata
            .get("skippedCount")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
}

/// Deterministic id for a raw payload: UUIDv5 over its JSON serialization.
///
/// Identical deliveries map to the same id, which lets callers spot replays
/// without keeping state in this crate.
pub fn payload_id(raw: &Value) -> Uuid {
    Uuid::new_v5(&PAYLOAD_ID_NAMESPACE, raw.to_string().as_bytes())
}

/// Request metadata handed in by the transport layer.
///
/// Header names are stored lowercased so lookups are case-insensitive.
///
/// ```rust
/// use leadhook::RequestContext;
///
/// let ctx = RequestContext::new()
///     .with_header("X-Hub-Signature-256", "sha256=abc")
///     .with_user_agent("facebookexternalua");
///
/// assert_eq!(ctx.header("x-hub-signature-256"), Some("sha256=abc"));
/// assert_eq!(ctx.user_agent(), Some("facebookexternalua"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    headers: BTreeMap<String, String>,
    user_agent: Option<String>,
    content_type: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from `(name, value)` pairs.
    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(Self::new(), |ctx, (name, value)| ctx.with_header(name, value))
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().trim().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Explicit agent, else the `User-Agent` header.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent
            .as_deref()
            .or_else(|| self.header("user-agent"))
    }

    /// Explicit content type, else the `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .or_else(|| self.header("content-type"))
    }

    /// Iterates headers as `(lowercased name, value)`.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
