//! Per-provider normalizers.
//!
//! Each provider gets a stateless unit implementing [`WebhookProcessor`]. The
//! set is closed: [`ProcessorRegistry`](crate::ProcessorRegistry) builds one
//! instance of each at construction time and shares them across calls.
use serde_json::Value;

use crate::error::NormalizeError;
use crate::types::{ProcessedWebhookData, RequestContext};

mod facebook;
mod generic;
mod google_forms;
mod hubspot;
mod linkedin;
mod swipepages;
mod zapier;

pub use facebook::FacebookProcessor;
pub use generic::GenericProcessor;
pub use google_forms::GoogleFormsProcessor;
pub use hubspot::HubSpotProcessor;
pub use linkedin::LinkedInProcessor;
pub use swipepages::SwipePagesProcessor;
pub use zapier::ZapierProcessor;

/// Capability contract every provider normalizer implements.
///
/// Implementations hold no mutable state: the same payload and context always
/// produce the same leads.
pub trait WebhookProcessor: Send + Sync {
    /// Registry key, lowercase (e.g. `"google-forms"`).
    fn key(&self) -> &'static str;

    /// Human-readable label.
    fn name(&self) -> &'static str;

    /// One-line description for configuration screens and docs.
    fn description(&self) -> &'static str;

    /// Cheap acceptance test. Must not panic.
    fn validate(&self, raw: &Value) -> bool;

    /// Normalizes the payload.
    ///
    /// Failures for individual candidates inside a batch are logged and the
    /// candidate skipped; an error here means nothing structured could be
    /// produced at all.
    fn process(
        &self,
        raw: &Value,
        ctx: &RequestContext,
    ) -> Result<ProcessedWebhookData, NormalizeError>;
}

/// Static display metadata for one processor.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProcessorInfo {
    pub name: &'static str,
    pub description: &'static str,
}

impl ProcessorInfo {
    pub fn of(processor: &dyn WebhookProcessor) -> Self {
        Self {
            name: processor.name(),
            description: processor.description(),
        }
    }
}
