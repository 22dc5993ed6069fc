//! Fixed lookup table from provider key to processor.
//!
//! The table is built once and never mutated. Share it with `Arc` when several
//! pipelines or threads need it.
use std::sync::Arc;

use crate::processors::{
    FacebookProcessor, GenericProcessor, GoogleFormsProcessor, HubSpotProcessor,
    LinkedInProcessor, ProcessorInfo, SwipePagesProcessor, WebhookProcessor, ZapierProcessor,
};

/// Key every unknown lookup resolves to.
pub const FALLBACK_KEY: &str = "generic";

/// Immutable provider table.
///
/// Lookups are case-insensitive and never fail: an unknown key resolves to
/// the generic processor.
///
/// ```rust
/// use leadhook::ProcessorRegistry;
///
/// let registry = ProcessorRegistry::new();
/// assert_eq!(registry.resolve("HubSpot").key(), "hubspot");
/// assert_eq!(registry.resolve("mailchimp").key(), "generic");
/// ```
pub struct ProcessorRegistry {
    entries: Vec<Arc<dyn WebhookProcessor>>,
    fallback: Arc<dyn WebhookProcessor>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        let fallback: Arc<dyn WebhookProcessor> = Arc::new(GenericProcessor);
        let entries: Vec<Arc<dyn WebhookProcessor>> = vec![
            Arc::new(FacebookProcessor),
            Arc::new(GoogleFormsProcessor),
            Arc::new(LinkedInProcessor),
            Arc::new(HubSpotProcessor),
            Arc::new(ZapierProcessor),
            Arc::new(SwipePagesProcessor),
            Arc::clone(&fallback),
        ];
        Self { entries, fallback }
    }

    /// Exact lookup; `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<&Arc<dyn WebhookProcessor>> {
        let wanted = key.trim();
        self.entries
            .iter()
            .find(|processor| processor.key().eq_ignore_ascii_case(wanted))
    }

    /// Lookup with fallback to the generic processor.
    pub fn resolve(&self, key: &str) -> &Arc<dyn WebhookProcessor> {
        self.get(key).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|processor| processor.key()).collect()
    }

    /// Display metadata for the processor `key` resolves to.
    pub fn info(&self, key: &str) -> ProcessorInfo {
        ProcessorInfo::of(self.resolve(key).as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
