//! Lead webhook normalization.
//!
//! This crate turns loosely structured lead payloads pushed by ad platforms,
//! form builders, CRMs and automation tools into one canonical
//! [`ProcessedLead`] shape. It performs no I/O: callers parse the request body
//! into a [`serde_json::Value`], describe the request with a
//! [`RequestContext`], and persist whatever comes back.
//!
//! ```text
//! (raw JSON, RequestContext)
//!     → detect_webhook_type()        (optional)
//!     → ProcessorRegistry::resolve() (unknown keys → generic)
//!     → WebhookProcessor::validate()
//!     → WebhookProcessor::process()
//!     → ProcessedWebhookData
//! ```
//!
//! # Example
//!
//! ```rust
//! use leadhook::{LeadPriority, RequestContext, WebhookPipeline};
//! use serde_json::json;
//!
//! let pipeline = WebhookPipeline::new();
//! let raw = json!([{"name": "Bob", "value": "12000"}, {}]);
//!
//! let data = pipeline
//!     .process_webhook("generic", &raw, &RequestContext::new())
//!     .unwrap();
//! assert_eq!(data.leads.len(), 1);
//! assert_eq!(data.leads[0].priority, Some(LeadPriority::High));
//! assert_eq!(data.original_data(), Some(&raw));
//! ```

pub mod config;
pub mod detector;
pub mod error;
mod fields;
pub mod processors;
pub mod registry;
pub mod types;

pub use config::{ConfigError, ConfigLoadError, LoggingConfig, PipelineConfig};
pub use detector::detect_webhook_type;
pub use error::{NormalizeError, WebhookError};
pub use processors::{ProcessorInfo, WebhookProcessor};
pub use registry::{FALLBACK_KEY, ProcessorRegistry};
pub use types::{
    LeadPriority, LeadSource, ProcessedLead, ProcessedWebhookData, RequestContext, payload_id,
};

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{info, info_span, warn};

/// Metrics observer for pipeline calls.
///
/// `result` carries the number of emitted leads on success.
pub trait PipelineMetrics: Send + Sync {
    fn record_process(&self, provider: &str, latency: Duration, result: Result<usize, WebhookError>);
}

struct MetricsSpan<'a> {
    recorder: &'a dyn PipelineMetrics,
    start: Instant,
}

impl<'a> MetricsSpan<'a> {
    fn start(recorder: Option<&'a Arc<dyn PipelineMetrics>>) -> Option<Self> {
        recorder.map(|recorder| Self {
            recorder: Arc::as_ref(recorder),
            start: Instant::now(),
        })
    }

    fn finish(self, provider: &str, result: &Result<ProcessedWebhookData, WebhookError>) {
        let outcome = match result {
            Ok(data) => Ok(data.leads.len()),
            Err(err) => Err(err.clone()),
        };
        self.recorder
            .record_process(provider, self.start.elapsed(), outcome);
    }
}

/// Entry point for normalizing inbound lead webhooks.
///
/// Cheap to share: wrap it in an `Arc` and call it from any number of threads.
#[derive(Clone)]
pub struct WebhookPipeline {
    registry: Arc<ProcessorRegistry>,
    config: PipelineConfig,
    metrics: Option<Arc<dyn PipelineMetrics>>,
}

impl WebhookPipeline {
    /// Pipeline with the default configuration (no size limits).
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ProcessorRegistry::new()),
            config: PipelineConfig::default(),
            metrics: None,
        }
    }

    /// Pipeline with a validated configuration.
    pub fn with_config(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Reuses an existing registry instead of building a new one.
    pub fn with_registry(mut self, registry: Arc<ProcessorRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Attaches a metrics observer to this pipeline instance.
    pub fn with_metrics(mut self, metrics: Arc<dyn PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ProcessorRegistry> {
        &self.registry
    }

    /// Normalizes `raw` with the processor registered under `type_key`.
    ///
    /// Unknown keys are handled by the generic processor. The payload is
    /// checked against the configured limits, then the processor's
    /// `validate`, then normalized.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::PayloadTooLarge`] when a configured limit is exceeded
    /// - [`WebhookError::InvalidFormat`] when the processor rejects the payload
    /// - [`WebhookError::Processing`] when normalization fails outright
    pub fn process_webhook(
        &self,
        type_key: &str,
        raw: &Value,
        ctx: &RequestContext,
    ) -> Result<ProcessedWebhookData, WebhookError> {
        let span = info_span!("leadhook.process", provider = type_key);
        let _guard = span.enter();
        let started = Instant::now();
        let metrics = MetricsSpan::start(self.metrics.as_ref());

        let result = self.run(type_key, raw, ctx);

        match &result {
            Ok(data) => {
                let skipped = data.skipped_count();
                info!(
                    provider = data.provider.as_str(),
                    lead_count = data.leads.len(),
                    skipped,
                    elapsed_micros = started.elapsed().as_micros() as u64,
                    "webhook_processed"
                )
            }
            Err(err) => warn!(
                provider = type_key,
                status = err.http_status_code(),
                error = %err,
                "webhook_rejected"
            ),
        }
        if let Some(metrics) = metrics {
            metrics.finish(type_key, &result);
        }
        result
    }

    fn run(
        &self,
        type_key: &str,
        raw: &Value,
        ctx: &RequestContext,
    ) -> Result<ProcessedWebhookData, WebhookError> {
        self.check_limits(raw)?;

        let processor = self.registry.resolve(type_key);
        if !processor.validate(raw) {
            return Err(WebhookError::InvalidFormat {
                provider: type_key.to_string(),
            });
        }

        processor
            .process(raw, ctx)
            .map_err(|source| WebhookError::Processing {
                provider: type_key.to_string(),
                source,
            })
    }

    fn check_limits(&self, raw: &Value) -> Result<(), WebhookError> {
        if let (Some(max), Value::Array(items)) = (self.config.max_batch_size, raw) {
            if items.len() > max {
                return Err(WebhookError::PayloadTooLarge(format!(
                    "batch of {} items exceeds max_batch_size {max}",
                    items.len()
                )));
            }
        }
        if let Some(max) = self.config.max_payload_bytes {
            let size = raw.to_string().len();
            if size > max {
                return Err(WebhookError::PayloadTooLarge(format!(
                    "{size} bytes exceeds max_payload_bytes {max}"
                )));
            }
        }
        Ok(())
    }

    /// Detects the provider, then normalizes with it.
    pub fn process_detected(
        &self,
        raw: &Value,
        ctx: &RequestContext,
    ) -> Result<ProcessedWebhookData, WebhookError> {
        let type_key = self.detect_webhook_type(ctx, raw);
        self.process_webhook(type_key, raw, ctx)
    }

    pub fn detect_webhook_type(&self, ctx: &RequestContext, raw: &Value) -> &'static str {
        detect_webhook_type(ctx, raw)
    }

    /// Processor for `type_key`, falling back to the generic one.
    pub fn get_webhook_processor(&self, type_key: &str) -> Arc<dyn WebhookProcessor> {
        Arc::clone(self.registry.resolve(type_key))
    }

    pub fn available_webhook_types(&self) -> Vec<&'static str> {
        self.registry.keys()
    }

    pub fn processor_info(&self, type_key: &str) -> ProcessorInfo {
        self.registry.info(type_key)
    }
}

impl Default for WebhookPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WebhookPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookPipeline")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::RwLock;

    #[derive(Default)]
    struct CountingMetrics {
        events: RwLock<Vec<(String, &'static str)>>,
    }

    impl CountingMetrics {
        fn snapshot(&self) -> Vec<(String, &'static str)> {
            self.events.read().unwrap().clone()
        }
    }

    impl PipelineMetrics for CountingMetrics {
        fn record_process(
            &self,
            provider: &str,
            _latency: Duration,
            result: Result<usize, WebhookError>,
        ) {
            let label = if result.is_ok() { "ok" } else { "err" };
            self.events
                .write()
                .unwrap()
                .push((provider.to_string(), label));
        }
    }

    #[test]
    fn unknown_type_resolves_to_generic() {
        let pipeline = WebhookPipeline::new();
        let data = pipeline
            .process_webhook("mailchimp", &json!({"email": "m@chimp.io"}), &RequestContext::new())
            .unwrap();
        assert_eq!(data.provider, "generic");
        assert_eq!(data.leads.len(), 1);
        assert_eq!(data.leads[0].name, "m");
        assert_eq!(pipeline.get_webhook_processor("mailchimp").key(), "generic");
    }

    #[test]
    fn rejected_payload_names_requested_type() {
        let pipeline = WebhookPipeline::new();
        let err = pipeline
            .process_webhook("LinkedIn", &json!({"email": "a@b.c"}), &RequestContext::new())
            .unwrap_err();
        assert_eq!(
            err,
            WebhookError::InvalidFormat {
                provider: "LinkedIn".into()
            }
        );
    }

    #[test]
    fn processing_failure_is_wrapped() {
        let pipeline = WebhookPipeline::new();
        let err = pipeline
            .process_webhook("zapier", &json!(42), &RequestContext::new())
            .unwrap_err();
        assert!(matches!(err, WebhookError::Processing { ref provider, .. } if provider == "zapier"));
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn batch_limit_is_enforced_before_validation() {
        let config = PipelineConfig {
            max_batch_size: Some(2),
            ..PipelineConfig::default()
        };
        let pipeline = WebhookPipeline::with_config(config).unwrap();
        let raw = json!([{"name": "a"}, {"name": "b"}, {"name": "c"}]);
        let err = pipeline
            .process_webhook("generic", &raw, &RequestContext::new())
            .unwrap_err();
        assert!(matches!(err, WebhookError::PayloadTooLarge(_)));
    }

    #[test]
    fn payload_byte_limit_is_enforced() {
        let config = PipelineConfig {
            max_payload_bytes: Some(16),
            ..PipelineConfig::default()
        };
        let pipeline = WebhookPipeline::with_config(config).unwrap();
        let raw = json!({"notes": "this payload is comfortably longer than sixteen bytes"});
        let err = pipeline
            .process_webhook("generic", &raw, &RequestContext::new())
            .unwrap_err();
        assert_eq!(err.http_status_code(), 413);
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = PipelineConfig {
            version: 9,
            ..PipelineConfig::default()
        };
        assert!(WebhookPipeline::with_config(config).is_err());
    }

    #[test]
    fn introspection_helpers() {
        let pipeline = WebhookPipeline::new();
        assert_eq!(pipeline.available_webhook_types().len(), 7);
        assert_eq!(pipeline.processor_info("swipepages").name, "SwipePages");
        assert_eq!(
            pipeline.detect_webhook_type(
                &RequestContext::new().with_user_agent("HubSpot Connect"),
                &json!({})
            ),
            "hubspot"
        );
    }

    #[test]
    fn metrics_recorder_tracks_outcomes() {
        let metrics = Arc::new(CountingMetrics::default());
        let pipeline = WebhookPipeline::new().with_metrics(metrics.clone());

        let ctx = RequestContext::new();
        assert!(pipeline
            .process_webhook("generic", &json!({"name": "Ok"}), &ctx)
            .is_ok());
        assert!(pipeline
            .process_webhook("hubspot", &json!({"nothing": true}), &ctx)
            .is_err());

        assert_eq!(
            metrics.snapshot(),
            vec![("generic".to_string(), "ok"), ("hubspot".to_string(), "err")]
        );
    }

    #[test]
    fn process_detected_uses_detector() {
        let pipeline = WebhookPipeline::new();
        let raw = json!({"headers": ["Name", "Email"], "values": ["Sam", "sam@z.com"]});
        let data = pipeline
            .process_detected(&raw, &RequestContext::new())
            .unwrap();
        assert_eq!(data.provider, "google-forms");
        assert_eq!(data.leads[0].email.as_deref(), Some("sam@z.com"));
    }
}
