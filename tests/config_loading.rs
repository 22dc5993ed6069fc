use std::io::Write;

use leadhook::{ConfigLoadError, PipelineConfig, RequestContext, WebhookError, WebhookPipeline};
use serde_json::json;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(yaml.as_bytes()).expect("write config");
    file
}

#[test]
fn config_file_limits_apply_to_pipeline() {
    let file = write_config(
        r#"
version: 1
max_batch_size: 2
logging:
  level: warn
"#,
    );
    let config = PipelineConfig::from_file(file.path()).expect("config loads");
    assert_eq!(config.logging.level, "warn");
    assert!(!config.logging.json);

    let pipeline = WebhookPipeline::with_config(config).expect("valid config");
    let ctx = RequestContext::new();

    let ok = json!([{"name": "a"}, {"name": "b"}]);
    assert_eq!(pipeline.process_webhook("generic", &ok, &ctx).unwrap().leads.len(), 2);

    let too_many = json!([{"name": "a"}, {"name": "b"}, {"name": "c"}]);
    assert!(matches!(
        pipeline.process_webhook("generic", &too_many, &ctx),
        Err(WebhookError::PayloadTooLarge(_))
    ));
}

#[test]
fn invalid_config_file_reports_validation_error() {
    let file = write_config("max_payload_bytes: 0\n");
    let err = PipelineConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigLoadError::Validation(_)));
    assert!(err.to_string().contains("max_payload_bytes"));
}

#[test]
fn unknown_fields_are_ignored() {
    let file = write_config("version: 1\nfuture_option: true\n");
    assert!(PipelineConfig::from_file(file.path()).is_ok());
}
