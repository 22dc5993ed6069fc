//! Zapier.
//!
//! The Zap author decides the payload shape, so `validate` accepts anything and
//! `process` only needs a JSON object. A `custom_fields` object is merged into
//! `customFields` as-is and a `tags` array extends the lead's tags.
use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::fields::{fill, parse_float, scalar_text, LeadDraft, PriorityRule};
use crate::processors::WebhookProcessor;
use crate::types::{LeadSource, ProcessedWebhookData, RequestContext};

const KEY: &str = "zapier";
const PRIORITY: PriorityRule = PriorityRule::high_above(10_000.0);
const NOTE_SEPARATOR: &str = "\n";

#[derive(Debug, Default, Clone, Copy)]
pub struct ZapierProcessor;

impl WebhookProcessor for ZapierProcessor {
    fn key(&self) -> &'static str {
        KEY
    }

    fn name(&self) -> &'static str {
        "Zapier"
    }

    fn description(&self) -> &'static str {
        "Leads pushed by a Zapier webhook action"
    }

    fn validate(&self, _raw: &Value) -> bool {
        true
    }

    fn process(
        &self,
        raw: &Value,
        _ctx: &RequestContext,
    ) -> Result<ProcessedWebhookData, NormalizeError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| NormalizeError::shape("$", "object", raw))?;

        let mut draft = LeadDraft::new(LeadSource::Other);
        for (key, value) in obj {
            let text = scalar_text(value);
            let stored = match key.as_str() {
                "name" | "full_name" => fill(&mut draft.name, text),
                "first_name" => fill(&mut draft.first_name, text),
                "last_name" => fill(&mut draft.last_name, text),
                "email" => fill(&mut draft.email, text),
                "phone" => fill(&mut draft.phone, text),
                "company" => fill(&mut draft.company, text),
                "notes" | "message" => {
                    text.is_some_and(|note| draft.push_note(&note, NOTE_SEPARATOR))
                }
                "value" | "amount" => match parse_float(value) {
                    Some(amount) if draft.value.is_none() => {
                        draft.value = Some(amount);
                        true
                    }
                    _ => false,
                },
                "source" => {
                    match text.as_deref().and_then(LeadSource::parse_known) {
                        Some(source) => draft.source = source,
                        None => draft.keep_custom("original_source", key, value),
                    }
                    true
                }
                "custom_fields" => {
                    merge_custom_fields(&mut draft, value)?;
                    true
                }
                "tags" => {
                    merge_tags(&mut draft, value);
                    true
                }
                _ => false,
            };
            if !stored {
                draft.keep_custom(key, key, value);
            }
        }

        let source = draft.source.clone();
        let leads = draft.finalize(PRIORITY, KEY).into_iter().collect();
        Ok(ProcessedWebhookData::new(
            leads,
            source.as_str(),
            KEY,
            raw,
            0,
            Map::new(),
        ))
    }
}

fn merge_custom_fields(draft: &mut LeadDraft, value: &Value) -> Result<(), NormalizeError> {
    match value {
        Value::Object(fields) => {
            for (key, field) in fields {
                draft.keep_custom(key, key, field);
            }
            Ok(())
        }
        Value::Null => Ok(()),
        other => Err(NormalizeError::shape("custom_fields", "object", other)),
    }
}

fn merge_tags(draft: &mut LeadDraft, value: &Value) {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).for_each(|t| draft.tag(t)),
        Value::String(list) => list
            .split(',')
            .map(str::trim)
            .for_each(|t| draft.tag(t)),
        _ => draft.keep_custom("tags", "tags", value),
    }
}
