//! Facebook Lead Ads.
//!
//! Two shapes are accepted:
//!
//! - the page subscription envelope: `{"object": "page", "entry": [{"changes": [...]}]}`,
//!   where every change with `field == "leadgen"` carries one lead in `value`;
//! - a direct lead object with `leadgen_id`, `form_id` or `field_data`.
//!
//! `field_data` is a list of `{ "name": ..., "values": [...] }` pairs.
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::NormalizeError;
use crate::fields::{currency_amount, fill, first_text, is_multi_valued, LeadDraft, PriorityRule};
use crate::processors::WebhookProcessor;
use crate::types::{LeadSource, ProcessedLead, ProcessedWebhookData, RequestContext};

const KEY: &str = "facebook";
const LEAD_TAG: &str = "facebook-lead";
const PRIORITY: PriorityRule = PriorityRule::high_above(10_000.0);
const NOTE_SEPARATOR: &str = "\n";

/// Identifiers copied from the lead envelope into `customFields`.
const ID_FIELDS: &[&str] = &[
    "leadgen_id",
    "form_id",
    "ad_id",
    "adgroup_id",
    "campaign_id",
    "page_id",
    "created_time",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct FacebookProcessor;

impl WebhookProcessor for FacebookProcessor {
    fn key(&self) -> &'static str {
        KEY
    }

    fn name(&self) -> &'static str {
        "Facebook Lead Ads"
    }

    fn description(&self) -> &'static str {
        "Lead Ads form submissions delivered through page webhooks"
    }

    fn validate(&self, raw: &Value) -> bool {
        let Some(obj) = raw.as_object() else {
            return false;
        };
        is_page_envelope(obj)
            || obj.contains_key("leadgen_id")
            || obj.contains_key("form_id")
            || obj.contains_key("field_data")
    }

    fn process(
        &self,
        raw: &Value,
        ctx: &RequestContext,
    ) -> Result<ProcessedWebhookData, NormalizeError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| NormalizeError::shape("$", "object", raw))?;

        let mut leads = Vec::new();
        let mut skipped = 0;

        if is_page_envelope(obj) {
            for (entry_idx, change_idx, value) in leadgen_changes(obj)? {
                match lead_from_object(value) {
                    Ok(Some(lead)) => leads.push(lead),
                    Ok(None) => {}
                    Err(err) => {
                        skipped += 1;
                        warn!(
                            provider = KEY,
                            entry = entry_idx,
                            change = change_idx,
                            error = %err,
                            "lead_skipped"
                        );
                    }
                }
            }
        } else {
            leads.extend(lead_from_object(raw)?);
        }

        let mut extra = Map::new();
        extra.insert(
            "signaturePresent".into(),
            Value::Bool(ctx.has_header("x-hub-signature-256") || ctx.has_header("x-hub-signature")),
        );

        Ok(ProcessedWebhookData::new(
            leads,
            LeadSource::SocialMedia.as_str(),
            KEY,
            raw,
            skipped,
            extra,
        ))
    }
}

fn is_page_envelope(obj: &Map<String, Value>) -> bool {
    obj.get("object").and_then(Value::as_str) == Some("page") && obj.contains_key("entry")
}

/// Walks `entry[].changes[]`, keeping `leadgen` changes in traversal order.
fn leadgen_changes(obj: &Map<String, Value>) -> Result<Vec<(usize, usize, &Value)>, NormalizeError> {
    let entries = match obj.get("entry") {
        Some(Value::Array(entries)) => entries,
        Some(other) => return Err(NormalizeError::shape("entry", "array", other)),
        None => return Ok(Vec::new()),
    };

    let mut found = Vec::new();
    for (entry_idx, entry) in entries.iter().enumerate() {
        let changes = match entry.get("changes") {
            Some(Value::Array(changes)) => changes,
            Some(other) => {
                return Err(NormalizeError::shape(
                    format!("entry[{entry_idx}].changes"),
                    "array",
                    other,
                ));
            }
            None => continue,
        };
        for (change_idx, change) in changes.iter().enumerate() {
            if change.get("field").and_then(Value::as_str) != Some("leadgen") {
                continue;
            }
            if let Some(value) = change.get("value") {
                found.push((entry_idx, change_idx, value));
            }
        }
    }
    Ok(found)
}

/// Builds one lead from a leadgen value or a direct lead object.
fn lead_from_object(value: &Value) -> Result<Option<ProcessedLead>, NormalizeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| NormalizeError::shape("value", "object", value))?;

    let mut draft = LeadDraft::new(LeadSource::SocialMedia);
    draft.tag(LEAD_TAG);

    if let Some(field_data) = obj.get("field_data") {
        let items = field_data
            .as_array()
            .ok_or_else(|| NormalizeError::shape("field_data", "array", field_data))?;
        for item in items {
            apply_field(&mut draft, item)?;
        }
    }

    for key in ID_FIELDS {
        if let Some(id) = obj.get(*key).filter(|v| !v.is_null()) {
            draft.keep_custom(key, key, id);
        }
    }
    if let Some(campaign) = obj.get("campaign_id").and_then(first_text) {
        draft.tag(format!("campaign-{campaign}"));
    }
    for (key, other) in obj {
        if key != "field_data" && !ID_FIELDS.contains(&key.as_str()) {
            draft.keep_custom(key, key, other);
        }
    }

    Ok(draft.finalize(PRIORITY, KEY))
}

/// Maps one `{name, values}` pair onto the draft.
fn apply_field(draft: &mut LeadDraft, item: &Value) -> Result<(), NormalizeError> {
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| NormalizeError::Malformed("field_data item without a name".into()))?
        .trim()
        .to_lowercase();
    let values = item.get("values").unwrap_or(&Value::Null);
    let text = first_text(values);

    let stored = match name.as_str() {
        "full_name" | "name" => fill(&mut draft.name, text),
        "first_name" => fill(&mut draft.first_name, text),
        "last_name" => fill(&mut draft.last_name, text),
        "email" | "email_address" => fill(&mut draft.email, text.map(|e| e.to_lowercase())),
        "phone_number" | "phone" => fill(&mut draft.phone, text),
        "company_name" | "company" => fill(&mut draft.company, text),
        "job_title" => {
            draft.has_title |= text.is_some();
            false
        }
        "budget" => match text.as_deref().and_then(currency_amount) {
            Some(amount) if draft.value.is_none() => {
                draft.value = Some(amount);
                true
            }
            _ => false,
        },
        "message" | "comments" | "notes" | "additional_info" => {
            text.is_some_and(|note| draft.push_note(&note, NOTE_SEPARATOR))
        }
        // city, state, country and anything unrecognised
        _ => false,
    };

    // A mapped attribute holds only the first value; the full list is kept too.
    if !stored || is_multi_valued(values) {
        draft.keep_custom(&name, &name, &field_value(values));
    }
    Ok(())
}

/// A single value collapses to a scalar; several are kept as an array.
fn field_value(values: &Value) -> Value {
    match values {
        Value::Array(items) if items.len() == 1 => items[0].clone(),
        other => other.clone(),
    }
}
