//! Fallback normalizer for any JSON object, or an array of them.
//!
//! Recognition is alias-driven: every raw key is compacted (lowercase,
//! alphanumerics only) and looked up in the alias lists below. Keys that match
//! nothing are kept verbatim in `customFields`.
//!
//! # Batch mode
//!
//! An array payload is treated as a batch; every element is an independent
//! candidate. A malformed element is logged and skipped without affecting the
//! others.
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::NormalizeError;
use crate::fields::{compact_key, dominant_source, parse_float, scalar_text, LeadDraft, PriorityRule};
use crate::processors::WebhookProcessor;
use crate::types::{LeadSource, ProcessedLead, ProcessedWebhookData, RequestContext};

const KEY: &str = "generic";
const PRIORITY: PriorityRule = PriorityRule::high_above(10_000.0).with_medium_above(1_000.0);
const NOTE_SEPARATOR: &str = "\n";

const NAME_ALIASES: &[&str] = &[
    "name",
    "fullname",
    "firstname",
    "lastname",
    "first",
    "last",
    "contactname",
    "customername",
    "yourname",
];
const EMAIL_ALIASES: &[&str] = &["email", "emailaddress", "mail", "contactemail", "useremail"];
const PHONE_ALIASES: &[&str] = &[
    "phone",
    "phonenumber",
    "mobile",
    "telephone",
    "tel",
    "cell",
    "contactphone",
];
const COMPANY_ALIASES: &[&str] = &[
    "company",
    "companyname",
    "organization",
    "organisation",
    "business",
    "org",
];
const NOTES_ALIASES: &[&str] = &[
    "notes",
    "note",
    "message",
    "comments",
    "comment",
    "description",
    "details",
    "inquiry",
];
const VALUE_ALIASES: &[&str] = &["value", "amount", "budget", "dealvalue", "price", "revenue"];
const SOURCE_ALIASES: &[&str] = &["source", "leadsource", "origin", "channel"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Email,
    Phone,
    Company,
    Notes,
    Value,
    Source,
}

fn classify(raw_key: &str) -> Option<Field> {
    let key = compact_key(raw_key);
    let key = key.as_str();
    [
        (NAME_ALIASES, Field::Name),
        (EMAIL_ALIASES, Field::Email),
        (PHONE_ALIASES, Field::Phone),
        (COMPANY_ALIASES, Field::Company),
        (NOTES_ALIASES, Field::Notes),
        (VALUE_ALIASES, Field::Value),
        (SOURCE_ALIASES, Field::Source),
    ]
    .into_iter()
    .find(|(aliases, _)| aliases.contains(&key))
    .map(|(_, field)| field)
}

fn is_non_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| !obj.is_empty())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GenericProcessor;

impl WebhookProcessor for GenericProcessor {
    fn key(&self) -> &'static str {
        KEY
    }

    fn name(&self) -> &'static str {
        "Generic Webhook"
    }

    fn description(&self) -> &'static str {
        "Any JSON object or array of objects, mapped through common field aliases"
    }

    fn validate(&self, raw: &Value) -> bool {
        match raw {
            Value::Array(items) => items.iter().any(is_non_empty_object),
            other => is_non_empty_object(other),
        }
    }

    fn process(
        &self,
        raw: &Value,
        _ctx: &RequestContext,
    ) -> Result<ProcessedWebhookData, NormalizeError> {
        let candidates: Vec<&Value> = match raw {
            Value::Array(items) => items.iter().collect(),
            Value::Object(_) => vec![raw],
            other => return Err(NormalizeError::shape("$", "object or array", other)),
        };

        let mut leads = Vec::new();
        let mut skipped = 0;
        for (idx, candidate) in candidates.into_iter().enumerate() {
            match lead_from_item(candidate) {
                Ok(Some(lead)) => leads.push(lead),
                Ok(None) => {}
                Err(err) => {
                    skipped += 1;
                    warn!(provider = KEY, index = idx, error = %err, "lead_skipped");
                }
            }
        }

        let source = dominant_source(&leads, &LeadSource::Other);
        Ok(ProcessedWebhookData::new(
            leads,
            source,
            KEY,
            raw,
            skipped,
            Map::new(),
        ))
    }
}

fn lead_from_item(item: &Value) -> Result<Option<ProcessedLead>, NormalizeError> {
    let obj = item
        .as_object()
        .ok_or_else(|| NormalizeError::shape("[]", "object", item))?;

    let mut draft = LeadDraft::new(LeadSource::Other);
    // Raw key behind each single-valued attribute, so a later alias that
    // overwrites it can move the earlier value into `customFields`.
    let mut origins: Vec<(Field, &str)> = Vec::new();
    for (key, value) in obj {
        let Some(field) = classify(key) else {
            draft.keep_custom(key, key, value);
            continue;
        };
        let text = scalar_text(value);
        let stored = match field {
            Field::Name => text.is_some_and(|fragment| draft.push_name(&fragment)),
            Field::Notes => text.is_some_and(|note| draft.push_note(&note, NOTE_SEPARATOR)),
            Field::Email => overwrite(&mut draft.email, text),
            Field::Phone => overwrite(&mut draft.phone, text),
            Field::Company => overwrite(&mut draft.company, text),
            Field::Value => match parse_float(value) {
                Some(amount) => {
                    draft.value = Some(amount);
                    true
                }
                None => false,
            },
            Field::Source => match text.as_deref().and_then(LeadSource::parse_known) {
                Some(source) => {
                    draft.source = source;
                    true
                }
                None => false,
            },
        };

        if !stored {
            let slot = if field == Field::Source { "original_source" } else { key.as_str() };
            draft.keep_custom(slot, key, value);
            continue;
        }
        if matches!(field, Field::Name | Field::Notes) {
            continue;
        }
        match origins.iter_mut().find(|(f, _)| *f == field) {
            Some((_, previous)) => {
                if let Some(displaced) = obj.get(*previous) {
                    draft.keep_custom(*previous, *previous, displaced);
                }
                *previous = key.as_str();
            }
            None => origins.push((field, key.as_str())),
        }
    }

    Ok(draft.finalize(PRIORITY, KEY))
}

/// Later aliases win; returns `false` when there is no usable text.
fn overwrite(slot: &mut Option<String>, text: Option<String>) -> bool {
    match text {
        Some(text) => {
            *slot = Some(text);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LeadPriority;
    use serde_json::json;

    fn run(raw: Value) -> ProcessedWebhookData {
        GenericProcessor
            .process(&raw, &RequestContext::new())
            .expect("generic payload should normalize")
    }

    #[test]
    fn batch_drops_empty_object() {
        let out = run(json!([{"name": "Bob", "value": "12000"}, {}]));
        assert_eq!(out.leads.len(), 1);
        assert_eq!(out.leads[0].name, "Bob");
        assert_eq!(out.leads[0].value, Some(12000.0));
        assert_eq!(out.leads[0].priority, Some(LeadPriority::High));
        assert_eq!(out.metadata["skippedCount"], json!(0));
    }

    #[test]
    fn aliases_are_case_and_punctuation_insensitive() {
        let out = run(json!({
            "First Name": "Mary",
            "last_name": "Shelley",
            "E-Mail": "mary@frank.en",
            "Phone-Number": "+44 1",
            "Organisation": "Gothic",
            "Message": "line one",
            "comments": "line two",
            "Deal Value": 1500,
            "utm_term": "horror"
        }));
        let lead = &out.leads[0];
        assert_eq!(lead.name, "Mary Shelley");
        assert_eq!(lead.email.as_deref(), Some("mary@frank.en"));
        assert_eq!(lead.phone.as_deref(), Some("+44 1"));
        assert_eq!(lead.company.as_deref(), Some("Gothic"));
        assert_eq!(lead.notes.as_deref(), Some("line one\nline two"));
        assert_eq!(lead.value, Some(1500.0));
        assert_eq!(lead.priority, Some(LeadPriority::Medium));
        assert_eq!(lead.custom_fields["utm_term"], json!("horror"));
        assert!(lead.tags.contains("generic"));
    }

    #[test]
    fn source_restricted_to_known_labels() {
        let out = run(json!([
            {"email": "a@x.io", "source": "Referral"},
            {"email": "b@x.io", "lead_source": "billboard"}
        ]));
        assert_eq!(out.leads[0].source, LeadSource::Referral);
        assert_eq!(out.leads[1].source, LeadSource::Other);
        assert_eq!(out.leads[1].custom_fields["original_source"], json!("billboard"));
    }

    #[test]
    fn invalid_value_stays_in_custom_fields() {
        let out = run(json!({"name": "Val", "amount": "lots"}));
        assert_eq!(out.leads[0].value, None);
        assert_eq!(out.leads[0].priority, Some(LeadPriority::Low));
        assert_eq!(out.leads[0].custom_fields["amount"], json!("lots"));
    }

    #[test]
    fn non_scalar_alias_values_are_kept_verbatim() {
        let emails = json!({"work": "bob@corp.io", "home": "bob@home.io"});
        let out = run(json!({"name": "Bob", "email": emails.clone(), "phone": ["1", "2"]}));
        let lead = &out.leads[0];
        assert_eq!(lead.email, None);
        assert_eq!(lead.custom_fields["email"], emails);
        assert_eq!(lead.custom_fields["phone"], json!(["1", "2"]));
    }

    #[test]
    fn overwritten_alias_keeps_the_earlier_value() {
        let out = run(json!({"name": "Ed", "phone": "111", "mobile": "222", "company": "A", "org": "B"}));
        let lead = &out.leads[0];
        assert_eq!(lead.phone.as_deref(), Some("222"));
        assert_eq!(lead.company.as_deref(), Some("B"));
        assert_eq!(lead.custom_fields["phone"], json!("111"));
        assert_eq!(lead.custom_fields["company"], json!("A"));
        assert_eq!(lead.custom_fields.len(), 2);
    }

    #[test]
    fn non_object_batch_element_is_skipped() {
        let out = run(json!([{"email": "ok@x.io"}, "garbage", 7]));
        assert_eq!(out.leads.len(), 1);
        assert_eq!(out.metadata["skippedCount"], json!(2));
    }

    #[test]
    fn validate_rules() {
        assert!(GenericProcessor.validate(&json!({"anything": 1})));
        assert!(GenericProcessor.validate(&json!([{"name": "Bob"}, {}])));
        assert!(!GenericProcessor.validate(&json!({})));
        assert!(!GenericProcessor.validate(&json!([])));
        assert!(!GenericProcessor.validate(&json!([{}, 3])));
        assert!(!GenericProcessor.validate(&json!(null)));
    }

    #[test]
    fn dominant_source_reported_for_batch() {
        let out = run(json!([
            {"email": "a@x.io", "source": "email"},
            {"email": "b@x.io", "source": "email"},
            {"email": "c@x.io", "source": "phone"}
        ]));
        assert_eq!(out.source, "email");
    }
}
