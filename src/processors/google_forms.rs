//! Google Forms.
//!
//! Three dialects reach this processor, tried in order:
//!
//! | Dialect | Shape | Matching |
//! |---------|-------|----------|
//! | `form_response` | relay envelope with a `form_response` object | alias table on normalized keys |
//! | `headers_values` | parallel `headers[]` / `values[]` arrays | substring tests on header text |
//! | `direct` | flat submission object | fixed key aliases |
//!
//! Every dialect yields at most one lead.
use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::fields::{fill, normalize_key, parse_float, pick, scalar_text, LeadDraft, PriorityRule};
use crate::processors::WebhookProcessor;
use crate::types::{LeadSource, ProcessedLead, ProcessedWebhookData, RequestContext};

const KEY: &str = "google-forms";
const PRIORITY: PriorityRule = PriorityRule::high_above(5_000.0);
const NOTE_SEPARATOR: &str = "\n";

const NAME_KEYS: &[&str] = &["name", "Name", "full_name", "Full Name", "fullName"];
const EMAIL_KEYS: &[&str] = &["email", "Email", "Email Address", "email_address", "emailAddress"];
const PHONE_KEYS: &[&str] = &["phone", "Phone", "Phone Number", "phone_number", "phoneNumber"];
const COMPANY_KEYS: &[&str] = &["company", "Company", "organization", "Organization"];
const MESSAGE_KEYS: &[&str] = &["message", "Message", "comments", "Comments"];
const BUDGET_KEYS: &[&str] = &["budget", "Budget"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    FormResponse,
    HeadersValues,
    Direct,
}

impl Dialect {
    fn detect(obj: &Map<String, Value>) -> Self {
        if obj.get("form_response").is_some_and(Value::is_object) {
            Dialect::FormResponse
        } else if obj.get("headers").is_some_and(Value::is_array)
            && obj.get("values").is_some_and(Value::is_array)
        {
            Dialect::HeadersValues
        } else {
            Dialect::Direct
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Dialect::FormResponse => "form_response",
            Dialect::HeadersValues => "headers_values",
            Dialect::Direct => "direct",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleFormsProcessor;

impl WebhookProcessor for GoogleFormsProcessor {
    fn key(&self) -> &'static str {
        KEY
    }

    fn name(&self) -> &'static str {
        "Google Forms"
    }

    fn description(&self) -> &'static str {
        "Form responses relayed by Apps Script or automation tools"
    }

    fn validate(&self, raw: &Value) -> bool {
        raw.as_object().is_some_and(|obj| !obj.is_empty())
    }

    fn process(
        &self,
        raw: &Value,
        _ctx: &RequestContext,
    ) -> Result<ProcessedWebhookData, NormalizeError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| NormalizeError::shape("$", "object", raw))?;

        let dialect = Dialect::detect(obj);
        let lead = match dialect {
            Dialect::FormResponse => from_form_response(obj)?,
            Dialect::HeadersValues => from_headers_values(obj)?,
            Dialect::Direct => from_direct(obj),
        };

        let mut extra = Map::new();
        extra.insert("dialect".into(), Value::from(dialect.as_str()));

        Ok(ProcessedWebhookData::new(
            lead.into_iter().collect(),
            LeadSource::Website.as_str(),
            KEY,
            raw,
            0,
            extra,
        ))
    }
}

fn new_draft() -> LeadDraft {
    let mut draft = LeadDraft::new(LeadSource::Website);
    draft.tag("google-forms");
    draft
}

/// Relay envelope: `{"form_response": {...}, "form_id": ..., ...}`.
fn from_form_response(obj: &Map<String, Value>) -> Result<Option<ProcessedLead>, NormalizeError> {
    let response = match obj.get("form_response") {
        Some(Value::Object(response)) => response,
        Some(other) => return Err(NormalizeError::shape("form_response", "object", other)),
        None => return Ok(None),
    };

    let mut draft = new_draft();
    for (key, value) in response {
        let normalized = normalize_key(key);
        let text = scalar_text(value);
        let stored = match normalized.as_str() {
            "name" | "full_name" | "your_name" => fill(&mut draft.name, text),
            "first_name" | "first" => fill(&mut draft.first_name, text),
            "last_name" | "last" | "surname" => fill(&mut draft.last_name, text),
            "email" | "email_address" | "e_mail" => fill(&mut draft.email, text),
            "phone" | "phone_number" | "telephone" | "mobile" => fill(&mut draft.phone, text),
            "company" | "company_name" | "organization" | "organisation" => {
                fill(&mut draft.company, text)
            }
            "message" | "comments" | "notes" | "question" => {
                text.is_some_and(|note| draft.push_note(&note, NOTE_SEPARATOR))
            }
            "budget" | "estimated_budget" => fill_value(&mut draft, value),
            _ => false,
        };
        if !stored {
            draft.keep_custom(&normalized, key, value);
        }
    }

    // Envelope fields (form id, response id, timestamps) travel with the lead.
    for (key, value) in obj {
        if key != "form_response" {
            draft.keep_custom(key, key, value);
        }
    }

    Ok(draft.finalize(PRIORITY, KEY))
}

/// Spreadsheet-style submission: `headers[i]` labels `values[i]`.
fn from_headers_values(obj: &Map<String, Value>) -> Result<Option<ProcessedLead>, NormalizeError> {
    let headers = obj
        .get("headers")
        .and_then(Value::as_array)
        .ok_or_else(|| NormalizeError::Malformed("headers must be an array".into()))?;
    let values = obj
        .get("values")
        .and_then(Value::as_array)
        .ok_or_else(|| NormalizeError::Malformed("values must be an array".into()))?;

    let mut draft = new_draft();
    for (idx, value) in values.iter().enumerate() {
        let Some(header) = headers.get(idx).and_then(scalar_text) else {
            draft.keep_custom(&format!("column_{idx}"), "column", value);
            continue;
        };
        let label = header.to_lowercase();
        let text = scalar_text(value);

        let stored = if label.contains("email") {
            fill(&mut draft.email, text)
        } else if label.contains("phone") {
            fill(&mut draft.phone, text)
        } else if label.contains("company") || label.contains("organization") {
            fill(&mut draft.company, text)
        } else if label.contains("first") && label.contains("name") {
            fill(&mut draft.first_name, text)
        } else if label.contains("last") && label.contains("name") {
            fill(&mut draft.last_name, text)
        } else if label.contains("name") {
            fill(&mut draft.name, text)
        } else if label.contains("message") || label.contains("comment") || label.contains("note") {
            text.is_some_and(|note| draft.push_note(&note, NOTE_SEPARATOR))
        } else if label.contains("budget") {
            fill_value(&mut draft, value)
        } else {
            false
        };
        if !stored {
            draft.keep_custom(&header, &header, value);
        }
    }

    for (key, value) in obj {
        if key != "headers" && key != "values" {
            draft.keep_custom(key, key, value);
        }
    }

    Ok(draft.finalize(PRIORITY, KEY))
}

/// Sets the lead value from the first parseable budget answer.
fn fill_value(draft: &mut LeadDraft, value: &Value) -> bool {
    match parse_float(value) {
        Some(amount) if draft.value.is_none() => {
            draft.value = Some(amount);
            true
        }
        _ => false,
    }
}

/// Flat submission read through the fixed alias lists.
fn from_direct(obj: &Map<String, Value>) -> Option<ProcessedLead> {
    let mut draft = new_draft();
    let mut consumed: Vec<&str> = Vec::new();

    if let Some((key, name)) = pick(obj, NAME_KEYS) {
        draft.name = Some(name);
        consumed.push(key);
    }
    if let Some((key, email)) = pick(obj, EMAIL_KEYS) {
        draft.email = Some(email);
        consumed.push(key);
    }
    if let Some((key, phone)) = pick(obj, PHONE_KEYS) {
        draft.phone = Some(phone);
        consumed.push(key);
    }
    if let Some((key, company)) = pick(obj, COMPANY_KEYS) {
        draft.company = Some(company);
        consumed.push(key);
    }
    if let Some((key, message)) = pick(obj, MESSAGE_KEYS) {
        draft.push_note(&message, NOTE_SEPARATOR);
        consumed.push(key);
    }
    if let Some((key, value)) = BUDGET_KEYS
        .iter()
        .find_map(|key| obj.get_key_value(*key))
        .and_then(|(k, v)| parse_float(v).map(|amount| (k.as_str(), amount)))
    {
        draft.value = Some(value);
        consumed.push(key);
    }

    for (key, value) in obj {
        if !consumed.contains(&key.as_str()) {
            draft.keep_custom(key, key, value);
        }
    }

    draft.finalize(PRIORITY, KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LeadPriority;
    use serde_json::json;

    fn run(raw: Value) -> ProcessedWebhookData {
        GoogleFormsProcessor
            .process(&raw, &RequestContext::new())
            .expect("google forms payload should normalize")
    }

    #[test]
    fn form_response_envelope_uses_alias_table() {
        let out = run(json!({
            "form_id": "abc",
            "form_response": {
                "First Name": "Sam",
                "Last Name": "Hill",
                "E-mail": "sam@z.com",
                "Organisation": "Hill & Co",
                "Message": "Need a quote",
                "Budget": "7500",
                "How did you hear about us?": "Podcast"
            }
        }));
        assert_eq!(out.metadata["dialect"], json!("form_response"));
        let lead = &out.leads[0];
        assert_eq!(lead.name, "Sam Hill");
        assert_eq!(lead.email.as_deref(), Some("sam@z.com"));
        assert_eq!(lead.company.as_deref(), Some("Hill & Co"));
        assert_eq!(lead.notes.as_deref(), Some("Need a quote"));
        assert_eq!(lead.value, Some(7500.0));
        assert_eq!(lead.priority, Some(LeadPriority::High));
        assert_eq!(
            lead.custom_fields["how_did_you_hear_about_us_"],
            json!("Podcast")
        );
        assert_eq!(lead.custom_fields["form_id"], json!("abc"));
    }

    #[test]
    fn form_response_keeps_unusable_and_duplicate_answers() {
        let out = run(json!({
            "form_response": {
                "Email": "gus@x.io",
                "Name": {"first": "Gus", "last": "Grant"},
                "Phone": "111",
                "Mobile": "222",
                "Budget": "ask me"
            }
        }));
        let lead = &out.leads[0];
        assert_eq!(lead.name, "gus");
        assert_eq!(lead.phone.as_deref(), Some("111"));
        assert_eq!(lead.value, None);
        assert_eq!(lead.custom_fields["name"], json!({"first": "Gus", "last": "Grant"}));
        assert_eq!(lead.custom_fields["mobile"], json!("222"));
        assert_eq!(lead.custom_fields["budget"], json!("ask me"));
    }

    #[test]
    fn headers_values_keeps_repeated_columns() {
        let out = run(json!({
            "headers": ["Email", "Email (work)", "Name"],
            "values": ["a@x.io", "b@x.io", ["A", "B"]]
        }));
        let lead = &out.leads[0];
        assert_eq!(lead.email.as_deref(), Some("a@x.io"));
        assert_eq!(lead.custom_fields["Email (work)"], json!("b@x.io"));
        assert_eq!(lead.custom_fields["Name"], json!(["A", "B"]));
    }

    #[test]
    fn headers_values_format() {
        let out = run(json!({"headers": ["Name", "Email"], "values": ["Sam", "sam@z.com"]}));
        assert_eq!(out.provider, "google-forms");
        assert_eq!(out.metadata["dialect"], json!("headers_values"));
        assert_eq!(out.leads.len(), 1);
        assert_eq!(out.leads[0].name, "Sam");
        assert_eq!(out.leads[0].email.as_deref(), Some("sam@z.com"));
    }

    #[test]
    fn headers_values_matches_by_substring() {
        let out = run(json!({
            "headers": ["Timestamp", "First Name", "Last Name", "Company Name", "Phone number", "Any comments?"],
            "values": ["2024-01-01", "Ada", "King", "Engines Ltd", "555", "hello"]
        }));
        let lead = &out.leads[0];
        assert_eq!(lead.name, "Ada King");
        assert_eq!(lead.company.as_deref(), Some("Engines Ltd"));
        assert_eq!(lead.phone.as_deref(), Some("555"));
        assert_eq!(lead.notes.as_deref(), Some("hello"));
        assert_eq!(lead.custom_fields["Timestamp"], json!("2024-01-01"));
        assert_eq!(lead.priority, Some(LeadPriority::Medium));
    }

    #[test]
    fn direct_submission_with_known_aliases() {
        let out = run(json!({
            "Full Name": "Lee",
            "Email Address": "lee@q.io",
            "Budget": 900,
            "source_page": "/pricing"
        }));
        assert_eq!(out.metadata["dialect"], json!("direct"));
        let lead = &out.leads[0];
        assert_eq!(lead.name, "Lee");
        assert_eq!(lead.value, Some(900.0));
        assert_eq!(lead.priority, Some(LeadPriority::Low));
        assert_eq!(lead.custom_fields["source_page"], json!("/pricing"));
        assert!(!lead.custom_fields.contains_key("Full Name"));
    }

    #[test]
    fn no_name_or_email_yields_zero_leads() {
        let out = run(json!({"favourite_colour": "green"}));
        assert!(out.leads.is_empty());
    }

    #[test]
    fn validate_rejects_empty_and_non_objects() {
        assert!(!GoogleFormsProcessor.validate(&json!({})));
        assert!(!GoogleFormsProcessor.validate(&json!("text")));
        assert!(GoogleFormsProcessor.validate(&json!({"email": "a@b.c"})));
    }
}
