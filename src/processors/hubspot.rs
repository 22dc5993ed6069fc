//! HubSpot contact / deal notifications.
//!
//! Contact data sits in `properties`, whose entries are either plain scalars
//! or `{ "value": ... }` objects depending on the API version that sent them.
use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::fields::{fill, parse_currency, scalar_text, LeadDraft, PriorityRule};
use crate::processors::WebhookProcessor;
use crate::types::{LeadSource, ProcessedWebhookData, RequestContext};

const KEY: &str = "hubspot";
const PRIORITY: PriorityRule = PriorityRule::high_above(10_000.0);
const NOTE_SEPARATOR: &str = "\n";

#[derive(Debug, Default, Clone, Copy)]
pub struct HubSpotProcessor;

impl WebhookProcessor for HubSpotProcessor {
    fn key(&self) -> &'static str {
        KEY
    }

    fn name(&self) -> &'static str {
        "HubSpot"
    }

    fn description(&self) -> &'static str {
        "Contact and deal notifications from HubSpot workflows"
    }

    fn validate(&self, raw: &Value) -> bool {
        raw.as_object().is_some_and(|obj| {
            obj.get("properties").is_some_and(Value::is_object) || obj.contains_key("objectId")
        })
    }

    fn process(
        &self,
        raw: &Value,
        _ctx: &RequestContext,
    ) -> Result<ProcessedWebhookData, NormalizeError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| NormalizeError::shape("$", "object", raw))?;
        let empty = Map::new();
        let properties = match obj.get("properties") {
            Some(Value::Object(properties)) => properties,
            Some(other) => return Err(NormalizeError::shape("properties", "object", other)),
            None => &empty,
        };

        let mut draft = LeadDraft::new(LeadSource::Website);
        draft.tag("crm");

        for (key, raw_value) in properties {
            let value = property_value(raw_value);
            let text = scalar_text(value);
            let stored = match key.as_str() {
                "firstname" => fill(&mut draft.first_name, text),
                "lastname" => fill(&mut draft.last_name, text),
                "email" => fill(&mut draft.email, text),
                "phone" | "mobilephone" => fill(&mut draft.phone, text),
                "company" => fill(&mut draft.company, text),
                "amount" => match parse_currency(value) {
                    Some(amount) if draft.value.is_none() => {
                        draft.value = Some(amount);
                        true
                    }
                    _ => false,
                },
                "message" | "notes" => {
                    text.is_some_and(|note| draft.push_note(&note, NOTE_SEPARATOR))
                }
                "jobtitle" => {
                    draft.has_title |= text.is_some();
                    false
                }
                "dealstage" => {
                    draft.keep_custom("deal_stage", key, value);
                    true
                }
                "hs_lead_status" => {
                    draft.keep_custom("lead_status", key, value);
                    true
                }
                _ => false,
            };
            if !stored {
                draft.keep_custom(key, key, value);
            }
        }

        for (key, value) in obj {
            match key.as_str() {
                "properties" => {}
                "objectId" => draft.keep_custom("hubspot_object_id", key, value),
                "portalId" => draft.keep_custom("hubspot_portal_id", key, value),
                _ => draft.keep_custom(key, key, value),
            }
        }

        let leads = draft.finalize(PRIORITY, KEY).into_iter().collect();
        Ok(ProcessedWebhookData::new(
            leads,
            LeadSource::Website.as_str(),
            KEY,
            raw,
            0,
            Map::new(),
        ))
    }
}

/// Unwraps `{ "value": x }` property envelopes.
fn property_value(value: &Value) -> &Value {
    match value {
        Value::Object(inner) => inner.get("value").unwrap_or(value),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LeadPriority;
    use serde_json::json;

    #[test]
    fn unwraps_property_envelopes_and_keeps_platform_ids() {
        let raw = json!({
            "objectId": 1234,
            "portalId": 62515,
            "properties": {
                "firstname": {"value": "Linus"},
                "lastname": {"value": "T"},
                "email": {"value": "linus@kernel.org"},
                "amount": "25000",
                "dealstage": {"value": "appointmentscheduled"},
                "lifecyclestage": "lead"
            }
        });
        let out = HubSpotProcessor
            .process(&raw, &RequestContext::new())
            .unwrap();
        let lead = &out.leads[0];
        assert_eq!(lead.name, "Linus T");
        assert_eq!(lead.value, Some(25000.0));
        assert_eq!(lead.priority, Some(LeadPriority::High));
        assert_eq!(lead.custom_fields["hubspot_object_id"], json!(1234));
        assert_eq!(lead.custom_fields["hubspot_portal_id"], json!(62515));
        assert_eq!(lead.custom_fields["deal_stage"], json!("appointmentscheduled"));
        assert_eq!(lead.custom_fields["lifecyclestage"], json!("lead"));
        assert!(lead.tags.contains("hubspot"));
        assert_eq!(out.provider, "hubspot");
    }

    #[test]
    fn unparseable_and_duplicate_properties_are_kept() {
        let raw = json!({
            "properties": {
                "email": {"value": "deal@corp.io"},
                "phone": "111",
                "mobilephone": {"value": "222"},
                "amount": "TBD",
                "company": {"value": {"name": "Corp"}}
            }
        });
        let out = HubSpotProcessor
            .process(&raw, &RequestContext::new())
            .unwrap();
        let lead = &out.leads[0];
        assert_eq!(lead.value, None);
        assert_eq!(lead.phone.as_deref(), Some("111"));
        assert_eq!(lead.company, None);
        assert_eq!(lead.custom_fields["amount"], json!("TBD"));
        assert_eq!(lead.custom_fields["mobilephone"], json!("222"));
        assert_eq!(lead.custom_fields["company"], json!({"name": "Corp"}));
    }

    #[test]
    fn object_without_contact_data_yields_no_lead() {
        let out = HubSpotProcessor
            .process(&json!({"objectId": 1}), &RequestContext::new())
            .unwrap();
        assert!(out.leads.is_empty());
    }

    #[test]
    fn properties_must_be_an_object() {
        let err = HubSpotProcessor
            .process(&json!({"properties": [1]}), &RequestContext::new())
            .unwrap_err();
        assert!(matches!(err, NormalizeError::UnexpectedShape { .. }));
    }

    #[test]
    fn validate_accepts_properties_or_object_id() {
        assert!(HubSpotProcessor.validate(&json!({"properties": {}})));
        assert!(HubSpotProcessor.validate(&json!({"objectId": 7})));
        assert!(!HubSpotProcessor.validate(&json!({"email": "x@y.z"})));
    }
}
