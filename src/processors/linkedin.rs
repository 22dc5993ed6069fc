//! LinkedIn Lead Gen Forms.
//!
//! Contact properties are read from the top level or from a nested
//! `leadData` object; platform ids (`leadId`, `formId`, `campaignId`,
//! `submittedAt`) are kept in `customFields`.
use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::fields::{fill, scalar_text, LeadDraft, PriorityRule};
use crate::processors::WebhookProcessor;
use crate::types::{LeadSource, ProcessedWebhookData, RequestContext};

const KEY: &str = "linkedin";
const PRIORITY: PriorityRule = PriorityRule::high_above(10_000.0);

const MARKERS: &[&str] = &["leadId", "leadData", "firstName", "lastName", "emailAddress"];

#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedInProcessor;

impl WebhookProcessor for LinkedInProcessor {
    fn key(&self) -> &'static str {
        KEY
    }

    fn name(&self) -> &'static str {
        "LinkedIn Lead Gen"
    }

    fn description(&self) -> &'static str {
        "Lead Gen Form submissions from LinkedIn campaigns"
    }

    fn validate(&self, raw: &Value) -> bool {
        raw.as_object()
            .is_some_and(|obj| MARKERS.iter().any(|key| obj.contains_key(*key)))
    }

    fn process(
        &self,
        raw: &Value,
        _ctx: &RequestContext,
    ) -> Result<ProcessedWebhookData, NormalizeError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| NormalizeError::shape("$", "object", raw))?;
        let (data, nested) = match obj.get("leadData") {
            Some(Value::Object(lead_data)) => (lead_data, true),
            Some(other) => return Err(NormalizeError::shape("leadData", "object", other)),
            None => (obj, false),
        };

        let mut draft = LeadDraft::new(LeadSource::SocialMedia);
        draft.tag("linkedin-lead");

        for (key, value) in data {
            let text = scalar_text(value);
            let stored = match key.as_str() {
                "firstName" => fill(&mut draft.first_name, text),
                "lastName" => fill(&mut draft.last_name, text),
                "emailAddress" | "email" => fill(&mut draft.email, text),
                "phoneNumber" | "phone" => fill(&mut draft.phone, text),
                "companyName" | "company" => fill(&mut draft.company, text),
                "jobTitle" | "title" => {
                    draft.has_title |= text.is_some();
                    draft.keep_custom("jobTitle", key, value);
                    true
                }
                _ => false,
            };
            if !stored {
                draft.keep_custom(key, key, value);
            }
        }

        if nested {
            copy_envelope(&mut draft, obj);
        }
        if let Some(campaign) = obj.get("campaignId").and_then(scalar_text) {
            draft.tag(format!("campaign-{campaign}"));
        }

        let leads = draft.finalize(PRIORITY, KEY).into_iter().collect();
        Ok(ProcessedWebhookData::new(
            leads,
            LeadSource::SocialMedia.as_str(),
            KEY,
            raw,
            0,
            Map::new(),
        ))
    }
}

/// Top-level keys around a nested `leadData` object.
fn copy_envelope(draft: &mut LeadDraft, obj: &Map<String, Value>) {
    for (key, value) in obj {
        if key != "leadData" {
            draft.keep_custom(key, key, value);
        }
    }
}
