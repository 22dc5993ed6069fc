//! SwipePages landing page forms.
//!
//! Raw keys are looked up (case-insensitively) in [`FIELD_MAP`]. Contact fields
//! land on the lead, note-like fields are concatenated, and everything else is
//! kept in `customFields` under its mapped name. Keys missing from the table are
//! kept under their raw name.
//!
//! Budget handling:
//!
//! ```text
//! "10k-25k"  ── range label table ──▶ 17500
//! "$4,500"   ── numeric extraction ─▶ 4500
//! "2.5k"     ── numeric extraction ─▶ 2500
//! ```
use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::fields::{fill, non_negative, scalar_text, slugify, LeadDraft, PriorityRule};
use crate::processors::WebhookProcessor;
use crate::types::{LeadSource, ProcessedWebhookData, RequestContext};

const KEY: &str = "swipepages";
const PRIORITY: PriorityRule = PriorityRule::high_above(10_000.0);
const NOTE_SEPARATOR: &str = "\n\n";

/// Raw field name → mapped field name.
const FIELD_MAP: &[(&str, &str)] = &[
    // contact
    ("name", "name"),
    ("full_name", "name"),
    ("first_name", "firstName"),
    ("firstname", "firstName"),
    ("last_name", "lastName"),
    ("lastname", "lastName"),
    ("email", "email"),
    ("email_address", "email"),
    ("phone", "phone"),
    ("phone_number", "phone"),
    ("mobile", "phone"),
    // address
    ("address", "address"),
    ("street", "address"),
    ("city", "city"),
    ("state", "state"),
    ("zip", "zip"),
    ("zipcode", "zip"),
    ("postal_code", "zip"),
    ("country", "country"),
    // business
    ("company", "company"),
    ("company_name", "company"),
    ("organization", "company"),
    ("job_title", "jobTitle"),
    ("title", "jobTitle"),
    ("website", "website"),
    ("industry", "industry"),
    ("company_size", "companySize"),
    ("employees", "companySize"),
    ("budget", "budget"),
    // marketing
    ("utm_source", "utmSource"),
    ("utm_medium", "utmMedium"),
    ("utm_campaign", "utmCampaign"),
    ("utm_term", "utmTerm"),
    ("utm_content", "utmContent"),
    ("referrer", "referrer"),
    ("source", "source"),
    ("form_name", "formName"),
    ("page_url", "pageUrl"),
    ("landing_page", "pageUrl"),
    // contact preferences
    ("preferred_contact", "preferredContact"),
    ("contact_method", "preferredContact"),
    ("best_time", "bestTimeToCall"),
    ("newsletter", "newsletter"),
    ("consent", "consent"),
    // notes
    ("message", "notes"),
    ("comments", "notes"),
    ("notes", "notes"),
    ("additional_info", "notes"),
    ("description", "notes"),
];

/// Budget range labels, checked in order with `contains`.
const BUDGET_RANGES: &[(&str, f64)] = &[
    ("under 1k", 500.0),
    ("less than 1k", 500.0),
    ("1k-5k", 3_000.0),
    ("5k-10k", 7_500.0),
    ("10k-25k", 17_500.0),
    ("25k-50k", 37_500.0),
    ("50k-100k", 75_000.0),
    ("100k+", 150_000.0),
    ("over 100k", 150_000.0),
    ("enterprise", 250_000.0),
];

fn mapped_key(raw_key: &str) -> Option<&'static str> {
    let lookup = raw_key.trim().to_ascii_lowercase();
    FIELD_MAP
        .iter()
        .find(|(raw, _)| *raw == lookup)
        .map(|(_, mapped)| *mapped)
}

/// Derives a monetary value from a free-text budget.
pub(crate) fn budget_value(budget: &str) -> Option<f64> {
    let lowered = budget.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    if let Some((_, amount)) = BUDGET_RANGES
        .iter()
        .find(|(label, _)| lowered.contains(label))
    {
        return Some(*amount);
    }
    first_numeric_run(&lowered)
}

/// First run of digits (commas allowed inside, one decimal point), scaled by a
/// directly following `k` or `m`.
fn first_numeric_run(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let mut number = String::new();
    let mut consumed = 0;
    for c in rest.chars() {
        match c {
            '0'..='9' => number.push(c),
            '.' if !number.contains('.') => number.push(c),
            ',' => {}
            _ => break,
        }
        consumed += c.len_utf8();
    }
    let base: f64 = number.trim_end_matches('.').parse().ok()?;
    let multiplier = match rest[consumed..].chars().next() {
        Some('k') => 1_000.0,
        Some('m') => 1_000_000.0,
        _ => 1.0,
    };
    non_negative(base * multiplier)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SwipePagesProcessor;

impl WebhookProcessor for SwipePagesProcessor {
    fn key(&self) -> &'static str {
        KEY
    }

    fn name(&self) -> &'static str {
        "SwipePages"
    }

    fn description(&self) -> &'static str {
        "Landing page form submissions with UTM attribution"
    }

    fn validate(&self, raw: &Value) -> bool {
        raw.as_object().is_some_and(|obj| {
            obj.keys().any(|key| {
                matches!(mapped_key(key), Some("email" | "name" | "firstName" | "phone"))
            })
        })
    }

    fn process(
        &self,
        raw: &Value,
        ctx: &RequestContext,
    ) -> Result<ProcessedWebhookData, NormalizeError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| NormalizeError::shape("$", "object", raw))?;

        let mut draft = LeadDraft::new(LeadSource::Website);
        draft.tag("landing-page");

        let mut utm_source = None;
        let mut generic_source = None;
        let mut referrer = None;

        for (raw_key, value) in obj {
            let Some(mapped) = mapped_key(raw_key) else {
                draft.keep_custom(raw_key, raw_key, value);
                continue;
            };
            let text = scalar_text(value);
            let stored = match mapped {
                "name" => fill(&mut draft.name, text),
                "firstName" => fill(&mut draft.first_name, text),
                "lastName" => fill(&mut draft.last_name, text),
                "email" => fill(&mut draft.email, text.map(|e| e.to_lowercase())),
                "phone" => fill(&mut draft.phone, text),
                "company" => fill(&mut draft.company, text),
                "notes" => text.is_some_and(|note| draft.push_note(&note, NOTE_SEPARATOR)),
                _ => {
                    match mapped {
                        "budget" => {
                            if draft.value.is_none() {
                                draft.value = text.as_deref().and_then(budget_value);
                            }
                        }
                        "jobTitle" => draft.has_title |= text.is_some(),
                        "utmSource" => utm_source = utm_source.or(text),
                        "source" => generic_source = generic_source.or(text),
                        "referrer" => referrer = referrer.or(text),
                        "formName" => {
                            if let Some(form) = text.as_deref() {
                                draft.tag(format!("form-{}", slugify(form)));
                            }
                        }
                        "utmCampaign" => {
                            if let Some(campaign) = text.as_deref() {
                                draft.tag(format!("campaign-{}", slugify(campaign)));
                            }
                        }
                        _ => {}
                    }
                    false
                }
            };
            if !stored {
                draft.keep_custom(mapped, raw_key, value);
            }
        }

        let referrer = referrer.or_else(|| ctx.header("referer").map(str::to_string));
        draft.source = infer_source(utm_source, generic_source, referrer.as_deref());
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

/// `utm_source`, then `source`, then a non-direct referrer, else website.
fn infer_source(
    utm_source: Option<String>,
    generic_source: Option<String>,
    referrer: Option<&str>,
) -> LeadSource {
    if let Some(label) = utm_source.or(generic_source) {
        return LeadSource::from_label(&label);
    }
    match referrer.map(str::trim) {
        Some(r) if !r.is_empty() && !r.eq_ignore_ascii_case("direct") => LeadSource::Referral,
        _ => LeadSource::Website,
    }
}
