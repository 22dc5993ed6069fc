//! Field helpers shared by every processor.
//!
//! Processors collect what they recognise into a [`LeadDraft`] and hand it to
//! [`LeadDraft::finalize`], the one place that enforces the lead invariants:
//!
//! ```text
//! LeadDraft
//!        │
//!        ▼
//! ┌─────────────────────────────┐
//! │ 1. Resolve name             │
//! │    - explicit name          │
//! │    - first + last           │
//! │    - email local part       │
//! ├─────────────────────────────┤
//! │ 2. Drop check               │
//! │    - no name and no email   │
//! ├─────────────────────────────┤
//! │ 3. Derive                   │
//! │    - priority               │
//! │    - provider tag           │
//! └─────────────────────────────┘
//!        │
//!        ▼
//! Option<ProcessedLead>
//! ```
use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::types::{LeadPriority, LeadSource, ProcessedLead};

/// Lowercases and replaces every non-alphanumeric character with `_`.
///
/// `"Email Address"` becomes `"email_address"`.
pub(crate) fn normalize_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Lowercases and keeps only alphanumeric characters.
///
/// `"E-mail Address"` becomes `"emailaddress"`.
pub(crate) fn compact_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Text form of a scalar JSON value, trimmed. Empty strings, nulls and
/// containers yield `None`.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

/// Leading float of a string, the way form builders usually submit numbers:
/// `"12000"`, `" 99.5 USD"`. Returns `None` when no number leads the string.
pub(crate) fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, c) in text.char_indices() {
        match c {
            '+' | '-' if idx == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = idx + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    text[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// Numeric value of a JSON scalar using [`leading_number`] for strings.
pub(crate) fn parse_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    };
    parsed.and_then(non_negative)
}

/// Strips currency symbols and separators before parsing: `"$5,000"` → `5000`.
pub(crate) fn parse_currency(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(non_negative),
        Value::String(s) => currency_amount(s),
        _ => None,
    }
}

pub(crate) fn currency_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().ok().and_then(non_negative)
}

pub(crate) fn non_negative(value: f64) -> Option<f64> {
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Lowercase, `-`-separated slug used for dynamic tags.
pub(crate) fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// First element of a `values` array or the value itself, as text.
pub(crate) fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(scalar_text),
        other => scalar_text(other),
    }
}

/// Looks up the first present, non-empty key among `keys` in `obj`.
pub(crate) fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<(&'a str, String)> {
    keys.iter().find_map(|key| {
        obj.get_key_value(*key)
            .and_then(|(k, v)| scalar_text(v).map(|text| (k.as_str(), text)))
    })
}

/// Stores `text` in an empty attribute slot. Returns `false` when nothing was
/// stored, so the caller can keep the raw value in `customFields` instead.
pub(crate) fn fill(slot: &mut Option<String>, text: Option<String>) -> bool {
    match text {
        Some(text) if slot.is_none() => {
            *slot = Some(text);
            true
        }
        _ => false,
    }
}

/// Whether a `values` array carries more than one element.
pub(crate) fn is_multi_valued(value: &Value) -> bool {
    value.as_array().is_some_and(|items| items.len() > 1)
}

/// Thresholds a provider uses to derive [`LeadPriority`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct PriorityRule {
    /// `value` strictly above this is high priority.
    pub(crate) high_above: f64,
    /// `value` strictly above this is at least medium, when set.
    pub(crate) medium_above: Option<f64>,
}

impl PriorityRule {
    pub(crate) const fn high_above(high_above: f64) -> Self {
        Self {
            high_above,
            medium_above: None,
        }
    }

    pub(crate) const fn with_medium_above(mut self, medium_above: f64) -> Self {
        self.medium_above = Some(medium_above);
        self
    }

    pub(crate) fn assess(&self, value: Option<f64>, has_company: bool, has_title: bool) -> LeadPriority {
        let value = value.unwrap_or(0.0);
        if value > self.high_above {
            LeadPriority::High
        } else if has_company
            || has_title
            || self.medium_above.is_some_and(|threshold| value > threshold)
        {
            LeadPriority::Medium
        } else {
            LeadPriority::Low
        }
    }
}

/// A candidate lead before the invariants are applied.
#[derive(Debug, Clone, Default)]
pub(crate) struct LeadDraft {
    pub(crate) name: Option<String>,
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) company: Option<String>,
    pub(crate) value: Option<f64>,
    pub(crate) notes: Option<String>,
    pub(crate) has_title: bool,
    pub(crate) source: LeadSource,
    pub(crate) custom_fields: Map<String, Value>,
    pub(crate) tags: BTreeSet<String>,
}

impl LeadDraft {
    pub(crate) fn new(source: LeadSource) -> Self {
        Self {
            source,
            ..Default::default()
        }
    }

    /// Appends a name fragment with a single space. Returns `false` for a
    /// blank fragment.
    pub(crate) fn push_name(&mut self, fragment: &str) -> bool {
        append(&mut self.name, fragment, " ")
    }

    /// Appends a note using the provider's separator.
    pub(crate) fn push_note(&mut self, text: &str, separator: &str) -> bool {
        append(&mut self.notes, text, separator)
    }

    /// Keeps a raw value that populated no attribute, without replacing
    /// anything already in `customFields`. An occupied `key` falls back to
    /// `fallback`, then to `fallback_2`, `fallback_3` and so on.
    pub(crate) fn keep_custom(&mut self, key: &str, fallback: &str, value: &Value) {
        let mut slot = key.to_string();
        if self.custom_fields.contains_key(&slot) {
            slot = fallback.to_string();
        }
        let mut suffix = 2;
        while self.custom_fields.contains_key(&slot) {
            slot = format!("{fallback}_{suffix}");
            suffix += 1;
        }
        self.custom_fields.insert(slot, value.clone());
    }

    pub(crate) fn tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !tag.is_empty() {
            self.tags.insert(tag);
        }
    }

    /// Explicit name, else `first last`, else `None`.
    fn resolved_name(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() { None } else { Some(joined) }
    }

    /// Applies the shared finalize step. Returns `None` when the candidate has
    /// neither a name nor an email.
    pub(crate) fn finalize(mut self, rule: PriorityRule, provider_tag: &str) -> Option<ProcessedLead> {
        let email = self.email.take().map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        let name = match (self.resolved_name(), email.as_deref()) {
            (Some(name), _) => name,
            (None, Some(email)) => email_local_part(email).to_string(),
            (None, None) => return None,
        };

        let company = self.company.take().filter(|c| !c.trim().is_empty());
        let value = self.value.and_then(non_negative);
        let priority = rule.assess(value, company.is_some(), self.has_title);
        self.tags.insert(provider_tag.to_string());

        Some(ProcessedLead {
            name,
            email,
            phone: self.phone.filter(|p| !p.trim().is_empty()),
            company,
            source: self.source,
            value,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            custom_fields: self.custom_fields,
            tags: self.tags,
            priority: Some(priority),
        })
    }
}

fn append(slot: &mut Option<String>, text: &str, separator: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    match slot {
        Some(existing) if !existing.is_empty() => {
            existing.push_str(separator);
            existing.push_str(text);
        }
        _ => *slot = Some(text.to_string()),
    }
    true
}

/// Substring before `@`; the whole address when the local part is empty.
pub(crate) fn email_local_part(email: &str) -> &str {
    match email.split('@').next() {
        Some(local) if !local.is_empty() => local,
        _ => email,
    }
}

/// Most frequent lead source, ties broken by first appearance.
pub(crate) fn dominant_source(leads: &[ProcessedLead], fallback: &LeadSource) -> String {
    let mut counts: Vec<(&LeadSource, usize)> = Vec::new();
    for lead in leads {
        match counts.iter_mut().find(|(source, _)| *source == &lead.source) {
            Some((_, count)) => *count += 1,
            None => counts.push((&lead.source, 1)),
        }
    }
    let mut best: Option<(&LeadSource, usize)> = None;
    for (source, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((source, count));
        }
    }
    best.map_or_else(|| fallback.to_string(), |(source, _)| source.to_string())
}
