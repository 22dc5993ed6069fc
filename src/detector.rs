//! Best-effort provider detection from request metadata and payload shape.
//!
//! Checks run in a fixed order and the first hit wins:
//!
//! ```text
//! facebook → google-forms → linkedin → hubspot → zapier → swipepages → generic
//! ```
//!
//! Each check combines independent signals: a user agent substring, a
//! provider-specific header, payload markers and, for form relays, the content
//! type. Generic is the unconditional default.
use serde_json::{Map, Value};
use tracing::debug;

use crate::registry::FALLBACK_KEY;
use crate::types::RequestContext;

type Check = fn(&Signals<'_>) -> bool;

const CHECKS: &[(&str, Check)] = &[
    ("facebook", is_facebook),
    ("google-forms", is_google_forms),
    ("linkedin", is_linkedin),
    ("hubspot", is_hubspot),
    ("zapier", is_zapier),
    ("swipepages", is_swipepages),
];

/// Inputs shared by every check.
struct Signals<'a> {
    agent: String,
    content_type: String,
    ctx: &'a RequestContext,
    payload: Option<&'a Map<String, Value>>,
}

impl Signals<'_> {
    fn agent_has(&self, needle: &str) -> bool {
        self.agent.contains(needle)
    }

    /// Body was posted as an HTML form and decoded upstream.
    fn form_encoded(&self) -> bool {
        self.content_type
            .starts_with("application/x-www-form-urlencoded")
    }

    fn header_prefixed(&self, prefix: &str) -> bool {
        self.ctx.headers().any(|(name, _)| name.starts_with(prefix))
    }

    fn has_key(&self, key: &str) -> bool {
        self.payload.is_some_and(|obj| obj.contains_key(key))
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.payload.and_then(|obj| obj.get(key))
    }
}

/// Guesses the provider key for a request.
///
/// Always returns a key the registry knows.
///
/// ```rust
/// use leadhook::{detect_webhook_type, RequestContext};
/// use serde_json::json;
///
/// let ctx = RequestContext::new().with_user_agent("Zapier");
/// assert_eq!(detect_webhook_type(&ctx, &json!({"email": "a@b.c"})), "zapier");
///
/// let raw = json!({"object": "page", "entry": []});
/// assert_eq!(detect_webhook_type(&RequestContext::new(), &raw), "facebook");
/// ```
pub fn detect_webhook_type(ctx: &RequestContext, raw: &Value) -> &'static str {
    let signals = Signals {
        agent: ctx.user_agent().unwrap_or_default().to_ascii_lowercase(),
        content_type: ctx
            .content_type()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase(),
        ctx,
        payload: raw.as_object(),
    };

    let detected = CHECKS
        .iter()
        .find(|(_, check)| check(&signals))
        .map_or(FALLBACK_KEY, |(key, _)| *key);

    debug!(
        provider = detected,
        user_agent = ctx.user_agent().unwrap_or(""),
        content_type = ctx.content_type().unwrap_or(""),
        "webhook_type_detected"
    );
    detected
}

fn is_facebook(s: &Signals<'_>) -> bool {
    s.agent_has("facebook")
        || s.ctx.has_header("x-hub-signature")
        || s.ctx.has_header("x-hub-signature-256")
        || s.field("object").and_then(Value::as_str) == Some("page")
        || s.has_key("leadgen_id")
        || s.has_key("field_data")
}

fn is_google_forms(s: &Signals<'_>) -> bool {
    s.agent_has("google-apps-script")
        || s.agent_has("google forms")
        || s.header_prefixed("x-goog-")
        || s.field("form_response").is_some_and(Value::is_object)
        || (s.field("headers").is_some_and(Value::is_array)
            && s.field("values").is_some_and(Value::is_array))
}

fn is_linkedin(s: &Signals<'_>) -> bool {
    s.agent_has("linkedin")
        || s.ctx.has_header("x-li-signature")
        || s.has_key("leadId")
        || s.field("leadData").is_some_and(Value::is_object)
}

fn is_hubspot(s: &Signals<'_>) -> bool {
    s.agent_has("hubspot")
        || s.header_prefixed("x-hubspot-signature")
        || (s.has_key("objectId") && s.has_key("portalId"))
        || (s.has_key("objectId") && s.field("properties").is_some_and(Value::is_object))
}

fn is_zapier(s: &Signals<'_>) -> bool {
    s.agent_has("zapier") || s.header_prefixed("x-zapier-")
}

fn is_swipepages(s: &Signals<'_>) -> bool {
    s.agent_has("swipepages")
        || s.header_prefixed("x-swipepages-")
        || (s.has_key("form_name") && (s.has_key("page_url") || s.has_key("landing_page")))
        || (s.form_encoded()
            && (s.has_key("form_name") || s.has_key("page_url") || s.has_key("landing_page")))
}
