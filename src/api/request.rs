//! Gateway mutator payload
//!
//! The authentication gateway forwards its session payload as JSON; the
//! service enriches it and echoes it back. Only `subject` is interpreted.
//! Everything else, notably the `extra` object and the matched URL, is a
//! parsed-but-opaque attribute bag that must round-trip untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The request and response body of the identity mutation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutatorPayload {
    /// The account key of the authenticated user.
    pub subject: String,

    /// Free-form session attributes. The service only ever adds the issued
    /// user ID; existing entries pass through unchanged.
    #[serde(default)]
    pub extra: Map<String, Value>,

    /// Forwarded request headers.
    #[serde(default)]
    pub header: HashMap<String, Vec<String>>,

    /// Routing context of the matched gateway rule.
    #[serde(default)]
    pub match_context: MatchContext,
}

/// Routing context forwarded by the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchContext {
    /// Capture groups of the matched routing rule.
    #[serde(default)]
    pub regexp_capture_groups: Vec<String>,

    /// The matched URL, kept opaque.
    #[serde(default)]
    pub url: Value,
}
