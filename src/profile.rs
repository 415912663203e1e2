//! User profile loading and fail-fast validation (A3).
//!
//! A profile is caller-supplied JSON describing the reader this brief is
//! being written for. Missing required sections or fields are a hard
//! error at load time rather than a silent `None` deep in synthesis.

use serde_json::Value;

use crate::error::{Error, Result};

const REQUIRED_SECTIONS: &[&str] = &[
    "geographic_context",
    "professional_context",
    "civic_interests",
    "personal_priorities",
    "content_preferences",
];

const REQUIRED_FIELDS: &[(&str, &str)] = &[
    ("geographic_context", "primary_location"),
    ("professional_context", "professional_domains"),
    ("content_preferences", "excluded_topics"),
];

/// A validated user profile. Wraps the raw JSON value so that callers can
/// still reach optional, profile-specific fields that aren't part of the
/// required shape (e.g. `briefing_preferences.perspective`).
#[derive(Debug, Clone)]
pub struct UserProfile {
    raw: Value,
}

impl UserProfile {
    /// A minimal, well-formed profile used when the external profile
    /// source's `load_profile()` returns nothing (§3: "absence is
    /// tolerated with generic placeholders", §6.1). Carries no location
    /// or professional domains, so perspective rendering falls through
    /// to its generic labels ("your city", "your profession", ...)
    /// rather than failing curation outright.
    pub fn generic() -> Self {
        Self::load(serde_json::json!({
            "geographic_context": { "primary_location": null },
            "professional_context": { "professional_domains": [] },
            "civic_interests": {},
            "personal_priorities": {},
            "content_preferences": { "excluded_topics": [] }
        }))
        .expect("generic profile is well-formed by construction")
    }

    /// Parse and validate a profile document. Fails fast on the first
    /// missing required section or field.
    pub fn load(raw: Value) -> Result<Self> {
        if !raw.is_object() {
            return Err(Error::validation("user profile must be a JSON object"));
        }

        for section in REQUIRED_SECTIONS {
            if raw.get(section).is_none() {
                return Err(Error::validation(format!(
                    "user profile is missing required section '{section}'"
                )));
            }
        }

        for (section, field) in REQUIRED_FIELDS {
            let present = raw
                .get(section)
                .and_then(|s| s.get(field))
                .is_some();
            if !present {
                return Err(Error::validation(format!(
                    "user profile section '{section}' is missing required field '{field}'"
                )));
            }
        }

        Ok(Self { raw })
    }

    pub fn geographic_context(&self) -> &Value {
        &self.raw["geographic_context"]
    }

    pub fn professional_context(&self) -> &Value {
        &self.raw["professional_context"]
    }

    pub fn civic_interests(&self) -> &Value {
        &self.raw["civic_interests"]
    }

    pub fn personal_priorities(&self) -> &Value {
        &self.raw["personal_priorities"]
    }

    pub fn content_preferences(&self) -> &Value {
        &self.raw["content_preferences"]
    }

    pub fn primary_location(&self) -> Option<&str> {
        self.geographic_context()
            .get("primary_location")
            .and_then(Value::as_str)
    }

    pub fn professional_domains(&self) -> Vec<String> {
        self.professional_context()
            .get("professional_domains")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default()
    }

    pub fn excluded_topics(&self) -> Vec<String> {
        self.content_preferences()
            .get("excluded_topics")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default()
    }

    pub fn complexity_level(&self) -> Option<&str> {
        self.content_preferences()
            .get("complexity_level")
            .and_then(Value::as_str)
    }

    /// Caller-preferred perspective id, if the profile sets one under
    /// `briefing_preferences.perspective`. Optional: absence just means
    /// the default perspective applies.
    pub fn preferred_perspective(&self) -> Option<&str> {
        self.raw
            .get("briefing_preferences")
            .and_then(|b| b.get("perspective"))
            .and_then(Value::as_str)
    }

    pub fn as_json(&self) -> &Value {
        &self.raw
    }
}
