//! Perspective registry (A4): named framing templates that steer the
//! narrative synthesizer's tone and emphasis. A perspective's `framework`
//! field is a `{placeholder}`-style template filled in from the user
//! profile at curation time, with generic fallbacks when a profile field
//! is absent.

use std::collections::HashMap;

/// A named synthesis framing.
#[derive(Debug, Clone)]
pub struct Perspective {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub framework: &'static str,
    pub tone: &'static str,
}

const DAILY_INTELLIGENCE_BRIEF: Perspective = Perspective {
    id: "daily_intelligence_brief",
    name: "Daily Intelligence Brief",
    description: "A concise daily synthesis oriented around what changed and what to do about it.",
    framework: "You are writing a daily intelligence brief for a reader based in {city}, {state}, \
        working in {professional_domains}, whose civic interests center on {civic_focus}. \
        Lead with what changed since yesterday, then connect it to {professional_domains} and \
        {civic_focus}. Keep tone {tone}.",
    tone: "direct and analytical",
};

const EXECUTIVE_SUMMARY: Perspective = Perspective {
    id: "executive_summary",
    name: "Executive Summary",
    description: "A compressed, decision-oriented summary for a reader who skims before acting.",
    framework: "You are writing an executive summary for a decision-maker in {region}, {country}, \
        operating in {professional_domains}. Favor brevity and decisions over narrative. Surface \
        only what bears on {civic_focus} or {professional_domains}. Keep tone {tone}.",
    tone: "terse and decisive",
};

const WEEKLY_DIGEST: Perspective = Perspective {
    id: "weekly_digest",
    name: "Weekly Digest",
    description: "A longer-horizon synthesis for a reader catching up once a week.",
    framework: "You are writing a weekly digest for a reader in {city}, {state}, {region}, \
        {country}, with professional interests in {professional_domains} and civic interests in \
        {civic_focus}. Emphasize trajectories over the past week rather than any single day's \
        news. Keep tone {tone}.",
    tone: "reflective and contextual",
};

const PERSPECTIVES: &[Perspective] = &[DAILY_INTELLIGENCE_BRIEF, EXECUTIVE_SUMMARY, WEEKLY_DIGEST];

/// Look up a perspective by id.
pub fn get_perspective(id: &str) -> Option<&'static Perspective> {
    PERSPECTIVES.iter().find(|p| p.id == id)
}

/// All registered perspectives, for discovery/listing UIs.
pub fn list_perspectives() -> &'static [Perspective] {
    PERSPECTIVES
}

/// The perspective used when neither a caller nor a profile names one.
pub fn get_default_perspective() -> &'static Perspective {
    get_perspective("daily_intelligence_brief").expect("default perspective must be registered")
}

/// Fill a perspective's `framework` template with profile-derived values,
/// falling back to generic labels for anything missing. Uses manual
/// substitution rather than `format!` since the template is runtime data,
/// not a compile-time format string.
pub fn render_framework(perspective: &Perspective, values: &HashMap<&str, String>) -> String {
    const FALLBACKS: &[(&str, &str)] = &[
        ("city", "your city"),
        ("state", "your state"),
        ("region", "your region"),
        ("country", "your country"),
        ("professional_domains", "your profession"),
        ("civic_focus", "civic issues"),
        ("tone", "professional"),
    ];

    let mut rendered = perspective.framework.to_string();
    for (key, fallback) in FALLBACKS {
        let placeholder = format!("{{{key}}}");
        let value = values.get(key).map(String::as_str).unwrap_or(fallback);
        rendered = rendered.replace(&placeholder, value);
    }
    rendered
}
