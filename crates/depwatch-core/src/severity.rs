//! Keyword heuristics over classifier insight text.
//!
//! Severity classification and alert gating are two independent checks over
//! the same text: an insight can rank `high` without ever becoming an alert.

use crate::types::Severity;

/// Keyword groups evaluated most-severe first. The first group with a
/// substring hit wins.
const SEVERITY_KEYWORDS: &[(Severity, &[&str])] = &[
    (Severity::Critical, &["critical", "remote code execution"]),
    (Severity::High, &["high", "privilege escalation"]),
    (Severity::Medium, &["medium", "cross-site scripting"]),
];

/// Any of these in any insight means the result describes a security issue.
const ISSUE_KEYWORDS: &[&str] = &["vulnerability", "security", "cve"];

fn combined_lowercase<S: AsRef<str>>(insights: &[S]) -> String {
    insights
        .iter()
        .map(|s| AsRef::<str>::as_ref(s).to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map free-text findings to a severity. Falls back to `Low`.
pub fn classify_severity<S: AsRef<str>>(insights: &[S]) -> Severity {
    let text = combined_lowercase(insights);
    SEVERITY_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(sev, _)| *sev)
        .unwrap_or(Severity::Low)
}

/// True if at least one insight mentions a vulnerability, security, or CVE.
pub fn indicates_issue<S: AsRef<str>>(insights: &[S]) -> bool {
    insights
        .iter()
        .any(|s| mentions_issue(AsRef::<str>::as_ref(s)))
}

fn mentions_issue(text: &str) -> bool {
    let lower = text.to_lowercase();
    ISSUE_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// The first insight that tripped the issue gate, used as the alert text.
pub fn primary_finding<S: AsRef<str>>(insights: &[S]) -> Option<&str> {
    insights
        .iter()
        .map(|s| AsRef::<str>::as_ref(s))
        .find(|s| mentions_issue(s))
}

/// Whether an alert of this severity needs someone to act on it.
pub fn requires_action(severity: Severity) -> bool {
    severity <= Severity::High
}

/// Lowercase with runs of whitespace collapsed. Used as the dedup key.
pub fn normalize_message(message: &str) -> String {
    message
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
