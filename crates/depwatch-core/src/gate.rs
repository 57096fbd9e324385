use crate::types::Severity;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// How loudly a surfaced alert should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    Error,
    Warning,
    Info,
}

impl Presentation {
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical => Presentation::Error,
            Severity::High => Presentation::Warning,
            Severity::Medium | Severity::Low => Presentation::Info,
        }
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Surface an alert iff it is at least as urgent as the threshold.
pub fn should_surface(severity: Severity, threshold: Severity) -> bool {
    severity.ordinal() <= threshold.ordinal()
}

/// `Some(presentation)` when the alert clears the threshold.
pub fn surface(severity: Severity, threshold: Severity) -> Option<Presentation> {
    should_surface(severity, threshold).then(|| Presentation::for_severity(severity))
}
