use crate::manifest::TrackedResource;
use crate::severity::{
    classify_severity, indicates_issue, normalize_message, primary_finding, requires_action,
};
use crate::types::{AlertKind, CheckKind, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

/// What the classifier said about a resource, kept verbatim on the alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub insights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub resource_name: String,
    pub resource_version: String,
    pub message: String,
    pub requires_action: bool,
    pub created_at: DateTime<Utc>,
    /// Version the classifier reported as current, when it differs from the
    /// declared one. Drives remediation planning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_version: Option<String>,
    pub evidence: Evidence,
}

impl Alert {
    /// Build a security alert if the findings mention an issue.
    ///
    /// Returns `None` when no insight passes the issue gate, regardless of
    /// how severe the text would have classified.
    pub fn security(
        resource: &TrackedResource,
        insights: &[String],
        latest_version: Option<&str>,
    ) -> Option<Alert> {
        if !indicates_issue(insights) {
            return None;
        }
        let severity = classify_severity(insights);
        let finding = primary_finding(insights).unwrap_or_default();
        let created_at = Utc::now();
        Some(Alert {
            id: alert_id(AlertKind::Security, &resource.name, created_at),
            kind: AlertKind::Security,
            severity,
            resource_name: resource.name.clone(),
            resource_version: resource.declared_version.clone(),
            message: format!(
                "{}@{}: {}",
                resource.name, resource.declared_version, finding
            ),
            requires_action: requires_action(severity),
            created_at,
            suggested_version: latest_version
                .filter(|v| is_newer_than_declared(&resource.declared_version, v))
                .map(str::to_string),
            evidence: Evidence {
                insights: insights.to_vec(),
                latest_version: latest_version.map(str::to_string),
            },
        })
    }

    /// Build an update alert when the classifier reports a newer release than
    /// the pinned declaration. Unpinned (`*`) declarations never qualify.
    pub fn update(resource: &TrackedResource, latest_version: &str) -> Option<Alert> {
        if !is_newer_than_declared(&resource.declared_version, latest_version) {
            return None;
        }
        let created_at = Utc::now();
        Some(Alert {
            id: alert_id(AlertKind::Update, &resource.name, created_at),
            kind: AlertKind::Update,
            severity: Severity::Low,
            resource_name: resource.name.clone(),
            resource_version: resource.declared_version.clone(),
            message: format!(
                "{}@{}: version {} is available",
                resource.name, resource.declared_version, latest_version
            ),
            requires_action: false,
            created_at,
            suggested_version: Some(latest_version.to_string()),
            evidence: Evidence {
                insights: Vec::new(),
                latest_version: Some(latest_version.to_string()),
            },
        })
    }

    fn dedup_key(&self) -> DedupKey {
        DedupKey {
            resource_name: self.resource_name.clone(),
            kind: self.kind,
            message: normalize_message(&self.message),
        }
    }
}

fn alert_id(kind: AlertKind, resource: &str, at: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}-{}",
        kind,
        resource,
        at.timestamp_millis(),
        &suffix[..8]
    )
}

/// Strip range operators and a leading `v` from a declared version.
pub fn bare_version(declared: &str) -> &str {
    declared.trim().trim_start_matches(|c: char| {
        matches!(c, '^' | '~' | '>' | '<' | '=' | '!' | 'v' | ' ')
    })
}

pub(crate) fn leading_numbers(version: &str) -> Vec<u64> {
    bare_version(version)
        .split(['.', '-', '+'])
        .map_while(|part| part.parse::<u64>().ok())
        .collect()
}

/// Order two versions by their leading numeric components, missing
/// components counting as zero. `None` if either has no numeric prefix.
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    let a = leading_numbers(a);
    let b = leading_numbers(b);
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let component = |v: &[u64], i: usize| v.get(i).copied().unwrap_or(0);
    let ord = (0..a.len().max(b.len()))
        .map(|i| component(&a, i).cmp(&component(&b, i)))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal);
    Some(ord)
}

/// True only when `latest` is strictly newer than a pinned declaration.
fn is_newer_than_declared(declared: &str, latest: &str) -> bool {
    compare_versions(latest, declared) == Some(Ordering::Greater)
}

// ---------------------------------------------------------------------------
// MonitoringStats
// ---------------------------------------------------------------------------

/// Rolling aggregate, overwritten in place by each scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringStats {
    /// Resources discovered by the most recent scan.
    pub total_resources: usize,
    pub last_critical_check: Option<DateTime<Utc>>,
    pub last_full_check: Option<DateTime<Utc>>,
    pub alerts_generated: u64,
    pub auto_remediations: u64,
    pub classifier_calls: u64,
    /// Mean classifier response time of the most recent scan.
    pub average_response_time_ms: f64,
}

impl MonitoringStats {
    /// Fold one completed scan into the aggregate.
    pub fn record_scan(
        &mut self,
        kind: CheckKind,
        total_resources: usize,
        response_times_ms: &[u64],
        finished_at: DateTime<Utc>,
    ) {
        self.total_resources = total_resources;
        self.classifier_calls += response_times_ms.len() as u64;
        self.average_response_time_ms = if response_times_ms.is_empty() {
            0.0
        } else {
            response_times_ms.iter().sum::<u64>() as f64 / response_times_ms.len() as f64
        };
        match kind {
            CheckKind::Critical => self.last_critical_check = Some(finished_at),
            CheckKind::Full => self.last_full_check = Some(finished_at),
        }
    }
}

// ---------------------------------------------------------------------------
// AlertRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    resource_name: String,
    kind: AlertKind,
    message: String,
}

/// Outcome of [`AlertRegistry::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// First alert for this (resource, kind, message).
    New,
    /// Replaced an earlier alert with the same content; `replaced` is its id.
    Refreshed { replaced: String },
}

/// In-memory alert store keyed by id, deduplicated by content.
///
/// Alerts that share resource, kind, and normalized message collapse to the
/// most recent occurrence, so repeated scans do not accumulate copies of the
/// same finding.
#[derive(Debug, Default)]
pub struct AlertRegistry {
    alerts: HashMap<String, Alert>,
    by_content: HashMap<DedupKey, String>,
    stats: MonitoringStats,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, alert: Alert) -> Insertion {
        let key = alert.dedup_key();
        let id = alert.id.clone();

        let outcome = match self.by_content.insert(key, id.clone()) {
            Some(previous) if previous != id => {
                self.alerts.remove(&previous);
                Insertion::Refreshed { replaced: previous }
            }
            Some(previous) => Insertion::Refreshed { replaced: previous },
            None => {
                self.stats.alerts_generated += 1;
                Insertion::New
            }
        };

        self.alerts.insert(id, alert);
        outcome
    }

    pub fn get(&self, id: &str) -> Option<&Alert> {
        self.alerts.get(id)
    }

    /// All alerts, most urgent first, then oldest first.
    pub fn all(&self) -> Vec<Alert> {
        let mut out: Vec<Alert> = self.alerts.values().cloned().collect();
        out.sort_by(|a, b| {
            a.severity
                .cmp(&b.severity)
                .then(a.created_at.cmp(&b.created_at))
        });
        out
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Drop every alert. Statistics are left intact.
    pub fn clear(&mut self) {
        self.alerts.clear();
        self.by_content.clear();
    }

    pub fn stats(&self) -> &MonitoringStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut MonitoringStats {
        &mut self.stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Ecosystem;

    fn left_pad() -> TrackedResource {
        TrackedResource::new("left-pad", "1.0.0", Ecosystem::Npm)
    }

    fn insights(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn security_alert_from_rce_finding() {
        let alert = Alert::security(
            &left_pad(),
            &insights(&["Known CVE: remote code execution in left-pad 1.0.0"]),
            None,
        )
        .unwrap();
        assert_eq!(alert.kind, AlertKind::Security);
        assert_eq!(alert.severity, Severity::Critical);
        assert!(alert.requires_action);
        assert_eq!(alert.resource_name, "left-pad");
        assert!(alert.message.contains("remote code execution"));
        assert!(alert.id.starts_with("security-left-pad-"));
    }

    #[test]
    fn benign_findings_produce_no_alert() {
        let alert = Alert::security(
            &left_pad(),
            &insights(&["left-pad is a stable, widely used package"]),
            None,
        );
        assert!(alert.is_none());
    }

    #[test]
    fn high_without_issue_keyword_produces_no_alert() {
        let alert = Alert::security(&left_pad(), &insights(&["high maintenance burden"]), None);
        assert!(alert.is_none());
    }

    #[test]
    fn medium_security_alert_does_not_require_action() {
        let alert = Alert::security(
            &left_pad(),
            &insights(&["security advisory: medium impact"]),
            None,
        )
        .unwrap();
        assert_eq!(alert.severity, Severity::Medium);
        assert!(!alert.requires_action);
    }

    #[test]
    fn update_alert_only_when_version_moves() {
        assert!(Alert::update(&left_pad(), "1.0.0").is_none());
        assert!(Alert::update(&left_pad(), "v1.0.0").is_none());
        let unpinned = TrackedResource::new("flask", "*", Ecosystem::Pypi);
        assert!(Alert::update(&unpinned, "3.0.0").is_none());

        let alert = Alert::update(&left_pad(), "1.3.0").unwrap();
        assert_eq!(alert.kind, AlertKind::Update);
        assert_eq!(alert.severity, Severity::Low);
        assert!(!alert.requires_action);
        assert_eq!(alert.suggested_version.as_deref(), Some("1.3.0"));
    }

    #[test]
    fn older_latest_is_not_an_update() {
        let pinned = TrackedResource::new("left-pad", "1.0.5", Ecosystem::Npm);
        assert!(Alert::update(&pinned, "1.0.3").is_none());
        assert!(Alert::update(&pinned, "0.9.9").is_none());
        assert!(Alert::update(&pinned, "1.0.5.0").is_none());
        assert!(Alert::update(&pinned, "1.0.10").is_some());
    }

    #[test]
    fn security_alert_never_suggests_a_downgrade() {
        let pinned = TrackedResource::new("left-pad", "^1.0.5", Ecosystem::Npm);
        let alert =
            Alert::security(&pinned, &insights(&["CVE-2024-0001 reported"]), Some("1.0.3")).unwrap();
        assert_eq!(alert.suggested_version, None);
        assert_eq!(alert.evidence.latest_version.as_deref(), Some("1.0.3"));
    }

    #[test]
    fn versions_compare_numerically() {
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Some(Ordering::Greater));
        assert_eq!(compare_versions("^2.0", "2.0.0"), Some(Ordering::Equal));
        assert_eq!(compare_versions("v0.21.1", "v0.21.0"), Some(Ordering::Greater));
        assert_eq!(compare_versions("1.0.3", "1.0.5"), Some(Ordering::Less));
        assert_eq!(compare_versions("latest", "1.0.0"), None);
        assert_eq!(compare_versions("*", "1.0.0"), None);
    }

    #[test]
    fn bare_version_strips_operators() {
        assert_eq!(bare_version("^18.2.0"), "18.2.0");
        assert_eq!(bare_version(">= 4.2"), "4.2");
        assert_eq!(bare_version("v0.21.0"), "0.21.0");
    }

    #[test]
    fn registry_counts_new_alerts() {
        let mut reg = AlertRegistry::new();
        let a = Alert::update(&left_pad(), "1.3.0").unwrap();
        assert_eq!(reg.add(a.clone()), Insertion::New);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.stats().alerts_generated, 1);
        assert_eq!(reg.get(&a.id), Some(&a));
    }

    #[test]
    fn registry_deduplicates_repeat_findings() {
        let mut reg = AlertRegistry::new();
        let first = Alert::security(&left_pad(), &insights(&["Known CVE in  left-pad"]), None)
            .unwrap();
        let mut second =
            Alert::security(&left_pad(), &insights(&["known cve in left-pad"]), None).unwrap();
        second.id = format!("{}-later", first.id);

        reg.add(first.clone());
        let outcome = reg.add(second.clone());

        assert_eq!(
            outcome,
            Insertion::Refreshed {
                replaced: first.id.clone()
            }
        );
        assert_eq!(reg.len(), 1);
        assert!(reg.get(&first.id).is_none());
        assert!(reg.get(&second.id).is_some());
        assert_eq!(reg.stats().alerts_generated, 1);
    }

    #[test]
    fn registry_keeps_distinct_kinds_apart() {
        let mut reg = AlertRegistry::new();
        reg.add(Alert::security(&left_pad(), &insights(&["cve found"]), None).unwrap());
        reg.add(Alert::update(&left_pad(), "2.0.0").unwrap());
        assert_eq!(reg.len(), 2);
        let kinds: Vec<AlertKind> = reg.all().iter().map(|a| a.kind).collect();
        assert!(kinds.contains(&AlertKind::Security));
        assert!(kinds.contains(&AlertKind::Update));
    }

    #[test]
    fn clear_keeps_stats() {
        let mut reg = AlertRegistry::new();
        reg.add(Alert::update(&left_pad(), "2.0.0").unwrap());
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.stats().alerts_generated, 1);
        // Same content after clear counts as new again.
        assert_eq!(
            reg.add(Alert::update(&left_pad(), "2.0.0").unwrap()),
            Insertion::New
        );
    }

    #[test]
    fn record_scan_overwrites_latest_values() {
        let mut stats = MonitoringStats::default();
        let now = Utc::now();
        stats.record_scan(CheckKind::Critical, 5, &[100, 300], now);
        assert_eq!(stats.total_resources, 5);
        assert_eq!(stats.classifier_calls, 2);
        assert!((stats.average_response_time_ms - 200.0).abs() < 1e-9);
        assert_eq!(stats.last_critical_check, Some(now));
        assert!(stats.last_full_check.is_none());

        stats.record_scan(CheckKind::Full, 1, &[], now);
        assert_eq!(stats.total_resources, 1);
        assert_eq!(stats.classifier_calls, 2);
        assert_eq!(stats.average_response_time_ms, 0.0);
        assert_eq!(stats.last_full_check, Some(now));
    }
}
