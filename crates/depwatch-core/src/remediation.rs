use crate::alert::{compare_versions, leading_numbers, Alert};
use std::cmp::Ordering;
use crate::config::MonitoringPolicy;
use crate::types::RiskLevel;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RemediationPlan
// ---------------------------------------------------------------------------

/// A version bump the monitor is allowed to apply without asking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationPlan {
    pub alert_id: String,
    pub resource_name: String,
    pub from_version: String,
    pub to_version: String,
    pub risk: RiskLevel,
}

// ---------------------------------------------------------------------------
// Risk assessment
// ---------------------------------------------------------------------------

/// Risk of moving from `from` to `to`, judged by which semver component
/// changes first. A major bump is high risk, a minor bump medium, anything
/// else low. Versions that do not parse are treated as a major change.
///
/// `None` when `to` is not newer than `from`: downgrades and no-ops are never
/// upgrades.
pub fn assess_upgrade_risk(from: &str, to: &str) -> Option<RiskLevel> {
    match compare_versions(to, from) {
        None => return Some(RiskLevel::High),
        Some(Ordering::Greater) => {}
        Some(_) => return None,
    }
    let from = leading_numbers(from);
    let to = leading_numbers(to);
    let component = |v: &[u64], i: usize| v.get(i).copied().unwrap_or(0);
    let risk = if component(&from, 0) != component(&to, 0) {
        RiskLevel::High
    } else if component(&from, 1) != component(&to, 1) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };
    Some(risk)
}

/// Plan an automatic fix for `alert`, or `None` if the policy forbids it or
/// the alert carries no target version.
pub fn plan_remediation(alert: &Alert, policy: &MonitoringPolicy) -> Option<RemediationPlan> {
    if !policy.auto_remediation_enabled {
        return None;
    }
    let to = alert.suggested_version.as_deref()?;
    let Some(risk) = assess_upgrade_risk(&alert.resource_version, to) else {
        tracing::debug!(
            resource = %alert.resource_name,
            from = %alert.resource_version,
            %to,
            "suggested version is not an upgrade"
        );
        return None;
    };
    if risk > policy.auto_remediation_risk_ceiling {
        tracing::debug!(
            resource = %alert.resource_name,
            %risk,
            ceiling = %policy.auto_remediation_risk_ceiling,
            "remediation above risk ceiling"
        );
        return None;
    }
    Some(RemediationPlan {
        alert_id: alert.id.clone(),
        resource_name: alert.resource_name.clone(),
        from_version: alert.resource_version.clone(),
        to_version: to.to_string(),
        risk,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::TrackedResource;
    use crate::types::Ecosystem;

    fn update_alert(from: &str, to: &str) -> Alert {
        Alert::update(&TrackedResource::new("left-pad", from, Ecosystem::Npm), to).unwrap()
    }

    #[test]
    fn risk_follows_semver_component() {
        assert_eq!(assess_upgrade_risk("1.0.0", "1.0.3"), Some(RiskLevel::Low));
        assert_eq!(assess_upgrade_risk("^1.0.0", "1.4.0"), Some(RiskLevel::Medium));
        assert_eq!(assess_upgrade_risk("1.9.9", "2.0.0"), Some(RiskLevel::High));
        assert_eq!(assess_upgrade_risk("v0.21.0", "v0.21.1"), Some(RiskLevel::Low));
        assert_eq!(assess_upgrade_risk("latest", "2.0.0"), Some(RiskLevel::High));
    }

    #[test]
    fn downgrades_and_no_ops_have_no_risk_level() {
        assert_eq!(assess_upgrade_risk("1.0.5", "1.0.3"), None);
        assert_eq!(assess_upgrade_risk("2.0.0", "1.9.9"), None);
        assert_eq!(assess_upgrade_risk("^1.2.0", "1.2.0"), None);
    }

    #[test]
    fn downgrade_is_never_planned() {
        let mut alert = update_alert("1.0.0", "1.0.1");
        alert.resource_version = "1.0.5".into();
        alert.suggested_version = Some("1.0.3".into());

        let permissive = MonitoringPolicy {
            auto_remediation_risk_ceiling: RiskLevel::High,
            ..Default::default()
        };
        assert!(plan_remediation(&alert, &MonitoringPolicy::default()).is_none());
        assert!(plan_remediation(&alert, &permissive).is_none());
    }

    #[test]
    fn plans_within_ceiling() {
        let policy = MonitoringPolicy::default();
        let plan = plan_remediation(&update_alert("1.0.0", "1.0.1"), &policy).unwrap();
        assert_eq!(plan.risk, RiskLevel::Low);
        assert_eq!(plan.from_version, "1.0.0");
        assert_eq!(plan.to_version, "1.0.1");
    }

    #[test]
    fn refuses_above_ceiling() {
        let policy = MonitoringPolicy::default();
        assert!(plan_remediation(&update_alert("1.0.0", "1.2.0"), &policy).is_none());

        let permissive = MonitoringPolicy {
            auto_remediation_risk_ceiling: RiskLevel::Medium,
            ..Default::default()
        };
        assert!(plan_remediation(&update_alert("1.0.0", "1.2.0"), &permissive).is_some());
    }

    #[test]
    fn disabled_policy_never_plans() {
        let policy = MonitoringPolicy {
            auto_remediation_enabled: false,
            ..Default::default()
        };
        assert!(plan_remediation(&update_alert("1.0.0", "1.0.1"), &policy).is_none());
    }

    #[test]
    fn security_alert_without_target_is_not_remediable() {
        let alert = Alert::security(
            &TrackedResource::new("left-pad", "1.0.0", Ecosystem::Npm),
            &["cve reported".to_string()],
            None,
        )
        .unwrap();
        assert!(plan_remediation(&alert, &MonitoringPolicy::default()).is_none());
    }
}
