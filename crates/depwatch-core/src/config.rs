use crate::error::{DepwatchError, Result};
use crate::paths;
use crate::types::{RiskLevel, Severity};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// MonitoringPolicy
// ---------------------------------------------------------------------------

/// Monitor configuration. Every field has a default, so a partial YAML map
/// yields the defaults merged with whatever the user overrode. The camelCase
/// aliases accept settings exported from editor extensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringPolicy {
    #[serde(default = "default_critical_interval", alias = "criticalCheckIntervalMs")]
    pub critical_check_interval_ms: u64,
    #[serde(default = "default_full_interval", alias = "fullCheckIntervalMs")]
    pub full_check_interval_ms: u64,
    #[serde(default = "default_true", alias = "autoRemediationEnabled")]
    pub auto_remediation_enabled: bool,
    #[serde(default = "default_risk_ceiling", alias = "autoRemediationRiskCeiling")]
    pub auto_remediation_risk_ceiling: RiskLevel,
    #[serde(default = "default_threshold", alias = "notificationThreshold")]
    pub notification_threshold: Severity,
    #[serde(default = "default_true", alias = "backgroundProcessingEnabled")]
    pub background_processing_enabled: bool,
    #[serde(default = "default_max_checks", alias = "maxConcurrentChecks")]
    pub max_concurrent_checks: usize,
    /// Upper bound on a single classifier call.
    #[serde(default = "default_classifier_timeout", alias = "classifierTimeoutMs")]
    pub classifier_timeout_ms: u64,
    /// Quiet period before a burst of manifest changes triggers a check.
    #[serde(default = "default_debounce", alias = "debounceMs")]
    pub debounce_ms: u64,
    #[serde(default = "default_startup_full_delay", alias = "startupFullCheckDelayMs")]
    pub startup_full_check_delay_ms: u64,
}

fn default_critical_interval() -> u64 {
    4 * 60 * 60 * 1000
}

fn default_full_interval() -> u64 {
    24 * 60 * 60 * 1000
}

fn default_true() -> bool {
    true
}

fn default_risk_ceiling() -> RiskLevel {
    RiskLevel::Low
}

fn default_threshold() -> Severity {
    Severity::Medium
}

fn default_max_checks() -> usize {
    3
}

fn default_classifier_timeout() -> u64 {
    5_000
}

fn default_debounce() -> u64 {
    1_000
}

fn default_startup_full_delay() -> u64 {
    30_000
}

impl Default for MonitoringPolicy {
    fn default() -> Self {
        Self {
            critical_check_interval_ms: default_critical_interval(),
            full_check_interval_ms: default_full_interval(),
            auto_remediation_enabled: default_true(),
            auto_remediation_risk_ceiling: default_risk_ceiling(),
            notification_threshold: default_threshold(),
            background_processing_enabled: default_true(),
            max_concurrent_checks: default_max_checks(),
            classifier_timeout_ms: default_classifier_timeout(),
            debounce_ms: default_debounce(),
            startup_full_check_delay_ms: default_startup_full_delay(),
        }
    }
}

impl MonitoringPolicy {
    /// Reject policies the scheduler cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.critical_check_interval_ms == 0 {
            return Err(DepwatchError::InvalidPolicy(
                "critical_check_interval_ms must be greater than 0".into(),
            ));
        }
        if self.full_check_interval_ms == 0 {
            return Err(DepwatchError::InvalidPolicy(
                "full_check_interval_ms must be greater than 0".into(),
            ));
        }
        if self.full_check_interval_ms < self.critical_check_interval_ms {
            return Err(DepwatchError::InvalidPolicy(format!(
                "full_check_interval_ms ({}) must be >= critical_check_interval_ms ({})",
                self.full_check_interval_ms, self.critical_check_interval_ms
            )));
        }
        if self.max_concurrent_checks == 0 {
            return Err(DepwatchError::InvalidPolicy(
                "max_concurrent_checks must be at least 1".into(),
            ));
        }
        if self.classifier_timeout_ms == 0 {
            return Err(DepwatchError::InvalidPolicy(
                "classifier_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn critical_interval(&self) -> Duration {
        Duration::from_millis(self.critical_check_interval_ms)
    }

    pub fn full_interval(&self) -> Duration {
        Duration::from_millis(self.full_check_interval_ms)
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn startup_full_check_delay(&self) -> Duration {
        Duration::from_millis(self.startup_full_check_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// ClassifierConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Base URL of the research service. No endpoint means no scans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Extra attempts after the first failed request.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_retries() -> u32 {
    2
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitoring: MonitoringPolicy,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Config {
    /// Load `.depwatch/config.yaml`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Err(e) = self.monitoring.validate() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: e.to_string(),
            });
        }

        if self.monitoring.critical_check_interval_ms > 0
            && self.monitoring.critical_check_interval_ms < 60_000
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "critical_check_interval_ms={} is under a minute; every check calls the classifier",
                    self.monitoring.critical_check_interval_ms
                ),
            });
        }

        if self.monitoring.max_concurrent_checks > 50 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "max_concurrent_checks={} (>50 is unusual)",
                    self.monitoring.max_concurrent_checks
                ),
            });
        }

        match self.classifier.endpoint.as_deref().map(str::trim) {
            None | Some("") => warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "classifier.endpoint is not set; scans will be skipped".into(),
            }),
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("classifier.endpoint '{url}' is not an http(s) URL"),
                })
            }
            Some(_) => {}
        }

        if self.classifier.retries > 10 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "classifier.retries={} (>10 is unusual)",
                    self.classifier.retries
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn with_endpoint() -> Config {
        let mut cfg = Config::default();
        cfg.classifier.endpoint = Some("https://research.example.com".into());
        cfg
    }

    #[test]
    fn defaults_match_documented_values() {
        let p = MonitoringPolicy::default();
        assert_eq!(p.critical_check_interval_ms, 14_400_000);
        assert_eq!(p.full_check_interval_ms, 86_400_000);
        assert!(p.auto_remediation_enabled);
        assert_eq!(p.auto_remediation_risk_ceiling, RiskLevel::Low);
        assert_eq!(p.notification_threshold, Severity::Medium);
        assert!(p.background_processing_enabled);
        assert_eq!(p.max_concurrent_checks, 3);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn partial_yaml_merges_over_defaults() {
        let yaml = "monitoring:\n  max_concurrent_checks: 7\n  notification_threshold: high\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.monitoring.max_concurrent_checks, 7);
        assert_eq!(cfg.monitoring.notification_threshold, Severity::High);
        assert_eq!(cfg.monitoring.critical_check_interval_ms, 14_400_000);
        assert_eq!(cfg.classifier.retries, 2);
    }

    #[test]
    fn camel_case_keys_are_accepted() {
        let yaml = "monitoring:\n  criticalCheckIntervalMs: 1000\n  fullCheckIntervalMs: 5000\n  autoRemediationRiskCeiling: medium\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.monitoring.critical_check_interval_ms, 1000);
        assert_eq!(cfg.monitoring.full_check_interval_ms, 5000);
        assert_eq!(
            cfg.monitoring.auto_remediation_risk_ceiling,
            RiskLevel::Medium
        );
    }

    #[test]
    fn policy_rejects_full_shorter_than_critical() {
        let p = MonitoringPolicy {
            critical_check_interval_ms: 10_000,
            full_check_interval_ms: 5_000,
            ..Default::default()
        };
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("full_check_interval_ms"));
    }

    #[test]
    fn policy_rejects_zero_concurrency() {
        let p = MonitoringPolicy {
            max_concurrent_checks: 0,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_preserves_overrides() {
        let dir = TempDir::new().unwrap();
        let mut cfg = with_endpoint();
        cfg.monitoring.max_concurrent_checks = 9;
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.monitoring.max_concurrent_checks, 9);
        assert_eq!(
            loaded.classifier.endpoint.as_deref(),
            Some("https://research.example.com")
        );
    }

    #[test]
    fn validate_default_with_endpoint_has_no_warnings() {
        assert!(with_endpoint().validate().is_empty());
    }

    #[test]
    fn validate_missing_endpoint_warns() {
        let warnings = Config::default().validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("endpoint")));
    }

    #[test]
    fn validate_invalid_policy_is_error() {
        let mut cfg = with_endpoint();
        cfg.monitoring.full_check_interval_ms = 1;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
    }

    #[test]
    fn validate_non_http_endpoint_is_error() {
        let mut cfg = Config::default();
        cfg.classifier.endpoint = Some("ftp://example.com".into());
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("ftp://")));
    }
}
