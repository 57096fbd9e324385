use serde::{Deserialize, Serialize};

/// Body sent for each resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub name: String,
    pub version: String,
    pub ecosystem: String,
}

/// Findings for one resource. `insights` is free text; the monitor applies its
/// own keyword heuristics to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierResult {
    pub success: bool,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default, alias = "latestVersion", skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
}

impl ClassifierResult {
    pub fn ok(insights: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            success: true,
            insights: insights.into_iter().map(Into::into).collect(),
            latest_version: None,
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    pub fn with_latest_version(mut self, version: impl Into<String>) -> Self {
        self.latest_version = Some(version.into());
        self
    }
}
