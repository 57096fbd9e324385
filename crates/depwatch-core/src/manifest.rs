use crate::error::{DepwatchError, Result};
use crate::paths::MANIFEST_FILES;
use crate::types::Ecosystem;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// TrackedResource
// ---------------------------------------------------------------------------

/// A dependency declared by a manifest. Re-derived on every scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackedResource {
    pub name: String,
    pub declared_version: String,
    pub ecosystem: Ecosystem,
}

impl TrackedResource {
    pub fn new(
        name: impl Into<String>,
        declared_version: impl Into<String>,
        ecosystem: Ecosystem,
    ) -> Self {
        Self {
            name: name.into(),
            declared_version: declared_version.into(),
            ecosystem,
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Manifest files present directly under `root`, in [`MANIFEST_FILES`] order.
pub fn discover_manifests(root: &Path) -> Vec<PathBuf> {
    MANIFEST_FILES
        .iter()
        .map(|name| root.join(name))
        .filter(|p| p.is_file())
        .collect()
}

/// Every resource declared by the manifests under `root`, in discovery order.
///
/// A manifest that cannot be read or parsed contributes nothing; the failure
/// is logged and the remaining manifests are still scanned.
pub fn discover_resources(root: &Path) -> Vec<TrackedResource> {
    let mut seen = HashSet::new();
    let mut resources = Vec::new();
    for path in discover_manifests(root) {
        match parse_manifest(&path) {
            Ok(found) => {
                for r in found {
                    if seen.insert((r.ecosystem, r.name.clone())) {
                        resources.push(r);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "skipping manifest: {e}");
            }
        }
    }
    resources
}

/// Parse one manifest. Lockfiles and formats without a declared-dependency
/// parser are recognized but yield no resources.
pub fn parse_manifest(path: &Path) -> Result<Vec<TrackedResource>> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DepwatchError::UnsupportedManifest(path.display().to_string()))?;

    if !MANIFEST_FILES.contains(&name) {
        return Err(DepwatchError::UnsupportedManifest(name.to_string()));
    }

    match name {
        "package.json" => {
            let data = std::fs::read_to_string(path)?;
            parse_package_json(&data).map_err(|reason| malformed(path, reason))
        }
        "composer.json" => {
            let data = std::fs::read_to_string(path)?;
            parse_composer_json(&data).map_err(|reason| malformed(path, reason))
        }
        "requirements.txt" => Ok(parse_requirements_txt(&std::fs::read_to_string(path)?)),
        "go.mod" => Ok(parse_go_mod(&std::fs::read_to_string(path)?)),
        _ => Ok(Vec::new()),
    }
}

fn malformed(path: &Path, reason: String) -> DepwatchError {
    DepwatchError::MalformedManifest {
        path: path.display().to_string(),
        reason,
    }
}

// ---------------------------------------------------------------------------
// Format parsers
// ---------------------------------------------------------------------------

fn json_dependency_sections(
    data: &str,
    sections: &[&str],
    ecosystem: Ecosystem,
    keep: fn(&str) -> bool,
) -> std::result::Result<Vec<TrackedResource>, String> {
    let value: serde_json::Value = serde_json::from_str(data).map_err(|e| e.to_string())?;
    let obj = value
        .as_object()
        .ok_or_else(|| "top-level value is not an object".to_string())?;

    let mut out = Vec::new();
    for section in sections {
        let Some(deps) = obj.get(*section) else {
            continue;
        };
        let deps = deps
            .as_object()
            .ok_or_else(|| format!("'{section}' is not an object"))?;
        for (name, version) in deps {
            if !keep(name) {
                continue;
            }
            if let Some(v) = version.as_str() {
                out.push(TrackedResource::new(name, v, ecosystem));
            }
        }
    }
    Ok(out)
}

/// `dependencies` then `devDependencies`.
pub fn parse_package_json(data: &str) -> std::result::Result<Vec<TrackedResource>, String> {
    json_dependency_sections(
        data,
        &["dependencies", "devDependencies"],
        Ecosystem::Npm,
        |_| true,
    )
}

/// `require` then `require-dev`, minus platform requirements (`php`, `ext-*`).
pub fn parse_composer_json(data: &str) -> std::result::Result<Vec<TrackedResource>, String> {
    json_dependency_sections(
        data,
        &["require", "require-dev"],
        Ecosystem::Packagist,
        |name| name.contains('/'),
    )
}

static REQUIREMENT_RE: OnceLock<Regex> = OnceLock::new();

fn requirement_re() -> &'static Regex {
    REQUIREMENT_RE.get_or_init(|| {
        Regex::new(
            r"^([A-Za-z0-9][A-Za-z0-9._\-]*)(?:\[[^\]]*\])?\s*(?:(===|==|>=|<=|~=|!=|>|<)\s*([^\s;,#]+))?",
        )
        .expect("valid requirement regex")
    })
}

/// Pinned requirements keep the bare version; ranges keep their operator;
/// unversioned lines become `*`.
pub fn parse_requirements_txt(data: &str) -> Vec<TrackedResource> {
    data.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('-'))
        .filter_map(|l| {
            let caps = requirement_re().captures(l)?;
            let name = caps.get(1)?.as_str();
            let version = match (caps.get(2), caps.get(3)) {
                (Some(op), Some(v)) if op.as_str() == "==" || op.as_str() == "===" => {
                    v.as_str().to_string()
                }
                (Some(op), Some(v)) => format!("{}{}", op.as_str(), v.as_str()),
                _ => "*".to_string(),
            };
            Some(TrackedResource::new(name, version, Ecosystem::Pypi))
        })
        .collect()
}

static GO_REQUIRE_RE: OnceLock<Regex> = OnceLock::new();

fn go_require_re() -> &'static Regex {
    GO_REQUIRE_RE.get_or_init(|| {
        Regex::new(r"^([^\s()]+)\s+(v[^\s]+)").expect("valid go require regex")
    })
}

/// Both `require x v1` lines and `require ( ... )` blocks.
pub fn parse_go_mod(data: &str) -> Vec<TrackedResource> {
    let mut out = Vec::new();
    let mut in_block = false;
    for line in data.lines().map(str::trim) {
        if in_block {
            if line.starts_with(')') {
                in_block = false;
                continue;
            }
            push_go_requirement(line, &mut out);
        } else if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest.starts_with('(') {
                in_block = true;
            } else {
                push_go_requirement(rest, &mut out);
            }
        }
    }
    out
}

fn push_go_requirement(line: &str, out: &mut Vec<TrackedResource>) {
    if line.starts_with("//") {
        return;
    }
    if let Some(caps) = go_require_re().captures(line) {
        out.push(TrackedResource::new(&caps[1], &caps[2], Ecosystem::Go));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
