use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DEPWATCH_DIR: &str = ".depwatch";
pub const CONFIG_FILE: &str = ".depwatch/config.yaml";

/// Every filename the watcher reacts to. Order matters: manifest discovery
/// walks this list, so it also fixes the order resources are checked in.
pub const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "requirements.txt",
    "Pipfile",
    "Pipfile.lock",
    "pyproject.toml",
    "Cargo.toml",
    "Cargo.lock",
    "go.mod",
    "go.sum",
    "Gemfile",
    "Gemfile.lock",
    "composer.json",
    "composer.lock",
    "pom.xml",
    "build.gradle",
];

/// Directories whose contents are vendored or generated; changes inside them
/// never count as a manifest change.
pub const IGNORED_DIRS: &[&str] = &["node_modules", "target", ".git", "vendor", DEPWATCH_DIR];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn depwatch_dir(root: &Path) -> PathBuf {
    root.join(DEPWATCH_DIR)
}

/// True if the file name of `path` is one of [`MANIFEST_FILES`].
pub fn is_manifest_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| MANIFEST_FILES.contains(&n))
        .unwrap_or(false)
}

/// True if any component of `path` is one of [`IGNORED_DIRS`].
pub fn is_ignored(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(os) => os
            .to_str()
            .map(|s| IGNORED_DIRS.contains(&s))
            .unwrap_or(false),
        _ => false,
    })
}

/// A path the watcher should forward to the debouncer.
pub fn is_watched_manifest(path: &Path) -> bool {
    is_manifest_file(path) && !is_ignored(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
