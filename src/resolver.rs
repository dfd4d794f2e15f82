//! Snapshot file naming.
//!
//! Every assertion inside a test gets its own file:
//! `<dir>/__snapshots__/<source-basename>.<test-slug>.<index>.<ext>`, where
//! `index` counts assertions made so far for that `(source, test)` pair.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

pub const SNAPSHOT_DIR: &str = "__snapshots__";

/// Identity of one assertion call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub source_file: PathBuf,
    pub test_name: String,
    pub sequence_index: usize,
    base: PathBuf,
}

impl SnapshotKey {
    pub fn path(&self, extension: &str) -> PathBuf {
        let mut name = self.base.clone().into_os_string();
        name.push(format!(".{}.{}", self.sequence_index, extension));
        PathBuf::from(name)
    }
}

/// Owns the per-run assertion counters.
///
/// Create one per test run (or per test); counters are never reset implicitly,
/// so a fresh context replays the same sequence of paths.
#[derive(Debug, Default)]
pub struct SnapshotContext {
    counters: Mutex<HashMap<PathBuf, usize>>,
}

impl SnapshotContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, source_file: &Path, test_name: &str) -> SnapshotKey {
        let base = base_path(source_file, test_name);
        let sequence_index = {
            let mut counters = self.counters.lock();
            let count = counters.entry(base.clone()).or_insert(0);
            let current = *count;
            *count += 1;
            current
        };
        log::debug!(
            "resolved snapshot {} #{sequence_index}",
            base.display()
        );
        SnapshotKey {
            source_file: source_file.to_path_buf(),
            test_name: test_name.to_string(),
            sequence_index,
            base,
        }
    }

    pub fn resolve_path(&self, source_file: &Path, test_name: &str, extension: &str) -> PathBuf {
        self.resolve(source_file, test_name).path(extension)
    }

    /// Number of keys handed out so far for this `(source, test)` pair.
    pub fn count(&self, source_file: &Path, test_name: &str) -> usize {
        let base = base_path(source_file, test_name);
        self.counters.lock().get(&base).copied().unwrap_or(0)
    }

    pub fn reset(&self) {
        self.counters.lock().clear();
    }
}

fn base_path(source_file: &Path, test_name: &str) -> PathBuf {
    let dir = source_file.parent().unwrap_or_else(|| Path::new(""));
    let mut name: OsString = source_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(slugify(test_name));
    dir.join(SNAPSHOT_DIR).join(name)
}

/// Lowercases `name` and collapses every run of non-alphanumeric characters
/// into a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("snapshot");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("clear"), "clear");
        assert_eq!(slugify("Quads Blending"), "quads-blending");
        assert_eq!(slugify("  texture / storage!! "), "texture-storage");
        assert_eq!(slugify("Ünïcode Näme"), "ünïcode-näme");
        assert_eq!(slugify("a__b--c"), "a-b-c");
    }

    #[test]
    fn slugify_never_returns_empty() {
        assert_eq!(slugify(""), "snapshot");
        assert_eq!(slugify("../.."), "snapshot");
    }

    #[test]
    fn first_key_starts_at_zero() {
        let ctx = SnapshotContext::new();
        let key = ctx.resolve(Path::new("tests/render.rs"), "Clear Screen");
        assert_eq!(key.sequence_index, 0);
        assert_eq!(
            key.path("png"),
            Path::new("tests/__snapshots__/render.rs.clear-screen.0.png")
        );
    }

    #[test]
    fn counters_are_per_test() {
        let ctx = SnapshotContext::new();
        let file = Path::new("tests/render.rs");
        ctx.resolve(file, "one");
        ctx.resolve(file, "one");
        let other = ctx.resolve(file, "two");
        assert_eq!(other.sequence_index, 0);
        assert_eq!(ctx.count(file, "one"), 2);
        assert_eq!(ctx.count(file, "missing"), 0);
    }

    #[test]
    fn reset_replays_the_sequence() {
        let ctx = SnapshotContext::new();
        let file = Path::new("a.test");
        let first = ctx.resolve_path(file, "clear", "snap");
        ctx.resolve_path(file, "clear", "snap");
        ctx.reset();
        assert_eq!(ctx.resolve_path(file, "clear", "snap"), first);
    }
}
