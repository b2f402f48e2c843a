//! Declaring-file provenance and staleness checks
//!
//! Rather than watching the filesystem, staleness is decided lazily at read
//! time: one stat per lookup, comparing the declaring file's current
//! modification time against the one recorded when the signature was
//! stored. Correct for edit-and-reload workflows, cheap everywhere else.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::method_key;

/// Where a cached signature came from: the declaring file and its
/// modification time at cache time. Replaced wholesale on re-store, never
/// mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Source file declaring the callable.
    pub file: PathBuf,
    /// The file's modification time when the signature was stored.
    pub modified: SystemTime,
}

impl Provenance {
    /// Capture the file's current modification time. `None` when the file
    /// cannot be stat'ed; such entries are simply not recorded, leaving the
    /// key permanently stale.
    pub fn capture(file: &Path) -> Option<Self> {
        let modified = fs::metadata(file).and_then(|m| m.modified()).ok()?;
        Some(Self {
            file: file.to_path_buf(),
            modified,
        })
    }

    /// Whether the declaring file still carries the recorded modification
    /// time. Unreadable files count as changed.
    pub fn is_current(&self) -> bool {
        fs::metadata(&self.file)
            .and_then(|m| m.modified())
            .map(|now| now == self.modified)
            .unwrap_or(false)
    }
}

/// Per-key provenance for functions and methods, with a dirty flag so
/// durable tiers know when the metadata needs rewriting.
///
/// Functions and methods live in separate namespaces. Closures never have
/// provenance; their identities do not outlive the process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvenanceTracker {
    #[serde(default)]
    functions: BTreeMap<String, Provenance>,
    #[serde(default)]
    methods: BTreeMap<String, Provenance>,
    #[serde(skip)]
    dirty: bool,
}

impl ProvenanceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record fresh provenance for a function.
    pub fn record_function(&mut self, name: &str, file: &Path) {
        if let Some(provenance) = Provenance::capture(file) {
            self.functions.insert(name.to_string(), provenance);
            self.dirty = true;
        }
    }

    /// Record fresh provenance for a method.
    pub fn record_method(&mut self, class: &str, method: &str, file: &Path) {
        if let Some(provenance) = Provenance::capture(file) {
            self.methods.insert(method_key(class, method), provenance);
            self.dirty = true;
        }
    }

    /// True when the function's declaring file changed since its signature
    /// was stored, or when no provenance was ever recorded for it.
    pub fn function_is_stale(&self, name: &str) -> bool {
        self.functions.get(name).map_or(true, |p| !p.is_current())
    }

    /// True when the method's declaring file changed since its signature
    /// was stored, or when no provenance was ever recorded for it.
    pub fn method_is_stale(&self, class: &str, method: &str) -> bool {
        self.methods
            .get(&method_key(class, method))
            .map_or(true, |p| !p.is_current())
    }

    /// Whether provenance changed since the last [`ProvenanceTracker::mark_clean`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Acknowledge that the current state has been persisted.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Number of recorded entries across both namespaces.
    pub fn len(&self) -> usize {
        self.functions.len() + self.methods.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn unknown_keys_are_stale() {
        let tracker = ProvenanceTracker::new();
        assert!(tracker.function_is_stale("strlen"));
        assert!(tracker.method_is_stale("SignatureTest", "options"));
    }

    #[test]
    fn recorded_provenance_is_fresh_until_the_file_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lib.src");
        fs::write(&path, "function strlen() {}").unwrap();

        let mut tracker = ProvenanceTracker::new();
        tracker.record_function("strlen", &path);
        assert!(!tracker.function_is_stale("strlen"));

        sleep(Duration::from_millis(20));
        fs::write(&path, "function strlen(x) {}").unwrap();
        assert!(tracker.function_is_stale("strlen"));
    }

    #[test]
    fn deleted_files_count_as_changed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lib.src");
        fs::write(&path, "class A {}").unwrap();

        let mut tracker = ProvenanceTracker::new();
        tracker.record_method("A", "run", &path);
        assert!(!tracker.method_is_stale("A", "run"));

        fs::remove_file(&path).unwrap();
        assert!(tracker.method_is_stale("A", "run"));
    }

    #[test]
    fn unreadable_files_are_never_recorded() {
        let mut tracker = ProvenanceTracker::new();
        tracker.record_function("ghost", Path::new("/nonexistent/ghost.src"));
        assert!(tracker.is_empty());
        assert!(!tracker.is_dirty());
        assert!(tracker.function_is_stale("ghost"));
    }

    #[test]
    fn dirty_flag_tracks_records_and_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lib.src");
        fs::write(&path, "function f() {}").unwrap();

        let mut tracker = ProvenanceTracker::new();
        assert!(!tracker.is_dirty());

        tracker.record_function("f", &path);
        assert!(tracker.is_dirty());

        tracker.mark_clean();
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn tracker_serialization_round_trip_skips_the_dirty_flag() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lib.src");
        fs::write(&path, "function f() {}").unwrap();

        let mut tracker = ProvenanceTracker::new();
        tracker.record_function("f", &path);
        tracker.record_method("A", "run", &path);

        let json = serde_json::to_string(&tracker).unwrap();
        let decoded: ProvenanceTracker = serde_json::from_str(&json).unwrap();

        assert!(!decoded.is_dirty());
        assert_eq!(decoded.len(), 2);
        assert!(!decoded.function_is_stale("f"));
        assert!(!decoded.method_is_stale("A", "run"));
    }
}
