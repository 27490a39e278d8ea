//! Built scripts, keyed by source path and modification time.

use crate::script::Script;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

struct Entry {
    modified: SystemTime,
    script: Arc<Script>,
}

/// Shared by every builder it is injected into. No lock is held while a
/// script is being built: two threads missing the same entry both build
/// it, the last insertion wins.
#[derive(Default)]
pub struct ScriptCache {
    entries: RwLock<HashMap<PathBuf, Entry>>,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The script built from `path`, if it was built from a file with
    /// this exact modification time.
    pub fn get(&self, path: &Path, modified: SystemTime) -> Option<Arc<Script>> {
        self.entries
            .read()
            .get(path)
            .filter(|e| e.modified == modified)
            .map(|e| e.script.clone())
    }

    pub fn insert(&self, path: PathBuf, modified: SystemTime, script: Arc<Script>) {
        self.entries.write().insert(path, Entry { modified, script });
    }

    pub fn invalidate(&self, path: &Path) -> bool {
        self.entries.write().remove(path).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn entries_expire_with_the_modification_time() {
        let cache = ScriptCache::new();
        let path = PathBuf::from("/tmp/app.btrp");
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let script = Arc::new(Script::new());
        cache.insert(path.clone(), t0, script.clone());
        let hit = cache.get(&path, t0).unwrap();
        assert!(Arc::ptr_eq(&hit, &script));
        assert!(cache.get(&path, t0 + Duration::from_secs(1)).is_none());
        assert_eq!(cache.len(), 1);
        assert!(cache.invalidate(&path));
        assert!(cache.is_empty());
    }
}
