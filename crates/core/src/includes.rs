//! Locating the scripts named by `import` statements.
//!
//! The [`Includes`] trait abstracts where dependencies come from so the
//! evaluator never touches the filesystem itself. [`PathBasedIncludes`]
//! searches directories; [`BasicIncludes`] serves scripts built in memory.

use crate::builder::ScriptBuilder;
use crate::error::BuildError;
use crate::script::Script;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const SCRIPT_EXTENSION: &str = "btrp";

/// Resolves an import identifier into built scripts.
///
/// `id` is either a script identifier (`a.b.c`) or a wildcard (`a.b.*`)
/// standing for every script whose identifier starts with `a.b.`. An
/// identifier matching nothing yields an empty list, not an error.
pub trait Includes: Send + Sync {
    fn get_scripts(&self, id: &str, builder: &ScriptBuilder)
        -> Result<Vec<Arc<Script>>, BuildError>;
}

/// In-memory includes, keyed by script identifier.
#[derive(Default)]
pub struct BasicIncludes {
    scripts: RwLock<BTreeMap<String, Arc<Script>>>,
}

impl BasicIncludes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `script` importable. A script with the same identifier is
    /// replaced.
    pub fn add(&self, script: Arc<Script>) {
        self.scripts
            .write()
            .insert(script.id().to_owned(), script);
    }
}

impl Includes for BasicIncludes {
    fn get_scripts(
        &self,
        id: &str,
        _builder: &ScriptBuilder,
    ) -> Result<Vec<Arc<Script>>, BuildError> {
        let scripts = self.scripts.read();
        let found = match id.strip_suffix('*') {
            Some(prefix) => scripts
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .map(|(_, s)| s.clone())
                .collect(),
            None => scripts.get(id).cloned().into_iter().collect(),
        };
        Ok(found)
    }
}

/// Filesystem includes: `a.b.c` is the file `a/b/c.btrp` in the first
/// directory containing it, `a.b.*` every `.btrp` file of `a/b/`.
pub struct PathBasedIncludes {
    paths: Vec<PathBuf>,
}

impl PathBasedIncludes {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        PathBasedIncludes { paths }
    }

    pub fn add_path(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// `.btrp` files directly inside `dir`, sorted.
    fn scripts_in(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
        let io = |source| BuildError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io)? {
            let path = entry.map_err(io)?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == SCRIPT_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Includes for PathBasedIncludes {
    fn get_scripts(
        &self,
        id: &str,
        builder: &ScriptBuilder,
    ) -> Result<Vec<Arc<Script>>, BuildError> {
        if let Some(prefix) = id.strip_suffix(".*") {
            let rel: PathBuf = prefix.split('.').collect();
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            for base in &self.paths {
                let dir = base.join(&rel);
                if !dir.is_dir() {
                    continue;
                }
                for file in Self::scripts_in(&dir)? {
                    let script = builder.build_file(&file)?;
                    if seen.insert(script.id().to_owned()) {
                        out.push(script);
                    }
                }
            }
            tracing::debug!(id, count = out.len(), "resolved wildcard import");
            return Ok(out);
        }
        let mut rel: PathBuf = id.split('.').collect();
        rel.set_extension(SCRIPT_EXTENSION);
        for base in &self.paths {
            let file = base.join(&rel);
            if file.is_file() {
                tracing::debug!(id, path = %file.display(), "resolved import");
                return Ok(vec![builder.build_file(&file)?]);
            }
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built(builder: &ScriptBuilder, src: &str) -> Arc<Script> {
        Arc::new(builder.build(src).unwrap())
    }

    #[test]
    fn basic_includes_exact_and_wildcard() {
        let builder = ScriptBuilder::new();
        let includes = BasicIncludes::new();
        includes.add(built(&builder, "namespace clients.a;"));
        includes.add(built(&builder, "namespace clients.b;"));
        includes.add(built(&builder, "namespace clientsx;"));
        let one = includes.get_scripts("clients.a", &builder).unwrap();
        assert_eq!(one.len(), 1);
        let all = includes.get_scripts("clients.*", &builder).unwrap();
        let ids: Vec<&str> = all.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["clients.a", "clients.b"]);
        assert!(includes.get_scripts("nope", &builder).unwrap().is_empty());
    }

    #[test]
    fn path_based_includes() {
        let dir = tempfile::tempdir().unwrap();
        let ns = dir.path().join("dc");
        std::fs::create_dir(&ns).unwrap();
        std::fs::write(ns.join("b.btrp"), "namespace dc.b;").unwrap();
        std::fs::write(ns.join("a.btrp"), "namespace dc.a;").unwrap();
        std::fs::write(ns.join("notes.txt"), "ignored").unwrap();

        let builder = ScriptBuilder::new();
        let includes = PathBasedIncludes::new(vec![dir.path().to_path_buf()]);
        let one = includes.get_scripts("dc.a", &builder).unwrap();
        assert_eq!(one[0].id(), "dc.a");
        let all = includes.get_scripts("dc.*", &builder).unwrap();
        let ids: Vec<&str> = all.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["dc.a", "dc.b"]);
        assert!(includes.get_scripts("dc.c", &builder).unwrap().is_empty());
        assert!(includes.get_scripts("other.*", &builder).unwrap().is_empty());
    }
}
