//! Build entry points.
//!
//! A [`ScriptBuilder`] owns everything an evaluation needs: the constraint
//! catalog, the templates, the naming service, the includes resolver and
//! the file cache. It is `Send + Sync`; one builder can serve many builds.

use crate::cache::ScriptCache;
use crate::constraint::{default_catalog, ConstraintsCatalog};
use crate::error::{BuildError, Diagnostic};
use crate::eval::Evaluator;
use crate::includes::{BasicIncludes, Includes};
use crate::lexer::lex;
use crate::model::{InMemoryNamingService, NamingService};
use crate::parser::parse;
use crate::script::Script;
use crate::template::{DefaultTemplateFactory, TemplateFactory};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// File name reported for scripts built from a string.
pub const INPUT_NAME: &str = "<input>";

pub struct ScriptBuilder {
    catalog: Option<ConstraintsCatalog>,
    templates: Arc<dyn TemplateFactory>,
    naming: Arc<dyn NamingService>,
    includes: Arc<dyn Includes>,
    cache: Arc<ScriptCache>,
    in_progress: Mutex<HashSet<String>>,
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        ScriptBuilder {
            catalog: Some(default_catalog()),
            templates: Arc::new(DefaultTemplateFactory::new()),
            naming: Arc::new(InMemoryNamingService::new()),
            includes: Arc::new(BasicIncludes::new()),
            cache: Arc::new(ScriptCache::new()),
            in_progress: Mutex::new(HashSet::new()),
        }
    }
}

impl ScriptBuilder {
    /// A builder with the default catalog and templates, an in-memory
    /// naming service and no includes.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_includes(mut self, includes: Arc<dyn Includes>) -> Self {
        self.includes = includes;
        self
    }

    pub fn with_templates(mut self, templates: Arc<dyn TemplateFactory>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_naming(mut self, naming: Arc<dyn NamingService>) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_cache(mut self, cache: Arc<ScriptCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_catalog(mut self, catalog: ConstraintsCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Every constraint statement then fails.
    pub fn without_catalog(mut self) -> Self {
        self.catalog = None;
        self
    }

    pub fn catalog(&self) -> Option<&ConstraintsCatalog> {
        self.catalog.as_ref()
    }

    /// To register additional constraints before building.
    pub fn catalog_mut(&mut self) -> Option<&mut ConstraintsCatalog> {
        self.catalog.as_mut()
    }

    pub fn templates(&self) -> &dyn TemplateFactory {
        self.templates.as_ref()
    }

    pub fn naming(&self) -> &dyn NamingService {
        self.naming.as_ref()
    }

    pub fn includes(&self) -> &dyn Includes {
        self.includes.as_ref()
    }

    pub fn cache(&self) -> &ScriptCache {
        &self.cache
    }

    // ── Building ─────────────────────────────────────────────────────

    /// Build a script from its source text.
    pub fn build(&self, source: &str) -> Result<Script, BuildError> {
        self.compile(source, INPUT_NAME, None)
    }

    /// Build the script stored in `path`, or return the cached one when
    /// the file did not change since its last build. The file name must
    /// match the local name of the script: `a.b.c` lives in `c.btrp`.
    pub fn build_file(&self, path: impl AsRef<Path>) -> Result<Arc<Script>, BuildError> {
        let path = path.as_ref();
        let io = |source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        };
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(io)?;
        let key = std::fs::canonicalize(path).map_err(io)?;
        if let Some(script) = self.cache.get(&key, modified) {
            tracing::debug!(path = %path.display(), "script served from cache");
            return Ok(script);
        }
        let source = std::fs::read_to_string(path).map_err(io)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let script = Arc::new(self.compile(
            &source,
            &path.display().to_string(),
            Some(&stem),
        )?);
        self.cache.insert(key, modified, script.clone());
        Ok(script)
    }

    fn compile(
        &self,
        source: &str,
        file: &str,
        expected_local: Option<&str>,
    ) -> Result<Script, BuildError> {
        tracing::debug!(file, "building script");
        let tokens = lex(source, file).map_err(|d| BuildError::Diagnostics(vec![d]))?;
        let (stmts, mut diagnostics) = parse(&tokens, file);
        let (script, errors) = Evaluator::new(self, file, expected_local).run(&stmts);
        diagnostics.extend(errors);
        if !diagnostics.is_empty() {
            diagnostics.sort_by_key(|d: &Diagnostic| (d.line, d.column));
            tracing::debug!(file, errors = diagnostics.len(), "build failed");
            return Err(BuildError::Diagnostics(diagnostics));
        }
        tracing::debug!(
            file,
            id = script.id(),
            vms = script.vms().len(),
            nodes = script.nodes().len(),
            constraints = script.constraints().len(),
            "script built"
        );
        Ok(script)
    }

    // ── Import cycles ────────────────────────────────────────────────

    /// Mark the script `id` as being built. `None` when it already is:
    /// its evaluation imports itself, directly or not.
    pub(crate) fn enter(&self, id: &str) -> Option<InProgress<'_>> {
        if !self.in_progress.lock().insert(id.to_owned()) {
            return None;
        }
        Some(InProgress {
            builder: self,
            id: id.to_owned(),
        })
    }

    pub(crate) fn is_in_progress(&self, id: &str) -> bool {
        self.in_progress.lock().contains(id)
    }
}

/// Unmarks its script when dropped, whatever the outcome of the build.
pub(crate) struct InProgress<'a> {
    builder: &'a ScriptBuilder,
    id: String,
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.builder.in_progress.lock().remove(&self.id);
    }
}
