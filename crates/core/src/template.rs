//! Templates instantiate VMs and nodes: `VM[1..4] : tiny<boot=5>;`.

use crate::model::{Element, ElementKind, NamingService};
use std::collections::BTreeMap;
use std::sync::Arc;

pub trait Template: Send + Sync {
    fn name(&self) -> &str;

    /// Kind of the elements this template builds.
    fn kind(&self) -> ElementKind;

    /// Register `name` in the naming service on behalf of the script
    /// `owner`, returning the element and its attributes.
    fn build(
        &self,
        naming: &dyn NamingService,
        name: &str,
        owner: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<(Element, BTreeMap<String, String>), String>;
}

/// A template recording its own name and the instantiation options as
/// attributes. Options override the defaults.
pub struct StandardTemplate {
    name: String,
    kind: ElementKind,
    defaults: BTreeMap<String, String>,
}

impl StandardTemplate {
    pub fn new(name: &str, kind: ElementKind) -> Self {
        StandardTemplate {
            name: name.to_owned(),
            kind,
            defaults: BTreeMap::new(),
        }
    }

    pub fn with_default(mut self, key: &str, value: &str) -> Self {
        self.defaults.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Template for StandardTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ElementKind {
        self.kind
    }

    fn build(
        &self,
        naming: &dyn NamingService,
        name: &str,
        owner: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<(Element, BTreeMap<String, String>), String> {
        let element = naming
            .register(self.kind, name, owner)
            .map_err(|e| e.to_string())?;
        let mut attrs = self.defaults.clone();
        attrs.extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));
        attrs.insert("template".to_owned(), self.name.clone());
        Ok((element, attrs))
    }
}

pub trait TemplateFactory: Send + Sync {
    fn template(&self, name: &str) -> Option<Arc<dyn Template>>;

    fn names(&self) -> Vec<String>;
}

/// VM templates `tiny` to `xlarge`, node template `defaultNode`.
pub struct DefaultTemplateFactory {
    templates: BTreeMap<String, Arc<dyn Template>>,
}

impl Default for DefaultTemplateFactory {
    fn default() -> Self {
        let mut factory = DefaultTemplateFactory::empty();
        for name in ["tiny", "small", "medium", "large", "xlarge"] {
            factory.register(Arc::new(StandardTemplate::new(name, ElementKind::Vm)));
        }
        factory.register(Arc::new(StandardTemplate::new("defaultNode", ElementKind::Node)));
        factory
    }
}

impl DefaultTemplateFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        DefaultTemplateFactory {
            templates: BTreeMap::new(),
        }
    }

    /// Returns `false` when a template with that name already exists.
    pub fn register(&mut self, template: Arc<dyn Template>) -> bool {
        let name = template.name().to_owned();
        if self.templates.contains_key(&name) {
            return false;
        }
        self.templates.insert(name, template);
        true
    }
}

impl TemplateFactory for DefaultTemplateFactory {
    fn template(&self, name: &str) -> Option<Arc<dyn Template>> {
        self.templates.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }
}
