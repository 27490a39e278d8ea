//! Model elements and the naming service that allocates them.
//!
//! VMs are registered under their fully-qualified name (`script.VM1`),
//! nodes under their global name without the `@` sigil. Every name is
//! owned by the script that declared it.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Vm,
    Node,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Vm => write!(f, "VM"),
            ElementKind::Node => write!(f, "node"),
        }
    }
}

/// Opaque handle on a VM or a node. Equality and hashing only consider
/// the kind and the identifier allocated by the naming service.
#[derive(Debug, Clone)]
pub struct Element {
    kind: ElementKind,
    id: u32,
    name: Arc<str>,
}

impl Element {
    pub fn new(kind: ElementKind, id: u32, name: &str) -> Self {
        Element {
            kind,
            id,
            name: Arc::from(name),
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// The registered name: fully-qualified for VMs, without `@` for nodes.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.id == other.id
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ElementKind::Vm => write!(f, "{}", self.name),
            ElementKind::Node => write!(f, "@{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    #[error("{kind} '{name}' is already declared")]
    AlreadyDeclared { kind: ElementKind, name: String },
}

/// Maps names to model elements.
pub trait NamingService: Send + Sync {
    /// Allocate a fresh element for `name`, owned by the script `owner`.
    fn register(&self, kind: ElementKind, name: &str, owner: &str)
        -> Result<Element, NamingError>;

    fn resolve(&self, kind: ElementKind, name: &str) -> Option<Element>;

    /// Forget every name owned by `owner`, before it is evaluated again.
    fn release(&self, owner: &str);
}

#[derive(Default)]
struct Registry {
    next_id: u32,
    entries: HashMap<(ElementKind, String), (Element, String)>,
}

/// Thread-safe in-memory naming service. Identifiers are never reused.
#[derive(Default)]
pub struct InMemoryNamingService {
    inner: RwLock<Registry>,
}

impl InMemoryNamingService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NamingService for InMemoryNamingService {
    fn register(
        &self,
        kind: ElementKind,
        name: &str,
        owner: &str,
    ) -> Result<Element, NamingError> {
        let mut registry = self.inner.write();
        let key = (kind, name.to_owned());
        if registry.entries.contains_key(&key) {
            return Err(NamingError::AlreadyDeclared {
                kind,
                name: name.to_owned(),
            });
        }
        let element = Element::new(kind, registry.next_id, name);
        registry.next_id += 1;
        registry
            .entries
            .insert(key, (element.clone(), owner.to_owned()));
        Ok(element)
    }

    fn resolve(&self, kind: ElementKind, name: &str) -> Option<Element> {
        self.inner
            .read()
            .entries
            .get(&(kind, name.to_owned()))
            .map(|(e, _)| e.clone())
    }

    fn release(&self, owner: &str) {
        self.inner
            .write()
            .entries
            .retain(|_, (_, o)| o.as_str() != owner);
    }
}
