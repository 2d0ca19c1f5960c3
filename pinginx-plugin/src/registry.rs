//! Processor registry

use crate::directives;
use pinginx_core::ProcessorFactory;
use std::sync::OnceLock;

/// Known directive processors, looked up by directive name
pub struct ProcessorRegistry {
    factories: Vec<Box<dyn ProcessorFactory>>,
}

static GLOBAL: OnceLock<ProcessorRegistry> = OnceLock::new();

impl ProcessorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Create a registry holding every built-in processor
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for factory in directives::builtins() {
            registry.register(factory);
        }
        registry
    }

    /// The process-wide registry, built with the built-in processors on
    /// first use and read-only afterwards.
    pub fn global() -> &'static ProcessorRegistry {
        GLOBAL.get_or_init(Self::with_builtins)
    }

    /// Register a factory. Earlier registrations win on overlapping names.
    pub fn register(&mut self, factory: Box<dyn ProcessorFactory>) {
        tracing::debug!("Registering processor: {}", factory.names().join(", "));
        self.factories.push(factory);
    }

    /// Find the factory handling a (lower-cased) directive name
    pub fn find(&self, directive: &str) -> Option<&dyn ProcessorFactory> {
        self.factories
            .iter()
            .find(|f| f.accepts(directive))
            .map(|f| f.as_ref())
    }

    /// Every directive name known to the registry
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.iter().flat_map(|f| f.names().iter().copied())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
