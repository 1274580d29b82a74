// Controllers are usually declared through the `#[routes]` macro:
// - #[routes(path = "...")] on the impl block sets the base path
// - #[get], #[post], #[use_middleware], #[param], #[middleware], ... on methods
//
// The macro generates:
// 1. Controller::declare, recording every method's routes
// 2. Controller::middleware_table for methods marked #[named_middleware]

use crate::handler::MethodFn;
use crate::meta::ControllerMeta;
use std::collections::HashMap;

/// A type whose methods are bound to routes.
pub trait Controller: Send + Sync + Sized + 'static {
    /// Record this controller's routes. Called once per [`MetadataStore`](crate::MetadataStore).
    fn declare(meta: &mut ControllerMeta<Self>) {
        let _ = meta;
    }

    /// Middleware that route declarations may refer to by name.
    fn middleware_table(&self) -> MiddlewareTable<Self> {
        MiddlewareTable::new()
    }
}

/// Name → middleware lookup, populated by the controller itself.
pub struct MiddlewareTable<C> {
    entries: HashMap<String, MethodFn<C>>,
}

impl<C> MiddlewareTable<C> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, middleware: MethodFn<C>) -> &mut Self {
        self.entries.insert(name.into(), middleware);
        self
    }

    pub fn with(mut self, name: impl Into<String>, middleware: MethodFn<C>) -> Self {
        self.insert(name, middleware);
        self
    }

    pub fn get(&self, name: &str) -> Option<&MethodFn<C>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> Default for MiddlewareTable<C> {
    fn default() -> Self {
        Self::new()
    }
}
