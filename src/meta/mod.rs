//! Route declarations.
//!
//! A controller describes its routes once, into a [`ControllerMeta`], by
//! declaring each of its methods: which verbs and paths the method answers,
//! which middleware runs ahead of it, and which path parameters it
//! preprocesses. The `#[routes]` macro expands to these same calls.

mod store;

pub use store::MetadataStore;

use crate::error::{Result, RouteError};
use crate::handler::{MethodFn, ParamFn};
use crate::verb::Verb;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

/// Path used by verb declarations that do not name one.
pub const DEFAULT_PATH: &str = "*";

/// A handler as declared, before it is bound to a controller instance.
pub enum HandlerRef<C> {
    /// A request handler taking the controller instance.
    Fn(MethodFn<C>),
    /// The name of a middleware looked up in the controller's
    /// [`MiddlewareTable`](crate::controller::MiddlewareTable) at resolution time.
    Named(String),
    /// A parameter handler.
    Param(ParamFn<C>),
}

/// Middleware handed to [`MethodDecl::middleware`].
pub type Middleware<C> = HandlerRef<C>;

impl<C> HandlerRef<C> {
    pub fn named(name: impl Into<String>) -> Self {
        HandlerRef::Named(name.into())
    }

    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(Arc<C>, axum::http::Request<axum::body::Body>, crate::handler::Next) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = crate::handler::HandlerResult> + Send + 'static,
    {
        HandlerRef::Fn(crate::handler::handler(f))
    }
}

impl<C> Clone for HandlerRef<C> {
    fn clone(&self) -> Self {
        match self {
            HandlerRef::Fn(f) => HandlerRef::Fn(f.clone()),
            HandlerRef::Named(name) => HandlerRef::Named(name.clone()),
            HandlerRef::Param(f) => HandlerRef::Param(f.clone()),
        }
    }
}

impl<C> std::fmt::Debug for HandlerRef<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerRef::Fn(_) => f.write_str("Fn(..)"),
            HandlerRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            HandlerRef::Param(_) => f.write_str("Param(..)"),
        }
    }
}

/// One declaration made on one controller method.
///
/// `method: None` marks a bare middleware record; such records carry no path
/// and apply to every verb record sharing their `key`.
pub struct RouteRecord<C> {
    pub method: Option<Verb>,
    pub path: Option<String>,
    pub key: String,
    pub handlers: Vec<HandlerRef<C>>,
}

impl<C> RouteRecord<C> {
    pub fn is_middleware(&self) -> bool {
        self.method.is_none()
    }
}

impl<C> Clone for RouteRecord<C> {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            path: self.path.clone(),
            key: self.key.clone(),
            handlers: self.handlers.clone(),
        }
    }
}

impl<C> std::fmt::Debug for RouteRecord<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRecord")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("key", &self.key)
            .field("handlers", &self.handlers)
            .finish()
    }
}

/// Everything a controller type declared about its routes.
pub struct ControllerMeta<C> {
    base_path: Option<String>,
    records: Vec<RouteRecord<C>>,
    param_routes: Vec<String>,
}

impl<C> ControllerMeta<C> {
    pub fn new() -> Self {
        Self {
            base_path: None,
            records: Vec::new(),
            param_routes: Vec::new(),
        }
    }

    /// Prefix applied to every non-`param` route of this controller.
    pub fn base_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.base_path = Some(path.into());
        self
    }

    pub fn base(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    pub fn records(&self) -> &[RouteRecord<C>] {
        &self.records
    }

    pub fn push(&mut self, record: RouteRecord<C>) {
        self.records.push(record);
    }

    /// Start declaring the request handler method `key`.
    pub fn method(&mut self, key: impl Into<String>, own: MethodFn<C>) -> MethodDecl<'_, C> {
        MethodDecl {
            meta: self,
            key: key.into(),
            own,
        }
    }

    /// Start declaring the parameter handler method `key`.
    pub fn param_method(&mut self, key: impl Into<String>, own: ParamFn<C>) -> ParamDecl<'_, C> {
        ParamDecl {
            meta: self,
            key: key.into(),
            own,
        }
    }

    /// Keys of request handler methods that were bound to `Verb::Param`.
    ///
    /// Such declarations are not recorded; resolution fails on them.
    pub fn param_routes(&self) -> &[String] {
        &self.param_routes
    }

    /// Keys that only declared bare middleware and no verb.
    ///
    /// Their middleware is never registered.
    pub fn orphaned_middleware(&self) -> Vec<&str> {
        let mut orphans: Vec<&str> = Vec::new();
        for record in self.records.iter().filter(|r| r.is_middleware()) {
            let has_verb = self
                .records
                .iter()
                .any(|r| r.key == record.key && !r.is_middleware());
            if !has_verb && !orphans.contains(&record.key.as_str()) {
                orphans.push(&record.key);
            }
        }
        orphans
    }
}

impl<C> Default for ControllerMeta<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for ControllerMeta<C> {
    fn clone(&self) -> Self {
        Self {
            base_path: self.base_path.clone(),
            records: self.records.clone(),
            param_routes: self.param_routes.clone(),
        }
    }
}

impl<C> std::fmt::Debug for ControllerMeta<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerMeta")
            .field("base_path", &self.base_path)
            .field("records", &self.records)
            .finish()
    }
}

/// Declarations for one request handler method.
pub struct MethodDecl<'a, C> {
    meta: &'a mut ControllerMeta<C>,
    key: String,
    own: MethodFn<C>,
}

impl<C> MethodDecl<'_, C> {
    /// Bind the method to `verb` at `path`.
    pub fn route(&mut self, verb: Verb, path: impl Into<String>) -> &mut Self {
        self.route_with(verb, path, Vec::new())
    }

    /// Bind the method to `verb` at `path`, preceded by route-level middleware.
    pub fn route_with(
        &mut self,
        verb: Verb,
        path: impl Into<String>,
        middleware: Vec<Middleware<C>>,
    ) -> &mut Self {
        if verb == Verb::Param {
            if !self.meta.param_routes.contains(&self.key) {
                self.meta.param_routes.push(self.key.clone());
            }
            return self;
        }
        let mut handlers = middleware;
        handlers.push(HandlerRef::Fn(self.own.clone()));
        self.meta.push(RouteRecord {
            method: Some(verb),
            path: Some(path.into()),
            key: self.key.clone(),
            handlers,
        });
        self
    }

    /// Bind the method to a verb given by name.
    pub fn route_named(&mut self, verb: &str, path: impl Into<String>) -> Result<&mut Self> {
        let verb = Verb::from_str(verb).map_err(|_| RouteError::UnknownVerb(verb.to_string()))?;
        if verb == Verb::Param {
            return Err(RouteError::ParamRoute {
                key: self.key.clone(),
            });
        }
        Ok(self.route(verb, path))
    }

    pub fn get(&mut self, path: impl Into<String>) -> &mut Self {
        self.route(Verb::Get, path)
    }

    pub fn post(&mut self, path: impl Into<String>) -> &mut Self {
        self.route(Verb::Post, path)
    }

    pub fn put(&mut self, path: impl Into<String>) -> &mut Self {
        self.route(Verb::Put, path)
    }

    pub fn patch(&mut self, path: impl Into<String>) -> &mut Self {
        self.route(Verb::Patch, path)
    }

    pub fn delete(&mut self, path: impl Into<String>) -> &mut Self {
        self.route(Verb::Delete, path)
    }

    pub fn del(&mut self, path: impl Into<String>) -> &mut Self {
        self.delete(path)
    }

    pub fn options(&mut self, path: impl Into<String>) -> &mut Self {
        self.route(Verb::Options, path)
    }

    pub fn head(&mut self, path: impl Into<String>) -> &mut Self {
        self.route(Verb::Head, path)
    }

    pub fn all(&mut self, path: impl Into<String>) -> &mut Self {
        self.route(Verb::All, path)
    }

    /// Mount the method as middleware for everything under the base path.
    pub fn use_middleware(&mut self) -> &mut Self {
        self.route(Verb::Use, DEFAULT_PATH)
    }

    /// Mount the method as middleware for requests under `path`.
    pub fn use_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.route(Verb::Use, path)
    }

    /// Run `middleware` ahead of every verb this method is bound to.
    pub fn middleware(&mut self, middleware: Middleware<C>) -> &mut Self {
        self.meta.push(RouteRecord {
            method: None,
            path: None,
            key: self.key.clone(),
            handlers: vec![middleware],
        });
        self
    }
}

/// Declarations for one parameter handler method.
pub struct ParamDecl<'a, C> {
    meta: &'a mut ControllerMeta<C>,
    key: String,
    own: ParamFn<C>,
}

impl<C> ParamDecl<'_, C> {
    /// Preprocess the path parameter `name`.
    pub fn param(&mut self, name: impl Into<String>) -> &mut Self {
        self.meta.push(RouteRecord {
            method: Some(Verb::Param),
            path: Some(name.into()),
            key: self.key.clone(),
            handlers: vec![HandlerRef::Param(self.own.clone())],
        });
        self
    }
}

/// Prefix `path` with `base`.
///
/// The base gets a single leading slash and loses its trailing ones; a
/// non-empty path is attached with exactly one slash; an empty path adds
/// nothing.
pub fn join_path(base: Option<&str>, path: &str) -> String {
    let base = base.map(|b| b.trim_matches('/')).unwrap_or("");
    let path_rest = path.trim_start_matches('/');
    let mut joined = String::with_capacity(base.len() + path.len() + 2);
    if !base.is_empty() {
        joined.push('/');
        joined.push_str(base);
    }
    if !path.is_empty() {
        joined.push('/');
        joined.push_str(path_rest);
    }
    joined
}
