//! A reference router for resolved routes.
//!
//! [`Dispatcher`] keeps an ordered stack of layers, the way express-style
//! routers do. A request walks the stack from the top: `use` layers match by
//! path prefix, verb layers match method and whole path. Within a layer the
//! handlers run as a chain, each one reaching the next only through
//! [`Next::run`]. Once the stack is exhausted the answer is `404`.
//!
//! The dispatcher is a `tower::Service`, so it can be mounted in an axum
//! router:
//!
//! ```rust,ignore
//! let mut dispatcher = Dispatcher::new();
//! decoroute::register(&mut dispatcher, Arc::new(UserController::new()))?;
//! let app = axum::Router::new().fallback_service(dispatcher);
//! ```

pub mod pattern;

pub use pattern::{PathParams, PathPattern};

use crate::config::DispatchOptions;
use crate::error::{Result, RouteError};
use crate::exception::{ArgumentsHost, ExceptionFilter, HttpExceptionFilter};
use crate::handler::{BoxFuture, Handler, HandlerResult, Next, ParamHandler};
use crate::registrar::{RouteTarget, guard};
use crate::verb::Verb;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayerKind {
    Middleware,
    Endpoint(Verb),
}

#[derive(Clone)]
struct Layer {
    kind: LayerKind,
    pattern: PathPattern,
    handlers: Vec<Handler>,
}

impl Layer {
    fn matches(&self, method: &Method, path: &str, options: &DispatchOptions) -> Option<PathParams> {
        match self.kind {
            LayerKind::Middleware => self
                .pattern
                .matches(path, true, options.case_sensitive, false),
            LayerKind::Endpoint(verb) => {
                let served = verb.matches(method) || (verb == Verb::Get && method == Method::HEAD);
                if !served {
                    return None;
                }
                self.pattern
                    .matches(path, false, options.case_sensitive, options.strict)
            }
        }
    }
}

/// Parameter values whose handlers already ran for this request.
#[derive(Debug, Clone, Default)]
struct ParamCalls(HashMap<String, String>);

#[derive(Clone)]
struct Stack {
    layers: Vec<Layer>,
    params: HashMap<String, Vec<ParamHandler>>,
    options: DispatchOptions,
    filter: Arc<dyn ExceptionFilter>,
}

impl Stack {
    async fn handle(self: Arc<Self>, request: Request<Body>) -> Response {
        let host = ArgumentsHost::new(request.method().clone(), request.uri().clone());
        // The chain settles exactly once: either a response or an error that
        // goes to the filter, never both.
        match self.clone().next_layer(0, request).await {
            Ok(response) => response,
            Err(error) => self.filter.catch(error, &host),
        }
    }

    fn next_layer(self: Arc<Self>, from: usize, mut request: Request<Body>) -> BoxFuture<HandlerResult> {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();

        let found = self.layers[from.min(self.layers.len())..]
            .iter()
            .enumerate()
            .find_map(|(offset, layer)| {
                layer
                    .matches(&method, &path, &self.options)
                    .map(|params| (from + offset, params))
            });

        let Some((index, params)) = found else {
            return Box::pin(async move {
                Ok((StatusCode::NOT_FOUND, format!("Cannot {method} {path}")).into_response())
            });
        };

        let pending = self.pending_params(&params, &request);
        request.extensions_mut().insert(params);
        self.run_params(index, Arc::new(pending), 0, 0, request)
    }

    fn pending_params(&self, params: &PathParams, request: &Request<Body>) -> Vec<(String, String)> {
        let called = request.extensions().get::<ParamCalls>();
        params
            .iter()
            .filter(|(name, _)| self.params.contains_key(*name))
            .filter(|(name, value)| {
                called.and_then(|c| c.0.get(*name)).map(String::as_str) != Some(*value)
            })
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    fn run_params(
        self: Arc<Self>,
        layer: usize,
        pending: Arc<Vec<(String, String)>>,
        param: usize,
        index: usize,
        mut request: Request<Body>,
    ) -> BoxFuture<HandlerResult> {
        let Some((name, value)) = pending.get(param).cloned() else {
            return self.run_layer(layer, 0, request);
        };
        let handler = self
            .params
            .get(&name)
            .and_then(|handlers| handlers.get(index))
            .cloned();
        let Some(handler) = handler else {
            return self.run_params(layer, pending, param + 1, 0, request);
        };

        if index == 0 {
            let mut calls = request
                .extensions_mut()
                .remove::<ParamCalls>()
                .unwrap_or_default();
            calls.0.insert(name.clone(), value.clone());
            request.extensions_mut().insert(calls);
        }

        let stack = self.clone();
        let next = Next::new(move |request| stack.run_params(layer, pending, param, index + 1, request));
        handler(request, next, value, name)
    }

    fn run_layer(self: Arc<Self>, layer: usize, index: usize, request: Request<Body>) -> BoxFuture<HandlerResult> {
        let handler = self.layers[layer].handlers.get(index).cloned();
        let Some(handler) = handler else {
            return self.next_layer(layer + 1, request);
        };
        let stack = self.clone();
        handler(
            request,
            Next::new(move |request| stack.run_layer(layer, index + 1, request)),
        )
    }
}

/// An express-style router implementing [`RouteTarget`].
#[derive(Clone)]
pub struct Dispatcher {
    stack: Arc<Stack>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_options(DispatchOptions::default())
    }

    pub fn with_options(options: DispatchOptions) -> Self {
        Self {
            stack: Arc::new(Stack {
                layers: Vec::new(),
                params: HashMap::new(),
                options,
                filter: Arc::new(HttpExceptionFilter),
            }),
        }
    }

    /// Replace the filter that turns handler errors into responses.
    pub fn with_filter(mut self, filter: impl ExceptionFilter) -> Self {
        Arc::make_mut(&mut self.stack).filter = Arc::new(filter);
        self
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.stack.options
    }

    /// Add a plain handler, outside of any controller.
    pub fn add<F, Fut>(&mut self, verb: Verb, path: &str, f: F) -> Result<()>
    where
        F: Fn(Request<Body>, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let handler: Handler = Arc::new(
            move |request: Request<Body>, next: Next| -> BoxFuture<HandlerResult> {
                Box::pin(f(request, next))
            },
        );
        self.route(verb, path, vec![guard(handler, Arc::from(path))])
    }

    /// Number of layers on the stack.
    pub fn len(&self) -> usize {
        self.stack.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.layers.is_empty()
    }

    /// Run `request` through the stack.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        self.stack.clone().handle(request).await
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTarget for Dispatcher {
    fn route(&mut self, verb: Verb, path: &str, handlers: Vec<Handler>) -> Result<()> {
        let kind = match verb {
            Verb::Param => return Err(RouteError::UnsupportedVerb { verb }),
            Verb::Use => LayerKind::Middleware,
            verb => LayerKind::Endpoint(verb),
        };
        tracing::debug!("Mounting {} {} ({} handlers)", verb, path, handlers.len());
        Arc::make_mut(&mut self.stack).layers.push(Layer {
            kind,
            pattern: PathPattern::parse(path),
            handlers,
        });
        Ok(())
    }

    fn param(&mut self, name: &str, handlers: Vec<ParamHandler>) -> Result<()> {
        tracing::debug!("Mounting param {} ({} handlers)", name, handlers.len());
        Arc::make_mut(&mut self.stack)
            .params
            .entry(name.to_string())
            .or_default()
            .extend(handlers);
        Ok(())
    }
}

impl Service<Request<Body>> for Dispatcher {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<std::result::Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let stack = self.stack.clone();
        Box::pin(async move { Ok(stack.handle(request).await) })
    }
}
