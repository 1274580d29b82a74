//! Registration of resolved routes on a router.

use crate::controller::Controller;
use crate::error::{Result, RouteError};
use crate::handler::{BoxFuture, Handler, HandlerError, HandlerResult, Next, ParamHandler};
use crate::meta::MetadataStore;
use crate::resolver::{Handlers, ResolvedRoute};
use crate::verb::Verb;
use axum::body::Body;
use axum::http::Request;
use futures::FutureExt;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// A router that routes can be registered on.
///
/// `route` receives every verb, including `use` and `all`; a router that
/// has no counterpart for a verb must return [`RouteError::UnsupportedVerb`].
pub trait RouteTarget {
    fn route(&mut self, verb: Verb, path: &str, handlers: Vec<Handler>) -> Result<()>;

    fn param(&mut self, name: &str, handlers: Vec<ParamHandler>) -> Result<()> {
        let _ = (name, handlers);
        Err(RouteError::UnsupportedVerb { verb: Verb::Param })
    }
}

/// Register the routes of `instance` on `router`, using the process-wide store.
///
/// Returns the number of routes registered.
pub fn register<R, C>(router: &mut R, instance: Arc<C>) -> Result<usize>
where
    R: RouteTarget + ?Sized,
    C: Controller,
{
    register_with(MetadataStore::global(), router, instance)
}

/// Register the routes of `instance` on `router`, using `store`.
pub fn register_with<R, C>(store: &MetadataStore, router: &mut R, instance: Arc<C>) -> Result<usize>
where
    R: RouteTarget + ?Sized,
    C: Controller,
{
    let routes = store.routes(&instance)?;
    let count = routes.len();
    for route in routes {
        register_route(router, route)?;
    }
    tracing::debug!(
        "Registered {} routes for {}",
        count,
        std::any::type_name::<C>()
    );
    Ok(count)
}

/// Register one resolved route, guarding each of its handlers.
pub fn register_route<R>(router: &mut R, route: ResolvedRoute) -> Result<()>
where
    R: RouteTarget + ?Sized,
{
    let key: Arc<str> = Arc::from(route.key.as_str());
    match route.handlers {
        Handlers::Request(handlers) => {
            let handlers = handlers
                .into_iter()
                .map(|h| guard(h, key.clone()))
                .collect();
            router.route(route.method, &route.path, handlers)
        }
        Handlers::Param(handlers) => {
            let handlers = handlers
                .into_iter()
                .map(|h| guard_param(h, key.clone()))
                .collect();
            router.param(&route.path, handlers)
        }
    }
}

/// Wrap `handler` so that a panic, whether raised while the handler builds
/// its future or while the future runs, comes back as an `Err`.
pub fn guard(handler: Handler, key: Arc<str>) -> Handler {
    Arc::new(move |request: Request<Body>, next: Next| -> BoxFuture<HandlerResult> {
        let key = key.clone();
        match catch_unwind(AssertUnwindSafe(|| handler(request, next))) {
            Ok(future) => settle(future, key),
            Err(payload) => failed(panicked(&key, payload)),
        }
    })
}

/// [`guard`] for parameter handlers.
pub fn guard_param(handler: ParamHandler, key: Arc<str>) -> ParamHandler {
    Arc::new(
        move |request: Request<Body>,
              next: Next,
              value: String,
              name: String|
              -> BoxFuture<HandlerResult> {
            let key = key.clone();
            match catch_unwind(AssertUnwindSafe(|| handler(request, next, value, name))) {
                Ok(future) => settle(future, key),
                Err(payload) => failed(panicked(&key, payload)),
            }
        },
    )
}

fn settle(future: BoxFuture<HandlerResult>, key: Arc<str>) -> BoxFuture<HandlerResult> {
    Box::pin(async move {
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(panicked(&key, payload)),
        }
    })
}

fn failed(error: HandlerError) -> BoxFuture<HandlerResult> {
    Box::pin(futures::future::ready(Err(error)))
}

fn panicked(key: &str, payload: Box<dyn Any + Send>) -> HandlerError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };
    tracing::error!("Handler {} panicked: {}", key, message);
    Box::new(RouteError::HandlerPanicked {
        key: key.to_string(),
        message,
    })
}
