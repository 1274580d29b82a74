//! Route resolution.
//!
//! Turns a controller's raw declarations into the final route list:
//! base paths applied, bare middleware merged ahead of each verb record of
//! the same method, named middleware looked up, and every handler bound to
//! the controller instance.

use crate::controller::{Controller, MiddlewareTable};
use crate::error::{Result, RouteError};
use crate::handler::{Handler, ParamHandler, bind, bind_param};
use crate::meta::{ControllerMeta, HandlerRef, MetadataStore, RouteRecord, join_path};
use crate::verb::Verb;
use std::sync::Arc;

/// The handler chain of a resolved route.
#[derive(Clone)]
pub enum Handlers {
    Request(Vec<Handler>),
    Param(Vec<ParamHandler>),
}

impl Handlers {
    pub fn len(&self) -> usize {
        match self {
            Handlers::Request(handlers) => handlers.len(),
            Handlers::Param(handlers) => handlers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handlers::Request(h) => write!(f, "Request({} handlers)", h.len()),
            Handlers::Param(h) => write!(f, "Param({} handlers)", h.len()),
        }
    }
}

/// A route ready to be registered on a router.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub method: Verb,
    pub path: String,
    pub key: String,
    pub handlers: Handlers,
}

/// Routes of `instance`, read from the process-wide store.
pub fn get_routes<C: Controller>(instance: &Arc<C>) -> Result<Vec<ResolvedRoute>> {
    MetadataStore::global().routes(instance)
}

impl MetadataStore {
    /// Routes of `instance`, resolved from this store.
    pub fn routes<C: Controller>(&self, instance: &Arc<C>) -> Result<Vec<ResolvedRoute>> {
        let meta = self.metadata::<C>()?;
        resolve(&meta, instance, &instance.middleware_table())
    }
}

/// Resolve `meta` against a controller instance.
///
/// Routes come out grouped by method key, in the order each key was first
/// declared; within a key, in declaration order.
pub fn resolve<C>(
    meta: &ControllerMeta<C>,
    instance: &Arc<C>,
    table: &MiddlewareTable<C>,
) -> Result<Vec<ResolvedRoute>>
where
    C: Send + Sync + 'static,
{
    let controller = std::any::type_name::<C>();
    if let Some(key) = meta.param_routes().first() {
        return Err(RouteError::ParamRoute { key: key.clone() });
    }
    let mut routes = Vec::new();

    for (key, group) in group_by_key(meta.records()) {
        let (middleware, verbs): (Vec<&RouteRecord<C>>, Vec<&RouteRecord<C>>) =
            group.into_iter().partition(|r| r.is_middleware());

        if verbs.is_empty() {
            tracing::warn!(
                "{}::{} declares middleware but no route; it will not be registered",
                controller,
                key
            );
            continue;
        }

        let middleware: Vec<&HandlerRef<C>> =
            middleware.iter().flat_map(|r| r.handlers.iter()).collect();

        for record in verbs {
            let Some(method) = record.method else { continue };
            let path = record.path.clone().unwrap_or_default();

            let route = if method == Verb::Param {
                if !middleware.is_empty() {
                    tracing::warn!(
                        "{}::{} mixes middleware with a param handler; the middleware is not applied to it",
                        controller,
                        key
                    );
                }
                ResolvedRoute {
                    method,
                    path,
                    key: key.to_string(),
                    handlers: Handlers::Param(bind_params(&record.handlers, instance, key)?),
                }
            } else {
                let chain = middleware.iter().copied().chain(record.handlers.iter());
                ResolvedRoute {
                    method,
                    path: join_path(meta.base(), &path),
                    key: key.to_string(),
                    handlers: Handlers::Request(bind_requests(chain, instance, table, key)?),
                }
            };

            tracing::debug!(
                "Resolved {} {} -> {}::{} ({} handlers)",
                route.method,
                route.path,
                controller,
                route.key,
                route.handlers.len()
            );
            routes.push(route);
        }
    }

    Ok(routes)
}

fn group_by_key<C>(records: &[RouteRecord<C>]) -> Vec<(&str, Vec<&RouteRecord<C>>)> {
    let mut groups: Vec<(&str, Vec<&RouteRecord<C>>)> = Vec::new();
    for record in records {
        match groups.iter().position(|(key, _)| *key == record.key) {
            Some(index) => groups[index].1.push(record),
            None => groups.push((record.key.as_str(), vec![record])),
        }
    }
    groups
}

fn bind_requests<'a, C>(
    refs: impl Iterator<Item = &'a HandlerRef<C>>,
    instance: &Arc<C>,
    table: &MiddlewareTable<C>,
    key: &str,
) -> Result<Vec<Handler>>
where
    C: Send + Sync + 'static,
{
    refs.map(|handler| match handler {
        HandlerRef::Fn(f) => Ok(bind(f.clone(), instance.clone())),
        HandlerRef::Named(name) => table
            .get(name)
            .map(|f| bind(f.clone(), instance.clone()))
            .ok_or_else(|| RouteError::MiddlewareNotFound {
                name: name.clone(),
                controller: std::any::type_name::<C>().to_string(),
            }),
        HandlerRef::Param(_) => Err(RouteError::Internal(format!(
            "param handler in the request chain of {key}"
        ))),
    })
    .collect()
}

fn bind_params<C>(refs: &[HandlerRef<C>], instance: &Arc<C>, key: &str) -> Result<Vec<ParamHandler>>
where
    C: Send + Sync + 'static,
{
    refs.iter()
        .map(|handler| match handler {
            HandlerRef::Param(f) => Ok(bind_param(f.clone(), instance.clone())),
            _ => Err(RouteError::Internal(format!(
                "request handler in the param chain of {key}"
            ))),
        })
        .collect()
}
