use crate::handler::{HandlerResult, Next};
use crate::meta::HandlerRef;
use axum::{body::Body, http::Request};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Id assigned to a request by the [`logging`] middleware.
///
/// Stored as a request extension for the handlers further down the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

/// Middleware that logs request timing and status
///
/// ```rust,ignore
/// meta.method("index", index)
///     .get("/")
///     .middleware(decoroute::middleware::logging());
/// ```
pub fn logging<C>() -> HandlerRef<C>
where
    C: Send + Sync + 'static,
{
    HandlerRef::from_fn(|_this: Arc<C>, request: Request<Body>, next: Next| log_request(request, next))
}

async fn log_request(mut request: Request<Body>, next: Next) -> HandlerResult {
    let id = Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();
    request.extensions_mut().insert(RequestId(id));

    tracing::info!(request_id = %id, "--> {} {}", method, uri);

    match next.run(request).await {
        Ok(response) => {
            tracing::info!(
                request_id = %id,
                "<-- {} {} {} {:?}",
                method,
                uri,
                response.status(),
                start.elapsed()
            );
            Ok(response)
        }
        Err(e) => {
            tracing::error!(
                request_id = %id,
                "<-- {} {} ERROR: {} {:?}",
                method,
                uri,
                e,
                start.elapsed()
            );
            Err(e)
        }
    }
}
