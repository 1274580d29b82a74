use axum::{body::Body, http::Request, response::Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A type-erased error raised by a handler at request time
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// standard return type for handlers
pub type HandlerResult = Result<Response, HandlerError>;

/// A request handler bound to its controller.
pub type Handler = Arc<dyn Fn(Request<Body>, Next) -> BoxFuture<HandlerResult> + Send + Sync>;

/// A parameter handler bound to its controller.
///
/// Called with the request, the continuation, the parameter value and the
/// parameter name.
pub type ParamHandler =
    Arc<dyn Fn(Request<Body>, Next, String, String) -> BoxFuture<HandlerResult> + Send + Sync>;

/// A request handler that still needs its controller instance.
pub type MethodFn<C> =
    Arc<dyn Fn(Arc<C>, Request<Body>, Next) -> BoxFuture<HandlerResult> + Send + Sync>;

/// A parameter handler that still needs its controller instance.
pub type ParamFn<C> = Arc<
    dyn Fn(Arc<C>, Request<Body>, Next, String, String) -> BoxFuture<HandlerResult> + Send + Sync,
>;

/// Represents the rest of the handler chain
pub struct Next {
    run: Box<dyn FnOnce(Request<Body>) -> BoxFuture<HandlerResult> + Send>,
}

impl Next {
    /// Create a new Next continuation
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Request<Body>) -> BoxFuture<HandlerResult> + Send + 'static,
    {
        Self { run: Box::new(f) }
    }

    /// Pass control to the next handler
    pub async fn run(self, request: Request<Body>) -> HandlerResult {
        (self.run)(request).await
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Turn an async controller method into a [`MethodFn`].
///
/// ```rust,ignore
/// meta.method("index", handler(|this: Arc<Self>, req, next| async move {
///     this.index(req, next).await
/// }))
/// .get("/");
/// ```
pub fn handler<C, F, Fut>(f: F) -> MethodFn<C>
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Request<Body>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(
        move |this: Arc<C>, request: Request<Body>, next: Next| -> BoxFuture<HandlerResult> {
            Box::pin(f(this, request, next))
        },
    )
}

/// Turn an async controller method into a [`ParamFn`].
pub fn param_handler<C, F, Fut>(f: F) -> ParamFn<C>
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Request<Body>, Next, String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(
        move |this: Arc<C>,
              request: Request<Body>,
              next: Next,
              value: String,
              name: String|
              -> BoxFuture<HandlerResult> { Box::pin(f(this, request, next, value, name)) },
    )
}

/// Fix the controller instance of a [`MethodFn`].
pub fn bind<C>(method: MethodFn<C>, instance: Arc<C>) -> Handler
where
    C: Send + Sync + 'static,
{
    Arc::new(
        move |request: Request<Body>, next: Next| -> BoxFuture<HandlerResult> {
            method(instance.clone(), request, next)
        },
    )
}

/// Fix the controller instance of a [`ParamFn`].
pub fn bind_param<C>(method: ParamFn<C>, instance: Arc<C>) -> ParamHandler
where
    C: Send + Sync + 'static,
{
    Arc::new(
        move |request: Request<Body>,
              next: Next,
              value: String,
              name: String|
              -> BoxFuture<HandlerResult> { method(instance.clone(), request, next, value, name) },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    struct Greeter {
        greeting: &'static str,
    }

    impl Greeter {
        async fn greet(&self, _request: Request<Body>, _next: Next) -> HandlerResult {
            Ok(self.greeting.into_response())
        }
    }

    fn end() -> Next {
        Next::new(|_| Box::pin(async { Ok(StatusCode::NO_CONTENT.into_response()) }))
    }

    #[tokio::test]
    async fn test_bound_handler_sees_its_instance() {
        let method = handler(|this: Arc<Greeter>, req, next| async move { this.greet(req, next).await });
        let bound = bind(method, Arc::new(Greeter { greeting: "hi" }));

        let response = bound(Request::new(Body::empty()), end()).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hi");
    }

    #[tokio::test]
    async fn test_next_runs_continuation() {
        let response = end().run(Request::new(Body::empty())).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_bound_param_handler_receives_value_and_name() {
        let method = param_handler(
            |_this: Arc<Greeter>, _req, _next, value: String, name: String| async move {
                Ok(format!("{name}={value}").into_response())
            },
        );
        let bound = bind_param(method, Arc::new(Greeter { greeting: "" }));

        let response = bound(Request::new(Body::empty()), end(), "5".into(), "id".into())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"id=5");
    }
}
