use axum::http::{HeaderValue, Method};
use decoroute::prelude::*;
use decoroute::{HandlerError, RouteError};
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

#[derive(Debug, Clone)]
struct Loaded(String);

pub struct TestController;

#[routes(path = "/test")]
impl TestController {
    #[use_middleware]
    async fn tag(&self, req: Request<Body>, next: Next) -> HandlerResult {
        let mut response = next.run(req).await?;
        response
            .headers_mut()
            .insert("x-middleware", HeaderValue::from_static("applied"));
        Ok(response)
    }

    #[get("/")]
    #[middleware(decoroute::middleware::logging())]
    async fn index(&self, _req: Request<Body>, _next: Next) -> HandlerResult {
        Ok("hi".into_response())
    }

    #[get("/items/:id")]
    async fn item(&self, req: Request<Body>, _next: Next) -> HandlerResult {
        let loaded = req
            .extensions()
            .get::<Loaded>()
            .map(|l| l.0.clone())
            .unwrap_or_default();
        Ok(format!("item {loaded}").into_response())
    }

    #[param("id")]
    async fn load(&self, mut req: Request<Body>, next: Next, id: String, _name: String) -> HandlerResult {
        req.extensions_mut().insert(Loaded(id));
        next.run(req).await
    }

    #[get("/guarded")]
    #[middleware("deny")]
    async fn guarded(&self, _req: Request<Body>, _next: Next) -> HandlerResult {
        Ok("unreachable".into_response())
    }

    #[named_middleware]
    async fn deny(&self, _req: Request<Body>, _next: Next) -> HandlerResult {
        Ok(StatusCode::FORBIDDEN.into_response())
    }

    #[del("/items/:id")]
    async fn remove(&self, req: Request<Body>, _next: Next) -> HandlerResult {
        let loaded = req.extensions().get::<Loaded>().map(|l| l.0.clone());
        Ok(format!("removed {}", loaded.unwrap_or_default()).into_response())
    }
}

pub struct FailingController;

#[routes(path = "fail/")]
impl FailingController {
    #[get("/error")]
    async fn error(&self, _req: Request<Body>, _next: Next) -> HandlerResult {
        Err(HttpException::bad_request("bad input").into())
    }

    #[get("/panic")]
    async fn explode(&self, _req: Request<Body>, _next: Next) -> HandlerResult {
        panic!("handler exploded")
    }
}

fn request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn dispatcher() -> Dispatcher {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut dispatcher = Dispatcher::new();
    register(&mut dispatcher, Arc::new(TestController)).unwrap();
    dispatcher
}

#[tokio::test]
async fn get_route_answers() {
    let response = dispatcher().oneshot(request("/test/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-middleware"], "applied");
    assert_eq!(text(response).await, "hi");
}

#[tokio::test]
async fn param_handler_runs_before_route() {
    let response = dispatcher().oneshot(request("/test/items/42")).await.unwrap();
    assert_eq!(text(response).await, "item 42");
}

#[tokio::test]
async fn del_shorthand_serves_delete() {
    let delete = Request::builder()
        .method(Method::DELETE)
        .uri("/test/items/a%20b")
        .body(Body::empty())
        .unwrap();
    let response = dispatcher().oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "removed a b");
}

#[tokio::test]
async fn named_middleware_short_circuits() {
    let response = dispatcher().oneshot(request("/test/guarded")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.headers()["x-middleware"], "applied");
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let response = dispatcher().oneshot(request("/elsewhere")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let post = Request::builder()
        .method(Method::POST)
        .uri("/test/")
        .body(Body::empty())
        .unwrap();
    let response = dispatcher().oneshot(post).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn routes_are_listed_in_declaration_order() {
    let routes = decoroute::get_routes(&Arc::new(TestController)).unwrap();
    let listed: Vec<_> = routes
        .iter()
        .map(|r| (r.method, r.path.as_str(), r.key.as_str()))
        .collect();
    assert_eq!(
        listed,
        vec![
            (Verb::Use, "/test/*", "tag"),
            (Verb::Get, "/test/", "index"),
            (Verb::Get, "/test/items/:id", "item"),
            (Verb::Param, "id", "load"),
            (Verb::Get, "/test/guarded", "guarded"),
            (Verb::Delete, "/test/items/:id", "remove"),
        ]
    );
    // logging middleware + own handler
    assert_eq!(routes[1].handlers.len(), 2);
}

#[tokio::test]
async fn errors_reach_the_filter_exactly_once() {
    let caught = Arc::new(AtomicUsize::new(0));
    let seen = caught.clone();
    let mut dispatcher = Dispatcher::new().with_filter(
        move |error: HandlerError, host: &ArgumentsHost| -> Response {
            seen.fetch_add(1, Ordering::SeqCst);
            let kind = if error.downcast_ref::<HttpException>().is_some() {
                "http"
            } else if let Some(RouteError::HandlerPanicked { message, .. }) = error.downcast_ref::<RouteError>() {
                assert_eq!(message, "handler exploded");
                "panic"
            } else {
                "other"
            };
            format!("{} {}", kind, host.uri.path()).into_response()
        },
    );
    register(&mut dispatcher, Arc::new(FailingController)).unwrap();

    let response = dispatcher.clone().oneshot(request("/fail/error")).await.unwrap();
    assert_eq!(text(response).await, "http /fail/error");
    assert_eq!(caught.load(Ordering::SeqCst), 1);

    let response = dispatcher.oneshot(request("/fail/panic")).await.unwrap();
    assert_eq!(text(response).await, "panic /fail/panic");
    assert_eq!(caught.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn default_filter_renders_json() {
    let mut dispatcher = Dispatcher::new();
    register(&mut dispatcher, Arc::new(FailingController)).unwrap();

    let response = dispatcher.oneshot(request("/fail/error")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["message"], "bad input");
    assert_eq!(body["path"], "/fail/error");
}
