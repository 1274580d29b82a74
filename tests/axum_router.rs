use decoroute::prelude::*;
use decoroute::{LoadedControllers, PathParams};
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

pub struct UserController {
    prefix: &'static str,
}

#[routes(path = "/users")]
impl UserController {
    #[get("/:id")]
    async fn show(&self, req: Request<Body>, _next: Next) -> HandlerResult {
        let id = req
            .extensions()
            .get::<PathParams>()
            .and_then(|p| p.get("id").map(str::to_string))
            .ok_or_else(|| HttpException::bad_request("missing id"))?;
        Ok(format!("{}{}", self.prefix, id).into_response())
    }

    #[route("delete", "/:id")]
    async fn remove(&self, _req: Request<Body>, _next: Next) -> HandlerResult {
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}

pub struct HealthController;

#[routes]
impl HealthController {
    #[get("/health")]
    async fn health(self: Arc<Self>, _req: Request<Body>, _next: Next) -> HandlerResult {
        Ok("ok".into_response())
    }
}

fn app() -> (Router, LoadedControllers) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut dispatcher = Dispatcher::new();
    let loaded = Module::new()
        .controller(|| UserController { prefix: "user-" })
        .controller(|| HealthController)
        .load(&mut dispatcher)
        .unwrap();

    let app = Router::new()
        .fallback_service(dispatcher)
        .layer(TraceLayer::new_for_http());
    (app, loaded)
}

async fn text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn served_through_axum() {
    let (app, loaded) = app();
    assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["UserController", "HealthController"]);
    assert_eq!(loaded.get::<UserController>("UserController").unwrap().unwrap().prefix, "user-");

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/users/7").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "user-7");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/users/7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(text(response).await, "ok");
}

#[tokio::test]
async fn unmatched_request_falls_through_to_not_found() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
