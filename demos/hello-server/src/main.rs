use decoroute::prelude::*;
use decoroute::PathParams;
use serde_json::json;

pub struct HelloController {
    greeting: String,
}

#[routes(path = "/hello")]
impl HelloController {
    #[get]
    #[middleware(decoroute::middleware::logging())]
    async fn index(&self, _req: Request<Body>, _next: Next) -> HandlerResult {
        Ok(self.greeting.clone().into_response())
    }

    #[get("/:name")]
    #[middleware("shout")]
    async fn greet(&self, req: Request<Body>, _next: Next) -> HandlerResult {
        let name = req
            .extensions()
            .get::<PathParams>()
            .and_then(|p| p.get("name").map(str::to_string))
            .ok_or_else(|| HttpException::bad_request("missing name"))?;
        Ok(axum::Json(json!({ "greeting": self.greeting, "name": name })).into_response())
    }

    #[param("name")]
    async fn check_name(&self, req: Request<Body>, next: Next, name: String, _param: String) -> HandlerResult {
        if name.len() > 32 {
            return Err(HttpException::bad_request("name too long").into());
        }
        next.run(req).await
    }

    #[named_middleware]
    async fn shout(&self, req: Request<Body>, next: Next) -> HandlerResult {
        tracing::info!("{} {}", req.method(), req.uri());
        next.run(req).await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting hello server...");

    let mut dispatcher = Dispatcher::with_options(DispatchOptions::from_env()?);
    let loaded = Module::new()
        .controller(|| HelloController {
            greeting: "hi".to_string(),
        })
        .load(&mut dispatcher)?;
    tracing::info!("Loaded controllers: {:?}", loaded);

    let app = Router::new().fallback_service(dispatcher);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server running on http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
