//! # Decoroute
//!
//! Declarative controller routing for Rust.
//!
//! Controllers declare, per method, which routes the method serves, which
//! middleware runs before it, and the base path the controller is mounted
//! under. Decoroute collects those declarations into a per-type metadata
//! store, resolves them into concrete routes bound to a controller instance,
//! and registers them on a router.
//!
//! ## Features
//!
//! - **Declarative routes**: `#[routes]` on an `impl` block, or builder calls on [`ControllerMeta`]
//! - **Middleware by value or by name**: names are looked up in the controller's [`MiddlewareTable`]
//! - **Any router**: registration goes through the [`RouteTarget`] trait
//! - **Reference router**: [`Dispatcher`] is an express-style stack usable as a `tower::Service`
//! - **Error containment**: handler errors and panics reach one [`ExceptionFilter`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use decoroute::prelude::*;
//!
//! pub struct HelloController;
//!
//! #[routes(path = "/hello")]
//! impl HelloController {
//!     #[get("/")]
//!     #[middleware(decoroute::middleware::logging())]
//!     async fn index(&self, _req: Request<Body>, _next: Next) -> HandlerResult {
//!         Ok("hi".into_response())
//!     }
//!
//!     #[param("id")]
//!     async fn load(&self, req: Request<Body>, next: Next, _id: String, _name: String) -> HandlerResult {
//!         next.run(req).await
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut dispatcher = Dispatcher::new();
//!     register(&mut dispatcher, Arc::new(HelloController)).unwrap();
//!
//!     let app = Router::new().fallback_service(dispatcher);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod exception;
pub mod handler;
pub mod meta;
pub mod middleware;
pub mod module;
pub mod registrar;
pub mod resolver;
pub mod verb;

// Re-export core types
pub use config::DispatchOptions;
pub use controller::{Controller, MiddlewareTable};
pub use dispatch::{Dispatcher, PathParams};
pub use error::{Result, RouteError};
pub use exception::{ArgumentsHost, ExceptionFilter, HttpException, HttpExceptionFilter};
pub use handler::{
    BoxFuture, Handler, HandlerError, HandlerResult, Next, ParamHandler, handler, param_handler,
};
pub use meta::{ControllerMeta, HandlerRef, MetadataStore, Middleware};
pub use module::{LoadedControllers, Module};
pub use registrar::{RouteTarget, register, register_with};
pub use resolver::{Handlers, ResolvedRoute, get_routes, resolve};
pub use verb::Verb;

// Re-export macros
pub use decoroute_macro::routes;

// Re-export commonly used types from dependencies
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use decoroute::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::DispatchOptions;
    pub use crate::controller::{Controller, MiddlewareTable};
    pub use crate::dispatch::{Dispatcher, PathParams};
    pub use crate::error::{Result, RouteError};
    pub use crate::exception::{ArgumentsHost, ExceptionFilter, HttpException};
    pub use crate::handler::{HandlerResult, Next, handler, param_handler};
    pub use crate::meta::{ControllerMeta, HandlerRef};
    pub use crate::module::Module;
    pub use crate::registrar::{RouteTarget, register};
    pub use crate::routes;
    pub use crate::verb::Verb;
    pub use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
