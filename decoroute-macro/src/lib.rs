use proc_macro::TokenStream;

mod controller;
mod verbs;

/// Attribute macro implementing `Controller` for an impl block
///
/// Methods are bound to routes with inert attributes, read top to bottom:
///
/// - `#[get("/path")]`, `#[post]`, `#[put]`, `#[patch]`, `#[delete]`
///   (or `#[del]`), `#[options]`, `#[head]`, `#[all]`: a route for that verb; without a path
///   the route matches `*`
/// - `#[route("propfind", "/path")]`: a route for any verb, checked at compile time
/// - `#[use_middleware]` / `#[use_middleware("/path")]`: mount as middleware
/// - `#[param("id")]`: a parameter handler
/// - `#[middleware(expr)]`: run the middleware `expr` before the method on
///   each of its routes; a string literal refers to a named middleware
/// - `#[named_middleware]`: make the method available to `#[middleware("name")]`
///
/// Request handlers have the shape
/// `async fn(&self, Request<Body>, Next) -> HandlerResult`;
/// parameter handlers additionally take the value and the name.
///
/// # Example
/// ```ignore
/// #[routes(path = "/users")]
/// impl UserController {
///     #[get("/:id")]
///     #[middleware("authenticate")]
///     async fn get_user(&self, req: Request<Body>, next: Next) -> HandlerResult {
///         // ...
///     }
///
///     #[named_middleware]
///     async fn authenticate(&self, req: Request<Body>, next: Next) -> HandlerResult {
///         next.run(req).await
///     }
///
///     #[param("id")]
///     async fn load_user(&self, req: Request<Body>, next: Next, id: String, _name: String) -> HandlerResult {
///         // ...
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn routes(attr: TokenStream, item: TokenStream) -> TokenStream {
    controller::routes_attribute(attr, item)
}
