use crate::controller::Controller;
use crate::error::{Result, RouteError};
use crate::meta::MetadataStore;
use crate::registrar::{RouteTarget, register_with};
use std::any::{Any, type_name};
use std::sync::Arc;

/// Maps a controller's type name to the key it is loaded under, or skips it.
pub type NameFilter = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

type Instance = Arc<dyn Any + Send + Sync>;

type Loader =
    Box<dyn FnOnce(&MetadataStore, &mut dyn RouteTarget, &NameFilter) -> Result<Option<(String, Instance)>> + Send>;

/// A set of controllers registered together
///
/// # Example
/// ```rust,ignore
/// let loaded = Module::new()
///     .controller(UserController::new)
///     .try_controller(|| Ok(AdminController::connect()?))
///     .load(&mut dispatcher)?;
///
/// let users = loaded.get::<UserController>("UserController")?;
/// ```
pub struct Module {
    loaders: Vec<Loader>,
    filter: NameFilter,
}

impl Module {
    /// A module accepting controllers whose type name ends in `Controller`.
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
            filter: Box::new(|name: &str| name.ends_with("Controller").then(|| name.to_string())),
        }
    }

    /// Replace the name filter.
    ///
    /// The filter sees the controller's type name without its module path.
    /// Controllers it rejects are never constructed.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.filter = Box::new(filter);
        self
    }

    pub fn controller<C, F>(self, factory: F) -> Self
    where
        C: Controller,
        F: FnOnce() -> C + Send + 'static,
    {
        self.try_controller(move || Ok(factory()))
    }

    /// Add a controller whose construction may fail.
    pub fn try_controller<C, F>(mut self, factory: F) -> Self
    where
        C: Controller,
        F: FnOnce() -> anyhow::Result<C> + Send + 'static,
    {
        self.loaders.push(Box::new(
            move |store: &MetadataStore,
                  router: &mut dyn RouteTarget,
                  filter: &NameFilter|
                  -> Result<Option<(String, Instance)>> {
                let name = short_type_name::<C>();
                let Some(key) = filter(name) else {
                    tracing::debug!("Skipping controller {}", name);
                    return Ok(None);
                };
                let instance = factory().map_err(|source| RouteError::Construction {
                    name: name.to_string(),
                    source,
                })?;
                let instance = Arc::new(instance);
                register_with(store, router, instance.clone())?;
                tracing::debug!("Loaded controller {} as {}", name, key);
                Ok(Some((key, instance as Instance)))
            },
        ));
        self
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Construct every accepted controller and register it on `router`.
    pub fn load<R: RouteTarget>(self, router: &mut R) -> Result<LoadedControllers> {
        self.load_with(MetadataStore::global(), router)
    }

    pub fn load_with<R: RouteTarget>(self, store: &MetadataStore, router: &mut R) -> Result<LoadedControllers> {
        let mut loaded = LoadedControllers::default();
        for loader in self.loaders {
            if let Some((key, instance)) = loader(store, &mut *router, &self.filter)? {
                loaded.entries.push((key, instance));
            }
        }
        Ok(loaded)
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

/// Controller instances created by [`Module::load`], by key.
#[derive(Default)]
pub struct LoadedControllers {
    entries: Vec<(String, Instance)>,
}

impl LoadedControllers {
    /// The instance loaded under `key`, if there is one.
    ///
    /// Fails if it is not a `C`.
    pub fn get<C: Controller>(&self, key: &str) -> Result<Option<Arc<C>>> {
        let Some((_, instance)) = self.entries.iter().find(|(k, _)| k == key) else {
            return Ok(None);
        };
        instance
            .clone()
            .downcast::<C>()
            .map(Some)
            .map_err(|_| RouteError::DowncastFailed {
                type_name: type_name::<C>().to_string(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys in load order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for LoadedControllers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

fn short_type_name<C>() -> &'static str {
    let full = type_name::<C>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Handler, handler};
    use crate::meta::ControllerMeta;
    use crate::verb::Verb;
    use axum::response::IntoResponse;

    #[derive(Default)]
    struct Recorder {
        paths: Vec<String>,
    }

    impl RouteTarget for Recorder {
        fn route(&mut self, _verb: Verb, path: &str, _handlers: Vec<Handler>) -> Result<()> {
            self.paths.push(path.to_string());
            Ok(())
        }
    }

    struct UserController {
        name: &'static str,
    }

    impl Controller for UserController {
        fn declare(meta: &mut ControllerMeta<Self>) {
            meta.base_path("/users");
            meta.method(
                "list",
                handler(|this: Arc<Self>, _req, _next| async move { Ok(this.name.into_response()) }),
            )
            .get("/");
        }
    }

    struct Helper;

    impl Controller for Helper {
        fn declare(meta: &mut ControllerMeta<Self>) {
            meta.method(
                "noop",
                handler(|_this: Arc<Self>, req, next: crate::handler::Next| async move {
                    next.run(req).await
                }),
            )
            .use_middleware();
        }
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<UserController>(), "UserController");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
    }

    #[test]
    fn test_load_registers_accepted_controllers() {
        let store = MetadataStore::new();
        let mut router = Recorder::default();
        let loaded = Module::new()
            .controller(|| UserController { name: "users" })
            .controller(|| Helper)
            .load_with(&store, &mut router)
            .unwrap();

        assert_eq!(router.paths, vec!["/users/".to_string()]);
        assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["UserController"]);
        let users = loaded.get::<UserController>("UserController").unwrap().unwrap();
        assert_eq!(users.name, "users");
    }

    #[test]
    fn test_custom_filter_picks_keys() {
        let store = MetadataStore::new();
        let mut router = Recorder::default();
        let loaded = Module::new()
            .with_filter(|name| Some(name.to_lowercase()))
            .controller(|| Helper)
            .load_with(&store, &mut router)
            .unwrap();

        assert!(loaded.contains("helper"));
        assert_eq!(router.paths, vec!["/*".to_string()]);
    }

    #[test]
    fn test_wrong_type_is_a_downcast_error() {
        let store = MetadataStore::new();
        let loaded = Module::new()
            .controller(|| UserController { name: "users" })
            .load_with(&store, &mut Recorder::default())
            .unwrap();

        assert!(matches!(
            loaded.get::<Helper>("UserController"),
            Err(RouteError::DowncastFailed { .. })
        ));
        assert!(loaded.get::<Helper>("missing").unwrap().is_none());
    }

    #[test]
    fn test_failing_factory_aborts_load() {
        let store = MetadataStore::new();
        let mut router = Recorder::default();
        let err = Module::new()
            .try_controller(|| -> anyhow::Result<UserController> { anyhow::bail!("no database") })
            .load_with(&store, &mut router)
            .unwrap_err();

        assert!(matches!(err, RouteError::Construction { ref name, .. } if name == "UserController"));
        assert!(router.paths.is_empty());
    }
}
