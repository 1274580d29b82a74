use super::ControllerMeta;
use crate::controller::Controller;
use crate::error::{Result, RouteError};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::LazyLock;

static GLOBAL: LazyLock<MetadataStore> = LazyLock::new(MetadataStore::new);

/// Route declarations of every controller type, keyed by type.
///
/// An entry is created the first time a controller type is looked up or
/// declared on, by running [`Controller::declare`]. Reads hand out a copy of
/// the metadata, so routes resolved later always see the current declarations.
pub struct MetadataStore {
    entries: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// The process-wide store used by [`register`](crate::register) and
    /// [`get_routes`](crate::get_routes).
    pub fn global() -> &'static MetadataStore {
        &GLOBAL
    }

    /// Add declarations for `C` on top of what `C::declare` contributes.
    ///
    /// `f` must not touch this store.
    pub fn declare<C: Controller>(&self, f: impl FnOnce(&mut ControllerMeta<C>)) -> Result<()> {
        self.ensure::<C>();
        let mut entry = self
            .entries
            .get_mut(&TypeId::of::<C>())
            .ok_or_else(|| RouteError::Internal(format!(
                "metadata for {} vanished",
                std::any::type_name::<C>()
            )))?;
        let meta = entry
            .downcast_mut::<ControllerMeta<C>>()
            .ok_or_else(|| RouteError::DowncastFailed {
                type_name: std::any::type_name::<C>().to_string(),
            })?;
        f(meta);
        Ok(())
    }

    /// A copy of the current declarations for `C`.
    pub fn metadata<C: Controller>(&self) -> Result<ControllerMeta<C>> {
        self.ensure::<C>();
        let entry = self
            .entries
            .get(&TypeId::of::<C>())
            .ok_or_else(|| RouteError::Internal(format!(
                "metadata for {} vanished",
                std::any::type_name::<C>()
            )))?;
        entry
            .downcast_ref::<ControllerMeta<C>>()
            .cloned()
            .ok_or_else(|| RouteError::DowncastFailed {
                type_name: std::any::type_name::<C>().to_string(),
            })
    }

    pub fn contains<C: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<C>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure<C: Controller>(&self) {
        let type_id = TypeId::of::<C>();
        if self.entries.contains_key(&type_id) {
            return;
        }
        // Built outside the map so `declare` never runs under a shard lock.
        let mut meta = ControllerMeta::<C>::new();
        C::declare(&mut meta);
        tracing::debug!(
            "Declared {} route records for {}",
            meta.records().len(),
            std::any::type_name::<C>()
        );
        self.entries.entry(type_id).or_insert_with(|| Box::new(meta));
    }
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler;
    use crate::verb::Verb;
    use axum::response::IntoResponse;
    use std::sync::Arc;

    struct Declared;

    impl Controller for Declared {
        fn declare(meta: &mut ControllerMeta<Self>) {
            meta.base_path("/declared");
            meta.method(
                "index",
                handler(|_this: Arc<Self>, _req, _next| async { Ok(().into_response()) }),
            )
            .get("/");
        }
    }

    struct Plain;

    impl Controller for Plain {}

    #[test]
    fn test_metadata_is_created_lazily_from_declare() {
        let store = MetadataStore::new();
        assert!(!store.contains::<Declared>());

        let meta = store.metadata::<Declared>().unwrap();
        assert!(store.contains::<Declared>());
        assert_eq!(meta.base(), Some("/declared"));
        assert_eq!(meta.records().len(), 1);

        // a second read does not run declare again
        let meta = store.metadata::<Declared>().unwrap();
        assert_eq!(meta.records().len(), 1);
    }

    #[test]
    fn test_explicit_declarations_extend_the_entry() {
        let store = MetadataStore::new();
        store
            .declare::<Declared>(|meta| {
                meta.method(
                    "extra",
                    handler(|_this: Arc<Declared>, _req, _next| async { Ok(().into_response()) }),
                )
                .post("/extra");
            })
            .unwrap();

        let meta = store.metadata::<Declared>().unwrap();
        assert_eq!(meta.records().len(), 2);
        assert_eq!(meta.records()[1].method, Some(Verb::Post));
    }

    #[test]
    fn test_entries_are_keyed_by_type() {
        let store = MetadataStore::new();
        store.metadata::<Declared>().unwrap();
        store.metadata::<Plain>().unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.metadata::<Plain>().unwrap().records().is_empty());
    }
}
