use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::ports::{EnrichmentService, Subject};

pub type SharedService<S> = Arc<dyn EnrichmentService<S>>;

/// Name-keyed catalog of enrichment services.
///
/// Registration is expected to happen mostly at startup, but `register` and
/// `unregister` may run at any time; every `process` call reads a snapshot
/// under the read lock.
pub struct ServiceRegistry<S: Subject> {
    by_name: RwLock<HashMap<String, SharedService<S>>>,
}

impl<S: Subject> ServiceRegistry<S> {
    pub fn new() -> Self {
        Self {
            by_name: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or overwrite by `service.name()`.
    pub fn register(&self, service: SharedService<S>) {
        let name = service.name().to_string();
        let replaced = self.by_name.write().insert(name.clone(), service);
        if replaced.is_some() {
            tracing::debug!("🔁 Service '{}' re-registered", name);
        } else {
            tracing::debug!("➕ Service '{}' registered", name);
        }
    }

    /// Remove `name` if present. Absent names are a no-op.
    pub fn unregister(&self, name: &str) {
        if self.by_name.write().remove(name).is_some() {
            tracing::debug!("➖ Service '{}' unregistered", name);
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.by_name.read().contains_key(name)
    }

    pub fn list_names(&self) -> BTreeSet<String> {
        self.by_name.read().keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<SharedService<S>> {
        self.by_name.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_name.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.read().is_empty()
    }

    /// Look up every name under one read lock, preserving input order.
    pub fn resolve(&self, names: &[String]) -> Vec<(String, Option<SharedService<S>>)> {
        let services = self.by_name.read();
        names
            .iter()
            .map(|name| (name.clone(), services.get(name).cloned()))
            .collect()
    }
}

impl<S: Subject> Default for ServiceRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ServiceError;
    use async_trait::async_trait;

    struct Probe;

    impl Subject for Probe {
        fn subject_id(&self) -> String {
            "probe".to_string()
        }
    }

    struct Named(&'static str);

    #[async_trait]
    impl EnrichmentService<Probe> for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn call(&self, _subject: &Probe) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_introspect() {
        let registry = ServiceRegistry::<Probe>::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(Named("a")));
        registry.register(Arc::new(Named("b")));

        assert!(registry.has("a"));
        assert!(!registry.has("c"));
        assert_eq!(
            registry.list_names(),
            BTreeSet::from(["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_register_overwrites_same_name() {
        let registry = ServiceRegistry::<Probe>::new();
        let first: SharedService<Probe> = Arc::new(Named("a"));
        let second: SharedService<Probe> = Arc::new(Named("a"));

        registry.register(first.clone());
        registry.register(second.clone());

        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.get("a").unwrap(), &second));
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let registry = ServiceRegistry::<Probe>::new();
        registry.register(Arc::new(Named("a")));

        registry.unregister("missing");
        assert_eq!(registry.len(), 1);

        registry.unregister("a");
        registry.unregister("a");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve_keeps_order_and_marks_missing() {
        let registry = ServiceRegistry::<Probe>::new();
        registry.register(Arc::new(Named("a")));

        let resolved = registry.resolve(&["x".to_string(), "a".to_string()]);

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].0, "x");
        assert!(resolved[0].1.is_none());
        assert_eq!(resolved[1].0, "a");
        assert!(resolved[1].1.is_some());
    }
}
