use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::model::DietaryInfo;
use crate::domain::ports::DietaryPreferenceStore;
use crate::utils::error::ServiceError;

/// Process-local dietary preference table keyed by (restaurant, type).
#[derive(Debug, Default)]
pub struct InMemoryDietaryStore {
    rows: RwLock<HashMap<Uuid, HashMap<String, bool>>>,
}

impl InMemoryDietaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn restaurant_count(&self) -> usize {
        self.rows.read().await.len()
    }
}

impl DietaryPreferenceStore for InMemoryDietaryStore {
    async fn set_preferences(
        &self,
        restaurant_id: Uuid,
        prefs: &DietaryInfo,
    ) -> Result<(), ServiceError> {
        let mut rows = self.rows.write().await;
        let entry = rows.entry(restaurant_id).or_default();
        for (kind, available) in prefs.entries() {
            if available {
                entry.insert(kind.to_string(), available);
            }
        }
        Ok(())
    }

    async fn get_preferences(&self, restaurant_id: Uuid) -> Result<DietaryInfo, ServiceError> {
        let rows = self.rows.read().await;
        let mut info = DietaryInfo::default();
        if let Some(stored) = rows.get(&restaurant_id) {
            for (kind, available) in stored {
                info.set(kind, *available);
            }
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_restaurant_returns_defaults() {
        let store = InMemoryDietaryStore::new();
        let info = store.get_preferences(Uuid::new_v4()).await.unwrap();
        assert_eq!(info, DietaryInfo::default());
    }

    #[tokio::test]
    async fn test_set_only_upserts_available_types() {
        let store = InMemoryDietaryStore::new();
        let id = Uuid::new_v4();

        let first = DietaryInfo {
            vegan: true,
            ..Default::default()
        };
        store.set_preferences(id, &first).await.unwrap();

        let second = DietaryInfo {
            halal: true,
            ..Default::default()
        };
        store.set_preferences(id, &second).await.unwrap();

        let info = store.get_preferences(id).await.unwrap();
        assert!(info.vegan);
        assert!(info.halal);
        assert!(!info.kosher);
        assert_eq!(store.restaurant_count().await, 1);
    }
}
