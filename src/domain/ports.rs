use crate::domain::model::DietaryInfo;
use crate::utils::error::ServiceError;
use async_trait::async_trait;
use uuid::Uuid;

/// Record handed to enrichment services. Only read, never persisted here.
pub trait Subject: Send + Sync + 'static {
    fn subject_id(&self) -> String;
}

/// A named, pluggable enrichment capability.
///
/// `call` performs its own I/O and persists whatever it derives through its
/// own collaborators; the subject is shared read-only with every other
/// service running for the same `process` call.
#[async_trait]
pub trait EnrichmentService<S: Subject>: Send + Sync {
    fn name(&self) -> &str;

    /// `None` falls back to the executor's default retry count.
    fn max_retries(&self) -> Option<u32> {
        None
    }

    async fn call(&self, subject: &S) -> Result<(), ServiceError>;
}

/// Storage collaborator for derived dietary attributes.
pub trait DietaryPreferenceStore: Send + Sync {
    /// Upserts every available type; unavailable types are left untouched.
    fn set_preferences(
        &self,
        restaurant_id: Uuid,
        prefs: &DietaryInfo,
    ) -> impl std::future::Future<Output = Result<(), ServiceError>> + Send;

    fn get_preferences(
        &self,
        restaurant_id: Uuid,
    ) -> impl std::future::Future<Output = Result<DietaryInfo, ServiceError>> + Send;
}
