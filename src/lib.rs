pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::InMemoryDietaryStore;
pub use app::services::{register_default_services, DietaryPreferenceService};
pub use config::EnrichConfig;
pub use crate::core::{
    orchestrator::Orchestrator,
    registry::ServiceRegistry,
    retry::{RetryExecutor, RetryPolicy},
};
pub use domain::model::{Coordinates, DietaryInfo, EnrichmentReport, Restaurant, ServiceOutcome};
pub use domain::ports::{DietaryPreferenceStore, EnrichmentService, Subject};
pub use utils::error::{EnrichError, Result, ServiceError};
