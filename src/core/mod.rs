pub mod orchestrator;
pub mod registry;
pub mod retry;

pub use crate::domain::model::{EnrichmentReport, ServiceOutcome};
pub use crate::domain::ports::{EnrichmentService, Subject};
pub use crate::utils::error::{Result, ServiceError};
