pub mod dietary;

use std::sync::Arc;

use crate::config::toml_config::EnrichConfig;
use crate::core::orchestrator::Orchestrator;
use crate::domain::model::Restaurant;
use crate::domain::ports::DietaryPreferenceStore;
use crate::utils::error::Result;

pub use dietary::DietaryPreferenceService;

/// Register the built-in service catalog enabled in `config`.
pub fn register_default_services<St>(
    orchestrator: &Orchestrator<Restaurant>,
    config: &EnrichConfig,
    store: Arc<St>,
) -> Result<()>
where
    St: DietaryPreferenceStore + 'static,
{
    let dietary_config = config.dietary_service();
    if dietary_config.enabled {
        orchestrator.register(Arc::new(DietaryPreferenceService::new(
            &dietary_config,
            store,
        )?));
    } else {
        tracing::info!("⏭️ Service {} disabled by config", dietary::SERVICE_NAME);
    }

    Ok(())
}
