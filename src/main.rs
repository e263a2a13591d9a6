use std::sync::Arc;

use clap::Parser;
use poi_enrich::config::toml_config::OrchestratorConfig;
use poi_enrich::utils::logger;
use poi_enrich::utils::validation::{validate_non_empty_string, Validate};
use poi_enrich::{
    register_default_services, CliConfig, Coordinates, DietaryPreferenceStore, EnrichConfig,
    InMemoryDietaryStore, Orchestrator, Restaurant,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 載入 TOML 配置（未指定時使用預設值）
    let mut config = match &args.config {
        Some(path) => match EnrichConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(1);
            }
        },
        None => EnrichConfig::default(),
    };

    if let Some(concurrency) = args.concurrency {
        config
            .orchestrator
            .get_or_insert(OrchestratorConfig { concurrency: None })
            .concurrency = Some(concurrency);
    }

    // 初始化日誌
    if args.json || config.json_logging() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting poi-enrich");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    // 驗證配置
    if let Err(e) = config
        .validate()
        .and_then(|_| validate_non_empty_string("name", &args.name))
    {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let store = Arc::new(InMemoryDietaryStore::new());
    let orchestrator: Orchestrator<Restaurant> = Orchestrator::from_config(&config);
    register_default_services(&orchestrator, &config, Arc::clone(&store))?;

    tracing::info!(
        "🔧 Concurrency: {}, services: {:?}",
        orchestrator.concurrency(),
        orchestrator.service_names()
    );

    let restaurant = Arc::new(Restaurant::new(
        args.name.clone(),
        Coordinates::new(args.lon, args.lat),
    ));

    let report = orchestrator
        .process(Arc::clone(&restaurant), &args.services)
        .await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    let dietary = store.get_preferences(restaurant.id).await?;
    println!("{}", serde_json::to_string_pretty(&dietary)?);

    if report.all_succeeded() {
        tracing::info!("✅ All enrichment services succeeded");
    } else {
        for outcome in report.failed() {
            eprintln!(
                "❌ {}: {}",
                outcome.service_name,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
        std::process::exit(2);
    }

    Ok(())
}
