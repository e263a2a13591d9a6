use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "poi-enrich")]
#[command(about = "Run enrichment services against a newly created restaurant")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Restaurant name
    #[arg(long, default_value = "Unnamed restaurant")]
    pub name: String,

    /// Longitude of the restaurant
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Latitude of the restaurant
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Services to run (all registered services if omitted)
    #[arg(long, value_delimiter = ',')]
    pub services: Vec<String>,

    /// Override orchestrator.concurrency from config
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON logs")]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_arguments() {
        let config = CliConfig::parse_from([
            "poi-enrich",
            "--lon",
            "-0.1276",
            "--lat",
            "51.5072",
            "--services",
            "dietary-preference,opening-hours",
            "--concurrency",
            "3",
        ]);

        assert_eq!(config.lon, -0.1276);
        assert_eq!(config.lat, 51.5072);
        assert_eq!(
            config.services,
            vec!["dietary-preference".to_string(), "opening-hours".to_string()]
        );
        assert_eq!(config.concurrency, Some(3));
        assert!(config.config.is_none());
        assert!(!config.verbose);
    }
}
