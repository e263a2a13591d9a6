use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::toml_config::DietaryServiceConfig;
use crate::domain::model::{DietaryInfo, Restaurant};
use crate::domain::ports::{DietaryPreferenceStore, EnrichmentService};
use crate::utils::error::{Result, ServiceError};

pub const SERVICE_NAME: &str = "dietary-preference";

const AMENITY_PATTERN: &str =
    "restaurant|fast_food|cafe|bar|pub|food_court|ice_cream|biergarten";

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// 查詢 Overpass API，取得餐廳的飲食標籤 (halal / vegan / ...) 並寫入儲存
pub struct DietaryPreferenceService<St: DietaryPreferenceStore> {
    store: Arc<St>,
    client: Client,
    endpoint: String,
    max_retries: u32,
    bbox_epsilon: f64,
}

impl<St: DietaryPreferenceStore> DietaryPreferenceService<St> {
    pub fn new(config: &DietaryServiceConfig, store: Arc<St>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            store,
            client,
            endpoint: config.endpoint.clone(),
            max_retries: config.max_retries,
            bbox_epsilon: config.bbox_epsilon,
        })
    }

    /// Overpass QL for food amenities inside a tiny box around the point.
    pub fn build_query(&self, restaurant: &Restaurant) -> String {
        let lon = restaurant.coordinates.lon;
        let lat = restaurant.coordinates.lat;
        let eps = self.bbox_epsilon;
        let bbox = format!(
            "{},{},{},{}",
            lat - eps,
            lon - eps,
            lat + eps,
            lon + eps
        );

        format!(
            "[out:json];\nnode[\"amenity\"~\"{}\"]({});\nout;",
            AMENITY_PATTERN, bbox
        )
    }

    async fn fetch_tags(
        &self,
        restaurant: &Restaurant,
    ) -> std::result::Result<HashMap<String, String>, ServiceError> {
        let query = self.build_query(restaurant);
        tracing::debug!("📡 Querying Overpass for restaurant {}", restaurant.id);

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Overpass 錯誤時不一定回 JSON
            let detail = response
                .json::<OverpassResponse>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string()
                });
            return Err(ServiceError::Upstream {
                message: format!("Overpass API error: {}", detail),
            });
        }

        let body: OverpassResponse = response.json().await?;
        body.elements
            .into_iter()
            .next()
            .map(|element| element.tags)
            .ok_or_else(|| ServiceError::NoData {
                message: "No data found for the given POI from Overpass API".to_string(),
            })
    }
}

/// A tag counts as available when present and not `"no"`.
pub fn dietary_info_from_tags(tags: &HashMap<String, String>) -> DietaryInfo {
    let flag = |kind: &str| {
        tags.get(&format!("diet:{}", kind))
            .is_some_and(|value| value != "no")
    };

    DietaryInfo {
        halal: flag("halal"),
        vegan: flag("vegan"),
        vegetarian: flag("vegetarian"),
        kosher: flag("kosher"),
    }
}

#[async_trait]
impl<St: DietaryPreferenceStore + 'static> EnrichmentService<Restaurant>
    for DietaryPreferenceService<St>
{
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn max_retries(&self) -> Option<u32> {
        Some(self.max_retries)
    }

    async fn call(&self, restaurant: &Restaurant) -> std::result::Result<(), ServiceError> {
        let tags = self.fetch_tags(restaurant).await?;
        let prefs = dietary_info_from_tags(&tags);
        tracing::debug!("🥗 Restaurant {} dietary info: {:?}", restaurant.id, prefs);

        self.store.set_preferences(restaurant.id, &prefs).await
    }
}
