use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::Subject;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// 新建立的餐廳，也就是 enrichment 的對象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub coordinates: Coordinates,
    pub created_by: Option<Uuid>,
}

impl Restaurant {
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            coordinates,
            created_by: None,
        }
    }
}

impl Subject for Restaurant {
    fn subject_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietaryInfo {
    pub halal: bool,
    pub vegan: bool,
    pub vegetarian: bool,
    pub kosher: bool,
}

impl DietaryInfo {
    /// (type, available) pairs in storage order.
    pub fn entries(&self) -> [(&'static str, bool); 4] {
        [
            ("halal", self.halal),
            ("vegan", self.vegan),
            ("vegetarian", self.vegetarian),
            ("kosher", self.kosher),
        ]
    }

    pub fn set(&mut self, kind: &str, available: bool) -> bool {
        match kind {
            "halal" => self.halal = available,
            "vegan" => self.vegan = available,
            "vegetarian" => self.vegetarian = available,
            "kosher" => self.kosher = available,
            _ => return false,
        }
        true
    }
}

/// Terminal record of one service's participation in one `process` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOutcome {
    pub service_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Attempts started, including one that panicked. 0 when never dispatched.
    pub attempts: u32,
}

impl ServiceOutcome {
    pub fn succeeded(service_name: impl Into<String>, attempts: u32) -> Self {
        Self {
            service_name: service_name.into(),
            success: true,
            error: None,
            attempts,
        }
    }

    pub fn failed(service_name: impl Into<String>, error: impl Into<String>, attempts: u32) -> Self {
        Self {
            service_name: service_name.into(),
            success: false,
            error: Some(error.into()),
            attempts,
        }
    }

    pub fn not_registered(service_name: &str) -> Self {
        Self::failed(
            service_name,
            format!("service {} not registered", service_name),
            0,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentReport {
    pub subject_id: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Completion order, not request order.
    pub outcomes: Vec<ServiceOutcome>,
}

impl EnrichmentReport {
    pub fn outcome(&self, service_name: &str) -> Option<&ServiceOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.service_name == service_name)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &ServiceOutcome> {
        self.outcomes.iter().filter(|o| o.success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ServiceOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_registered_outcome_message() {
        let outcome = ServiceOutcome::not_registered("C");
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("service C not registered"));
        assert_eq!(outcome.attempts, 0);
    }

    #[test]
    fn test_dietary_info_set_ignores_unknown_kind() {
        let mut info = DietaryInfo::default();
        assert!(info.set("vegan", true));
        assert!(!info.set("gluten_free", true));
        assert_eq!(
            info,
            DietaryInfo {
                vegan: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_report_helpers() {
        let report = EnrichmentReport {
            subject_id: "r-1".to_string(),
            started_at: Utc::now(),
            elapsed_ms: 3,
            outcomes: vec![
                ServiceOutcome::succeeded("A", 1),
                ServiceOutcome::not_registered("C"),
            ],
        };

        assert!(!report.all_succeeded());
        assert_eq!(report.succeeded().count(), 1);
        assert_eq!(report.failed().next().unwrap().service_name, "C");
        assert!(report.outcome("A").unwrap().success);
        assert!(report.outcome("Z").is_none());
    }

    #[test]
    fn test_outcome_serializes_without_empty_error() {
        let json = serde_json::to_value(ServiceOutcome::succeeded("A", 1)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"service_name": "A", "success": true, "attempts": 1})
        );
    }
}
