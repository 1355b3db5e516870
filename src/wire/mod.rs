use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// ========================================
/// Intake data model and diagnosis schema
/// ========================================

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::Ar => Language::En,
            Language::En => Language::Ar,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Language::Ar => Direction::Rtl,
            _ => Direction::Ltr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rtl,
    Ltr,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// The four ordinal stages of the intake flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    DeviceInfo = 1,
    IssueDescription = 2,
    ContactInfo = 3,
    Result = 4,
}

impl Step {
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    #[default]
    StoreVisit,
    Pickup,
}

impl ServiceType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "store_visit" => Some(ServiceType::StoreVisit),
            "pickup" => Some(ServiceType::Pickup),
            _ => None,
        }
    }
}

/// Request accumulated across the wizard steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairRequest {
    pub manufacturer: String,
    pub model: String,
    pub issue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_issue: Option<String>,
    pub issue_description: String,
    pub service_type: ServiceType,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
}

/// Preliminary diagnosis returned by the model. Every field is required on
/// the wire; `requiredParts` may be an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairQuote {
    pub estimated_time: String,
    pub required_parts: Vec<String>,
    pub notes: String,
}

/// JSON schema the model output must satisfy.
pub fn diagnosis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "estimatedTime": {
                "type": "string",
                "description": "Estimated time to complete the repair, e.g., '2-3 hours', '1 business day'."
            },
            "requiredParts": {
                "type": "array",
                "items": { "type": "string" },
                "description": "A list of parts likely needed for the repair."
            },
            "notes": {
                "type": "string",
                "description": "Additional notes, potential causes, and diagnostics about the repair."
            }
        },
        "required": ["estimatedTime", "requiredParts", "notes"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case() {
        let req = RepairRequest {
            manufacturer: "Apple".into(),
            software_issue: Some("Device restarts randomly".into()),
            service_type: ServiceType::Pickup,
            ..Default::default()
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["softwareIssue"], "Device restarts randomly");
        assert_eq!(v["serviceType"], "pickup");
        assert!(v.get("streetAddress").is_none());
    }

    #[test]
    fn test_quote_requires_all_fields() {
        let ok: Result<RepairQuote, _> =
            serde_json::from_str(r#"{"estimatedTime":"1h","requiredParts":[],"notes":"n"}"#);
        assert!(ok.is_ok());
        let missing: Result<RepairQuote, _> =
            serde_json::from_str(r#"{"estimatedTime":"1h","notes":"n"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_language_direction() {
        assert_eq!(Language::Ar.direction(), Direction::Rtl);
        assert_eq!(Language::En.direction(), Direction::Ltr);
        assert_eq!(Language::Ar.toggled(), Language::En);
    }

    #[test]
    fn test_service_type_parse() {
        assert_eq!(ServiceType::parse("pickup"), Some(ServiceType::Pickup));
        assert_eq!(ServiceType::parse("store_visit"), Some(ServiceType::StoreVisit));
        assert_eq!(ServiceType::parse("drone"), None);
        assert_eq!(ServiceType::default(), ServiceType::StoreVisit);
    }

    #[test]
    fn test_schema_marks_all_required() {
        let s = diagnosis_schema();
        let req: Vec<&str> = s["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(req, vec!["estimatedTime", "requiredParts", "notes"]);
    }
}
