use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Canonical city stored when no known Moroccan city is detected.
pub const UNKNOWN_CITY: &str = "Maroc";

/// A posting as it comes out of a site page or an AI provider response.
/// Short-lived: normalized immediately, never stored as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPosting {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: Option<String>,
    #[serde(default, alias = "city", deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, alias = "url", deserialize_with = "lenient_string")]
    pub source_url: Option<String>,
    #[serde(default, alias = "job_type", deserialize_with = "lenient_string")]
    pub contract: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub salary: Option<String>,
    #[serde(default, alias = "company_email", deserialize_with = "lenient_string")]
    pub contact_email: Option<String>,
    #[serde(default, alias = "company_phone", deserialize_with = "lenient_string")]
    pub contact_phone: Option<String>,
    #[serde(default, alias = "source")]
    pub source_name: String,
}

/// Accepts a string or a number (`"salary": 8000`); anything else reads as absent.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    #[serde(rename = "CDI")]
    Cdi,
    #[serde(rename = "CDD")]
    Cdd,
    Stage,
    Freelance,
    Interim,
    #[default]
    Unspecified,
}

impl ContractType {
    pub const ALL: [ContractType; 6] = [
        ContractType::Cdi,
        ContractType::Cdd,
        ContractType::Stage,
        ContractType::Freelance,
        ContractType::Interim,
        ContractType::Unspecified,
    ];

    /// Stored value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Cdi => "CDI",
            ContractType::Cdd => "CDD",
            ContractType::Stage => "Stage",
            ContractType::Freelance => "Freelance",
            ContractType::Interim => "Interim",
            ContractType::Unspecified => "Unspecified",
        }
    }

    /// Reads a stored contract name back.
    pub fn from_stored(value: &str) -> Option<ContractType> {
        ContractType::ALL.into_iter().find(|c| c.as_str() == value)
    }

    /// French display label used by the listing UI.
    pub fn label(&self) -> &'static str {
        match self {
            ContractType::Interim => "Intérim",
            ContractType::Unspecified => "Non spécifié",
            other => other.as_str(),
        }
    }
}

/// Sector taxonomy. Declaration order is the classification tie-break order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Tech,
    Design,
    Commercial,
    #[serde(rename = "Customer-Service")]
    CustomerService,
    Finance,
    Logistics,
    Engineering,
    Health,
    Education,
    Hospitality,
    #[default]
    General,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Tech,
        Category::Design,
        Category::Commercial,
        Category::CustomerService,
        Category::Finance,
        Category::Logistics,
        Category::Engineering,
        Category::Health,
        Category::Education,
        Category::Hospitality,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tech => "Tech",
            Category::Design => "Design",
            Category::Commercial => "Commercial",
            Category::CustomerService => "Customer-Service",
            Category::Finance => "Finance",
            Category::Logistics => "Logistics",
            Category::Engineering => "Engineering",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Hospitality => "Hospitality",
            Category::General => "General",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Tech => "Informatique & Tech",
            Category::Design => "Design & Création",
            Category::Commercial => "Commercial & Ventes",
            Category::CustomerService => "Service Client",
            Category::Finance => "Finance & Administration",
            Category::Logistics => "Logistique & Transport",
            Category::Engineering => "Ingénierie",
            Category::Health => "Santé",
            Category::Education => "Éducation",
            Category::Hospitality => "Hôtellerie & Tourisme",
            Category::General => "Général",
        }
    }

    /// Accepts either the stored name or the French label, ignoring case and separators.
    pub fn parse(value: &str) -> Option<Category> {
        let wanted = fold(value);
        if wanted.is_empty() {
            return None;
        }
        Category::ALL
            .into_iter()
            .find(|c| fold(c.as_str()) == wanted || fold(c.label()) == wanted)
    }
}

fn fold(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A posting mapped onto the canonical schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosting {
    pub title: String,
    pub company: Option<String>,
    /// Raw location text, kept for enrichment prompts.
    pub location: Option<String>,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub source_name: String,
    pub salary: Option<String>,
    pub contract_type: ContractType,
    pub city: String,
    /// City found by the keyword rules. Enrichment may fill `city`, never this; the
    /// hash identity is built from it so an AI answer cannot change a key.
    #[serde(skip)]
    pub rule_city: String,
    pub category: Category,
    pub skills: Vec<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_website: Option<String>,
}

/// The shape written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPosting {
    #[serde(flatten)]
    pub posting: NormalizedPosting,
    pub summary: String,
    /// Provider whose answer was merged, `None` for the rule-based path.
    pub enriched_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_accepts_name_and_label() {
        assert_eq!(Category::parse("Tech"), Some(Category::Tech));
        assert_eq!(Category::parse("informatique & tech"), Some(Category::Tech));
        assert_eq!(Category::parse("customer service"), Some(Category::CustomerService));
        assert_eq!(Category::parse("Service Client"), Some(Category::CustomerService));
        assert_eq!(Category::parse("Santé"), Some(Category::Health));
    }

    #[test]
    fn test_category_parse_rejects_free_text() {
        assert_eq!(Category::parse("Astronautics"), None);
        assert_eq!(Category::parse("   "), None);
    }

    #[test]
    fn test_contract_from_stored() {
        for contract in ContractType::ALL {
            assert_eq!(ContractType::from_stored(contract.as_str()), Some(contract));
        }
        assert_eq!(ContractType::from_stored("Intérim"), None);
    }

    #[test]
    fn test_french_labels() {
        assert_eq!(ContractType::Interim.label(), "Intérim");
        assert_eq!(ContractType::Cdi.label(), "CDI");
        assert_eq!(Category::Hospitality.label(), "Hôtellerie & Tourisme");
    }

    #[test]
    fn test_contract_type_serde_uses_stored_names() {
        let json = serde_json::to_string(&ContractType::Cdi).unwrap();
        assert_eq!(json, r#""CDI""#);
        let parsed: ContractType = serde_json::from_str(r#""Unspecified""#).unwrap();
        assert_eq!(parsed, ContractType::Unspecified);
    }

    #[test]
    fn test_category_serde_customer_service() {
        let json = serde_json::to_string(&Category::CustomerService).unwrap();
        assert_eq!(json, r#""Customer-Service""#);
    }

    #[test]
    fn test_raw_posting_accepts_store_field_names() {
        let json = r#"{
            "title": "Comptable",
            "company": "X",
            "city": "Rabat",
            "url": "https://x.ma/job/42",
            "company_email": "rh@x.ma",
            "source": "ingest"
        }"#;
        let raw: RawPosting = serde_json::from_str(json).unwrap();
        assert_eq!(raw.location.as_deref(), Some("Rabat"));
        assert_eq!(raw.source_url.as_deref(), Some("https://x.ma/job/42"));
        assert_eq!(raw.contact_email.as_deref(), Some("rh@x.ma"));
        assert_eq!(raw.source_name, "ingest");
    }

    #[test]
    fn test_raw_posting_numeric_fields_are_stringified() {
        let json = r#"{"title": "Comptable", "company": "X", "salary": 8000, "company_phone": 661234567}"#;
        let raw: RawPosting = serde_json::from_str(json).unwrap();
        assert_eq!(raw.salary.as_deref(), Some("8000"));
        assert_eq!(raw.contact_phone.as_deref(), Some("661234567"));
    }

    #[test]
    fn test_raw_posting_missing_title_defaults_empty() {
        let raw: RawPosting = serde_json::from_str(r#"{"company": "X"}"#).unwrap();
        assert!(raw.title.is_empty());
    }
}
