use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::posting::EnrichedPosting;

/// A row of the `jobs` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRecord {
    pub id: Uuid,
    pub identity_key: String,
    pub url: Option<String>,
    pub title: String,
    pub company: Option<String>,
    pub city: String,
    pub description: Option<String>,
    pub contract_type: String,
    pub salary: Option<String>,
    pub company_email: Option<String>,
    pub company_phone: Option<String>,
    pub company_website: Option<String>,
    pub category: String,
    pub skills: Vec<String>,
    pub summary: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub identity_key: String,
    pub url: Option<String>,
    pub title: String,
    pub company: Option<String>,
    pub city: String,
    pub description: Option<String>,
    pub contract_type: String,
    pub salary: Option<String>,
    pub company_email: Option<String>,
    pub company_phone: Option<String>,
    pub company_website: Option<String>,
    pub category: String,
    pub skills: Vec<String>,
    pub summary: String,
    pub source: String,
}

impl NewJob {
    pub fn from_enriched(identity_key: String, enriched: &EnrichedPosting) -> Self {
        let p = &enriched.posting;
        Self {
            identity_key,
            url: p.source_url.clone(),
            title: p.title.clone(),
            company: p.company.clone(),
            city: p.city.clone(),
            description: p.description.clone(),
            contract_type: p.contract_type.as_str().to_string(),
            salary: p.salary.clone(),
            company_email: p.contact_email.clone(),
            company_phone: p.contact_phone.clone(),
            company_website: p.contact_website.clone(),
            category: p.category.as_str().to_string(),
            skills: p.skills.clone(),
            summary: enriched.summary.clone(),
            source: p.source_name.clone(),
        }
    }

    #[cfg(test)]
    pub fn into_record(self, id: Uuid, created_at: DateTime<Utc>) -> JobRecord {
        JobRecord {
            id,
            identity_key: self.identity_key,
            url: self.url,
            title: self.title,
            company: self.company,
            city: self.city,
            description: self.description,
            contract_type: self.contract_type,
            salary: self.salary,
            company_email: self.company_email,
            company_phone: self.company_phone,
            company_website: self.company_website,
            category: self.category,
            skills: self.skills,
            summary: self.summary,
            source: self.source,
            created_at,
        }
    }
}
