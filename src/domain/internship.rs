//! Internship and Campaign records
//!
//! Plain data carried between the workflow, the repository port and the
//! HTTP layer. Relations are held by id only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{InternshipResult, InternshipState};

/// An internship placement, the subject of the workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Internship {
    /// Absent until the repository has persisted the record
    pub id: Option<i64>,

    pub subject: String,
    pub description: String,
    pub country: String,
    pub city: String,
    pub postal_code: String,
    pub address: String,
    pub additional: Option<String>,
    pub is_abroad: bool,

    pub state: InternshipState,
    pub result: InternshipResult,

    // Epoch milliseconds on the wire
    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    pub publish_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    pub end_at: Option<DateTime<Utc>>,

    pub student: Option<i64>,
    pub mentor: Option<i64>,
    pub available_campaign: Option<i64>,
    pub validated_campaign: Option<i64>,
    pub business: Option<i64>,
    pub category: Option<i64>,
    #[serde(default)]
    pub files: Vec<i64>,
    #[serde(default)]
    pub propositions: Vec<i64>,
}

impl Internship {
    /// A fresh, unpersisted internship in `WAITING`
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            id: None,
            subject: subject.into(),
            description: String::new(),
            country: String::new(),
            city: String::new(),
            postal_code: String::new(),
            address: String::new(),
            additional: None,
            is_abroad: false,
            state: InternshipState::Waiting,
            result: InternshipResult::Unknown,
            publish_at: None,
            start_at: None,
            end_at: None,
            student: None,
            mentor: None,
            available_campaign: None,
            validated_campaign: None,
            business: None,
            category: None,
            files: Vec::new(),
            propositions: Vec::new(),
        }
    }

    pub fn with_location(
        mut self,
        country: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        self.country = country.into();
        self.city = city.into();
        self.postal_code = postal_code.into();
        self.address = address.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_business(mut self, business_id: i64) -> Self {
        self.business = Some(business_id);
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category = Some(category_id);
        self
    }

    pub fn abroad(mut self) -> Self {
        self.is_abroad = true;
        self
    }

    /// Campaign the internship is currently counted under, if any
    pub fn campaign(&self) -> Option<i64> {
        self.validated_campaign.or(self.available_campaign)
    }
}

/// Campaign under which internships are offered to mentors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_published: bool,
    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    pub end_at: Option<DateTime<Utc>>,
    pub category: Option<i64>,
    #[serde(default)]
    pub mentors: Vec<i64>,
    #[serde(default)]
    pub propositions: Vec<i64>,
    #[serde(default)]
    pub internships: Vec<i64>,
}

impl Campaign {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            is_published: false,
            start_at: None,
            end_at: None,
            category: None,
            mentors: Vec::new(),
            propositions: Vec::new(),
            internships: Vec::new(),
        }
    }
}
