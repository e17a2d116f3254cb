//! Row types for the relational schema.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use referral_core::{Priority, ReferralStatus, RttPathway};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PractitionerRow {
    pub id: Uuid,
    pub legacy_id: String,
    pub name: String,
    pub role: Option<String>,
    pub specialty: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRow {
    pub id: Uuid,
    pub legacy_id: String,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Gender,
    pub nhs_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferralRow {
    pub id: Uuid,
    pub legacy_id: String,
    pub patient_id: Uuid,
    pub referrer_id: Option<Uuid>,
    pub specialty: String,
    pub priority: Priority,
    pub status: ReferralStatus,
    pub reason: Option<String>,
    pub ubrn: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllergyRow {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub substance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationRow {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathwayRow {
    pub referral_id: Uuid,
    #[serde(flatten)]
    pub pathway: RttPathway,
}

/// Rows ready for insertion, in foreign-key order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Tables {
    pub practitioners: Vec<PractitionerRow>,
    pub patients: Vec<PatientRow>,
    pub referrals: Vec<ReferralRow>,
    pub allergies: Vec<AllergyRow>,
    pub medications: Vec<MedicationRow>,
    pub rtt_pathways: Vec<PathwayRow>,
}

/// Legacy ID to new UUID, per table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IdMap {
    pub practitioners: BTreeMap<String, Uuid>,
    pub patients: BTreeMap<String, Uuid>,
    pub referrals: BTreeMap<String, Uuid>,
}
