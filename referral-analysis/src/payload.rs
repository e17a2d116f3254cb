//! Shapes an analysis result into the insert payload of the referral store.

use chrono::{DateTime, NaiveDate, Utc};
use referral_core::{
    calculate_pathway, clock_start_from, AnalysisResult, Priority, ReferralError, ReferralResult,
    ReferralStatus, RttConfig, RttPathway,
};
use serde::{Deserialize, Serialize};

/// Specialty used when no document named one.
pub const DEFAULT_SPECIALTY: &str = "General Medicine";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub full_name: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub nhs_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewReferral {
    pub specialty: String,
    pub priority: Priority,
    pub urgency: Option<String>,
    pub reason: Option<String>,
    pub status: ReferralStatus,
    pub source_confidence: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewClinicalInfo {
    pub history: Option<String>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub medications: Vec<String>,
    pub allergies: Vec<String>,
}

/// Everything needed to create a referral from analysed documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralDraft {
    pub patient: NewPatient,
    pub referral: NewReferral,
    pub clinical: NewClinicalInfo,
    pub pathway: RttPathway,
}

impl ReferralDraft {
    /// Build a draft from a (usually merged) analysis result.
    ///
    /// The patient name is mandatory. Birth dates that are not `YYYY-MM-DD`
    /// are dropped.
    pub fn from_analysis(
        result: &AnalysisResult,
        created_at: DateTime<Utc>,
        today: NaiveDate,
        rtt: &RttConfig,
    ) -> ReferralResult<Self> {
        let patient_info = &result.patient_info;
        let full_name = non_blank(&patient_info.name)
            .ok_or_else(|| ReferralError::MissingField("patientInfo.name".to_string()))?;
        let (given_name, family_name) = split_name(&full_name);

        let birth_date = non_blank(&patient_info.birth_date).and_then(|raw| {
            let parsed = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok();
            if parsed.is_none() {
                tracing::warn!(birth_date = %raw, "dropping unparsable birth date");
            }
            parsed
        });

        let nhs_number = non_blank(&patient_info.nhs_number).map(|raw| {
            normalize_nhs_number(&raw).unwrap_or_else(|| {
                tracing::warn!(nhs_number = %raw, "NHS number failed checksum validation");
                raw
            })
        });

        let patient = NewPatient {
            full_name,
            given_name,
            family_name,
            birth_date,
            gender: non_blank(&patient_info.gender).map(|gender| gender.to_lowercase()),
            nhs_number,
            address: non_blank(&patient_info.address),
            phone: non_blank(&patient_info.phone),
        };

        let referral = NewReferral {
            specialty: non_blank(&result.referral_info.specialty)
                .unwrap_or_else(|| DEFAULT_SPECIALTY.to_string()),
            priority: result.referral_info.priority.unwrap_or_default(),
            urgency: non_blank(&result.referral_info.urgency),
            reason: non_blank(&result.clinical_info.reason),
            status: ReferralStatus::Pending,
            source_confidence: result.confidence,
            created_at,
        };

        let clinical = NewClinicalInfo {
            history: non_blank(&result.clinical_info.history),
            diagnosis: non_blank(&result.clinical_info.diagnosis),
            notes: non_blank(&result.clinical_info.notes),
            medications: result.clinical_info.medications.clone(),
            allergies: result.clinical_info.allergies.clone(),
        };

        let pathway = calculate_pathway(clock_start_from(created_at), today, rtt)?;

        Ok(Self {
            patient,
            referral,
            clinical,
            pathway,
        })
    }
}

/// Format a valid NHS number as `XXX XXX XXXX`.
///
/// Returns `None` when the input is not ten digits or the modulus 11 check
/// digit does not match.
pub fn normalize_nhs_number(raw: &str) -> Option<String> {
    let digits: Vec<u32> = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()?;

    if digits.len() != 10 {
        return None;
    }

    let weighted: u32 = digits
        .iter()
        .take(9)
        .zip((2..=10).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();
    let check = match 11 - weighted % 11 {
        11 => 0,
        10 => return None,
        value => value,
    };
    if check != digits[9] {
        return None;
    }

    let text: String = digits
        .iter()
        .filter_map(|digit| char::from_digit(*digit, 10))
        .collect();
    Some(format!("{} {} {}", &text[0..3], &text[3..6], &text[6..10]))
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn split_name(full_name: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = full_name.split_whitespace().collect();
    match parts.as_slice() {
        [] => (None, None),
        [single] => (None, Some(single.to_string())),
        [given @ .., family] => (Some(given.join(" ")), Some(family.to_string())),
    }
}
