//! One-off migration of the prototype's mock dataset into relational rows.
//!
//! The job is linear and ordered by foreign keys. Rows that cannot be
//! translated are skipped and reported; a bad row never aborts the run.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use referral_core::{
    calculate_pathway, clock_start_from, PathwayStatus, Priority, ReferralError, ReferralStatus,
    RttConfig,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod dataset;
pub mod tables;

pub use dataset::{MockDataset, MockPatient, MockPractitioner, MockReferral};
pub use tables::{
    AllergyRow, Gender, IdMap, MedicationRow, PathwayRow, PatientRow, PractitionerRow,
    ReferralRow, Tables,
};

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("failed to parse mock dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Referral(#[from] ReferralError),
}

pub type MigrationResult<T> = std::result::Result<T, MigrationError>;

/// A row that was skipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowFailure {
    pub table: String,
    pub legacy_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MigrationReport {
    pub practitioners: usize,
    pub patients: usize,
    pub referrals: usize,
    pub allergies: usize,
    pub medications: usize,
    pub rtt_pathways: usize,
    /// Patients folded into an earlier record with the same NHS number.
    pub duplicate_patients: usize,
    pub failures: Vec<RowFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MigrationOutcome {
    pub tables: Tables,
    pub id_map: IdMap,
    pub report: MigrationReport,
}

/// Parse a JSON dataset and migrate it.
pub fn migrate_json_str(
    input: &str,
    today: NaiveDate,
    rtt: &RttConfig,
) -> MigrationResult<MigrationOutcome> {
    rtt.validate()?;
    let dataset: MockDataset = serde_json::from_str(input)?;
    Ok(migrate(dataset, today, rtt))
}

/// Migrate the dataset: practitioners, patients, referrals, allergies,
/// medications, then RTT pathways.
pub fn migrate(dataset: MockDataset, today: NaiveDate, rtt: &RttConfig) -> MigrationOutcome {
    let mut job = Migration::default();

    for practitioner in dataset.practitioners {
        job.insert_practitioner(practitioner);
    }

    let mut clinical_lists = Vec::new();
    for patient in dataset.patients {
        if let Some(entry) = job.insert_patient(patient) {
            clinical_lists.push(entry);
        }
    }

    let mut created = Vec::new();
    for referral in dataset.referrals {
        if let Some(entry) = job.insert_referral(referral) {
            created.push(entry);
        }
    }

    for (patient_id, allergies, _) in &clinical_lists {
        for substance in allergies {
            job.insert_allergy(*patient_id, substance);
        }
    }
    for (patient_id, _, medications) in &clinical_lists {
        for name in medications {
            job.insert_medication(*patient_id, name);
        }
    }

    for (referral_id, legacy_id, created_at, status) in created {
        match calculate_pathway(clock_start_from(created_at), today, rtt) {
            Ok(mut pathway) => {
                if is_closed(status) {
                    pathway.status = PathwayStatus::Completed;
                }
                job.tables.rtt_pathways.push(PathwayRow {
                    referral_id,
                    pathway,
                });
                job.report.rtt_pathways += 1;
            }
            Err(err) => job.fail("rtt_pathways", &legacy_id, err.to_string()),
        }
    }

    tracing::info!(
        practitioners = job.report.practitioners,
        patients = job.report.patients,
        referrals = job.report.referrals,
        allergies = job.report.allergies,
        medications = job.report.medications,
        failures = job.report.failures.len(),
        "migration finished"
    );

    MigrationOutcome {
        tables: job.tables,
        id_map: job.id_map,
        report: job.report,
    }
}

#[derive(Default)]
struct Migration {
    tables: Tables,
    id_map: IdMap,
    report: MigrationReport,
    patients_by_nhs: HashMap<String, Uuid>,
    seen_allergies: HashSet<(Uuid, String)>,
    seen_medications: HashSet<(Uuid, String)>,
}

impl Migration {
    fn insert_practitioner(&mut self, practitioner: MockPractitioner) {
        if self.id_map.practitioners.contains_key(&practitioner.id) {
            self.fail("practitioners", &practitioner.id, "duplicate legacy id");
            return;
        }

        let id = remap("practitioners", &practitioner.id);
        self.id_map
            .practitioners
            .insert(practitioner.id.clone(), id);
        self.tables.practitioners.push(PractitionerRow {
            id,
            legacy_id: practitioner.id,
            name: practitioner.name.trim().to_string(),
            role: non_blank(practitioner.role),
            specialty: non_blank(practitioner.specialty),
            email: non_blank(practitioner.email).map(|email| email.to_lowercase()),
        });
        self.report.practitioners += 1;
    }

    /// Returns the patient's clinical lists to insert once referrals are done.
    fn insert_patient(&mut self, patient: MockPatient) -> Option<(Uuid, Vec<String>, Vec<String>)> {
        if self.id_map.patients.contains_key(&patient.id) {
            self.fail("patients", &patient.id, "duplicate legacy id");
            return None;
        }

        let nhs_number = non_blank(patient.nhs_number);
        let nhs_key = nhs_number
            .as_deref()
            .map(|raw| raw.chars().filter(char::is_ascii_digit).collect::<String>())
            .filter(|digits| !digits.is_empty());

        if let Some(existing) = nhs_key
            .as_ref()
            .and_then(|key| self.patients_by_nhs.get(key))
            .copied()
        {
            tracing::info!(
                legacy_id = %patient.id,
                patient_id = %existing,
                "folding duplicate patient into existing record"
            );
            self.id_map.patients.insert(patient.id, existing);
            self.report.duplicate_patients += 1;
            return Some((existing, patient.allergies, patient.medications));
        }

        let birth_date = match non_blank(patient.date_of_birth) {
            Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    self.fail("patients", &patient.id, format!("invalid date of birth {raw}"));
                    return None;
                }
            },
            None => None,
        };

        let gender = translate_gender(patient.gender.as_deref());
        let id = remap("patients", &patient.id);
        if let Some(key) = nhs_key {
            self.patients_by_nhs.insert(key, id);
        }
        self.id_map.patients.insert(patient.id.clone(), id);
        self.tables.patients.push(PatientRow {
            id,
            legacy_id: patient.id,
            full_name: patient.name.trim().to_string(),
            birth_date,
            gender,
            nhs_number,
            address: non_blank(patient.address),
            phone: non_blank(patient.phone),
        });
        self.report.patients += 1;

        Some((id, patient.allergies, patient.medications))
    }

    /// Returns what the pathway step needs for this referral.
    fn insert_referral(
        &mut self,
        referral: MockReferral,
    ) -> Option<(Uuid, String, DateTime<Utc>, ReferralStatus)> {
        if self.id_map.referrals.contains_key(&referral.id) {
            self.fail("referrals", &referral.id, "duplicate legacy id");
            return None;
        }

        let Some(patient_id) = self.id_map.patients.get(&referral.patient_id).copied() else {
            self.fail(
                "referrals",
                &referral.id,
                format!("unknown patient {}", referral.patient_id),
            );
            return None;
        };

        let referrer_id = match non_blank(referral.referrer_id) {
            Some(legacy) => {
                let mapped = self.id_map.practitioners.get(&legacy).copied();
                if mapped.is_none() {
                    tracing::warn!(
                        legacy_id = %referral.id,
                        referrer = %legacy,
                        "referrer not found, leaving referral unassigned"
                    );
                }
                mapped
            }
            None => None,
        };

        let Some(priority) = translate_priority(&referral.priority) else {
            self.fail(
                "referrals",
                &referral.id,
                format!("unknown priority {}", referral.priority),
            );
            return None;
        };

        let Some(status) = translate_status(&referral.status) else {
            self.fail(
                "referrals",
                &referral.id,
                format!("unknown status {}", referral.status),
            );
            return None;
        };

        let created_at = match parse_timestamp(&referral.created_at) {
            Some(created_at) => created_at,
            None => {
                self.fail(
                    "referrals",
                    &referral.id,
                    format!("invalid created_at {}", referral.created_at),
                );
                return None;
            }
        };

        let id = remap("referrals", &referral.id);
        self.id_map.referrals.insert(referral.id.clone(), id);
        self.tables.referrals.push(ReferralRow {
            id,
            legacy_id: referral.id.clone(),
            patient_id,
            referrer_id,
            specialty: referral.specialty.trim().to_string(),
            priority,
            status,
            reason: non_blank(referral.reason),
            ubrn: non_blank(referral.ubrn),
            created_at,
        });
        self.report.referrals += 1;

        Some((id, referral.id, created_at, status))
    }

    fn insert_allergy(&mut self, patient_id: Uuid, substance: &str) {
        let substance = substance.trim();
        if substance.is_empty() {
            return;
        }
        let key = (patient_id, substance.to_lowercase());
        if !self.seen_allergies.insert(key.clone()) {
            return;
        }
        self.tables.allergies.push(AllergyRow {
            id: remap("allergies", &format!("{}:{}", key.0, key.1)),
            patient_id,
            substance: substance.to_string(),
        });
        self.report.allergies += 1;
    }

    fn insert_medication(&mut self, patient_id: Uuid, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let key = (patient_id, name.to_lowercase());
        if !self.seen_medications.insert(key.clone()) {
            return;
        }
        self.tables.medications.push(MedicationRow {
            id: remap("medications", &format!("{}:{}", key.0, key.1)),
            patient_id,
            name: name.to_string(),
        });
        self.report.medications += 1;
    }

    fn fail(&mut self, table: &str, legacy_id: &str, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(table, legacy_id, reason = %reason, "skipping row");
        self.report.failures.push(RowFailure {
            table: table.to_string(),
            legacy_id: legacy_id.to_string(),
            reason,
        });
    }
}

/// Deterministic UUID for a legacy key within a table.
pub fn remap(table: &str, legacy_id: &str) -> Uuid {
    let namespace = Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("referral/{table}").as_bytes());
    Uuid::new_v5(&namespace, legacy_id.as_bytes())
}

pub fn translate_priority(raw: &str) -> Option<Priority> {
    match raw.trim().to_lowercase().as_str() {
        "routine" => Some(Priority::Routine),
        "urgent" | "2ww" | "two week wait" | "two-week-wait" => Some(Priority::Urgent),
        _ => None,
    }
}

pub fn translate_status(raw: &str) -> Option<ReferralStatus> {
    match raw.trim().to_lowercase().as_str() {
        "new" | "pending" => Some(ReferralStatus::Pending),
        "triaged" | "accepted" => Some(ReferralStatus::Accepted),
        "booked" => Some(ReferralStatus::Booked),
        "seen" | "completed" => Some(ReferralStatus::Completed),
        "declined" | "rejected" => Some(ReferralStatus::Rejected),
        "cancelled" | "canceled" => Some(ReferralStatus::Cancelled),
        _ => None,
    }
}

pub fn translate_gender(raw: Option<&str>) -> Gender {
    match raw.map(|value| value.trim().to_lowercase()).as_deref() {
        Some("m") | Some("male") => Gender::Male,
        Some("f") | Some("female") => Gender::Female,
        Some("o") | Some("other") => Gender::Other,
        _ => Gender::Unknown,
    }
}

/// A closed referral stops its RTT clock.
fn is_closed(status: ReferralStatus) -> bool {
    matches!(
        status,
        ReferralStatus::Completed | ReferralStatus::Rejected | ReferralStatus::Cancelled
    )
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
