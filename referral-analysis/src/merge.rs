//! Consolidates per-document analysis results into one result.
//!
//! Scalar fields follow one of two rules, declared in [`SCALAR_FIELD_RULES`]:
//! identity and routing fields take the value of the most confident document,
//! narrative fields keep every document's contribution.

use referral_core::{AnalysisResult, ReferralError, ReferralResult};

/// Separator placed between the extracted texts of merged documents.
pub const EXTRACTED_TEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Separator placed between concatenated narrative values.
pub const NARRATIVE_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    /// Value from the highest-confidence result; ties go to the earliest.
    HighestConfidence,
    /// All non-empty values in input order, joined with [`NARRATIVE_SEPARATOR`].
    Concatenate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    BirthDate,
    Gender,
    NhsNumber,
    Address,
    Phone,
    Reason,
    History,
    Diagnosis,
    Notes,
    Specialty,
    Urgency,
}

impl TextField {
    fn get(self, result: &AnalysisResult) -> Option<&str> {
        let value = match self {
            Self::Name => &result.patient_info.name,
            Self::BirthDate => &result.patient_info.birth_date,
            Self::Gender => &result.patient_info.gender,
            Self::NhsNumber => &result.patient_info.nhs_number,
            Self::Address => &result.patient_info.address,
            Self::Phone => &result.patient_info.phone,
            Self::Reason => &result.clinical_info.reason,
            Self::History => &result.clinical_info.history,
            Self::Diagnosis => &result.clinical_info.diagnosis,
            Self::Notes => &result.clinical_info.notes,
            Self::Specialty => &result.referral_info.specialty,
            Self::Urgency => &result.referral_info.urgency,
        };
        value.as_deref().filter(|text| !text.trim().is_empty())
    }

    fn slot(self, result: &mut AnalysisResult) -> &mut Option<String> {
        match self {
            Self::Name => &mut result.patient_info.name,
            Self::BirthDate => &mut result.patient_info.birth_date,
            Self::Gender => &mut result.patient_info.gender,
            Self::NhsNumber => &mut result.patient_info.nhs_number,
            Self::Address => &mut result.patient_info.address,
            Self::Phone => &mut result.patient_info.phone,
            Self::Reason => &mut result.clinical_info.reason,
            Self::History => &mut result.clinical_info.history,
            Self::Diagnosis => &mut result.clinical_info.diagnosis,
            Self::Notes => &mut result.clinical_info.notes,
            Self::Specialty => &mut result.referral_info.specialty,
            Self::Urgency => &mut result.referral_info.urgency,
        }
    }
}

/// Every scalar of [`AnalysisResult`] that takes part in merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    Text(TextField),
    Priority,
}

pub const SCALAR_FIELD_RULES: [(ScalarField, MergeRule); 13] = [
    (ScalarField::Text(TextField::Name), MergeRule::HighestConfidence),
    (ScalarField::Text(TextField::BirthDate), MergeRule::HighestConfidence),
    (ScalarField::Text(TextField::Gender), MergeRule::HighestConfidence),
    (ScalarField::Text(TextField::NhsNumber), MergeRule::HighestConfidence),
    (ScalarField::Text(TextField::Address), MergeRule::HighestConfidence),
    (ScalarField::Text(TextField::Phone), MergeRule::HighestConfidence),
    (ScalarField::Text(TextField::Reason), MergeRule::Concatenate),
    (ScalarField::Text(TextField::History), MergeRule::Concatenate),
    (ScalarField::Text(TextField::Diagnosis), MergeRule::Concatenate),
    (ScalarField::Text(TextField::Notes), MergeRule::Concatenate),
    (ScalarField::Text(TextField::Specialty), MergeRule::HighestConfidence),
    (ScalarField::Priority, MergeRule::HighestConfidence),
    (ScalarField::Text(TextField::Urgency), MergeRule::HighestConfidence),
];

/// Merge analysis results of several documents.
///
/// An empty input is rejected. A single result is returned unchanged.
pub fn merge(mut results: Vec<AnalysisResult>) -> ReferralResult<AnalysisResult> {
    match results.len() {
        0 => return Err(ReferralError::EmptyMergeInput),
        1 => return results.pop().ok_or(ReferralError::EmptyMergeInput),
        _ => {}
    }

    let mut merged = AnalysisResult::default();

    for (field, rule) in SCALAR_FIELD_RULES {
        match (field, rule) {
            (ScalarField::Text(text), MergeRule::HighestConfidence) => {
                *text.slot(&mut merged) =
                    most_confident(&results, |result| text.get(result)).map(str::to_string);
            }
            (ScalarField::Text(text), MergeRule::Concatenate) => {
                *text.slot(&mut merged) = concatenate(&results, |result| text.get(result));
            }
            // Priority has no narrative form.
            (ScalarField::Priority, _) => {
                merged.referral_info.priority =
                    most_confident(&results, |result| result.referral_info.priority);
            }
        }
    }

    merged.clinical_info.medications =
        union(results.iter().map(|result| &result.clinical_info.medications));
    merged.clinical_info.allergies =
        union(results.iter().map(|result| &result.clinical_info.allergies));

    let count = results.len() as f64;
    merged.confidence = results.iter().map(|result| result.confidence).sum::<f64>() / count;
    merged.processing_time = results.iter().map(|result| result.processing_time).sum();
    merged.extracted_text = results
        .iter()
        .map(|result| result.extracted_text.as_str())
        .collect::<Vec<_>>()
        .join(EXTRACTED_TEXT_SEPARATOR);

    tracing::debug!(
        documents = results.len(),
        confidence = merged.confidence,
        medications = merged.clinical_info.medications.len(),
        allergies = merged.clinical_info.allergies.len(),
        "merged analysis results"
    );

    Ok(merged)
}

fn most_confident<'a, T, F>(results: &'a [AnalysisResult], extract: F) -> Option<T>
where
    F: Fn(&'a AnalysisResult) -> Option<T>,
{
    let mut best: Option<(f64, T)> = None;
    for result in results {
        let Some(value) = extract(result) else {
            continue;
        };
        match &best {
            Some((confidence, _)) if result.confidence <= *confidence => {}
            _ => best = Some((result.confidence, value)),
        }
    }
    best.map(|(_, value)| value)
}

fn concatenate<'a, F>(results: &'a [AnalysisResult], extract: F) -> Option<String>
where
    F: Fn(&'a AnalysisResult) -> Option<&'a str>,
{
    let parts: Vec<&str> = results.iter().filter_map(extract).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(NARRATIVE_SEPARATOR))
    }
}

fn union<'a>(lists: impl Iterator<Item = &'a Vec<String>>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for item in lists.flatten() {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use referral_core::Priority;

    fn scored(confidence: f64) -> AnalysisResult {
        AnalysisResult {
            confidence,
            ..AnalysisResult::default()
        }
    }

    #[test]
    fn confidence_ties_keep_first_value() {
        let results = vec![scored(0.8), scored(0.8)];
        let picked = most_confident(&results, |_| Some("x"));
        assert_eq!(picked, Some("x"));

        let mut a = scored(0.8);
        a.patient_info.name = Some("First".into());
        let mut b = scored(0.8);
        b.patient_info.name = Some("Second".into());
        let merged = merge(vec![a, b]).unwrap();
        assert_eq!(merged.patient_info.name.as_deref(), Some("First"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut a = scored(0.9);
        a.patient_info.phone = Some("   ".into());
        let mut b = scored(0.5);
        b.patient_info.phone = Some("0161".into());
        let merged = merge(vec![a, b]).unwrap();
        assert_eq!(merged.patient_info.phone.as_deref(), Some("0161"));
    }

    #[test]
    fn every_scalar_field_has_exactly_one_rule() {
        let mut seen = Vec::new();
        for (field, _) in SCALAR_FIELD_RULES {
            assert!(!seen.contains(&field));
            seen.push(field);
        }
        assert_eq!(seen.len(), 13);
        assert!(SCALAR_FIELD_RULES
            .contains(&(ScalarField::Priority, MergeRule::HighestConfidence)));
    }

    #[test]
    fn priority_tie_keeps_first_and_skips_missing() {
        let mut a = scored(0.7);
        a.referral_info.priority = None;
        let mut b = scored(0.6);
        b.referral_info.priority = Some(Priority::Routine);
        let mut c = scored(0.6);
        c.referral_info.priority = Some(Priority::Urgent);
        let merged = merge(vec![a, b, c]).unwrap();
        assert_eq!(merged.referral_info.priority, Some(Priority::Routine));
    }
}
