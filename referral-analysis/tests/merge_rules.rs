use referral_analysis::{merge, merge_json_str, synthesize, EXTRACTED_TEXT_SEPARATOR};
use referral_core::{AnalysisResult, Priority, ReferralError};

fn result(confidence: f64) -> AnalysisResult {
    AnalysisResult {
        confidence,
        ..AnalysisResult::default()
    }
}

#[test]
fn merging_single_result_is_identity() {
    let mut only = synthesize("Referral_Letter.pdf");
    only.processing_time = 1234;
    only.clinical_info.medications.push("Aspirin 75mg".to_string());

    let merged = merge(vec![only.clone()]).expect("Không gộp được");
    assert_eq!(merged, only);
}

#[test]
fn empty_input_is_rejected() {
    assert_eq!(merge(Vec::new()), Err(ReferralError::EmptyMergeInput));
    assert_eq!(merge_json_str("[]"), Err(ReferralError::EmptyMergeInput));
}

#[test]
fn confidence_is_mean_and_time_is_sum() {
    let mut a = result(0.6);
    a.processing_time = 2000;
    let mut b = result(0.9);
    b.processing_time = 2100;

    let merged = merge(vec![a, b]).expect("Không gộp được");
    assert!((merged.confidence - 0.75).abs() < 1e-12);
    assert_eq!(merged.processing_time, 4100);
}

#[test]
fn lists_are_unioned_in_first_seen_order() {
    let mut a = result(0.5);
    a.clinical_info.medications = vec!["Aspirin".to_string()];
    a.clinical_info.allergies = vec!["Latex".to_string()];
    let mut b = result(0.5);
    b.clinical_info.medications = vec!["Aspirin".to_string(), "Statin".to_string()];
    b.clinical_info.allergies = vec!["Penicillin".to_string(), "Latex".to_string()];

    let merged = merge(vec![a, b]).expect("Không gộp được");
    assert_eq!(merged.clinical_info.medications, vec!["Aspirin", "Statin"]);
    assert_eq!(merged.clinical_info.allergies, vec!["Latex", "Penicillin"]);
}

#[test]
fn identity_fields_come_from_most_confident_result() {
    let mut a = result(0.6);
    a.patient_info.name = Some("X".to_string());
    a.patient_info.address = Some("1 Low Road".to_string());
    a.referral_info.priority = Some(Priority::Routine);
    let mut b = result(0.9);
    b.patient_info.name = Some("Y".to_string());
    b.referral_info.priority = Some(Priority::Urgent);

    let merged = merge(vec![a, b]).expect("Không gộp được");
    assert_eq!(merged.patient_info.name.as_deref(), Some("Y"));
    assert_eq!(merged.patient_info.address.as_deref(), Some("1 Low Road"));
    assert_eq!(merged.referral_info.priority, Some(Priority::Urgent));
    assert_eq!(merged.patient_info.phone, None);
}

#[test]
fn narrative_fields_are_concatenated() {
    let mut a = result(0.9);
    a.clinical_info.reason = Some("Chest pain".to_string());
    a.clinical_info.history = Some("Hypertension".to_string());
    let mut b = result(0.4);
    b.clinical_info.reason = Some("Raised CRP".to_string());
    let c = result(0.7);

    let merged = merge(vec![a, b, c]).expect("Không gộp được");
    assert_eq!(
        merged.clinical_info.reason.as_deref(),
        Some("Chest pain; Raised CRP")
    );
    assert_eq!(merged.clinical_info.history.as_deref(), Some("Hypertension"));
    assert_eq!(merged.clinical_info.diagnosis, None);
}

#[test]
fn extracted_text_keeps_document_boundaries() {
    let letter = synthesize("Referral_Letter.pdf");
    let labs = synthesize("Blood_Test_Results.pdf");
    let expected = format!(
        "{}{}{}",
        letter.extracted_text, EXTRACTED_TEXT_SEPARATOR, labs.extracted_text
    );

    let merged = merge(vec![letter, labs]).expect("Không gộp được");
    assert_eq!(merged.extracted_text, expected);
}

#[test]
fn merging_templates_prefers_referral_letter_identity() {
    let merged = merge(vec![
        synthesize("Blood_Test_Results.pdf"),
        synthesize("Referral_Letter.pdf"),
        synthesize("Discharge_Summary.docx"),
    ])
    .expect("Không gộp được");

    assert_eq!(merged.patient_info.name.as_deref(), Some("John Smith"));
    assert_eq!(merged.referral_info.specialty.as_deref(), Some("Cardiology"));
    assert_eq!(merged.clinical_info.medications.len(), 7);
    assert_eq!(
        merged.clinical_info.allergies,
        vec!["Penicillin", "Sulfonamides"]
    );
    assert!((merged.confidence - (0.78 + 0.92 + 0.88) / 3.0).abs() < 1e-12);
}

#[test]
fn json_input_is_parsed_before_merging() {
    let input = r#"[
        { "confidence": 0.5, "patientInfo": { "name": "A" } },
        { "confidence": 0.7, "patientInfo": { "name": "B" }, "clinicalInfo": { "medications": ["Statin"] } }
    ]"#;
    let merged = merge_json_str(input).expect("Không gộp được");
    assert_eq!(merged.patient_info.name.as_deref(), Some("B"));
    assert_eq!(merged.clinical_info.medications, vec!["Statin"]);

    assert!(matches!(
        merge_json_str("not json"),
        Err(ReferralError::Parse(_))
    ));
}
