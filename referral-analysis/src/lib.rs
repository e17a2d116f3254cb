//! Document analysis pipeline for referral intake: synthesize per-document
//! results, merge them, and shape the outcome into a referral payload.

use std::thread;
use std::time::{Duration, Instant};

use referral_core::{AnalysisConfig, AnalysisResult, ReferralError, ReferralResult, UploadedFile};

pub mod merge;
pub mod payload;
pub mod synthesizer;
pub mod upload;

pub use merge::{
    merge, MergeRule, ScalarField, TextField, EXTRACTED_TEXT_SEPARATOR, NARRATIVE_SEPARATOR,
    SCALAR_FIELD_RULES,
};
pub use payload::{normalize_nhs_number, NewClinicalInfo, NewPatient, NewReferral, ReferralDraft};
pub use synthesizer::{classify, synthesize, DocumentKind};
pub use upload::validate_upload;

/// Merge analysis results supplied as a JSON array.
pub fn merge_json_str(input: &str) -> ReferralResult<AnalysisResult> {
    let results: Vec<AnalysisResult> =
        serde_json::from_str(input).map_err(|err| ReferralError::Parse(err.to_string()))?;
    merge(results)
}

/// Progress notification emitted after each analysed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    pub file_name: String,
}

/// Runs the mock analysis for uploaded documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentAnalyzer {
    config: AnalysisConfig,
}

impl DocumentAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse a single document, including the simulated service delay.
    pub fn analyze(&self, file_name: &str) -> AnalysisResult {
        let started = Instant::now();
        if self.config.simulated_delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.config.simulated_delay_ms));
        }

        let mut result = synthesize(file_name);
        result.processing_time = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        result
    }

    /// Validate, analyse and merge a batch of uploads.
    ///
    /// All files are validated before the first analysis starts. Files are
    /// processed one after another, in order.
    pub fn analyze_batch<F>(
        &self,
        files: &[UploadedFile],
        mut on_progress: F,
    ) -> ReferralResult<AnalysisResult>
    where
        F: FnMut(&BatchProgress),
    {
        for file in files {
            validate_upload(file, &self.config)?;
        }

        tracing::info!(files = files.len(), "starting document analysis");

        let mut results = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            let result = self.analyze(&file.name);
            tracing::info!(
                file_name = %file.name,
                confidence = result.confidence,
                processing_time_ms = result.processing_time,
                "analysed document"
            );
            results.push(result);
            on_progress(&BatchProgress {
                completed: index + 1,
                total: files.len(),
                file_name: file.name.clone(),
            });
        }

        merge(results)
    }
}
