use referral_core::{AnalysisConfig, ReferralError, ReferralResult, UploadedFile};

/// Check an uploaded file against the size and MIME limits.
pub fn validate_upload(file: &UploadedFile, config: &AnalysisConfig) -> ReferralResult<()> {
    if file.size == 0 {
        return Err(ReferralError::EmptyUpload(file.name.clone()));
    }

    if file.size > config.max_upload_bytes {
        return Err(ReferralError::UploadTooLarge {
            name: file.name.clone(),
            size: file.size,
            limit: config.max_upload_bytes,
        });
    }

    let mime_type = file.mime_type.trim().to_lowercase();
    if !config
        .accepted_mime_types
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(&mime_type))
    {
        return Err(ReferralError::UnsupportedMimeType {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
        });
    }

    Ok(())
}
