//! Mô hình dữ liệu dùng chung cho luồng tiếp nhận giấy chuyển tuyến.

use serde::{Deserialize, Serialize};

pub mod rtt;

pub use rtt::{
    calculate_pathway, classify_breach_risk, clock_start_from, resolve_pathway, target_date,
    InMemoryPathwayStore, PathwayStore, HIGH_RISK_THRESHOLD_DAYS, RTT_TARGET_DAYS,
};

/// Cấu hình tổng cho toàn bộ luồng phân tích và theo dõi RTT.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReferralConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub rtt: RttConfig,
}

impl ReferralConfig {
    /// Đọc cấu hình từ chuỗi JSON, các trường thiếu lấy giá trị mặc định.
    pub fn from_json_str(input: &str) -> ReferralResult<Self> {
        let config: Self =
            serde_json::from_str(input).map_err(|err| ReferralError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Kiểm tra các ngưỡng có hợp lệ không.
    pub fn validate(&self) -> ReferralResult<()> {
        self.analysis.validate()?;
        self.rtt.validate()
    }
}

/// Cấu hình bước phân tích tài liệu tải lên.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Thời gian chờ giả lập (ms) cho mỗi tài liệu.
    pub simulated_delay_ms: u64,
    /// Kích thước tối đa (byte) của một tệp tải lên.
    pub max_upload_bytes: u64,
    /// Danh sách MIME type được chấp nhận.
    pub accepted_mime_types: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            simulated_delay_ms: 2_000,
            max_upload_bytes: 10 * 1024 * 1024,
            accepted_mime_types: vec![
                "application/pdf".to_string(),
                "application/msword".to_string(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string(),
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "text/plain".to_string(),
            ],
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> ReferralResult<()> {
        if self.max_upload_bytes == 0 {
            return Err(ReferralError::InvalidConfig(
                "max_upload_bytes phải lớn hơn 0".to_string(),
            ));
        }
        if self.accepted_mime_types.is_empty() {
            return Err(ReferralError::InvalidConfig(
                "accepted_mime_types không được rỗng".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ngưỡng phân tầng nguy cơ vi phạm RTT.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RttConfig {
    /// Số ngày còn lại dưới mức này (và từ 28 trở lên) được coi là `medium`.
    pub medium_risk_days: i64,
}

impl Default for RttConfig {
    fn default() -> Self {
        Self {
            medium_risk_days: 56,
        }
    }
}

impl RttConfig {
    pub fn validate(&self) -> ReferralResult<()> {
        if self.medium_risk_days <= HIGH_RISK_THRESHOLD_DAYS {
            return Err(ReferralError::InvalidConfig(format!(
                "medium_risk_days ({}) phải lớn hơn {HIGH_RISK_THRESHOLD_DAYS}",
                self.medium_risk_days
            )));
        }
        Ok(())
    }
}

/// Thông tin bệnh nhân trích xuất từ tài liệu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nhs_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Thông tin lâm sàng trích xuất từ tài liệu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub medications: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allergies: Vec<String>,
}

/// Mức ưu tiên của giấy chuyển tuyến.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Routine,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routine => "routine",
            Self::Urgent => "urgent",
        }
    }
}

/// Trạng thái xử lý của giấy chuyển tuyến.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    #[default]
    Pending,
    Accepted,
    Booked,
    Completed,
    Rejected,
    Cancelled,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Booked => "booked",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Thông tin chuyển tuyến (chuyên khoa, mức ưu tiên).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReferralInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
}

/// Kết quả phân tích một tài liệu (hoặc kết quả đã gộp).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub patient_info: PatientInfo,
    #[serde(default)]
    pub clinical_info: ClinicalInfo,
    #[serde(default)]
    pub referral_info: ReferralInfo,
    /// Độ tin cậy trong khoảng [0, 1].
    pub confidence: f64,
    #[serde(default)]
    pub extracted_text: String,
    /// Thời gian xử lý (ms).
    #[serde(default)]
    pub processing_time: u64,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            patient_info: PatientInfo::default(),
            clinical_info: ClinicalInfo::default(),
            referral_info: ReferralInfo::default(),
            confidence: 0.0,
            extracted_text: String::new(),
            processing_time: 0,
        }
    }
}

/// Mô tả tệp người dùng tải lên.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}

/// Phân loại nguy cơ vượt mốc 18 tuần.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BreachRisk {
    Breached,
    High,
    Medium,
    Low,
}

impl BreachRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breached => "breached",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Trạng thái của lộ trình RTT đã lưu.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PathwayStatus {
    Active,
    Paused,
    Completed,
    Breached,
}

/// Lộ trình Referral-to-Treatment của một giấy chuyển tuyến.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RttPathway {
    pub clock_start: chrono::NaiveDate,
    pub target_date: chrono::NaiveDate,
    pub days_remaining: i64,
    pub breach_risk: BreachRisk,
    pub status: PathwayStatus,
}

impl RttPathway {
    pub fn is_breached(&self) -> bool {
        self.breach_risk == BreachRisk::Breached
    }
}

/// Lỗi chung của luồng chuyển tuyến.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReferralError {
    #[error("Không thể gộp danh sách kết quả rỗng")]
    EmptyMergeInput,
    #[error("Thiếu trường bắt buộc: {0}")]
    MissingField(String),
    #[error("Tệp rỗng: {0}")]
    EmptyUpload(String),
    #[error("Tệp {name} quá lớn ({size} byte, giới hạn {limit} byte)")]
    UploadTooLarge { name: String, size: u64, limit: u64 },
    #[error("Tệp {name} có định dạng không hỗ trợ: {mime_type}")]
    UnsupportedMimeType { name: String, mime_type: String },
    #[error("Ngày vượt phạm vi tính toán: {0}")]
    DateOutOfRange(chrono::NaiveDate),
    #[error("Cấu hình không hợp lệ: {0}")]
    InvalidConfig(String),
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Lỗi lưu trữ: {0}")]
    Store(String),
}

pub type ReferralResult<T> = std::result::Result<T, ReferralError>;
