//! Tính lộ trình Referral-to-Treatment (mốc 18 tuần).
//!
//! "Hôm nay" luôn được truyền vào từ tầng gọi ngoài cùng để kết quả có thể
//! kiểm thử mà không cần giả lập đồng hồ.

use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::{BreachRisk, PathwayStatus, ReferralError, ReferralResult, RttConfig, RttPathway};

/// Số ngày mục tiêu của lộ trình RTT (18 tuần).
pub const RTT_TARGET_DAYS: u64 = 126;

/// Dưới ngưỡng này (và còn dương) lộ trình có nguy cơ `high`.
pub const HIGH_RISK_THRESHOLD_DAYS: i64 = 28;

/// Ngày mục tiêu = clock start + 126 ngày.
pub fn target_date(clock_start: NaiveDate) -> ReferralResult<NaiveDate> {
    clock_start
        .checked_add_days(Days::new(RTT_TARGET_DAYS))
        .ok_or(ReferralError::DateOutOfRange(clock_start))
}

/// Phân tầng nguy cơ theo số ngày còn lại.
pub fn classify_breach_risk(days_remaining: i64, config: &RttConfig) -> BreachRisk {
    match days_remaining {
        days if days <= 0 => BreachRisk::Breached,
        days if days < HIGH_RISK_THRESHOLD_DAYS => BreachRisk::High,
        days if days < config.medium_risk_days => BreachRisk::Medium,
        _ => BreachRisk::Low,
    }
}

/// Tính lộ trình RTT từ ngày bắt đầu đếm giờ.
pub fn calculate_pathway(
    clock_start: NaiveDate,
    today: NaiveDate,
    config: &RttConfig,
) -> ReferralResult<RttPathway> {
    let target = target_date(clock_start)?;
    let days_remaining = target.signed_duration_since(today).num_days();
    let breach_risk = classify_breach_risk(days_remaining, config);
    let status = if breach_risk == BreachRisk::Breached {
        PathwayStatus::Breached
    } else {
        PathwayStatus::Active
    };

    Ok(RttPathway {
        clock_start,
        target_date: target,
        days_remaining,
        breach_risk,
        status,
    })
}

/// Cắt thời điểm tạo giấy chuyển tuyến về ngày để làm clock start.
pub fn clock_start_from(created_at: DateTime<Utc>) -> NaiveDate {
    created_at.date_naive()
}

/// Nơi lưu lộ trình RTT, khoá theo mã giấy chuyển tuyến.
pub trait PathwayStore {
    fn load(&self, referral_id: &str) -> ReferralResult<Option<RttPathway>>;
    fn upsert(&mut self, referral_id: &str, pathway: &RttPathway) -> ReferralResult<()>;
}

/// Bản lưu trong bộ nhớ (mock/testing).
#[derive(Debug, Default, Clone)]
pub struct InMemoryPathwayStore {
    pathways: HashMap<String, RttPathway>,
}

impl InMemoryPathwayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pathways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }

    pub fn get(&self, referral_id: &str) -> Option<&RttPathway> {
        self.pathways.get(referral_id)
    }
}

impl PathwayStore for InMemoryPathwayStore {
    fn load(&self, referral_id: &str) -> ReferralResult<Option<RttPathway>> {
        Ok(self.pathways.get(referral_id).cloned())
    }

    fn upsert(&mut self, referral_id: &str, pathway: &RttPathway) -> ReferralResult<()> {
        self.pathways
            .insert(referral_id.to_string(), pathway.clone());
        Ok(())
    }
}

/// Lấy lộ trình đã lưu, hoặc tính mới từ thời điểm tạo và ghi lại.
///
/// Lỗi khi ghi chỉ được log; lộ trình vừa tính vẫn được trả về.
pub fn resolve_pathway<S: PathwayStore + ?Sized>(
    store: &mut S,
    referral_id: &str,
    created_at: DateTime<Utc>,
    today: NaiveDate,
    config: &RttConfig,
) -> ReferralResult<RttPathway> {
    if let Some(stored) = store.load(referral_id)? {
        tracing::debug!(referral_id, "using persisted RTT pathway");
        return Ok(stored);
    }

    let pathway = calculate_pathway(clock_start_from(created_at), today, config)?;
    tracing::debug!(
        referral_id,
        days_remaining = pathway.days_remaining,
        breach_risk = pathway.breach_risk.as_str(),
        "computed RTT pathway"
    );

    if let Err(err) = store.upsert(referral_id, &pathway) {
        tracing::warn!(referral_id, error = %err, "failed to persist RTT pathway");
    }

    Ok(pathway)
}
