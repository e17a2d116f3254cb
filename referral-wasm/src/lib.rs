//! Bridge WASM <-> JavaScript cho SPA quản lý chuyển tuyến.

use chrono::{DateTime, NaiveDate, Utc};
use referral_analysis::ReferralDraft;
use referral_core::{AnalysisResult, ReferralError, RttConfig};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsRttConfig {
    #[serde(default)]
    medium_risk_days: Option<i64>,
}

impl From<JsRttConfig> for RttConfig {
    fn from(cfg: JsRttConfig) -> Self {
        let mut base = RttConfig::default();
        if let Some(days) = cfg.medium_risk_days {
            base.medium_risk_days = days;
        }
        base
    }
}

/// Phân tích giả lập một tài liệu theo tên tệp (không có độ trễ).
///
/// `processingTime` luôn bằng 0: phía JS tự đo thời gian chờ và ghi đè
/// trường này trước khi gộp kết quả.
#[wasm_bindgen]
pub fn synthesize_document(file_name: &str) -> Result<JsValue, JsValue> {
    init_panic_hook();
    let result = referral_analysis::synthesize(file_name);
    to_value(&result).map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

/// Gộp mảng kết quả phân tích.
#[wasm_bindgen]
pub fn merge_results(results: JsValue) -> Result<JsValue, JsValue> {
    init_panic_hook();
    let results: Vec<AnalysisResult> = from_value(results)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được kết quả: {err}")))?;

    let merged = referral_analysis::merge(results)
        .map_err(|err| JsValue::from_str(&format_referral_error(err)))?;

    to_value(&merged).map_err(|err| JsValue::from_str(&format!("Không serialize kết quả: {err}")))
}

/// Tính lộ trình RTT. `today` mặc định là ngày hiện tại (UTC).
#[wasm_bindgen]
pub fn calculate_pathway(
    clock_start: &str,
    today: Option<String>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    init_panic_hook();
    let clock_start = parse_date(clock_start)?;
    let today = match today {
        Some(value) => parse_date(&value)?,
        None => Utc::now().date_naive(),
    };
    let cfg = read_rtt_config(config)?;

    let pathway = referral_core::calculate_pathway(clock_start, today, &cfg)
        .map_err(|err| JsValue::from_str(&format_referral_error(err)))?;

    to_value(&pathway).map_err(|err| JsValue::from_str(&format!("Không serialize lộ trình: {err}")))
}

/// Dựng payload tạo giấy chuyển tuyến từ kết quả đã gộp.
#[wasm_bindgen]
pub fn build_referral_draft(
    result: JsValue,
    created_at: Option<String>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    init_panic_hook();
    let result: AnalysisResult = from_value(result)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được kết quả: {err}")))?;
    let created_at = match created_at {
        Some(value) => DateTime::parse_from_rfc3339(&value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|err| JsValue::from_str(&format!("Thời điểm không hợp lệ: {err}")))?,
        None => Utc::now(),
    };
    let cfg = read_rtt_config(config)?;

    let draft =
        ReferralDraft::from_analysis(&result, created_at, Utc::now().date_naive(), &cfg)
            .map_err(|err| JsValue::from_str(&format_referral_error(err)))?;

    to_value(&draft).map_err(|err| JsValue::from_str(&format!("Không serialize payload: {err}")))
}

fn read_rtt_config(config: Option<JsValue>) -> Result<RttConfig, JsValue> {
    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsRttConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            RttConfig::from(cfg)
        }
        None => RttConfig::default(),
    };
    cfg.validate()
        .map_err(|err| JsValue::from_str(&format_referral_error(err)))?;
    Ok(cfg)
}

fn parse_date(value: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| JsValue::from_str(&format!("Ngày không hợp lệ {value}: {err}")))
}

fn init_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn format_referral_error(err: ReferralError) -> String {
    format!("Referral error: {err}")
}
