use chrono::{Days, NaiveDate, TimeZone, Utc};
use referral_core::{
    calculate_pathway, resolve_pathway, BreachRisk, InMemoryPathwayStore, PathwayStatus,
    PathwayStore, ReferralConfig, ReferralError, ReferralResult, RttConfig, RttPathway,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("Ngày không hợp lệ")
}

fn days_before(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).expect("Ngày không hợp lệ")
}

#[test]
fn pathway_on_target_day_is_breached() {
    let today = date(2024, 6, 10);
    let pathway = calculate_pathway(days_before(today, 126), today, &RttConfig::default())
        .expect("Không tính được lộ trình");

    assert_eq!(pathway.days_remaining, 0);
    assert_eq!(pathway.breach_risk, BreachRisk::Breached);
    assert_eq!(pathway.status, PathwayStatus::Breached);
    assert_eq!(pathway.target_date, today);
}

#[test]
fn twenty_seven_days_left_is_high_risk() {
    let today = date(2024, 6, 10);
    let pathway = calculate_pathway(days_before(today, 99), today, &RttConfig::default())
        .expect("Không tính được lộ trình");

    assert_eq!(pathway.days_remaining, 27);
    assert_eq!(pathway.breach_risk, BreachRisk::High);
    assert_eq!(pathway.status, PathwayStatus::Active);
}

#[test]
fn twenty_eight_days_left_is_no_longer_high_risk() {
    let today = date(2024, 6, 10);
    let pathway = calculate_pathway(days_before(today, 98), today, &RttConfig::default())
        .expect("Không tính được lộ trình");

    assert_eq!(pathway.days_remaining, 28);
    assert_ne!(pathway.breach_risk, BreachRisk::High);
    assert_eq!(pathway.breach_risk, BreachRisk::Medium);
}

#[test]
fn overdue_pathway_has_negative_days() {
    let today = date(2024, 6, 10);
    let pathway = calculate_pathway(days_before(today, 140), today, &RttConfig::default())
        .expect("Không tính được lộ trình");

    assert_eq!(pathway.days_remaining, -14);
    assert!(pathway.is_breached());
}

#[test]
fn future_clock_start_is_low_risk() {
    let today = date(2024, 6, 10);
    let pathway = calculate_pathway(date(2024, 7, 1), today, &RttConfig::default())
        .expect("Không tính được lộ trình");

    assert_eq!(pathway.days_remaining, 147);
    assert_eq!(pathway.breach_risk, BreachRisk::Low);
}

#[test]
fn target_date_is_exactly_126_days_across_boundaries() {
    let config = RttConfig::default();
    let today = date(2024, 1, 1);
    for clock_start in [
        date(2023, 12, 31),
        date(2023, 10, 28),
        date(2024, 1, 31),
        date(2024, 2, 29),
        date(2023, 2, 28),
        date(1999, 11, 15),
    ] {
        let pathway =
            calculate_pathway(clock_start, today, &config).expect("Không tính được lộ trình");
        assert_eq!(
            pathway
                .target_date
                .signed_duration_since(pathway.clock_start)
                .num_days(),
            126,
            "clock start {clock_start}"
        );
    }

    let leap = calculate_pathway(date(2024, 1, 1), today, &config).expect("Không tính được");
    assert_eq!(leap.target_date, date(2024, 5, 6));
    let plain = calculate_pathway(date(2023, 1, 1), today, &config).expect("Không tính được");
    assert_eq!(plain.target_date, date(2023, 5, 7));
}

#[test]
fn custom_medium_threshold_moves_low_boundary() {
    let config = RttConfig {
        medium_risk_days: 42,
    };
    let today = date(2024, 6, 10);
    let pathway = calculate_pathway(days_before(today, 84), today, &config)
        .expect("Không tính được lộ trình");

    assert_eq!(pathway.days_remaining, 42);
    assert_eq!(pathway.breach_risk, BreachRisk::Low);
}

#[test]
fn medium_threshold_must_exceed_high_threshold() {
    let config = RttConfig {
        medium_risk_days: 28,
    };
    assert!(matches!(
        config.validate(),
        Err(ReferralError::InvalidConfig(_))
    ));
}

#[test]
fn partial_config_json_falls_back_to_defaults() {
    let config = ReferralConfig::from_json_str(r#"{ "rtt": { "medium_risk_days": 70 } }"#)
        .expect("Cấu hình không hợp lệ");

    assert_eq!(config.rtt.medium_risk_days, 70);
    assert_eq!(config.analysis.simulated_delay_ms, 2_000);
}

#[test]
fn resolve_pathway_computes_and_persists_when_missing() {
    let mut store = InMemoryPathwayStore::new();
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 15, 45, 0).unwrap();
    let today = date(2024, 6, 10);

    let pathway = resolve_pathway(
        &mut store,
        "ref-001",
        created_at,
        today,
        &RttConfig::default(),
    )
    .expect("Không tính được lộ trình");

    assert_eq!(pathway.clock_start, date(2024, 3, 1));
    assert_eq!(pathway.target_date, date(2024, 7, 5));
    assert_eq!(store.get("ref-001"), Some(&pathway));
}

#[test]
fn resolve_pathway_returns_stored_record_verbatim() {
    let mut store = InMemoryPathwayStore::new();
    let stored = RttPathway {
        clock_start: date(2024, 1, 1),
        target_date: date(2024, 5, 6),
        days_remaining: 12,
        breach_risk: BreachRisk::High,
        status: PathwayStatus::Paused,
    };
    store.upsert("ref-002", &stored).expect("Không lưu được");

    let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let pathway = resolve_pathway(
        &mut store,
        "ref-002",
        created_at,
        date(2024, 6, 10),
        &RttConfig::default(),
    )
    .expect("Không đọc được lộ trình");

    assert_eq!(pathway, stored);
}

struct FailingStore;

impl PathwayStore for FailingStore {
    fn load(&self, _referral_id: &str) -> ReferralResult<Option<RttPathway>> {
        Ok(None)
    }

    fn upsert(&mut self, _referral_id: &str, _pathway: &RttPathway) -> ReferralResult<()> {
        Err(ReferralError::Store("offline".to_string()))
    }
}

#[test]
fn failed_persist_does_not_fail_resolution() {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let pathway = resolve_pathway(
        &mut FailingStore,
        "ref-003",
        created_at,
        date(2024, 3, 1),
        &RttConfig::default(),
    )
    .expect("Lỗi ghi không được làm hỏng kết quả");

    assert_eq!(pathway.days_remaining, 126);
    assert_eq!(pathway.breach_risk, BreachRisk::Low);
}
