use super::*;
use chrono::NaiveDate;

fn at(y: i32, m: u32, d: u32, h: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

#[test]
fn test_default_config_validates() {
    let config = Config::default();
    config.validate().unwrap();
}

#[test]
fn test_level_of_is_total_and_monotone() {
    let levels = Config::default().gamification.levels;
    assert_eq!(levels.level_of(0).number, 1);

    let mut previous = 0;
    for points in [0u64, 1, 99, 100, 299, 300, 4999, 5000, 1_000_000] {
        let level = levels.level_of(points);
        assert!(level.number >= previous, "level dropped at {points} points");
        previous = level.number;
    }
}

#[test]
fn test_progress_interpolates_between_thresholds() {
    let levels = Config::default().gamification.levels;
    // Halfway between 100 and 300.
    let progress = levels.progress(200);
    assert_eq!(progress.percent, 50);
    assert_eq!(progress.points_needed, 100);
    assert_eq!(progress.next.unwrap().min_points, 300);
}

#[test]
fn test_progress_at_max_level() {
    let levels = Config::default().gamification.levels;
    let progress = levels.progress(999_999);
    assert_eq!(progress.percent, 100);
    assert_eq!(progress.points_needed, 0);
    assert!(progress.next.is_none());
}

#[test]
fn test_level_table_rejects_empty_at_construction() {
    assert!(LevelTable::try_from(Vec::new()).is_err());
    // Deserialization goes through the same validation.
    assert!(serde_json::from_str::<LevelTable>("[]").is_err());
}

#[test]
fn test_non_increasing_thresholds_rejected() {
    let mut config = GamificationConfig::default();
    config.levels.0[2].min_points = config.levels.0[1].min_points;
    assert!(matches!(config.validate(), Err(CoachError::Config(_))));
}

#[test]
fn test_first_level_must_start_at_zero() {
    let mut config = GamificationConfig::default();
    config.levels.0[0].min_points = 10;
    assert!(config.validate().is_err());
}

#[test]
fn test_duplicate_badge_id_rejected() {
    let mut config = GamificationConfig::default();
    let dup = config.badges[0].clone();
    config.badges.push(dup);
    assert!(matches!(config.validate(), Err(CoachError::Config(_))));
}

#[test]
fn test_empty_phrase_list_rejected() {
    let mut config = GamificationConfig::default();
    config.actions[0].phrases.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_friday_outranks_time_of_day() {
    let multipliers = default_config_multipliers();
    // 2026-01-02 is a Friday; 07:00 also falls in the early-morning window.
    let rule = multipliers.active_rule(at(2026, 1, 2, 7)).unwrap();
    assert_eq!(rule.name, "friday");
    assert_eq!(rule.factor, 1.5);
}

#[test]
fn test_time_of_day_windows() {
    let multipliers = default_config_multipliers();
    // 2026-01-05 is a Monday.
    assert_eq!(
        multipliers.active_rule(at(2026, 1, 5, 7)).unwrap().name,
        "early-morning"
    );
    assert_eq!(
        multipliers.active_rule(at(2026, 1, 5, 21)).unwrap().name,
        "evening"
    );
    assert!(multipliers.active_rule(at(2026, 1, 5, 12)).is_none());
}

#[test]
fn test_disabled_multipliers_never_match() {
    let mut multipliers = default_config_multipliers();
    multipliers.enabled = false;
    assert!(multipliers.active_rule(at(2026, 1, 2, 7)).is_none());
}

#[test]
fn test_badge_rules_are_threshold_checks() {
    use crate::progress::UserProgress;

    let progress = UserProgress {
        total_points: 4999,
        ..Default::default()
    };
    assert!(!BadgeRule::TotalPoints(5000).satisfied(&progress));

    let progress = UserProgress {
        total_points: 5000,
        ..Default::default()
    };
    assert!(BadgeRule::TotalPoints(5000).satisfied(&progress));
}

#[test]
fn test_partial_toml_overrides_merge_with_defaults() {
    let toml = r#"
        [coach]
        name = "Rafiq"

        [gamification]
        program_days = 21
    "#;
    let config: Config = toml::from_str(toml).unwrap();
    config.validate().unwrap();
    assert_eq!(config.coach.name, "Rafiq");
    assert_eq!(config.gamification.program_days, 21);
    // Untouched sections keep their defaults.
    assert_eq!(config.gamification.levels.0[0].min_points, 0);
    assert!(!config.gamification.actions.is_empty());
}

#[test]
fn test_multiplier_rules_round_trip_toml() {
    let toml = r#"
        enabled = true

        [[rules]]
        name = "friday"
        factor = 1.5
        when = "friday"

        [[rules]]
        name = "early-morning"
        factor = 1.3
        when = "before"
        hour = 8
    "#;
    let multipliers: MultiplierConfig = toml::from_str(toml).unwrap();
    assert_eq!(multipliers.rules.len(), 2);
    assert!(matches!(
        multipliers.rules[1].window,
        MultiplierWindow::Before { hour: 8 }
    ));
}

fn default_config_multipliers() -> MultiplierConfig {
    Config::default().gamification.multipliers
}
