//! Default values for config fields, including the built-in gamification
//! tables shipped with the binary.

use super::gamification::*;
use crate::progress::BadgeId;

pub fn default_name() -> String {
    "Murshid".to_string()
}

pub fn default_data_dir() -> String {
    "~/.murshid".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_db_path() -> String {
    "~/.murshid/data/murshid.db".to_string()
}

pub fn default_program_days() -> u32 {
    15
}

pub fn default_early_morning_hour() -> u32 {
    8
}

fn rule(kind: ActionKind, points: u32, phrases: &[&str]) -> ActionRule {
    ActionRule {
        kind,
        points,
        phrases: phrases.iter().map(|p| p.to_string()).collect(),
    }
}

/// Recognized phrases, Latin transliteration and Arabic script side by
/// side. Base points only — temporal multipliers live in their own table.
pub fn default_actions() -> Vec<ActionRule> {
    vec![
        rule(
            ActionKind::Bismillah,
            15,
            &["bismillah", "بسم الله"],
        ),
        rule(
            ActionKind::Alhamdulillah,
            20,
            &["alhamdulillah", "al hamdulillah", "الحمد لله"],
        ),
        rule(
            ActionKind::Subhanallah,
            20,
            &["subhanallah", "subhan allah", "سبحان الله"],
        ),
        rule(
            ActionKind::Astaghfirullah,
            25,
            &["astaghfirullah", "astarfullah", "أستغفر الله"],
        ),
        rule(
            ActionKind::AllahuAkbar,
            20,
            &["allahu akbar", "allahou akbar", "الله أكبر"],
        ),
        rule(
            ActionKind::LaIlahaIllallah,
            30,
            &["la ilaha illallah", "لا إله إلا الله"],
        ),
        rule(
            ActionKind::Salawat,
            25,
            &[
                "sallallahu alayhi wa sallam",
                "allahumma salli",
                "صلى الله عليه وسلم",
            ],
        ),
        rule(
            ActionKind::Gratitude,
            10,
            &["thank you", "grateful", "gratitude", "shukran", "جزاك الله"],
        ),
    ]
}

/// Friday outranks time-of-day windows; table order is priority order.
pub fn default_multipliers() -> MultiplierConfig {
    MultiplierConfig {
        enabled: true,
        rules: vec![
            MultiplierRule {
                name: "friday".to_string(),
                factor: 1.5,
                window: MultiplierWindow::Friday,
            },
            MultiplierRule {
                name: "early-morning".to_string(),
                factor: 1.3,
                window: MultiplierWindow::Before { hour: 8 },
            },
            MultiplierRule {
                name: "evening".to_string(),
                factor: 1.2,
                window: MultiplierWindow::After { hour: 20 },
            },
        ],
    }
}

pub fn default_levels() -> LevelTable {
    let table = [
        (1, "Seeker", 0),
        (2, "Student", 100),
        (3, "Devoted", 300),
        (4, "Committed", 700),
        (5, "Steadfast", 1500),
        (6, "Radiant", 3000),
        (7, "Sage", 5000),
    ];
    LevelTable(
        table
            .iter()
            .map(|&(number, name, min_points)| Level {
                number,
                name: name.to_string(),
                min_points,
            })
            .collect(),
    )
}

fn badge(id: &str, label: &str, rule: BadgeRule) -> Badge {
    Badge {
        id: BadgeId::new(id),
        label: label.to_string(),
        rule,
    }
}

pub fn default_badges() -> Vec<Badge> {
    vec![
        badge("first-light", "First Light", BadgeRule::TotalSessions(1)),
        badge("seven-day-flame", "Seven-Day Flame", BadgeRule::MaxStreak(7)),
        badge(
            "hundredfold",
            "Hundredfold Remembrance",
            BadgeRule::DhikrCount(100),
        ),
        badge(
            "before-the-dawn",
            "Before the Dawn",
            BadgeRule::EarlyMorningSessions(10),
        ),
        badge(
            "devoted-day",
            "Devoted Day",
            BadgeRule::ActionsInSingleDay(10),
        ),
        badge(
            "thousand-steps",
            "Thousand Steps",
            BadgeRule::TotalPoints(1000),
        ),
        badge(
            "mountain-mover",
            "Mountain Mover",
            BadgeRule::TotalPoints(5000),
        ),
    ]
}
