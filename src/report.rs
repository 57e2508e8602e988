//! Display-ready figures derived from the progress tracker.

use crate::progress::{DailyProgress, DayTotal, DAILY_GOAL_SECS};

/// `mm:ss`, zero padded. Negative input renders as `00:00`.
pub fn format_mmss(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Share of the displayed daily goal, rounded and capped at 100.
pub fn goal_percent(seconds: u64) -> u8 {
    let pct = (seconds as f64 / DAILY_GOAL_SECS as f64 * 100.0).round();
    pct.min(100.0) as u8
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBar {
    /// `MM-DD`
    pub label: String,
    pub seconds: u64,
    pub percent: u8,
}

impl From<&DayTotal> for DayBar {
    fn from(d: &DayTotal) -> Self {
        let key = d.key();
        Self {
            label: key[5..].to_string(),
            seconds: d.seconds,
            percent: goal_percent(d.seconds),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSummary {
    pub today_seconds: u64,
    pub today_clock: String,
    pub percent: u8,
    pub streak: u32,
    pub week: Vec<DayBar>,
}

impl ProgressSummary {
    pub fn from_totals(today_seconds: u64, streak: u32, week: &[DayTotal]) -> Self {
        Self {
            today_seconds,
            today_clock: format_mmss(today_seconds as i64),
            percent: goal_percent(today_seconds),
            streak,
            week: week.iter().map(DayBar::from).collect(),
        }
    }

    pub fn of(progress: &DailyProgress) -> Self {
        Self::from_totals(
            progress.today_seconds(),
            progress.streak(),
            &progress.week_data(),
        )
    }

    pub fn goal_minutes(&self) -> u64 {
        DAILY_GOAL_SECS / 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::parse_day_key;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(5), "00:05");
        assert_eq!(format_mmss(65), "01:05");
        assert_eq!(format_mmss(600), "10:00");
    }

    #[test]
    fn negative_seconds_clamp_to_zero() {
        assert_eq!(format_mmss(-3), "00:00");
        assert_eq!(format_mmss(i64::MIN), "00:00");
    }

    #[test]
    fn formatting_is_zero_padded_for_all_small_values() {
        for s in 0..3600i64 {
            let text = format_mmss(s);
            let (m, sec) = text.split_once(':').unwrap();
            assert_eq!(m.len(), 2);
            assert_eq!(sec.len(), 2);
            assert_eq!(m.parse::<i64>().unwrap() * 60 + sec.parse::<i64>().unwrap(), s);
        }
    }

    #[test]
    fn percent_is_relative_to_fifteen_minutes_and_capped() {
        assert_eq!(goal_percent(0), 0);
        assert_eq!(goal_percent(450), 50);
        // streak threshold is only two thirds of the visible goal
        assert_eq!(goal_percent(600), 67);
        assert_eq!(goal_percent(900), 100);
        assert_eq!(goal_percent(5000), 100);
    }

    #[test]
    fn summary_labels_week_bars_by_month_and_day() {
        let week = vec![
            DayTotal {
                day: parse_day_key("2024-04-30").unwrap(),
                seconds: 0,
            },
            DayTotal {
                day: parse_day_key("2024-05-01").unwrap(),
                seconds: 90,
            },
        ];
        let summary = ProgressSummary::from_totals(90, 3, &week);
        assert_eq!(summary.today_clock, "01:30");
        assert_eq!(summary.percent, 10);
        assert_eq!(summary.streak, 3);
        assert_eq!(summary.week[0].label, "04-30");
        assert_eq!(summary.week[1].label, "05-01");
        assert_eq!(summary.week[1].percent, 10);
        assert_eq!(summary.goal_minutes(), 15);
    }
}
