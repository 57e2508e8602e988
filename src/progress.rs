use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::store::{self, KvStore};

pub const DAILY_KEY: &str = "daily_seconds";
pub const META_KEY: &str = "streak_meta";

/// Seconds of practice a day needs to count toward the streak.
pub const STREAK_THRESHOLD_SECS: u64 = 10 * 60;
/// Goal shown to the user. Deliberately larger than the streak threshold.
pub const DAILY_GOAL_SECS: u64 = 15 * 60;

const DAY_FORMAT: &str = "%Y-%m-%d";

pub fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DAY_FORMAT).ok()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakMeta {
    pub streak: u32,
    pub last_day: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTotal {
    pub day: NaiveDate,
    pub seconds: u64,
}

impl DayTotal {
    pub fn key(&self) -> String {
        day_key(self.day)
    }
}

/// Practice seconds per calendar day plus the streak derived from them.
///
/// Both maps are saved to the store after every change; if the store is
/// gone the tracker keeps working from memory.
pub struct DailyProgress {
    days: BTreeMap<String, u64>,
    meta: StreakMeta,
    store: Rc<dyn KvStore>,
}

impl std::fmt::Debug for DailyProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyProgress")
            .field("days", &self.days)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl DailyProgress {
    pub fn load(store: Rc<dyn KvStore>) -> Self {
        let days = store::load(store.as_ref(), DAILY_KEY, BTreeMap::new());
        let meta = store::load(store.as_ref(), META_KEY, StreakMeta::default());
        tracing::debug!(days = days.len(), streak = meta.streak, "loaded progress");
        Self { days, meta, store }
    }

    pub fn add_seconds(&mut self, delta: u64) {
        self.add_seconds_on(Local::now().date_naive(), delta);
    }

    /// Credits `delta` seconds to `today` and updates the streak.
    pub fn add_seconds_on(&mut self, today: NaiveDate, delta: u64) {
        if delta == 0 {
            return;
        }

        let key = day_key(today);
        let before = self.days.get(&key).copied().unwrap_or(0);
        let after = before + delta;
        self.days.insert(key.clone(), after);

        let already = before >= STREAK_THRESHOLD_SECS;
        let completed = after >= STREAK_THRESHOLD_SECS;
        let last = self.meta.last_day.as_deref().and_then(parse_day_key);

        match last {
            None => {
                self.meta = StreakMeta {
                    streak: u32::from(completed),
                    last_day: Some(key),
                };
            }
            Some(last) => match (today - last).num_days() {
                0 => {
                    if !already && completed {
                        self.meta.streak += 1;
                    }
                }
                1 => {
                    if completed {
                        self.meta.streak += 1;
                    }
                    self.meta.last_day = Some(key);
                }
                gap if gap > 1 => {
                    self.meta = StreakMeta {
                        streak: u32::from(completed),
                        last_day: Some(key),
                    };
                }
                // clock moved backwards; seconds are kept, the streak is left alone
                _ => {
                    tracing::debug!(%today, %last, "day earlier than last recorded day");
                }
            },
        }

        tracing::debug!(delta, total = after, streak = self.meta.streak, "credited practice");
        self.persist();
    }

    pub fn week_data(&self) -> Vec<DayTotal> {
        self.week_data_ending(Local::now().date_naive())
    }

    /// The seven days ending at `today`, oldest first.
    pub fn week_data_ending(&self, today: NaiveDate) -> Vec<DayTotal> {
        (0..7u64)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back)))
            .map(|day| DayTotal {
                day,
                seconds: self.seconds_on(day),
            })
            .collect()
    }

    pub fn seconds_on(&self, day: NaiveDate) -> u64 {
        self.days.get(&day_key(day)).copied().unwrap_or(0)
    }

    pub fn today_seconds(&self) -> u64 {
        self.seconds_on(Local::now().date_naive())
    }

    pub fn streak(&self) -> u32 {
        self.meta.streak
    }

    pub fn meta(&self) -> &StreakMeta {
        &self.meta
    }

    fn persist(&self) {
        store::save(self.store.as_ref(), DAILY_KEY, &self.days);
        store::save(self.store.as_ref(), META_KEY, &self.meta);
    }
}
