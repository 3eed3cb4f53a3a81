//! In-world calendar: day counting and year-relative position.

use serde::{Deserialize, Serialize};

/// Months per in-game year
pub const MONTHS_PER_YEAR: u32 = 12;

/// Source of calendar time for periodic simulation.
pub trait CalendarClock {
    /// Position within the current year, in `[0.0, 1.0)`
    fn year_rel(&self) -> f32;

    /// Days elapsed since the world began, fractional part is time of day
    fn total_days(&self) -> f64;
}

/// Tracks elapsed game days on a calendar of fixed-length months.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameCalendar {
    /// Elapsed days, never negative
    total_days: f64,
    /// Length of every month in days
    days_per_month: u32,
}

impl Default for GameCalendar {
    fn default() -> Self {
        Self::new(9)
    }
}

impl GameCalendar {
    /// Create a calendar at day zero. `days_per_month` is at least 1.
    pub fn new(days_per_month: u32) -> Self {
        Self {
            total_days: 0.0,
            days_per_month: days_per_month.max(1),
        }
    }

    /// Create a calendar positioned at `year_rel` of the first year.
    pub fn at_year_rel(year_rel: f32, days_per_month: u32) -> Self {
        let mut cal = Self::new(days_per_month);
        cal.total_days = year_rel.clamp(0.0, 1.0) as f64 * cal.days_per_year();
        cal
    }

    pub fn days_per_month(&self) -> u32 {
        self.days_per_month
    }

    pub fn days_per_year(&self) -> f64 {
        (self.days_per_month * MONTHS_PER_YEAR) as f64
    }

    /// Advance real time by `dt_seconds`, converting via `day_length_seconds`
    /// (how many real seconds make one in-game day).
    pub fn advance(&mut self, dt_seconds: f32, day_length_seconds: f32) {
        if day_length_seconds <= 0.0 {
            return;
        }
        self.advance_days(dt_seconds as f64 / day_length_seconds as f64);
    }

    /// Advance by a number of game days. Time never runs backwards past day 0.
    pub fn advance_days(&mut self, days: f64) {
        self.total_days = (self.total_days + days).max(0.0);
    }

    pub fn set_total_days(&mut self, days: f64) {
        self.total_days = days.max(0.0);
    }

    /// Number of full years elapsed
    pub fn year(&self) -> u32 {
        (self.total_days / self.days_per_year()).floor() as u32
    }

    /// Current month, 1-based
    pub fn month(&self) -> u32 {
        ((self.year_rel() * MONTHS_PER_YEAR as f32).floor() as u32).min(MONTHS_PER_YEAR - 1) + 1
    }

    /// Current day of the month, 1-based
    pub fn day_of_month(&self) -> u32 {
        let day_of_year = self.total_days.rem_euclid(self.days_per_year()).floor() as u32;
        day_of_year % self.days_per_month + 1
    }

    /// Hour within the current day, `[0.0, 24.0)`
    pub fn hour(&self) -> f32 {
        (self.total_days.fract() * 24.0) as f32
    }
}

impl CalendarClock for GameCalendar {
    fn year_rel(&self) -> f32 {
        let rel = (self.total_days / self.days_per_year()).fract() as f32;
        // f64 -> f32 rounding can land exactly on 1.0
        if rel >= 1.0 { 0.0 } else { rel }
    }

    fn total_days(&self) -> f64 {
        self.total_days
    }
}
