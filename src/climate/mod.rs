//! Calendar time and local climate

pub mod calendar;
pub mod sampler;
pub mod seasonal;

pub use calendar::{CalendarClock, GameCalendar, MONTHS_PER_YEAR};
pub use sampler::ClimateSampler;
pub use seasonal::{ClimateParams, SeasonalClimate};
