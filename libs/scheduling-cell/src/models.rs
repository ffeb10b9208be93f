use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::appointment::{clock_time, Appointment};
use shared_models::error::AppError;

/// A calendar date with the time of day stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    /// The calendar day an instant falls on.
    pub fn of(instant: NaiveDateTime) -> Self {
        Self(instant.date())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// One bookable interval of a day, identified by its start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Start of the slot, serialized as "HH:MM".
    #[serde(with = "clock_time")]
    pub time: NaiveTime,
    /// False when the slot is booked or already started today.
    pub is_available: bool,
}

impl TimeSlot {
    pub fn label(&self) -> String {
        clock_time::format(self.time)
    }
}

/// Every slot of one day, bookable or not, in clock order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGrid {
    pub day: CalendarDay,
    pub slots: Vec<TimeSlot>,
}

impl SlotGrid {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn available(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter().filter(|slot| slot.is_available)
    }

    /// Looks a slot up by its "HH:MM" label.
    pub fn find(&self, label: &str) -> Option<&TimeSlot> {
        let time = clock_time::parse(label)?;
        self.slots.iter().find(|slot| slot.time == time)
    }
}

/// The contiguous run of horizon days currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
    /// Offset of the first visible day into the horizon.
    pub start_index: usize,
    /// Number of visible days.
    pub size: usize,
}

/// Result of a paging request. Hitting either end is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOutcome {
    Moved,
    AtBoundary,
}

/// Paginator state as a UI consumer holds it between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    /// First day of the horizon ("today" when the session started).
    pub anchor: CalendarDay,
    /// Offset of the first visible day, at most `horizon - window`.
    pub start_index: usize,
    /// The day whose slots are shown; may sit outside the visible window.
    pub selected_day: CalendarDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueState {
    Past,
    Current,
    Upcoming,
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueState::Past => write!(f, "past"),
            QueueState::Current => write!(f, "current"),
            QueueState::Upcoming => write!(f, "upcoming"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedAppointment {
    pub id: String,
    pub state: QueueState,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueClassification {
    pub per_appointment: Vec<ClassifiedAppointment>,
    /// Index of the "now serving" entry; `None` only for an empty day.
    pub active_index: Option<usize>,
    /// Set when every appointment is past and the active index fell back
    /// to the last entry of the day.
    pub all_past: bool,
    pub display_window: Vec<Appointment>,
}

impl QueueClassification {
    pub fn states(&self) -> Vec<QueueState> {
        self.per_appointment.iter().map(|entry| entry.state).collect()
    }

    pub fn active(&self) -> Option<&ClassifiedAppointment> {
        self.active_index.and_then(|index| self.per_appointment.get(index))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Day {day} is outside the booking horizon ({min} to {max})")]
    DayOutOfRange {
        day: CalendarDay,
        min: CalendarDay,
        max: CalendarDay,
    },

    #[error("Index {index} is outside the visible window of {size} days")]
    WindowIndexOutOfRange { index: usize, size: usize },

    #[error("Window start {start_index} exceeds the last page start {max}")]
    InvalidWindowStart { start_index: usize, max: usize },
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
