use tracing::debug;

use shared_config::SchedulingConfig;

use crate::models::CalendarDay;

/// Consecutive bookable days starting at the anchor ("today").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingHorizon {
    anchor: CalendarDay,
    days: Vec<CalendarDay>,
}

impl BookingHorizon {
    pub fn min_date(&self) -> CalendarDay {
        self.anchor
    }

    pub fn max_date(&self) -> CalendarDay {
        self.days.last().copied().unwrap_or(self.anchor)
    }

    pub fn days(&self) -> &[CalendarDay] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn contains(&self, day: CalendarDay) -> bool {
        self.index_of(day).is_some()
    }

    /// Position of `day` in the horizon. Days are contiguous, so this is
    /// the day offset from the anchor when it falls inside the range.
    pub fn index_of(&self, day: CalendarDay) -> Option<usize> {
        let offset = day.date().signed_duration_since(self.anchor.date()).num_days();
        usize::try_from(offset)
            .ok()
            .filter(|index| *index < self.days.len())
    }

    /// Up to `len` days starting at `start`, clamped to the horizon.
    pub fn slice(&self, start: usize, len: usize) -> &[CalendarDay] {
        let start = start.min(self.days.len());
        let end = start.saturating_add(len).min(self.days.len());
        &self.days[start..end]
    }
}

/// Builds the `days`-long horizon beginning at `anchor`.
pub fn build_horizon(anchor: CalendarDay, days: usize) -> BookingHorizon {
    let days: Vec<CalendarDay> = anchor
        .date()
        .iter_days()
        .take(days)
        .map(CalendarDay::from)
        .collect();

    debug!("Built booking horizon of {} days from {}", days.len(), anchor);

    BookingHorizon { anchor, days }
}

pub struct HorizonService {
    horizon_days: usize,
}

impl HorizonService {
    pub fn new(config: &SchedulingConfig) -> Self {
        Self {
            horizon_days: config.horizon_days,
        }
    }

    pub fn build_horizon(&self, anchor: CalendarDay) -> BookingHorizon {
        build_horizon(anchor, self.horizon_days)
    }
}
