use tracing::{debug, info, warn};

use shared_config::SchedulingConfig;

use crate::models::{CalendarDay, PageOutcome, SchedulingError, WeekWindow, WindowState};
use crate::services::horizon::{build_horizon, BookingHorizon};

/// A fixed-size window sliding over the booking horizon, plus the day the
/// patient has picked.
///
/// Invariants: `window.start_index <= horizon.len() - window.size`, and
/// `selected_day` always lies inside the horizon (not necessarily inside
/// the visible window).
#[derive(Debug, Clone)]
pub struct WeekPaginator {
    horizon: BookingHorizon,
    window: WeekWindow,
    selected_day: CalendarDay,
}

impl WeekPaginator {
    pub fn new(horizon: BookingHorizon, window_size: usize) -> Self {
        let size = window_size.clamp(1, horizon.len().max(1));
        let selected_day = horizon.min_date();

        Self {
            horizon,
            window: WeekWindow { start_index: 0, size },
            selected_day,
        }
    }

    pub fn from_config(anchor: CalendarDay, config: &SchedulingConfig) -> Self {
        Self::new(build_horizon(anchor, config.horizon_days), config.window_size)
    }

    /// Rebuilds a paginator from state a consumer kept between requests.
    pub fn restore(state: WindowState, config: &SchedulingConfig) -> Result<Self, SchedulingError> {
        let mut paginator = Self::from_config(state.anchor, config);

        if state.start_index > paginator.max_start() {
            return Err(SchedulingError::InvalidWindowStart {
                start_index: state.start_index,
                max: paginator.max_start(),
            });
        }
        if !paginator.horizon.contains(state.selected_day) {
            return Err(paginator.out_of_range(state.selected_day));
        }

        paginator.window.start_index = state.start_index;
        paginator.selected_day = state.selected_day;
        Ok(paginator)
    }

    pub fn state(&self) -> WindowState {
        WindowState {
            anchor: self.horizon.min_date(),
            start_index: self.window.start_index,
            selected_day: self.selected_day,
        }
    }

    pub fn horizon(&self) -> &BookingHorizon {
        &self.horizon
    }

    pub fn window(&self) -> WeekWindow {
        self.window
    }

    pub fn selected_day(&self) -> CalendarDay {
        self.selected_day
    }

    pub fn visible_days(&self) -> &[CalendarDay] {
        self.horizon.slice(self.window.start_index, self.window.size)
    }

    /// Jumps to `day`, moving the window so the day sits just left of
    /// centre. Days outside the horizon are rejected and nothing changes.
    pub fn select_day(&mut self, day: CalendarDay) -> Result<(), SchedulingError> {
        let index = match self.horizon.index_of(day) {
            Some(index) => index,
            None => {
                warn!(
                    "Rejected selection of {} outside {}..{}",
                    day,
                    self.horizon.min_date(),
                    self.horizon.max_date()
                );
                return Err(self.out_of_range(day));
            }
        };

        let lead = (self.window.size - 1) / 2;
        self.selected_day = day;
        self.window.start_index = index.saturating_sub(lead).min(self.max_start());

        debug!("Selected {} (window starts at {})", day, self.window.start_index);
        Ok(())
    }

    /// Picks the `index`-th visible day without moving the window.
    pub fn select_day_at_index(&mut self, index: usize) -> Result<CalendarDay, SchedulingError> {
        let day = self
            .visible_days()
            .get(index)
            .copied()
            .ok_or(SchedulingError::WindowIndexOutOfRange {
                index,
                size: self.window.size,
            })?;

        self.selected_day = day;
        Ok(day)
    }

    pub fn can_page_forward(&self) -> bool {
        self.window.start_index < self.max_start()
    }

    pub fn can_page_backward(&self) -> bool {
        self.window.start_index > 0
    }

    pub fn page_forward(&mut self) -> PageOutcome {
        if !self.can_page_forward() {
            return PageOutcome::AtBoundary;
        }
        self.window.start_index = (self.window.start_index + self.window.size).min(self.max_start());
        PageOutcome::Moved
    }

    pub fn page_backward(&mut self) -> PageOutcome {
        if !self.can_page_backward() {
            return PageOutcome::AtBoundary;
        }
        self.window.start_index = self.window.start_index.saturating_sub(self.window.size);
        PageOutcome::Moved
    }

    /// Moves the horizon to start at `today` when the session has crossed
    /// midnight. The selection survives if it is still bookable; otherwise
    /// it resets to the first day. Returns whether anything changed.
    pub fn rebase(&mut self, today: CalendarDay) -> bool {
        if today == self.horizon.min_date() {
            return false;
        }

        info!("Booking horizon rolled over from {} to {}", self.horizon.min_date(), today);

        let previous = self.selected_day;
        self.horizon = build_horizon(today, self.horizon.len());
        self.window.start_index = 0;
        self.selected_day = today;

        if self.select_day(previous).is_err() {
            debug!("Previous selection {} is no longer bookable", previous);
        }
        true
    }

    fn max_start(&self) -> usize {
        self.horizon.len().saturating_sub(self.window.size)
    }

    fn out_of_range(&self, day: CalendarDay) -> SchedulingError {
        SchedulingError::DayOutOfRange {
            day,
            min: self.horizon.min_date(),
            max: self.horizon.max_date(),
        }
    }
}
