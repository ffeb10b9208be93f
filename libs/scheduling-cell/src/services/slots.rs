use std::collections::HashSet;

use chrono::{NaiveDateTime, NaiveTime};
use tracing::{debug, warn};

use shared_config::SchedulingConfig;
use shared_models::appointment::clock_time;

use crate::models::{CalendarDay, SlotGrid, TimeSlot};

/// Lays out a day's bookable slots and flags the ones that can no longer
/// be taken.
pub struct SlotGridService {
    opening_hour: u32,
    closing_hour: u32,
    slot_minutes: u32,
}

impl SlotGridService {
    pub fn new(config: &SchedulingConfig) -> Self {
        Self {
            opening_hour: config.opening_hour,
            closing_hour: config.closing_hour,
            slot_minutes: config.slot_minutes,
        }
    }

    /// Slot start times from the opening hour through the closing hour
    /// inclusive. Nothing starts after the closing hour.
    pub fn slot_times(&self) -> Vec<NaiveTime> {
        let first = self.opening_hour * 60;
        let last = self.closing_hour * 60;
        let step = self.slot_minutes.max(1) as usize;

        (first..=last)
            .step_by(step)
            .filter_map(|minutes| NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0))
            .collect()
    }

    /// Builds the slot grid of `day`. A slot is unavailable when it is
    /// booked, or when `day` is today and the slot starts before `now`.
    pub fn build_slot_grid<I, S>(&self, day: CalendarDay, booked_times: I, now: NaiveDateTime) -> SlotGrid
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let booked = normalize_booked_times(booked_times);
        let is_today = day == CalendarDay::of(now);
        let current_time = now.time();

        let slots: Vec<TimeSlot> = self
            .slot_times()
            .into_iter()
            .map(|time| {
                let is_past = is_today && time < current_time;
                let is_booked = booked.contains(&time);
                TimeSlot {
                    time,
                    is_available: !is_past && !is_booked,
                }
            })
            .collect();

        debug!(
            "Slot grid for {}: {} slots, {} available",
            day,
            slots.len(),
            slots.iter().filter(|slot| slot.is_available).count()
        );

        SlotGrid { day, slots }
    }
}

fn normalize_booked_times<I, S>(booked_times: I) -> HashSet<NaiveTime>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    booked_times
        .into_iter()
        .filter_map(|raw| {
            let raw = raw.as_ref();
            let parsed = clock_time::parse(raw);
            if parsed.is_none() {
                warn!("Ignoring booked time '{}': not a clock time", raw);
            }
            parsed
        })
        .collect()
}
