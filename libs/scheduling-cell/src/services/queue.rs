use chrono::{NaiveDateTime, NaiveTime, Timelike};
use tracing::{debug, warn};

use shared_config::SchedulingConfig;
use shared_models::appointment::Appointment;

use crate::models::{ClassifiedAppointment, QueueClassification, QueueState};

/// Derives the waiting-room view of a doctor's day from the clock.
///
/// Nothing is carried between calls: each tick re-classifies the whole
/// list against the new `now`.
pub struct QueueClassifier {
    slot_minutes: u32,
    display_before: usize,
    display_after: usize,
}

impl QueueClassifier {
    pub fn new(config: &SchedulingConfig) -> Self {
        Self {
            slot_minutes: config.slot_minutes,
            display_before: config.queue_display_before,
            display_after: config.queue_display_after,
        }
    }

    /// Classifies `appointments` (approved, ascending by time) at `now`.
    pub fn classify(&self, appointments: &[Appointment], now: NaiveDateTime) -> QueueClassification {
        if appointments.is_empty() {
            return QueueClassification::default();
        }

        let now_minutes = minutes_since_midnight(now.time());

        let per_appointment: Vec<ClassifiedAppointment> = appointments
            .iter()
            .map(|appointment| ClassifiedAppointment {
                id: appointment.id.clone(),
                state: self.state_at(minutes_since_midnight(appointment.time), now_minutes),
            })
            .collect();

        let first_with = |state: QueueState| per_appointment.iter().position(|entry| entry.state == state);

        let (active, all_past) = match first_with(QueueState::Current).or_else(|| first_with(QueueState::Upcoming)) {
            Some(index) => (index, false),
            None => {
                // Kept for parity with the existing display: a finished day
                // keeps its last appointment highlighted.
                warn!("All {} appointments are past; highlighting the last one", appointments.len());
                (appointments.len() - 1, true)
            }
        };

        let start = active.saturating_sub(self.display_before);
        let end = active
            .saturating_add(self.display_after)
            .saturating_add(1)
            .min(appointments.len());

        debug!(
            "Queue at {}: active {} of {}, showing {}..{}",
            now.format("%H:%M"),
            active,
            appointments.len(),
            start,
            end
        );

        QueueClassification {
            per_appointment,
            active_index: Some(active),
            all_past,
            display_window: appointments[start..end].to_vec(),
        }
    }

    fn state_at(&self, start_minutes: u32, now_minutes: u32) -> QueueState {
        if now_minutes < start_minutes {
            QueueState::Upcoming
        } else if now_minutes < start_minutes + self.slot_minutes {
            QueueState::Current
        } else {
            QueueState::Past
        }
    }
}

/// Keeps the approved appointments and orders them by start time, which
/// is the order `QueueClassifier::classify` expects.
pub fn approved_queue(appointments: Vec<Appointment>) -> Vec<Appointment> {
    let mut queue: Vec<Appointment> = appointments
        .into_iter()
        .filter(Appointment::is_approved)
        .collect();
    queue.sort_by_key(|appointment| appointment.time);
    queue
}

fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}
