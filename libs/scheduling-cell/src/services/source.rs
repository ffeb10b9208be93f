use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::appointment::{clock_time, Appointment, AppointmentStatus};

use crate::services::queue::approved_queue;

/// Where the scheduling engine reads a doctor's day from.
#[async_trait]
pub trait AppointmentSource: Send + Sync {
    /// The doctor's approved appointments on `date`, ascending by time.
    async fn approved_appointments(&self, doctor_id: &str, date: NaiveDate) -> Result<Vec<Appointment>>;

    /// "HH:MM" start times already taken on `date`.
    async fn booked_times(&self, doctor_id: &str, date: NaiveDate) -> Result<Vec<String>>;
}

pub struct SupabaseAppointmentSource {
    supabase: SupabaseClient,
}

#[derive(Debug, Deserialize)]
struct BookedTimeRow {
    time: String,
}

impl SupabaseAppointmentSource {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl AppointmentSource for SupabaseAppointmentSource {
    async fn approved_appointments(&self, doctor_id: &str, date: NaiveDate) -> Result<Vec<Appointment>> {
        debug!("Fetching approved appointments for doctor {} on {}", doctor_id, date);

        let path = format!(
            "/rest/v1/appointments?doctorId=eq.{}&date=eq.{}&status=eq.APPROVED&order=time.asc&select=id,time,patientFirstName,patientLastName,status",
            urlencoding::encode(doctor_id), date
        );
        let appointments: Vec<Appointment> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;

        Ok(approved_queue(appointments))
    }

    async fn booked_times(&self, doctor_id: &str, date: NaiveDate) -> Result<Vec<String>> {
        debug!("Fetching booked times for doctor {} on {}", doctor_id, date);

        let path = format!(
            "/rest/v1/appointments?doctorId=eq.{}&date=eq.{}&status=in.(PENDING,APPROVED)&select=time",
            urlencoding::encode(doctor_id), date
        );
        let rows: Vec<BookedTimeRow> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;

        Ok(rows.into_iter().map(|row| row.time).collect())
    }
}

/// Appointments held in memory, keyed by doctor and day.
#[derive(Default)]
pub struct InMemoryAppointmentSource {
    days: RwLock<HashMap<(String, NaiveDate), Vec<Appointment>>>,
}

impl InMemoryAppointmentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_day(&self, doctor_id: &str, date: NaiveDate, appointments: Vec<Appointment>) {
        self.days
            .write()
            .await
            .insert((doctor_id.to_string(), date), appointments);
    }

    async fn day(&self, doctor_id: &str, date: NaiveDate) -> Vec<Appointment> {
        self.days
            .read()
            .await
            .get(&(doctor_id.to_string(), date))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl AppointmentSource for InMemoryAppointmentSource {
    async fn approved_appointments(&self, doctor_id: &str, date: NaiveDate) -> Result<Vec<Appointment>> {
        Ok(approved_queue(self.day(doctor_id, date).await))
    }

    async fn booked_times(&self, doctor_id: &str, date: NaiveDate) -> Result<Vec<String>> {
        Ok(self
            .day(doctor_id, date)
            .await
            .into_iter()
            .filter(|appointment| {
                matches!(appointment.status, AppointmentStatus::Pending | AppointmentStatus::Approved)
            })
            .map(|appointment| clock_time::format(appointment.time))
            .collect())
    }
}
