use std::sync::Arc;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

use shared_config::{AppConfig, SchedulingConfig};
use shared_models::appointment::{clock_time, Appointment, AppointmentStatus};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub scheduling: SchedulingConfig,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            scheduling: SchedulingConfig::default(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            server_port: 3000,
            scheduling: self.scheduling.clone(),
            queue_display_doctor_ids: Vec::new(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Calendar date fixture; panics on an impossible date.
pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Wall-clock instant fixture.
pub fn at(year: i32, month: u32, date: u32, hour: u32, minute: u32) -> NaiveDateTime {
    day(year, month, date)
        .and_hms_opt(hour, minute, 0)
        .expect("valid test time")
}

pub struct TestAppointment;

impl TestAppointment {
    pub fn approved(id: &str, time: &str) -> Appointment {
        Self::with_status(id, time, AppointmentStatus::Approved)
    }

    pub fn with_status(id: &str, time: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: id.to_string(),
            time: clock_time::parse(time).expect("valid test clock time"),
            patient_first_name: "Test".to_string(),
            patient_last_name: format!("Patient {}", id),
            status,
        }
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    /// A row of the appointments table as PostgREST returns it.
    pub fn appointment_row(id: &str, time: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "time": time,
            "patientFirstName": "Test",
            "patientLastName": format!("Patient {}", id),
            "status": status
        })
    }

    pub fn booked_time_row(time: &str) -> serde_json::Value {
        json!({ "time": time })
    }
}
