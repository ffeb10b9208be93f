use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub server_port: u16,
    pub scheduling: SchedulingConfig,
    /// Doctors whose waiting-room display is kept live by the API process.
    pub queue_display_doctor_ids: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            supabase_url: lookup("SUPABASE_URL").unwrap_or_else(|| {
                warn!("SUPABASE_URL not set, using empty value");
                String::new()
            }),
            supabase_anon_key: lookup("SUPABASE_ANON_PUBLIC_KEY").unwrap_or_else(|| {
                warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                String::new()
            }),
            server_port: parse_or_default(&lookup, "SERVER_PORT", 3000),
            scheduling: SchedulingConfig::from_lookup(&lookup),
            queue_display_doctor_ids: lookup("QUEUE_DISPLAY_DOCTOR_IDS")
                .map(|ids| {
                    ids.split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("Week window of {window} days does not fit a {horizon}-day booking horizon")]
    WindowLargerThanHorizon { window: usize, horizon: usize },

    #[error("Opening hour {opening} must be before closing hour {closing}")]
    InvertedOpeningHours { opening: u32, closing: u32 },

    #[error("Closing hour {0} is not a valid hour of the day")]
    InvalidClosingHour(u32),

    #[error("Slot length of {0} minutes does not divide an hour")]
    UnevenSlotLength(u32),
}

/// Tunables of the scheduling engine. Defaults mirror the clinic's
/// front-office: 90 bookable days shown five at a time, 09:00 to 17:00
/// in half-hour slots, and a waiting-room display refreshed every minute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    pub horizon_days: usize,
    pub window_size: usize,
    pub opening_hour: u32,
    /// Last bookable slot starts on this hour.
    pub closing_hour: u32,
    pub slot_minutes: u32,
    pub queue_refresh_seconds: u64,
    pub queue_display_before: usize,
    pub queue_display_after: usize,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            horizon_days: 90,
            window_size: 5,
            opening_hour: 9,
            closing_hour: 17,
            slot_minutes: 30,
            queue_refresh_seconds: 60,
            queue_display_before: 3,
            queue_display_after: 6,
        }
    }
}

impl SchedulingConfig {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            horizon_days: parse_or_default(lookup, "BOOKING_HORIZON_DAYS", defaults.horizon_days),
            window_size: parse_or_default(lookup, "BOOKING_WINDOW_SIZE", defaults.window_size),
            opening_hour: parse_or_default(lookup, "CLINIC_OPENING_HOUR", defaults.opening_hour),
            closing_hour: parse_or_default(lookup, "CLINIC_CLOSING_HOUR", defaults.closing_hour),
            slot_minutes: parse_or_default(lookup, "SLOT_MINUTES", defaults.slot_minutes),
            queue_refresh_seconds: parse_or_default(
                lookup,
                "QUEUE_REFRESH_SECONDS",
                defaults.queue_refresh_seconds,
            ),
            queue_display_before: parse_or_default(
                lookup,
                "QUEUE_DISPLAY_BEFORE",
                defaults.queue_display_before,
            ),
            queue_display_after: parse_or_default(
                lookup,
                "QUEUE_DISPLAY_AFTER",
                defaults.queue_display_after,
            ),
        };

        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Invalid scheduling configuration ({}), using defaults", e);
                defaults
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon_days == 0 {
            return Err(ConfigError::Zero("BOOKING_HORIZON_DAYS"));
        }
        if self.window_size == 0 {
            return Err(ConfigError::Zero("BOOKING_WINDOW_SIZE"));
        }
        if self.slot_minutes == 0 {
            return Err(ConfigError::Zero("SLOT_MINUTES"));
        }
        if self.queue_refresh_seconds == 0 {
            return Err(ConfigError::Zero("QUEUE_REFRESH_SECONDS"));
        }
        if self.window_size > self.horizon_days {
            return Err(ConfigError::WindowLargerThanHorizon {
                window: self.window_size,
                horizon: self.horizon_days,
            });
        }
        if self.closing_hour > 23 {
            return Err(ConfigError::InvalidClosingHour(self.closing_hour));
        }
        if self.opening_hour >= self.closing_hour {
            return Err(ConfigError::InvertedOpeningHours {
                opening: self.opening_hour,
                closing: self.closing_hour,
            });
        }
        if 60 % self.slot_minutes != 0 {
            return Err(ConfigError::UnevenSlotLength(self.slot_minutes));
        }
        Ok(())
    }

    pub fn queue_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.queue_refresh_seconds)
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}
