pub mod appointment;
pub mod error;
