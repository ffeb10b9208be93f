pub mod clock;
pub mod horizon;
pub mod slots;
pub mod paginator;
pub mod queue;
pub mod source;
pub mod monitor;

pub use clock::{Clock, FixedClock, SystemClock};
pub use horizon::{build_horizon, BookingHorizon, HorizonService};
pub use slots::SlotGridService;
pub use paginator::WeekPaginator;
pub use queue::{approved_queue, QueueClassifier};
pub use source::{AppointmentSource, InMemoryAppointmentSource, SupabaseAppointmentSource};
pub use monitor::{LiveQueueHandle, LiveQueueMonitor, QueueSnapshot};
